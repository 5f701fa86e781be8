use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const WELCOME: &str = "Welcome to the Campus Course & Records Manager (CCRM)";

fn run_ccrm(args: &[&str], stdin: &str, cwd: &Path) -> Result<Output> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ccrm"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // The binary may exit before reading stdin (e.g. startup failure).
    match child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
    {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        other => other?,
    }

    Ok(child.wait_with_output()?)
}

#[test]
fn test_normal_exit_returns_zero() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = run_ccrm(&[], "0\n", temp_dir.path())?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().next(), Some(WELCOME));
    assert!(stdout.contains("Goodbye!"));
    assert!(temp_dir.path().join("data").is_dir());
    assert!(temp_dir.path().join("backups").is_dir());
    Ok(())
}

#[test]
fn test_directory_collision_exits_with_one() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("blocked"), b"file")?;

    let output = run_ccrm(&["--data-dir", "blocked"], "0\n", temp_dir.path())?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(stderr.lines().count(), 1, "stderr was: {stderr}");
    assert!(stderr.starts_with("Error starting application:"));
    assert_eq!(String::from_utf8(output.stdout)?, "", "failure is reported on stderr only");
    Ok(())
}

#[test]
fn test_debug_flag_prints_detail() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("blocked"), b"file")?;

    let output = run_ccrm(
        &["--backup-dir", "blocked", "--debug"],
        "0\n",
        temp_dir.path(),
    )?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.lines().count() > 1, "stderr was: {stderr}");
    assert!(stderr.contains("Caused by:"));
    Ok(())
}

#[test]
fn test_config_file_is_honoured() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(
        temp_dir.path().join("ccrm.toml"),
        "[storage]\ndata_dir = \"records\"\nbackup_dir = \"archive/backups\"\n",
    )?;

    let output = run_ccrm(&["--config", "ccrm.toml"], "0\n", temp_dir.path())?;

    assert_eq!(output.status.code(), Some(0));
    assert!(temp_dir.path().join("records").is_dir());
    assert!(temp_dir.path().join("archive").join("backups").is_dir());
    Ok(())
}

#[test]
fn test_broken_config_file_exits_with_one() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("ccrm.toml"), "[storage\n")?;

    let output = run_ccrm(&["--config", "ccrm.toml"], "0\n", temp_dir.path())?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(stderr.lines().count(), 1, "stderr was: {stderr}");
    assert!(stderr.contains("failed to load configuration"));
    Ok(())
}
