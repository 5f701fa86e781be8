//! Application composition root.
//!
//! Prepares the storage directories, builds the services leaves first and
//! hands control to the interactive menu.

use crate::app::menu::MenuHandler;
use crate::app::services::{
    InMemoryCourseService, InMemoryEnrollmentService, InMemoryStudentService,
};
use crate::config::AppConfig;
use crate::core::backup::BackupService;
use crate::core::import_export::ImportExportService;
use crate::domain::ports::{CourseService, EnrollmentService, StudentService};
use crate::utils::error::StartupError;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

pub const WELCOME_MESSAGE: &str = "Welcome to the Campus Course & Records Manager (CCRM)";

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Creates `path` and any missing parents; an existing directory is fine.
pub fn ensure_directory(path: &Path) -> Result<(), StartupError> {
    fs::create_dir_all(path).map_err(|source| StartupError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Directory ready: {}", path.display());
    Ok(())
}

/// Runs the startup sequence up to, but not including, the welcome line.
pub fn build(config: Arc<AppConfig>) -> Result<MenuHandler, StartupError> {
    ensure_directory(&config.data_dir)?;
    ensure_directory(&config.backup_dir)?;

    let students: Arc<dyn StudentService> = Arc::new(InMemoryStudentService::new());
    let courses: Arc<dyn CourseService> = Arc::new(InMemoryCourseService::new());
    let enrollments: Arc<dyn EnrollmentService> = Arc::new(InMemoryEnrollmentService::new());

    let import_export = Arc::new(ImportExportService::new(
        students.clone(),
        courses.clone(),
        enrollments.clone(),
    ));

    let backup = BackupService::new(&config.backup_dir, import_export.clone()).map_err(
        |source| StartupError::Construction {
            component: "backup service",
            source,
        },
    )?;

    tracing::info!(
        "Services ready (data: {}, backups: {})",
        config.data_dir.display(),
        config.backup_dir.display()
    );

    Ok(MenuHandler::new(
        students,
        courses,
        enrollments,
        import_export,
        Arc::new(backup),
        config,
    ))
}

/// Full startup on the process console; blocks until the session ends.
pub fn run(config: Arc<AppConfig>) -> Result<(), StartupError> {
    let menu = build(config)?;
    println!("{}", WELCOME_MESSAGE);
    menu.start().map_err(StartupError::Runtime)
}

/// Same sequence as [`run`] with an injected console.
pub fn run_with_io<R: BufRead, W: Write>(
    config: Arc<AppConfig>,
    input: R,
    mut output: W,
) -> Result<(), StartupError> {
    let menu = build(config)?;
    writeln!(output, "{}", WELCOME_MESSAGE).map_err(|e| StartupError::Runtime(e.into()))?;
    menu.run_with(input, output).map_err(StartupError::Runtime)
}

/// Writes the one-line summary, plus the cause chain when `debug` is set.
pub fn report_failure<W: Write>(err: &StartupError, debug: bool, out: &mut W) -> io::Result<()> {
    // parser errors can span several lines; the summary must stay on one
    let summary = err
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "Error starting application: {}", summary)?;
    if debug {
        for line in err.diagnostic_detail() {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

pub fn exit_code(result: &Result<(), StartupError>) -> i32 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
