use crate::utils::logger::LogFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "ccrm")]
#[command(about = "Campus Course & Records Manager", version)]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for exported CSV files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for backup archives
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Print full diagnostic detail on failure
    #[arg(long)]
    pub debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,
}
