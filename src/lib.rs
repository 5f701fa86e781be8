pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::app::bootstrap::{run, run_with_io, WELCOME_MESSAGE};
pub use crate::app::menu::MenuHandler;
pub use crate::config::{AppConfig, CliArgs};
pub use crate::core::{backup::BackupService, import_export::ImportExportService};
pub use crate::utils::error::{CcrmError, Result, StartupError};
