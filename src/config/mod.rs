pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use cli::CliArgs;
pub use toml_config::TomlConfig;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_BACKUP_DIR: &str = "./backups";

/// Application settings, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub debug_mode: bool,
    pub verbose: bool,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            debug_mode: false,
            verbose: false,
            log_format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_dir: backup_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Defaults, then the TOML file named by `--config`, then command line flags.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        let config = Self::from_sources(file, args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_sources(file: TomlConfig, args: &CliArgs) -> Self {
        let mut config = Self::default();

        if let Some(storage) = file.storage {
            if let Some(dir) = storage.data_dir {
                config.data_dir = PathBuf::from(dir);
            }
            if let Some(dir) = storage.backup_dir {
                config.backup_dir = PathBuf::from(dir);
            }
        }
        if let Some(debug) = file.app.and_then(|app| app.debug) {
            config.debug_mode = debug;
        }
        if let Some(logging) = file.logging {
            config.verbose = logging.verbose.unwrap_or(false);
            if let Some(format) = logging.format {
                config.log_format = format;
            }
        }

        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &args.backup_dir {
            config.backup_dir = dir.clone();
        }
        // flags can only switch these on
        config.debug_mode |= args.debug;
        config.verbose |= args.verbose;
        if let Some(format) = args.log_format {
            config.log_format = format.into();
        }

        config
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_path("data_dir", &self.data_dir.to_string_lossy())?;
        validate_path("backup_dir", &self.backup_dir.to_string_lossy())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::CcrmError;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(TomlConfig::default(), &CliArgs::default());
        assert_eq!(config, AppConfig::default());
        assert!(!config.is_debug_mode());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = TomlConfig::from_toml_str(
            "[storage]\ndata_dir = \"/from/file\"\nbackup_dir = \"/file/backups\"\n[app]\ndebug = false\n",
        )
        .unwrap();
        let args = CliArgs::parse_from(["ccrm", "--data-dir", "/from/cli", "--debug"]);

        let config = AppConfig::from_sources(file, &args);
        assert_eq!(config.data_dir, PathBuf::from("/from/cli"));
        assert_eq!(config.backup_dir, PathBuf::from("/file/backups"));
        assert!(config.debug_mode);
    }

    #[test]
    fn test_log_format_flag() {
        let args = CliArgs::parse_from(["ccrm", "--log-format", "json", "-v"]);
        let config = AppConfig::from_sources(TomlConfig::default(), &args);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.verbose);
    }

    #[test]
    fn test_empty_path_fails_validation() {
        let config = AppConfig::new("", "./backups");
        assert!(matches!(
            config.validate(),
            Err(CcrmError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let args = CliArgs::parse_from(["ccrm", "--config", "/no/such/ccrm.toml"]);
        assert!(matches!(
            AppConfig::load(&args),
            Err(CcrmError::ConfigError { .. })
        ));
    }
}
