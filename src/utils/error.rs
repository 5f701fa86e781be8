use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CcrmError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error(
        "Credit limit exceeded for {reg_no} in {semester}: {attempted} credits requested, limit is {limit}"
    )]
    CreditLimitExceeded {
        reg_no: String,
        semester: String,
        attempted: u32,
        limit: u32,
    },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Record,
    Storage,
    Configuration,
}

impl CcrmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Input,
            Self::NotFound { .. }
            | Self::Duplicate { .. }
            | Self::CreditLimitExceeded { .. }
            | Self::InvalidState { .. } => ErrorCategory::Record,
            Self::ZipError(_)
            | Self::CsvError(_)
            | Self::IoError(_)
            | Self::SerializationError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Short message for the console, without nested causes.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {}", e),
            Self::CsvError(e) => format!("Could not read or write CSV data: {}", e),
            Self::ZipError(e) => format!("Backup archive error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the entered values and try again",
            ErrorCategory::Record => "List the existing records and pick a valid entry",
            ErrorCategory::Storage => "Check that the path exists and is readable/writable",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, CcrmError>;

/// Failures that end the process at the top level.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[source] CcrmError),

    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to construct {component}: {source}")]
    Construction {
        component: &'static str,
        #[source]
        source: CcrmError,
    },

    #[error("menu session aborted: {0}")]
    Runtime(#[source] CcrmError),
}

impl StartupError {
    /// Multi-line diagnostic detail printed in debug mode.
    pub fn diagnostic_detail(&self) -> Vec<String> {
        let mut lines = vec![format!("Caused by: {:?}", self)];
        let mut source = std::error::Error::source(self);
        let mut depth = 0;
        while let Some(cause) = source {
            lines.push(format!("  {}: {}", depth, cause));
            depth += 1;
            source = cause.source();
        }
        lines
    }
}
