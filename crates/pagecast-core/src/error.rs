use crate::storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagecastError {
    // Template errors
    #[error("TEMPLATE_NOT_FOUND: template '{0}' is not registered")]
    TemplateNotFound(String),

    #[error("TEMPLATE_NOT_FOUND: body file '{path}' for template '{template}' does not exist")]
    TemplateBodyMissing { template: String, path: String },

    #[error("TEMPLATE_MALFORMED: template '{template}': {reason}")]
    TemplateMalformed { template: String, reason: String },

    // Render errors
    #[error(
        "MISSING_PRIOR_PERIOD_DATA: template '{template}' requires '{reference}' at '{path}' but it does not exist"
    )]
    MissingPriorPeriodData {
        template: String,
        reference: String,
        path: String,
    },

    #[error("UNRESOLVED_REQUIRED_PLACEHOLDERS: template '{template}' is missing values for: {}", .names.join(", "))]
    UnresolvedRequiredPlaceholders {
        template: String,
        names: Vec<String>,
    },

    // Storage errors
    #[error("STORAGE_BACKEND_ERROR: {0}")]
    Storage(#[from] StorageError),

    #[error("FOLDER_NOT_FOUND: no folder matching '{pattern}' under '{parent}'")]
    FolderNotFound { parent: String, pattern: String },

    #[error("FOLDER_AMBIGUOUS: folders {} all match '{pattern}'", .candidates.join(", "))]
    FolderAmbiguous {
        pattern: String,
        candidates: Vec<String>,
    },

    #[error("INVALID_PATH: '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    // Config errors
    #[error("CONFIG_NOT_FOUND: pagecast.toml not found in current or parent directories")]
    ConfigNotFound,

    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },

    // IO errors
    #[error("IO_ERROR: {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PagecastError {
    /// Stable machine-readable code (the prefix of the Display output)
    pub fn code(&self) -> &'static str {
        match self {
            PagecastError::TemplateNotFound(_) | PagecastError::TemplateBodyMissing { .. } => {
                "TEMPLATE_NOT_FOUND"
            }
            PagecastError::TemplateMalformed { .. } => "TEMPLATE_MALFORMED",
            PagecastError::MissingPriorPeriodData { .. } => "MISSING_PRIOR_PERIOD_DATA",
            PagecastError::UnresolvedRequiredPlaceholders { .. } => {
                "UNRESOLVED_REQUIRED_PLACEHOLDERS"
            }
            PagecastError::Storage(_) => "STORAGE_BACKEND_ERROR",
            PagecastError::FolderNotFound { .. } => "FOLDER_NOT_FOUND",
            PagecastError::FolderAmbiguous { .. } => "FOLDER_AMBIGUOUS",
            PagecastError::InvalidPath { .. } => "INVALID_PATH",
            PagecastError::ConfigNotFound => "CONFIG_NOT_FOUND",
            PagecastError::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            PagecastError::ConfigInvalidValue { .. } => "CONFIG_INVALID_VALUE",
            PagecastError::IoError { .. } => "IO_ERROR",
        }
    }

    pub(crate) fn malformed(template: &str, reason: impl Into<String>) -> Self {
        PagecastError::TemplateMalformed {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PagecastError>;
