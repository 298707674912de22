use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("No site matches terminal '{0}'")]
    SiteNotFound(String),

    #[error("Terminal '{terminal}' matched {count} sites, expected exactly one")]
    AmbiguousMatch { terminal: String, count: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Executable not found at: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Application did not quiesce within {0:?}")]
    LaunchTimeout(std::time::Duration),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No recorded video for the requested range: {0}")]
    VideoNotFound(String),

    #[error("Output directory does not exist: {0}")]
    OutputDirectoryMissing(PathBuf),

    #[error("File already exists and overwrite is disabled: {0}")]
    FileExists(PathBuf),

    #[error("Aborted by operator")]
    Aborted,

    #[error("Failed to terminate application process: {0}")]
    TerminationFailed(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AutomationError {
    /// Transient lookup failures are the only errors the navigator retries;
    /// everything else escalates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, AutomationError::ElementNotFound(_))
    }
}
