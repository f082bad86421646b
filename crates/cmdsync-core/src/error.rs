use crate::types::Service;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no adapter registered for service '{0}'")]
    AdapterNotFound(Service),

    #[error("{} is not installed on this host", .0.label())]
    ServiceUnavailable(Service),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error(
        "invalid command name '{0}': use letters, digits, '-' or '_', starting and ending with a letter or digit"
    )]
    InvalidName(String),

    #[error("project-scoped command '{0}' has no project path")]
    MissingProjectPath(String),

    #[error("no backup found for {}", .0.display())]
    NoBackupFound(PathBuf),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("unknown scope: {0}")]
    UnknownScope(String),

    #[error("unknown activation mode: {0}")]
    UnknownActivationMode(String),

    #[error("home directory not found: set HOME or CMDSYNC_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
