use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FtpVaultError {
    #[error("{0}")]
    Message(String),
    #[error("connect: {0}")]
    Connection(String),
    #[error("list {path}: {message}")]
    Listing { path: String, message: String },
    #[error("unsafe path: {0}")]
    PathEscape(String),
    #[error("download {remote}: {message}")]
    Transfer { remote: String, message: String },
    #[error("remove {}: {message}", path.display())]
    Cleanup { path: PathBuf, message: String },
    #[error("{0}")]
    Config(ConfigError),
    #[error("traversal stopped at {0}")]
    Traversal(String),
    #[error("{failed} item(s) failed; first: {first}")]
    Incomplete { failed: usize, first: String },
    #[error("job {0} is already running")]
    AlreadyRunning(String),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
    #[error("job '{0}' not found")]
    JobNotFound(String),
}

pub type Result<T> = std::result::Result<T, FtpVaultError>;

impl FtpVaultError {
    pub fn message(msg: impl Into<String>) -> Self {
        FtpVaultError::Message(msg.into())
    }
}

impl From<ConfigError> for FtpVaultError {
    fn from(err: ConfigError) -> Self {
        FtpVaultError::Config(err)
    }
}
