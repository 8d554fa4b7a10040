//! Scheduled FTP/FTPS backups into timestamped snapshots or a mirrored copy.

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod remote;
pub mod scheduler;
pub mod signal;
pub mod types;
pub mod util;

pub use backup::{BackupExecutor, RunFailure, RunReport};
pub use error::{FtpVaultError, Result};
pub use scheduler::{JobRunner, Scheduler};
pub use types::RunMode;
