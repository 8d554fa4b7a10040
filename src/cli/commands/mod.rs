pub mod init;
pub mod list;
pub mod run;
pub mod schedule;
pub mod test;

use crate::backup::{BackupExecutor, RunFailure};
use crate::config::model::RuntimeConfig;
use crate::error::FtpVaultError;
use crate::notify;
use crate::remote::FtpConnector;
use crate::types::RunMode;

pub const EXIT_JOB_FAILED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_ALREADY_RUNNING: i32 = 3;

/// Executor wired to real FTP sessions and the configured webhook.
pub fn build_executor(cfg: &RuntimeConfig, run_mode: RunMode) -> BackupExecutor<FtpConnector> {
    BackupExecutor::new(
        FtpConnector::new(cfg.settings.timeout),
        cfg.settings.clone(),
        cfg.notifications.clone(),
        notify::from_settings(&cfg.notifications),
        cfg.profiles.clone(),
    )
    .force_dry_run(run_mode.dry_run)
}

pub fn exit_code(err: &FtpVaultError) -> i32 {
    match err {
        FtpVaultError::Config(_) | FtpVaultError::Message(_) => EXIT_CONFIG,
        FtpVaultError::AlreadyRunning(_) => EXIT_ALREADY_RUNNING,
        _ => EXIT_JOB_FAILED,
    }
}

pub fn exit_for_error(err: &FtpVaultError) -> ! {
    println!("{}", err);
    std::process::exit(exit_code(err));
}

/// Exit code for a run that stopped early; plain messages count as job failures here.
pub fn failure_exit_code(failure: &RunFailure) -> i32 {
    match &failure.error {
        FtpVaultError::Config(_) => EXIT_CONFIG,
        FtpVaultError::AlreadyRunning(_) => EXIT_ALREADY_RUNNING,
        _ => EXIT_JOB_FAILED,
    }
}
