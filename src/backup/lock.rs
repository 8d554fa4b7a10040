use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, warn};

use crate::error::{FtpVaultError, Result};
use crate::types::RunMode;

/// Removes the pid file when the run ends.
#[derive(Debug)]
pub struct JobLock {
    path: PathBuf,
}

impl JobLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        // only remove a lock that still carries our pid
        let ours = fs::read_to_string(&self.path)
            .map(|text| text.trim() == process::id().to_string())
            .unwrap_or(false);
        if ours {
            let _ = fs::remove_file(&self.path);
        }
    }
}

pub fn job_lock_path(lock_dir: &Path, job_name: &str) -> PathBuf {
    let safe: String = job_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    lock_dir.join(format!("ftpvault.{}.pid", safe))
}

/// Dry runs write nothing, so they take no lock either. A lock file left
/// by a process that no longer exists is taken over.
pub fn acquire_job_lock(lock_dir: &Path, job_name: &str, run_mode: RunMode) -> Result<Option<JobLock>> {
    if run_mode.dry_run {
        return Ok(None);
    }
    let path = job_lock_path(lock_dir, job_name);
    let failed = |err: io::Error| {
        FtpVaultError::message(format!("failed to lock {}: {}", path.display(), err))
    };
    fs::create_dir_all(lock_dir).map_err(failed)?;

    const ATTEMPTS: usize = 3;
    for _ in 0..ATTEMPTS {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", process::id()).map_err(failed)?;
                debug!("locked {}", path.display());
                return Ok(Some(JobLock { path }));
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                if let Some(pid) = live_holder(&path).map_err(failed)? {
                    debug!("{} held by pid {}", path.display(), pid);
                    return Err(FtpVaultError::AlreadyRunning(job_name.to_string()));
                }
                warn!("removing stale lock {}", path.display());
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(failed(err)),
                }
            }
            Err(err) => return Err(failed(err)),
        }
    }
    Err(FtpVaultError::AlreadyRunning(job_name.to_string()))
}

/// Pid recorded in `path` when that process is still alive.
fn live_holder(path: &Path) -> io::Result<Option<u32>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    Ok(text
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|pid| Path::new("/proc").join(pid.to_string()).exists()))
}
