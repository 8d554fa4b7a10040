use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::FtpVaultError;
use crate::types::RunMode;

pub const SNAPSHOT_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Default)]
pub struct PruneReport {
    pub kept: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub fn snapshot_name(at: NaiveDateTime) -> String {
    at.format(SNAPSHOT_FORMAT).to_string()
}

pub fn is_snapshot_name(name: &str) -> bool {
    name.len() == 15 && NaiveDateTime::parse_from_str(name, SNAPSHOT_FORMAT).is_ok()
}

/// Keeps the `keep_last` newest snapshot directories of `job_dir` and
/// removes the rest. A directory that cannot be removed is reported and
/// skipped.
pub fn prune(job_dir: &Path, keep_last: usize, run_mode: RunMode) -> io::Result<PruneReport> {
    prune_with(job_dir, keep_last, run_mode, |path| fs::remove_dir_all(path))
}

fn prune_with<F>(job_dir: &Path, keep_last: usize, run_mode: RunMode, remove: F) -> io::Result<PruneReport>
where
    F: Fn(&Path) -> io::Result<()>,
{
    let mut report = PruneReport::default();
    if keep_last == 0 || !job_dir.exists() {
        return Ok(report);
    }

    let mut snapshots = Vec::new();
    for entry in fs::read_dir(job_dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("cleanup: unreadable entry in {}: {}", job_dir.display(), err);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        // file_type does not follow symlinks
        let is_dir = match entry.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(err) => {
                warn!("cleanup: cannot stat {}: {}", entry.path().display(), err);
                continue;
            }
        };
        if !is_dir || !is_snapshot_name(&name) {
            debug!("retention ignores {}", entry.path().display());
            continue;
        }
        snapshots.push(name);
    }

    snapshots.sort_unstable_by(|a, b| b.cmp(a));
    for (index, name) in snapshots.iter().enumerate() {
        let target = job_dir.join(name);
        if index < keep_last {
            report.kept.push(target);
            continue;
        }
        if run_mode.dry_run {
            info!("dry-run: would remove old snapshot {}", target.display());
            report.removed.push(target);
            continue;
        }
        match remove(&target) {
            Ok(()) => {
                info!("cleanup: removed old snapshot {}", target.display());
                report.removed.push(target);
            }
            Err(err) => {
                let err = FtpVaultError::Cleanup {
                    path: target.clone(),
                    message: err.to_string(),
                };
                warn!("cleanup: {}", err);
                report.failed.push(target);
            }
        }
    }
    Ok(report)
}
