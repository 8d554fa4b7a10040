use std::path::Path;

use tracing::warn;

use crate::backup::RunReport;
use crate::cli::commands::{build_executor, failure_exit_code};
use crate::config::load::load_config;
use crate::error::{ConfigError, Result};
use crate::types::RunMode;

pub fn summary(report: &RunReport) -> Vec<String> {
    let (copy, prune) = if report.dry_run {
        ("would copy", "would prune")
    } else {
        ("copied", "pruned")
    };
    let mut lines = vec![format!(
        "{}: {} {} file(s) from {} folder(s) to {}",
        report.job,
        copy,
        report.transfers.len(),
        report.directories.len(),
        report.dest_root.display()
    )];
    lines.extend(
        report
            .pruned
            .iter()
            .map(|path| format!("  {} {}", prune, path.display())),
    );
    lines
}

/// Runs one job now, on this thread, whatever its schedule says.
pub fn run_job_command(config_path: &Path, job_name: &str, run_mode: RunMode) -> Result<()> {
    let cfg = load_config(config_path)?;
    let job = cfg
        .job(job_name)
        .cloned()
        .ok_or_else(|| ConfigError::JobNotFound(job_name.to_string()))?;
    if !job.enabled {
        warn!("job {} is disabled; running it anyway", job.name);
    }

    let mut executor = build_executor(&cfg, run_mode);
    match executor.execute(&job) {
        Ok(report) => {
            for line in summary(&report) {
                println!("{}", line);
            }
            Ok(())
        }
        Err(failure) => {
            println!("{}: failed during {}: {}", job.name, failure.stage, failure);
            std::process::exit(failure_exit_code(&failure));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn report(dry_run: bool) -> RunReport {
        RunReport {
            job: "nightly".to_string(),
            profile: "game".to_string(),
            remote: "/srv".to_string(),
            dest_root: PathBuf::from("/backups/game/nightly/20240504_030000"),
            dry_run,
            transfers: Vec::new(),
            directories: vec!["/srv".to_string()],
            skipped: Vec::new(),
            pruned: vec![PathBuf::from("/backups/game/nightly/20240101_000000")],
        }
    }

    #[test]
    fn dry_run_summary_says_would() {
        let lines = summary(&report(true));
        assert_eq!(
            lines[0],
            "nightly: would copy 0 file(s) from 1 folder(s) to /backups/game/nightly/20240504_030000"
        );
        assert_eq!(lines[1], "  would prune /backups/game/nightly/20240101_000000");
    }

    #[test]
    fn real_run_summary_reports_pruned() {
        let lines = summary(&report(false));
        assert!(lines[0].starts_with("nightly: copied 0 file(s)"));
        assert_eq!(lines[1], "  pruned /backups/game/nightly/20240101_000000");
    }
}
