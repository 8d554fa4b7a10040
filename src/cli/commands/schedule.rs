use std::path::Path;

use tracing::{info, warn};

use crate::cli::commands::build_executor;
use crate::cli::commands::list::job_line;
use crate::config::load::load_config;
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::signal::stop_flag;
use crate::types::RunMode;

/// Runs the scheduler in the foreground until SIGINT/SIGTERM.
pub fn run_schedule(config_path: &Path, run_mode: RunMode) -> Result<()> {
    let cfg = load_config(config_path)?;
    if !cfg.jobs.iter().any(|job| job.enabled) {
        warn!("no enabled jobs in {}; nothing will fire", config_path.display());
    }
    for job in &cfg.jobs {
        info!("{}", job_line(job));
    }
    if run_mode.dry_run {
        warn!("dry run enabled for every job");
    }

    let stop = stop_flag()?;
    let mut executor = build_executor(&cfg, run_mode);
    let mut scheduler = Scheduler::new(cfg.jobs.clone(), cfg.settings.tick);
    scheduler.run_until(&mut executor, &stop);
    Ok(())
}
