use std::fmt;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::backup::lock::acquire_job_lock;
use crate::backup::retention::{prune, snapshot_name};
use crate::backup::walk::{Transfer, TreeWalk};
use crate::config::model::{Job, NotifySettings, Profile, Settings};
use crate::error::{ConfigError, FtpVaultError, Result};
use crate::notify::{EventKind, Notifier};
use crate::remote::Connector;
use crate::types::{BackupMode, RunMode};
use crate::util::paths::{expand_home, normalize_remote, remote_basename, resolve_local};

pub mod lock;
pub mod retention;
pub mod walk;

pub const MIRROR_DIR: &str = "MIRROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Resolving,
    Connecting,
    SingleFile,
    TreeWalk,
    Cleanup,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStage::Resolving => "resolving",
            RunStage::Connecting => "connecting",
            RunStage::SingleFile => "single file",
            RunStage::TreeWalk => "tree walk",
            RunStage::Cleanup => "cleanup",
            RunStage::Done => "done",
        };
        f.write_str(label)
    }
}

/// A run that ended early; `error` keeps the original message.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    pub stage: RunStage,
    pub error: FtpVaultError,
}

impl RunFailure {
    fn at(stage: RunStage) -> impl FnOnce(FtpVaultError) -> RunFailure {
        move |error| RunFailure { stage, error }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub job: String,
    pub profile: String,
    pub remote: String,
    pub dest_root: PathBuf,
    pub dry_run: bool,
    pub transfers: Vec<Transfer>,
    pub directories: Vec<String>,
    pub skipped: Vec<String>,
    pub pruned: Vec<PathBuf>,
}

/// Where a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub remote: String,
    pub job_dir: PathBuf,
    pub dest_root: PathBuf,
}

pub fn resolve_remote_source(profile_root: &str, source: &str) -> String {
    let source: String = source
        .trim()
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    if source.starts_with('/') || source.starts_with('\\') {
        return normalize_remote(&source);
    }
    let root = normalize_remote(profile_root);
    normalize_remote(&format!("{}/{}", root.trim_end_matches('/'), source))
}

pub fn plan_run(job: &Job, profile: &Profile, started: NaiveDateTime) -> Result<RunPlan> {
    let remote = resolve_remote_source(&profile.root, &job.remote_source);
    let local_base = expand_home(&job.local_target);
    let job_dir = resolve_local(&local_base, &format!("{}/{}", profile.name, job.name))?;
    let leaf = match job.mode {
        BackupMode::Snapshot => snapshot_name(started),
        BackupMode::Mirror => MIRROR_DIR.to_string(),
    };
    let dest_root = job_dir.join(leaf);
    Ok(RunPlan {
        remote,
        job_dir,
        dest_root,
    })
}

/// Runs jobs one at a time against the remote side produced by `C`.
pub struct BackupExecutor<C: Connector> {
    connector: C,
    settings: Settings,
    notifications: NotifySettings,
    notifier: Box<dyn Notifier>,
    profiles: Vec<Profile>,
    force_dry_run: bool,
}

impl<C: Connector> BackupExecutor<C> {
    pub fn new(
        connector: C,
        settings: Settings,
        notifications: NotifySettings,
        notifier: Box<dyn Notifier>,
        profiles: Vec<Profile>,
    ) -> Self {
        Self {
            connector,
            settings,
            notifications,
            notifier,
            profiles,
            force_dry_run: false,
        }
    }

    /// Treat every job as a dry run regardless of its own flag.
    pub fn force_dry_run(mut self, dry_run: bool) -> Self {
        self.force_dry_run = dry_run;
        self
    }

    fn notify(&self, kind: EventKind, message: String) {
        if self.notifications.allows(kind) {
            self.notifier.notify(kind, &message);
        }
    }

    /// Looks up the job's profile by name, then runs it.
    pub fn execute(&mut self, job: &Job) -> std::result::Result<RunReport, RunFailure> {
        let Some(profile) = self.profiles.iter().find(|p| p.name == job.profile).cloned() else {
            let failure = RunFailure {
                stage: RunStage::Resolving,
                error: ConfigError::ProfileNotFound(job.profile.clone()).into(),
            };
            error!("job {}: {}", job.name, failure);
            self.notify(
                EventKind::Failure,
                format!("Backup failed: {} ({}) - {}", job.name, job.profile, failure),
            );
            return Err(failure);
        };
        self.run_job(job, &profile)
    }

    pub fn run_job(&mut self, job: &Job, profile: &Profile) -> std::result::Result<RunReport, RunFailure> {
        self.run_job_at(job, profile, Local::now().naive_local())
    }

    pub fn run_job_at(
        &mut self,
        job: &Job,
        profile: &Profile,
        started: NaiveDateTime,
    ) -> std::result::Result<RunReport, RunFailure> {
        let run_mode = RunMode {
            dry_run: job.dry_run || self.force_dry_run,
        };
        info!("JOB: {} | mode={} | profile={}", job.name, job.mode.as_str(), profile.name);
        self.notify(
            EventKind::Start,
            format!("Backup started: {} ({})", job.name, profile.name),
        );

        match self.perform(job, profile, started, run_mode) {
            Ok(report) => {
                info!(
                    "JOB DONE: {} ({} file(s), {} folder(s))",
                    job.name,
                    report.transfers.len(),
                    report.directories.len()
                );
                self.notify(
                    EventKind::Success,
                    format!("Backup done: {} ({})", job.name, profile.name),
                );
                Ok(report)
            }
            Err(failure) => {
                error!("JOB FAILED: {} during {} -> {}", job.name, failure.stage, failure);
                self.notify(
                    EventKind::Failure,
                    format!("Backup failed: {} ({}) - {}", job.name, profile.name, failure),
                );
                Err(failure)
            }
        }
    }

    fn perform(
        &mut self,
        job: &Job,
        profile: &Profile,
        started: NaiveDateTime,
        run_mode: RunMode,
    ) -> std::result::Result<RunReport, RunFailure> {
        let plan = plan_run(job, profile, started).map_err(RunFailure::at(RunStage::Resolving))?;
        info!("remote: {}", plan.remote);
        info!("local : {}", plan.dest_root.display());
        if run_mode.dry_run {
            warn!("dry run enabled: no files will be downloaded");
        }
        let _lock = acquire_job_lock(&self.settings.lock_dir, &job.name, run_mode)
            .map_err(RunFailure::at(RunStage::Resolving))?;

        let mut client = self
            .connector
            .connect(profile)
            .map_err(RunFailure::at(RunStage::Connecting))?;

        let mut walk = TreeWalk::new(
            &mut client,
            &plan.dest_root,
            job.include_subdirs,
            run_mode,
            self.settings.max_depth,
            self.settings.on_item_error,
        );
        let (stage, walked) = if walk.is_directory(&plan.remote) {
            (RunStage::TreeWalk, walk.walk_dir(&plan.remote, "", 0))
        } else {
            let name = remote_basename(&plan.remote).to_string();
            if name.is_empty() {
                return Err(RunFailure {
                    stage: RunStage::SingleFile,
                    error: FtpVaultError::message(format!("nothing to download at {}", plan.remote)),
                });
            }
            (RunStage::SingleFile, walk.copy_file(&plan.remote, &name))
        };
        let outcome = walked
            .and_then(|()| walk.finish())
            .map_err(RunFailure::at(stage))?;
        client.close();

        let mut pruned = Vec::new();
        if job.mode == BackupMode::Snapshot && job.keep_last > 0 {
            match prune(&plan.job_dir, job.keep_last, run_mode) {
                Ok(report) => pruned = report.removed,
                Err(err) => warn!(
                    "cleanup of {} skipped ({}): {}",
                    plan.job_dir.display(),
                    RunStage::Cleanup,
                    err
                ),
            }
        }

        Ok(RunReport {
            job: job.name.clone(),
            profile: profile.name.clone(),
            remote: plan.remote,
            dest_root: plan.dest_root,
            dry_run: run_mode.dry_run,
            transfers: outcome.transfers,
            directories: outcome.directories,
            skipped: outcome.skipped,
            pruned,
        })
    }

    /// Connects, reports the remote working directory and disconnects.
    pub fn test_connection(&self, profile: &Profile) -> Result<String> {
        info!(
            "testing connection to {}:{} TLS={}",
            profile.host, profile.port, profile.tls
        );
        let mut client = self.connector.connect(profile)?;
        let pwd = client.pwd();
        client.close();
        let pwd = pwd?;
        info!("connected. PWD: {}", pwd);
        Ok(pwd)
    }
}
