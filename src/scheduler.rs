use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use tracing::{debug, info};

use crate::backup::{BackupExecutor, RunFailure, RunReport};
use crate::config::model::Job;
use crate::remote::Connector;
use crate::types::Day;

const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// Something that can run a job to completion on the calling thread.
pub trait JobRunner {
    fn run(&mut self, job: &Job) -> Result<RunReport, RunFailure>;
}

impl<C: Connector> JobRunner for BackupExecutor<C> {
    fn run(&mut self, job: &Job) -> Result<RunReport, RunFailure> {
        self.execute(job)
    }
}

/// A job plus the minute it last fired in, so one matching minute fires once.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub job: Job,
    pub last_fired_key: Option<String>,
}

pub fn fire_key(day: Day, hour: u32, minute: u32) -> String {
    format!("{}-{:02}:{:02}", day, hour, minute)
}

pub struct Scheduler {
    entries: Vec<ScheduledJob>,
    tick: Duration,
}

impl Scheduler {
    pub fn new(jobs: Vec<Job>, tick: Duration) -> Self {
        let entries = jobs
            .into_iter()
            .map(|job| ScheduledJob {
                job,
                last_fired_key: None,
            })
            .collect();
        Self { entries, tick }
    }

    pub fn entries(&self) -> &[ScheduledJob] {
        &self.entries
    }

    pub fn tick<R: JobRunner>(&mut self, runner: &mut R) -> Vec<String> {
        self.tick_at(Local::now().naive_local(), runner)
    }

    /// Runs every enabled job due at `now`; returns the names fired.
    pub fn tick_at<R: JobRunner>(&mut self, now: NaiveDateTime, runner: &mut R) -> Vec<String> {
        let day = Day::from(now.weekday());
        let (hour, minute) = (now.hour(), now.minute());
        let key = fire_key(day, hour, minute);

        let mut fired = Vec::new();
        for entry in &mut self.entries {
            let job = &entry.job;
            if !job.enabled || !job.days.contains(&day) || job.hour != hour || job.minute != minute {
                // trigger minute is over; next week's match fires again
                entry.last_fired_key = None;
                continue;
            }
            if entry.last_fired_key.as_deref() == Some(key.as_str()) {
                debug!("job {} already fired at {}", job.name, key);
                continue;
            }
            entry.last_fired_key = Some(key.clone());
            info!("job {} is due ({})", job.name, key);
            match runner.run(job) {
                Ok(report) => debug!(
                    "job {} finished: {} file(s)",
                    job.name,
                    report.transfers.len()
                ),
                Err(failure) => debug!("job {} ended during {}", job.name, failure.stage),
            }
            fired.push(job.name.clone());
        }
        fired
    }

    /// Ticks until `stop` is raised. A raised flag never interrupts a run
    /// that is already in progress.
    pub fn run_until<R: JobRunner>(&mut self, runner: &mut R, stop: &AtomicBool) {
        info!(
            "scheduler started: {} job(s), tick {}s",
            self.entries.len(),
            self.tick.as_secs()
        );
        while !stop.load(Ordering::Relaxed) {
            self.tick(runner);
            let deadline = Instant::now() + self.tick;
            while !stop.load(Ordering::Relaxed) && Instant::now() < deadline {
                thread::sleep(SLEEP_SLICE.min(deadline.saturating_duration_since(Instant::now())));
            }
        }
        info!("scheduler stopped");
    }
}
