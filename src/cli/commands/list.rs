use std::path::Path;

use crate::config::load::load_config;
use crate::config::model::{Job, RuntimeConfig};
use crate::error::Result;

pub fn job_line(job: &Job) -> String {
    let days: Vec<&str> = job.days.iter().map(|d| d.as_str()).collect();
    format!(
        "[{}] {} | {} | {} {:02}:{:02} | {}",
        if job.enabled { "ON" } else { "OFF" },
        job.name,
        job.mode.as_str(),
        days.join(","),
        job.hour,
        job.minute,
        job.profile
    )
}

pub fn render(cfg: &RuntimeConfig) -> Vec<String> {
    let mut lines = vec!["Profiles:".to_string()];
    for profile in &cfg.profiles {
        let active = cfg.active_profile.as_deref() == Some(profile.name.as_str());
        lines.push(format!(
            "  {} {}:{} TLS={} root={}{}",
            profile.name,
            profile.host,
            profile.port,
            profile.tls,
            profile.root,
            if active { " (active)" } else { "" }
        ));
    }
    lines.push("Jobs:".to_string());
    lines.extend(cfg.jobs.iter().map(|job| format!("  {}", job_line(job))));
    lines
}

pub fn run_list(config_path: &Path) -> Result<()> {
    let cfg = load_config(config_path)?;
    for line in render(&cfg) {
        println!("{}", line);
    }
    Ok(())
}
