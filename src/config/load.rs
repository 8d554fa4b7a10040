use std::collections::HashSet;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::config::model::{Config, Job, JobConfig, Profile, ProfileConfig, RuntimeConfig, Settings};
use crate::error::{ConfigError, FtpVaultError, Result};
use crate::types::{BackupMode, Day, ItemErrorPolicy};
use crate::util::paths::{is_safe_segment, normalize_remote};

pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let mut contents = String::new();
    File::open(path)
        .map_err(|e| {
            FtpVaultError::message(format!(
                "open config {}: {} (run `ftpvault init` to create one)",
                path.display(),
                e
            ))
        })?
        .read_to_string(&mut contents)
        .map_err(FtpVaultError::Io)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<RuntimeConfig> {
    let cfg: Config =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg)
}

fn parse_runtime(cfg: Config) -> Result<RuntimeConfig> {
    let settings = &cfg.settings;
    if settings.timeout_seconds == 0 || settings.tick_seconds == 0 {
        return Err(ConfigError::Invalid(
            "timeout_seconds and tick_seconds must be positive".to_string(),
        )
        .into());
    }
    if settings.max_depth == 0 {
        return Err(ConfigError::Invalid("max_depth must be positive".to_string()).into());
    }
    let on_item_error = ItemErrorPolicy::parse(&settings.on_item_error).map_err(ConfigError::Invalid)?;

    let mut profiles = Vec::new();
    let mut names = HashSet::new();
    for profile in cfg.profiles {
        let profile = parse_profile(profile)?;
        if !names.insert(profile.name.clone()) {
            return Err(ConfigError::Invalid(format!("duplicate profile name {}", profile.name)).into());
        }
        profiles.push(profile);
    }

    let jobs = cfg
        .jobs
        .into_iter()
        .map(parse_job)
        .collect::<Result<Vec<_>>>()?;

    Ok(RuntimeConfig {
        settings: Settings {
            timeout: Duration::from_secs(settings.timeout_seconds),
            tick: Duration::from_secs(settings.tick_seconds),
            max_depth: settings.max_depth,
            on_item_error,
            lock_dir: settings.lock_dir.clone().unwrap_or_else(env::temp_dir),
        },
        notifications: cfg.notifications,
        active_profile: cfg.active_profile,
        profiles,
        jobs,
    })
}

fn parse_profile(profile: ProfileConfig) -> Result<Profile> {
    if !is_safe_segment(&profile.name) {
        return Err(ConfigError::Invalid(format!(
            "profile {:?}: name must be non-empty and must not contain path separators",
            profile.name
        ))
        .into());
    }
    let port = u16::try_from(profile.port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "profile {}: port {} is outside 1-65535",
                profile.name, profile.port
            ))
        })?;
    Ok(Profile {
        host: profile.host.trim().to_string(),
        port,
        username: profile.username.trim().to_string(),
        password: profile.password,
        tls: profile.tls,
        root: normalize_remote(profile.root.trim()),
        name: profile.name,
    })
}

fn parse_job(job: JobConfig) -> Result<Job> {
    let invalid = |msg: String| -> FtpVaultError {
        ConfigError::Invalid(format!("job {}: {}", job.name, msg)).into()
    };
    if !is_safe_segment(&job.name) {
        return Err(invalid(
            "name must be non-empty and must not contain path separators".to_string(),
        ));
    }
    let mode = BackupMode::parse(&job.mode).map_err(invalid)?;
    if job.hour > 23 || job.minute > 59 {
        return Err(invalid("hour must be 0-23 and minute must be 0-59".to_string()));
    }
    if job.keep_last < 0 {
        return Err(invalid("keep_last must be 0 or a positive number".to_string()));
    }
    let mut days = Vec::new();
    for day in &job.days {
        let day = day.parse::<Day>().map_err(invalid)?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        return Err(invalid("select at least one day".to_string()));
    }
    let keep_last = usize::try_from(job.keep_last).map_err(|e| invalid(e.to_string()))?;
    let local_target = if job.local_target.trim().is_empty() {
        crate::config::model::DEFAULT_LOCAL_TARGET.to_string()
    } else {
        job.local_target.trim().to_string()
    };
    let remote_source = match job.remote_source.trim() {
        "" => "/".to_string(),
        other => other.to_string(),
    };

    Ok(Job {
        enabled: job.enabled,
        profile: job.profile.trim().to_string(),
        mode,
        remote_source,
        local_target,
        days,
        hour: job.hour,
        minute: job.minute,
        include_subdirs: job.include_subdirs,
        keep_last,
        dry_run: job.dry_run,
        name: job.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
settings:
  timeout_seconds: 15
  tick_seconds: 5
active_profile: game
profiles:
  - name: game
    host: " ftp.example.net "
    port: 2121
    username: admin
    password: secret
    tls: true
    root: "\\srv\\dayz\\"
  - name: minimal
jobs:
  - name: nightly
    profile: game
    mode: Mirror
    remote_source: mpmissions
    local_target: /var/backups
    days: [Mon, sat]
    hour: 3
    minute: 30
    include_subdirs: false
    keep_last: 0
  - name: defaults
"#;

    #[test]
    fn load_config_from_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let cfg = load_config(file.path()).expect("load");

        assert_eq!(cfg.settings.timeout, Duration::from_secs(15));
        assert_eq!(cfg.settings.tick, Duration::from_secs(5));
        assert_eq!(cfg.settings.on_item_error, ItemErrorPolicy::Abort);
        assert_eq!(cfg.active_profile.as_deref(), Some("game"));

        let game = cfg.profile("game").expect("game profile");
        assert_eq!(game.host, "ftp.example.net");
        assert_eq!(game.port, 2121);
        assert!(game.tls);
        assert_eq!(game.root, "/srv/dayz");

        let nightly = cfg.job("nightly").expect("nightly job");
        assert_eq!(nightly.mode, BackupMode::Mirror);
        assert_eq!(nightly.days, vec![Day::Mon, Day::Sat]);
        assert_eq!((nightly.hour, nightly.minute), (3, 30));
        assert!(!nightly.include_subdirs);
        assert_eq!(nightly.keep_last, 0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = parse_config(SAMPLE).expect("parse");
        let minimal = cfg.profile("minimal").expect("minimal");
        assert_eq!(minimal.port, 21);
        assert!(!minimal.tls);
        assert_eq!(minimal.root, "/");

        let job = cfg.job("defaults").expect("defaults");
        assert!(job.enabled);
        assert_eq!(job.mode, BackupMode::Snapshot);
        assert_eq!(job.remote_source, "/");
        assert_eq!(job.days, vec![Day::Sat]);
        assert_eq!(job.keep_last, 10);
        assert!(job.include_subdirs);
        assert!(!job.dry_run);
        assert!(cfg.notifications.notify_start);
        assert!(cfg.notifications.webhook_url.is_empty());
    }

    #[test]
    fn rejects_invalid_jobs() {
        let cases = [
            "jobs:\n  - name: a\n    days: []\n",
            "jobs:\n  - name: a\n    hour: 24\n",
            "jobs:\n  - name: a\n    minute: 60\n",
            "jobs:\n  - name: a\n    keep_last: -1\n",
            "jobs:\n  - name: a\n    mode: sync\n",
            "jobs:\n  - name: \"../up\"\n",
            "profiles:\n  - name: p\n    port: 0\n",
            "profiles:\n  - name: p\n    port: 70000\n",
            "profiles:\n  - name: p\n  - name: p\n",
            "settings:\n  tick_seconds: 0\n",
        ];
        for case in cases {
            let err = parse_config(case).expect_err(case);
            assert!(matches!(err, FtpVaultError::Config(ConfigError::Invalid(_))), "{case}: {err}");
        }
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = parse_config("jobs: [").expect_err("parse error");
        assert!(matches!(err, FtpVaultError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn example_config_is_valid() {
        let cfg = parse_config(include_str!("../../ftpvault.example.yaml")).expect("example");
        assert_eq!(cfg.profiles.len(), 2);
        assert_eq!(cfg.profile("gameserver").expect("profile").root, "/home/container");
        let mirror = cfg.job("config_mirror").expect("job");
        assert_eq!(mirror.mode, BackupMode::Mirror);
        assert_eq!(mirror.days.len(), 5);
        assert!(!cfg.job("nas_photos").expect("job").enabled);
    }

    #[test]
    fn unnamed_entries_get_placeholder_names() {
        let cfg = parse_config("profiles:\n  - host: ftp.invalid\njobs:\n  - profile: Unnamed\n")
            .expect("parse");
        assert_eq!(cfg.profiles[0].name, "Unnamed");
        assert_eq!(cfg.jobs[0].name, "Unnamed Job");
        assert!(cfg.profile(&cfg.jobs[0].profile).is_some());
    }
}
