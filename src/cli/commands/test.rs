use std::path::Path;

use crate::cli::commands::build_executor;
use crate::config::load::load_config;
use crate::config::model::{Profile, RuntimeConfig};
use crate::error::{ConfigError, Result};
use crate::types::RunMode;

/// Named profile, else the active one, else the first configured.
pub fn select_profile<'a>(cfg: &'a RuntimeConfig, name: Option<&str>) -> Result<&'a Profile> {
    let wanted = name.or(cfg.active_profile.as_deref());
    match wanted {
        Some(name) => cfg
            .profile(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()).into()),
        None => cfg
            .profiles
            .first()
            .ok_or_else(|| ConfigError::Invalid("no profiles configured".to_string()).into()),
    }
}

pub fn run_test(config_path: &Path, profile_name: Option<&str>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let profile = select_profile(&cfg, profile_name)?;
    let executor = build_executor(&cfg, RunMode::default());
    let pwd = executor.test_connection(profile)?;
    println!("Connected to {} ({}:{}). PWD: {}", profile.name, profile.host, profile.port, pwd);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load::parse_config;
    use crate::error::FtpVaultError;

    const TWO_PROFILES: &str = r#"
active_profile: backup
profiles:
  - name: game
    host: ftp.game.invalid
  - name: backup
    host: ftp.backup.invalid
"#;

    #[test]
    fn picks_named_then_active_then_first() {
        let cfg = parse_config(TWO_PROFILES).expect("config");
        assert_eq!(select_profile(&cfg, Some("game")).expect("named").name, "game");
        assert_eq!(select_profile(&cfg, None).expect("active").name, "backup");

        let mut cfg = cfg;
        cfg.active_profile = None;
        assert_eq!(select_profile(&cfg, None).expect("first").name, "game");
    }

    #[test]
    fn unknown_profile_is_a_config_error() {
        let cfg = parse_config(TWO_PROFILES).expect("config");
        let err = select_profile(&cfg, Some("nope")).expect_err("missing");
        assert!(matches!(err, FtpVaultError::Config(ConfigError::ProfileNotFound(_))));
    }
}
