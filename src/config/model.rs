use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{BackupMode, Day, ItemErrorPolicy};

pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_KEEP_LAST: i64 = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_TICK_SECONDS: u64 = 20;
pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_LOCAL_TARGET: &str = "backups";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub notifications: NotifySettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SettingsConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_on_item_error")]
    pub on_item_error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            tick_seconds: DEFAULT_TICK_SECONDS,
            max_depth: DEFAULT_MAX_DEPTH,
            on_item_error: default_on_item_error(),
            lock_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_true")]
    pub notify_start: bool,
    #[serde(default = "default_true")]
    pub notify_success: bool,
    #[serde(default = "default_true")]
    pub notify_failure: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            notify_start: true,
            notify_success: true,
            notify_failure: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProfileConfig {
    #[serde(default = "default_profile_name")]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u32,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default = "default_root")]
    pub root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JobConfig {
    #[serde(default = "default_job_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub profile: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_root")]
    pub remote_source: String,
    #[serde(default = "default_local_target")]
    pub local_target: String,
    #[serde(default = "default_days")]
    pub days: Vec<String>,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default = "default_true")]
    pub include_subdirs: bool,
    #[serde(default = "default_keep_last")]
    pub keep_last: i64,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub tls: bool,
    pub root: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub enabled: bool,
    pub profile: String,
    pub mode: BackupMode,
    pub remote_source: String,
    pub local_target: String,
    pub days: Vec<Day>,
    pub hour: u32,
    pub minute: u32,
    pub include_subdirs: bool,
    pub keep_last: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub timeout: Duration,
    pub tick: Duration,
    pub max_depth: usize,
    pub on_item_error: ItemErrorPolicy,
    pub lock_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub settings: Settings,
    pub notifications: NotifySettings,
    pub active_profile: Option<String>,
    pub profiles: Vec<Profile>,
    pub jobs: Vec<Job>,
}

impl RuntimeConfig {
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }
}

impl Config {
    /// Starter file written by `ftpvault init`.
    pub fn starter() -> Self {
        Self {
            settings: SettingsConfig::default(),
            notifications: NotifySettings::default(),
            active_profile: Some("Profile_1".to_string()),
            profiles: vec![ProfileConfig {
                name: "Profile_1".to_string(),
                host: "ftp.example.com".to_string(),
                port: u32::from(DEFAULT_PORT),
                username: "backup".to_string(),
                password: String::new(),
                tls: false,
                root: default_root(),
            }],
            jobs: vec![JobConfig {
                name: "BackupJob_1".to_string(),
                enabled: true,
                profile: "Profile_1".to_string(),
                mode: default_mode(),
                remote_source: default_root(),
                local_target: default_local_target(),
                days: default_days(),
                hour: 0,
                minute: 0,
                include_subdirs: true,
                keep_last: DEFAULT_KEEP_LAST,
                dry_run: false,
            }],
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_profile_name() -> String {
    "Unnamed".to_string()
}

fn default_job_name() -> String {
    "Unnamed Job".to_string()
}

fn default_port() -> u32 {
    u32::from(DEFAULT_PORT)
}

fn default_root() -> String {
    "/".to_string()
}

fn default_mode() -> String {
    "snapshot".to_string()
}

fn default_local_target() -> String {
    DEFAULT_LOCAL_TARGET.to_string()
}

fn default_days() -> Vec<String> {
    vec!["Sat".to_string()]
}

fn default_keep_last() -> i64 {
    DEFAULT_KEEP_LAST
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_tick_seconds() -> u64 {
    DEFAULT_TICK_SECONDS
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_on_item_error() -> String {
    "abort".to_string()
}
