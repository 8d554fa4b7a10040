use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        }
    }
}

impl From<Weekday> for Day {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Day::Mon,
            Weekday::Tue => Day::Tue,
            Weekday::Wed => Day::Wed,
            Weekday::Thu => Day::Thu,
            Weekday::Fri => Day::Fri,
            Weekday::Sat => Day::Sat,
            Weekday::Sun => Day::Sun,
        }
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .iter()
            .copied()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid day {}; expected one of Mon..Sun", s))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    Snapshot,
    Mirror,
}

impl BackupMode {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(BackupMode::Snapshot),
            "mirror" => Ok(BackupMode::Mirror),
            _ => Err(format!(
                "invalid mode {}; expected snapshot or mirror",
                value
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMode::Snapshot => "snapshot",
            BackupMode::Mirror => "mirror",
        }
    }
}

/// What to do when a single file in a tree walk cannot be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemErrorPolicy {
    #[default]
    Abort,
    Continue,
}

impl ItemErrorPolicy {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ItemErrorPolicy::Abort),
            "continue" => Ok(ItemErrorPolicy::Continue),
            _ => Err(format!(
                "invalid on_item_error {}; expected abort or continue",
                value
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
}
