use figment::{
    providers::{Env, Format, Toml},
    value::{Uncased, UncasedStr},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Day, TimeSlot};

pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Persistence key the routine entries are stored under.
pub const DEFAULT_CATEGORY: &str = "routineEntries";

/// Top-level config (timetable.toml + TIMETABLE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub routine: RoutineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// The slot calendar and storage key for the class routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineConfig {
    #[serde(default = "default_category")]
    pub category: String,
    /// Teaching days, in display order.
    #[serde(default = "default_days")]
    pub days: Vec<Day>,
    /// Ascending, non-overlapping time slots shared by every teaching day.
    #[serde(default = "default_time_slots")]
    pub time_slots: Vec<TimeSlot>,
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            days: default_days(),
            time_slots: default_time_slots(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}
fn default_days() -> Vec<Day> {
    vec![
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ]
}

/// Nine one-hour slots, 08:00 to 17:00.
fn default_time_slots() -> Vec<TimeSlot> {
    (8..17)
        .filter_map(|h| {
            let start = chrono::NaiveTime::from_hms_opt(h, 0, 0)?;
            let end = chrono::NaiveTime::from_hms_opt(h + 1, 0, 0)?;
            TimeSlot::new(start, end).ok()
        })
        .collect()
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.timetable/timetable.db", home)
}

impl TimetableConfig {
    /// Load config from a TOML file with TIMETABLE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.timetable/timetable.toml
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(%path, "loading timetable config");

        let config: TimetableConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TIMETABLE_").map(section_key))
            .extract()
            .map_err(|e| crate::error::TimetableError::Config(e.to_string()))?;

        Ok(config)
    }
}

/// `ROUTINE_TIME_SLOTS` -> `routine.time_slots`: only the first `_` separates
/// the section, so multi-word keys stay reachable from the environment.
fn section_key(key: &UncasedStr) -> Uncased<'_> {
    key.as_str().replacen('_', ".", 1).into()
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.timetable/timetable.toml", home)
}
