//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the organization calendar (fiscal-year start month and
//! era), the data directory and the last acting member.
//!
//! Configuration is stored at `~/.config/chokai/config.json`. Environment
//! variables override the calendar settings from the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fiscal::{
    fiscal_year_of, EraCalendar, FiscalYear, DEFAULT_ERA_NAME, DEFAULT_ERA_START_YEAR,
    DEFAULT_FISCAL_YEAR_START_MONTH,
};
use crate::models::MemberId;

/// Application name used for config/data directory paths
const APP_NAME: &str = "chokai";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_FISCAL_YEAR_START_MONTH: &str = "CHOKAI_FISCAL_YEAR_START_MONTH";
pub const ENV_ERA_NAME: &str = "CHOKAI_ERA_NAME";
pub const ENV_ERA_START_YEAR: &str = "CHOKAI_ERA_START_YEAR";

fn default_start_month() -> u32 {
    DEFAULT_FISCAL_YEAR_START_MONTH
}

/// Organization calendar settings, owned by organization settings and
/// read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationCalendarConfig {
    #[serde(rename = "fiscalYearStartMonth", default = "default_start_month")]
    pub fiscal_year_start_month: u32,
    #[serde(rename = "eraName")]
    pub era_name: String,
    #[serde(rename = "eraStartYear")]
    pub era_start_year: i32,
}

impl Default for OrganizationCalendarConfig {
    fn default() -> Self {
        Self {
            fiscal_year_start_month: DEFAULT_FISCAL_YEAR_START_MONTH,
            era_name: DEFAULT_ERA_NAME.to_string(),
            era_start_year: DEFAULT_ERA_START_YEAR,
        }
    }
}

impl OrganizationCalendarConfig {
    /// Replace unusable values with defaults.
    pub fn normalized(mut self) -> Self {
        if !(1..=12).contains(&self.fiscal_year_start_month) {
            warn!(
                start_month = self.fiscal_year_start_month,
                "Configured fiscal year start month out of range, using April"
            );
            self.fiscal_year_start_month = DEFAULT_FISCAL_YEAR_START_MONTH;
        }
        if self.era_name.trim().is_empty() {
            warn!("Configured era name is blank, using default era");
            self.era_name = DEFAULT_ERA_NAME.to_string();
            self.era_start_year = DEFAULT_ERA_START_YEAR;
        }
        self
    }

    pub fn era(&self) -> EraCalendar {
        EraCalendar::new(&self.era_name, self.era_start_year)
    }

    pub fn fiscal_year_of(&self, date: chrono::NaiveDate) -> FiscalYear {
        fiscal_year_of(date, self.fiscal_year_start_month)
    }
}

/// Source of organization calendar settings.
pub trait CalendarSettings {
    fn calendar_config(&self) -> Option<OrganizationCalendarConfig>;
}

impl CalendarSettings for OrganizationCalendarConfig {
    fn calendar_config(&self) -> Option<OrganizationCalendarConfig> {
        Some(self.clone())
    }
}

impl CalendarSettings for Option<OrganizationCalendarConfig> {
    fn calendar_config(&self) -> Option<OrganizationCalendarConfig> {
        self.clone()
    }
}

/// Calendar settings with defaults applied. Missing configuration is
/// recovered here and never reported to the caller.
pub fn resolve_calendar<S: CalendarSettings + ?Sized>(source: &S) -> OrganizationCalendarConfig {
    match source.calendar_config() {
        Some(config) => config.normalized(),
        None => {
            debug!("Organization calendar config missing, using defaults");
            OrganizationCalendarConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub calendar: Option<OrganizationCalendarConfig>,
    pub data_dir: Option<PathBuf>,
    pub last_member_id: Option<MemberId>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Like [`Config::load`], but an unreadable or unparseable file yields
    /// the defaults with a warning. Resolution must keep working when the
    /// calendar config is unavailable.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                warn!(error = %e, "No config directory, using default config");
                Self::default()
            }
        }
    }

    pub fn load_or_default_from(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unusable config file, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Record store directory: the configured override, else the platform
    /// data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply `CHOKAI_*` environment overrides to the calendar settings.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let start_month = env_value::<u32>(ENV_FISCAL_YEAR_START_MONTH, &lookup);
        let era_name = lookup(ENV_ERA_NAME).filter(|v| !v.trim().is_empty());
        let era_start_year = env_value::<i32>(ENV_ERA_START_YEAR, &lookup);

        if start_month.is_none() && era_name.is_none() && era_start_year.is_none() {
            return;
        }

        let calendar = self.calendar.get_or_insert_with(OrganizationCalendarConfig::default);
        if let Some(month) = start_month {
            calendar.fiscal_year_start_month = month;
        }
        if let Some(name) = era_name {
            calendar.era_name = name;
        }
        if let Some(year) = era_start_year {
            calendar.era_start_year = year;
        }
    }
}

impl CalendarSettings for Config {
    fn calendar_config(&self) -> Option<OrganizationCalendarConfig> {
        self.calendar.clone()
    }
}

fn env_value<T: FromStr>(name: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_calendar_uses_defaults() {
        let config = Config::default();
        let calendar = resolve_calendar(&config);
        assert_eq!(calendar.fiscal_year_start_month, 4);
        assert_eq!(calendar.era_name, "令和");
        assert_eq!(calendar.era_start_year, 2019);
    }

    #[test]
    fn test_out_of_range_start_month_is_normalized() {
        let calendar = resolve_calendar(&OrganizationCalendarConfig {
            fiscal_year_start_month: 0,
            era_name: "令和".to_string(),
            era_start_year: 2019,
        });
        assert_eq!(calendar.fiscal_year_start_month, 4);
    }

    #[test]
    fn test_blank_era_name_falls_back() {
        let calendar = resolve_calendar(&OrganizationCalendarConfig {
            fiscal_year_start_month: 1,
            era_name: " ".to_string(),
            era_start_year: 1989,
        });
        assert_eq!(calendar.fiscal_year_start_month, 1);
        assert_eq!(calendar.era(), EraCalendar::default());
    }

    #[test]
    fn test_calendar_json_defaults_start_month() {
        let json = r#"{"eraName": "令和", "eraStartYear": 2019}"#;
        let calendar: OrganizationCalendarConfig = serde_json::from_str(json).unwrap();
        assert_eq!(calendar.fiscal_year_start_month, 4);
    }

    #[test]
    fn test_config_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            calendar: Some(OrganizationCalendarConfig {
                fiscal_year_start_month: 1,
                era_name: "令和".to_string(),
                era_start_year: 2019,
            }),
            data_dir: Some(dir.path().join("data")),
            last_member_id: Some(MemberId(3)),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.calendar, config.calendar);
        assert_eq!(loaded.data_dir().unwrap(), dir.path().join("data"));
        assert_eq!(loaded.last_member_id, Some(MemberId(3)));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{\"calendar\": ").unwrap();

        assert!(Config::load_from(&path).is_err());
        let config = Config::load_or_default_from(&path);
        assert_eq!(resolve_calendar(&config).fiscal_year_start_month, 4);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert!(loaded.calendar.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            (ENV_FISCAL_YEAR_START_MONTH, "1"),
            (ENV_ERA_START_YEAR, "not a year"),
        ]));
        let calendar = config.calendar.unwrap();
        assert_eq!(calendar.fiscal_year_start_month, 1);
        assert_eq!(calendar.era_start_year, 2019);
    }

    #[test]
    fn test_no_env_overrides_leave_calendar_unset() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[]));
        assert!(config.calendar.is_none());
    }
}
