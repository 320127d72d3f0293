use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fiscal::FiscalYear;
use crate::models::MemberId;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Name of the persisted fiscal-year preference (the cookie-equivalent).
pub const FISCAL_YEAR_PREFERENCE: &str = "current_fiscal_year";

/// Preferences expire after this many hours without use.
const SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPreferences {
    #[serde(default)]
    pub member_id: Option<MemberId>,
    #[serde(rename = "current_fiscal_year", default)]
    pub fiscal_year_override: Option<FiscalYear>,
    pub touched_at: DateTime<Utc>,
}

impl SessionPreferences {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            member_id: None,
            fiscal_year_override: None,
            touched_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.touched_at + Duration::hours(SESSION_TTL_HOURS)
    }
}

pub struct Session {
    dir: PathBuf,
    pub data: Option<SessionPreferences>,
}

impl Session {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, data: None }
    }

    /// Load preferences from disk and mark them used at `now`.
    ///
    /// Expired preferences are discarded. An unparseable session file is
    /// treated like a missing one: the override stays unset.
    pub fn load(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let mut data: SessionPreferences = match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                    return Ok(false);
                }
            };

            if !data.is_expired_at(now) {
                data.touched_at = now;
                self.data = Some(data);
                if let Err(e) = self.save() {
                    warn!(error = %e, "Failed to refresh session timestamp");
                }
                return Ok(true);
            }
            debug!("Session preferences expired");
        }
        Ok(false)
    }

    /// Save preferences to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear preferences, in memory and on disk
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Persist an explicit fiscal-year switch for the rest of the session.
    pub fn switch_fiscal_year(&mut self, year: FiscalYear, now: DateTime<Utc>) -> Result<()> {
        let data = self.data.get_or_insert_with(|| SessionPreferences::new(now));
        data.fiscal_year_override = Some(year);
        data.touched_at = now;
        debug!(fiscal_year = %year, "Switched fiscal year");
        self.save()
    }

    /// Drop the override so resolution falls back to the calendar default.
    pub fn clear_fiscal_year(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(data) = self.data.as_mut() {
            data.fiscal_year_override = None;
            data.touched_at = now;
        }
        self.save()
    }

    /// Remember the acting member for the rest of the session.
    pub fn set_member_id(&mut self, member: MemberId, now: DateTime<Utc>) -> Result<()> {
        let data = self.data.get_or_insert_with(|| SessionPreferences::new(now));
        data.member_id = Some(member);
        data.touched_at = now;
        self.save()
    }

    pub fn fiscal_year_override(&self) -> Option<FiscalYear> {
        self.data.as_ref().and_then(|d| d.fiscal_year_override)
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.data.as_ref().and_then(|d| d.member_id)
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

/// Decode a raw preference value (e.g. a cookie). Blank or non-numeric
/// values are treated as unset; out-of-range years are passed through.
pub fn parse_override(raw: Option<&str>) -> Option<FiscalYear> {
    let value = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(year) => Some(year),
        Err(e) => {
            debug!(value, error = %e, "Ignoring unparseable fiscal year preference");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();

        let mut session = Session::new(dir.path().to_path_buf());
        session.switch_fiscal_year(FiscalYear::new(2023), now).unwrap();

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(reloaded.load(now).unwrap());
        assert_eq!(reloaded.fiscal_year_override(), Some(FiscalYear::new(2023)));
    }

    #[test]
    fn test_clear_fiscal_year_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();

        let mut session = Session::new(dir.path().to_path_buf());
        session.switch_fiscal_year(FiscalYear::new(2023), now).unwrap();
        session.clear_fiscal_year(now).unwrap();

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(reloaded.load(now).unwrap());
        assert_eq!(reloaded.fiscal_year_override(), None);
    }

    #[test]
    fn test_expired_session_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let then = Utc::now() - Duration::hours(SESSION_TTL_HOURS + 1);

        let mut session = Session::new(dir.path().to_path_buf());
        session.switch_fiscal_year(FiscalYear::new(2023), then).unwrap();

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(!reloaded.load(Utc::now()).unwrap());
        assert_eq!(reloaded.fiscal_year_override(), None);
    }

    #[test]
    fn test_use_extends_session() {
        let dir = tempfile::tempdir().unwrap();
        let start = Utc::now() - Duration::hours(SESSION_TTL_HOURS + 6);

        let mut session = Session::new(dir.path().to_path_buf());
        session.switch_fiscal_year(FiscalYear::new(2023), start).unwrap();

        // used within the window, then again past the original expiry
        let mut midway = Session::new(dir.path().to_path_buf());
        assert!(midway.load(start + Duration::hours(SESSION_TTL_HOURS - 1)).unwrap());

        let mut later = Session::new(dir.path().to_path_buf());
        assert!(later.load(start + Duration::hours(SESSION_TTL_HOURS + 5)).unwrap());
        assert_eq!(later.fiscal_year_override(), Some(FiscalYear::new(2023)));
    }

    #[test]
    fn test_corrupt_session_file_is_unset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();

        let mut session = Session::new(dir.path().to_path_buf());
        assert!(!session.load(Utc::now()).unwrap());
        assert_eq!(session.fiscal_year_override(), None);
    }

    #[test]
    fn test_member_id_persists() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();

        let mut session = Session::new(dir.path().to_path_buf());
        session.set_member_id(MemberId(4), now).unwrap();

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(reloaded.load(now).unwrap());
        assert_eq!(reloaded.member_id(), Some(MemberId(4)));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.switch_fiscal_year(FiscalYear::new(2024), Utc::now()).unwrap();
        session.clear().unwrap();
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn test_preference_uses_named_field() {
        let prefs = SessionPreferences {
            member_id: None,
            fiscal_year_override: Some(FiscalYear::new(2025)),
            touched_at: Utc::now(),
        };
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json[FISCAL_YEAR_PREFERENCE], 2025);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override(Some("2024")), Some(FiscalYear::new(2024)));
        assert_eq!(parse_override(Some(" 2024 ")), Some(FiscalYear::new(2024)));
        assert_eq!(parse_override(Some("-3")), Some(FiscalYear::new(-3)));
        assert_eq!(parse_override(Some("")), None);
        assert_eq!(parse_override(Some("abc")), None);
        assert_eq!(parse_override(None), None);
    }
}
