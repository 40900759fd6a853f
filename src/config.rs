use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::clock::SystemClock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub log_level: String,
    /// Fixed UTC offset for active-hours checks; the host's local offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8081".into(),
            database_path: PathBuf::from("data/worksync.sqlite3"),
            log_level: "info".into(),
            utc_offset_minutes: None,
        }
    }
}

impl AppConfig {
    /// Reads `WORKSYNC_CONFIG` (when set and present), then applies env overrides.
    pub fn load() -> Result<Self> {
        let config = match std::env::var_os("WORKSYNC_CONFIG") {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Applies environment overrides through `lookup`, which maps a variable
    /// name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("WORKSYNC_BIND") {
            self.bind_address = bind;
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?;
            let host = self
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| self.bind_address.clone());
            self.bind_address = format!("{host}:{port}");
        }
        if let Some(path) = lookup("WORKSYNC_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(level) = lookup("WORKSYNC_LOG") {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            bail!("bindAddress must not be empty");
        }
        if self.database_path.as_os_str().is_empty() {
            bail!("databasePath must not be empty");
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<Option<FixedOffset>> {
        match self.utc_offset_minutes {
            None => Ok(None),
            Some(minutes) => match FixedOffset::east_opt(minutes.saturating_mul(60)) {
                Some(offset) => Ok(Some(offset)),
                None => bail!("utcOffsetMinutes {minutes} is outside +/-24h"),
            },
        }
    }

    pub fn clock(&self) -> Result<SystemClock> {
        Ok(match self.utc_offset()? {
            Some(offset) => SystemClock::with_offset(offset),
            None => SystemClock::local(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn file_values_are_merged_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worksync.json");
        fs::write(&path, r#"{"logLevel":"debug","utcOffsetMinutes":120}"#).unwrap();

        let config = AppConfig::from_file(path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bind_address, "127.0.0.1:8081");
        assert_eq!(
            config.utc_offset().unwrap(),
            Some(FixedOffset::east_opt(7200).unwrap())
        );
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worksync.json");
        fs::write(&path, r#"{"bindAdress":"typo"}"#).unwrap();
        assert!(AppConfig::from_file(path).is_err());
    }

    #[test]
    fn env_overrides_win() {
        let config = AppConfig::default()
            .with_overrides(env(&[
                ("PORT", "9000"),
                ("WORKSYNC_DB_PATH", "/tmp/ws.sqlite3"),
                ("WORKSYNC_LOG", "warn"),
            ]))
            .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.database_path, PathBuf::from("/tmp/ws.sqlite3"));
        assert_eq!(config.log_level, "warn");

        let config = AppConfig::default()
            .with_overrides(env(&[("WORKSYNC_BIND", "0.0.0.0:80")]))
            .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:80");
    }

    #[test]
    fn bad_overrides_are_rejected() {
        assert!(AppConfig::default()
            .with_overrides(env(&[("PORT", "eighty")]))
            .is_err());
        let config = AppConfig {
            utc_offset_minutes: Some(24 * 60 + 1),
            ..AppConfig::default()
        };
        assert!(config.with_overrides(env(&[])).is_err());
    }
}
