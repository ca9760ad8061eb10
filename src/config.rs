use crate::age::STALE_AFTER_HOURS;
use crate::storage::BoardLocation;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::time::Duration;

pub const SWEEP_INTERVAL_SECS: u64 = 60;
/// Roughly a century; keeps the threshold inside chrono's range.
pub const MAX_STALE_AFTER_HOURS: i64 = 24 * 365 * 100;

/// Per-board settings read from `config.yml` beside the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sweep_interval_secs: u64,
    pub stale_after_hours: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            name: None,
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            stale_after_hours: STALE_AFTER_HOURS,
        }
    }
}

impl Settings {
    pub fn load(location: &BoardLocation) -> Result<Settings> {
        let path = location.config_path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(err) => return Err(err).with_context(|| format!("reading {:?}", path)),
        };
        let settings = Settings::parse(&data).with_context(|| format!("parsing {:?}", path))?;
        Ok(settings)
    }

    pub fn parse(data: &str) -> Result<Settings> {
        if data.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings: Settings = serde_yaml::from_str(data)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes `config.yml`, keeping any existing values and replacing the
    /// board name when one is given.
    pub fn init(location: &BoardLocation, name: Option<String>) -> Result<Settings> {
        let mut settings = Settings::load(location)?;
        if let Some(name) = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            settings.name = Some(name);
        }
        settings.save(location)?;
        Ok(settings)
    }

    pub fn save(&self, location: &BoardLocation) -> Result<()> {
        let path = location.config_path();
        let serialized = serde_yaml::to_string(self).context("serializing settings")?;
        fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))
    }

    /// Configured name, or one derived from where the board lives.
    pub fn board_name(&self, location: &BoardLocation) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => location.name(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs == 0 {
            bail!("sweep_interval_secs must be greater than zero");
        }
        if self.stale_after_hours <= 0 {
            bail!("stale_after_hours must be greater than zero");
        }
        if self.stale_after_hours > MAX_STALE_AFTER_HOURS {
            bail!(
                "stale_after_hours must be at most {} (got {})",
                MAX_STALE_AFTER_HOURS,
                self.stale_after_hours
            );
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stale_after_hours)
    }
}
