//! Runtime configuration, loaded from JSON.

use crate::entity::classifier::FactionTables;
use crate::entity::offsets::LayoutOffsets;
use crate::entity::PlayerBone;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote HTTP service location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoint {
    /// Base URL; the lookup key is appended as the last path segment.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 5_000,
        }
    }
}

impl ServiceEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Upper bound on registry ticks per second.
    pub tick_rate_hz: u32,
    /// Consecutive failed refreshes before a player is marked inactive.
    pub max_refresh_errors: u32,
    /// Ticks between out-of-line live status refreshes.
    pub watchlist_refresh_ticks: u64,
    /// PvE raids carry PMC bots that are only recognisable by their dogtag.
    pub pve_mode: bool,
    /// Remote layout; version specific.
    pub offsets: LayoutOffsets,
    pub factions: FactionTables,
    /// Joints tracked per player.
    pub bones: Vec<PlayerBone>,
    pub stats: Option<ServiceEndpoint>,
    pub live: Option<ServiceEndpoint>,
    pub watchlist_path: Option<PathBuf>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_refresh_errors: 30,
            watchlist_refresh_ticks: 600,
            pve_mode: false,
            offsets: LayoutOffsets::default(),
            factions: FactionTables::default(),
            bones: PlayerBone::REQUIRED.to_vec(),
            stats: None,
            live: None,
            watchlist_path: None,
        }
    }
}

impl RadarConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("invalid config {:?}", path))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: RadarConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_hz == 0 {
            return Err(anyhow!("tick_rate_hz must be positive"));
        }
        if self.offsets.skeleton.entry_stride == 0 {
            return Err(anyhow!("skeleton entry_stride must be positive"));
        }
        if self.offsets.string.max_chars == 0 {
            return Err(anyhow!("string max_chars must be positive"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.tick_rate_hz.max(1) as u64)
    }
}
