//! Account statistics lookups for human players.
//!
//! Lookups run on the shared runtime's blocking pool and post a `StatsEvent`
//! when done. The registry drains events on its next tick, so player fields
//! are only ever written from the polling thread.

use crate::core::config::ServiceEndpoint;
use crate::core::globals::TOKIO_RUNTIME;
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub nickname: String,
    pub level: i32,
    #[serde(alias = "kd_ratio")]
    pub kd: f32,
    #[serde(alias = "hours_played")]
    pub hours: i32,
}

pub trait StatsService: Send + Sync {
    fn fetch(&self, account_id: &str) -> Result<PlayerStats>;
}

/// `GET {base_url}/{account_id}` returning a `PlayerStats` JSON object.
pub struct HttpStatsService {
    client: reqwest::blocking::Client,
    endpoint: ServiceEndpoint,
}

impl HttpStatsService {
    /// Must not be called from inside the async runtime.
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(endpoint.timeout())
            .gzip(true)
            .build()
            .context("failed to build stats http client")?;
        Ok(Self { client, endpoint })
    }
}

impl StatsService for HttpStatsService {
    fn fetch(&self, account_id: &str) -> Result<PlayerStats> {
        let url = self.endpoint.url_for(account_id);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("stats request to {} failed", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("stats service returned {} for {}", response.status(), account_id));
        }

        response.json::<PlayerStats>().context("invalid stats response")
    }
}

/// Completion of one lookup. `stats` is `None` when the lookup failed.
#[derive(Debug, Clone)]
pub struct StatsEvent {
    pub profile_id: String,
    pub stats: Option<PlayerStats>,
}

pub struct StatsDispatcher {
    service: Option<Arc<dyn StatsService>>,
    sender: Sender<StatsEvent>,
    receiver: Receiver<StatsEvent>,
}

impl StatsDispatcher {
    pub fn new(service: Arc<dyn StatsService>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            service: Some(service),
            sender,
            receiver,
        }
    }

    /// Every request completes immediately as failed.
    pub fn disabled() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            service: None,
            sender,
            receiver,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    /// Starts a lookup. The event always arrives, failed or not.
    pub fn request(&self, profile_id: &str, account_id: &str) {
        let profile_id = profile_id.to_string();
        let Some(service) = self.service.clone() else {
            let _ = self.sender.send(StatsEvent { profile_id, stats: None });
            return;
        };

        let account_id = account_id.to_string();
        let sender = self.sender.clone();
        TOKIO_RUNTIME.spawn_blocking(move || {
            let stats = match service.fetch(&account_id) {
                Ok(stats) => {
                    debug!("Stats for {}: {} lvl {}", account_id, stats.nickname, stats.level);
                    Some(stats)
                }
                Err(e) => {
                    warn!("Stats lookup for {} failed: {:#}", account_id, e);
                    None
                }
            };
            let _ = sender.send(StatsEvent { profile_id, stats });
        });
    }

    /// Completed lookups, without blocking.
    pub fn drain(&self) -> Vec<StatsEvent> {
        self.receiver.try_iter().collect()
    }

    /// Blocks until one lookup completes or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StatsEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Default for StatsDispatcher {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStats;

    impl StatsService for FixedStats {
        fn fetch(&self, account_id: &str) -> Result<PlayerStats> {
            if account_id == "missing" {
                return Err(anyhow!("not found"));
            }
            Ok(PlayerStats {
                nickname: format!("player{}", account_id),
                level: 42,
                kd: 3.5,
                hours: 900,
            })
        }
    }

    #[test]
    fn test_request_posts_event() {
        let dispatcher = StatsDispatcher::new(Arc::new(FixedStats));
        dispatcher.request("profile-1", "7");
        let event = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.profile_id, "profile-1");
        assert_eq!(event.stats.unwrap().nickname, "player7");
    }

    #[test]
    fn test_failed_lookup_still_completes() {
        let dispatcher = StatsDispatcher::new(Arc::new(FixedStats));
        dispatcher.request("profile-2", "missing");
        let event = dispatcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.profile_id, "profile-2");
        assert!(event.stats.is_none());
    }

    #[test]
    fn test_disabled_completes_synchronously() {
        let dispatcher = StatsDispatcher::disabled();
        dispatcher.request("profile-3", "1");
        let events = dispatcher.drain();
        assert_eq!(events.len(), 1);
        assert!(events[0].stats.is_none());
        assert!(dispatcher.drain().is_empty());
    }

    #[test]
    fn test_stats_json_aliases() {
        let stats: PlayerStats =
            serde_json::from_str(r#"{ "nickname": "a", "level": 3, "kd_ratio": 1.5, "hours_played": 10 }"#).unwrap();
        assert_eq!(stats.kd, 1.5);
        assert_eq!(stats.hours, 10);
    }
}
