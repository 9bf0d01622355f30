//! Flagged accounts and the live status of the streamers among them.

use crate::core::config::ServiceEndpoint;
use crate::core::globals::TOKIO_RUNTIME;
use anyhow::{anyhow, Context, Result};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub account_id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub is_streamer: bool,
    /// Channel handle queried for live status.
    #[serde(default)]
    pub handle: String,
}

impl WatchlistEntry {
    pub fn new(account_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            tag: tag.into(),
            is_streamer: false,
            handle: String::new(),
        }
    }

    pub fn streamer(account_id: impl Into<String>, tag: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            is_streamer: true,
            handle: handle.into(),
            ..Self::new(account_id, tag)
        }
    }
}

pub trait LiveStatusService: Send + Sync {
    fn is_live(&self, entry: &WatchlistEntry) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    live: bool,
}

/// `GET {base_url}/{handle}` returning `{ "live": bool }`.
pub struct HttpLiveStatusService {
    client: reqwest::blocking::Client,
    endpoint: ServiceEndpoint,
}

impl HttpLiveStatusService {
    /// Must not be called from inside the async runtime.
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(endpoint.timeout())
            .build()
            .context("failed to build live status http client")?;
        Ok(Self { client, endpoint })
    }
}

impl LiveStatusService for HttpLiveStatusService {
    fn is_live(&self, entry: &WatchlistEntry) -> Result<bool> {
        if entry.handle.is_empty() {
            return Ok(false);
        }
        let url = self.endpoint.url_for(&entry.handle);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("live status request to {} failed", url))?;
        if !response.status().is_success() {
            return Err(anyhow!("live status service returned {} for {}", response.status(), entry.handle));
        }
        Ok(response.json::<LiveResponse>().context("invalid live status response")?.live)
    }
}

/// Read-mostly store shared between the poller and whoever edits the list.
///
/// `is_live` only answers from the cache. The cache is written by
/// `refresh_live_status`, which the registry runs off the polling thread.
#[derive(Default)]
pub struct Watchlist {
    entries: DashMap<String, WatchlistEntry>,
    live: DashMap<String, bool>,
    service: Option<Arc<dyn LiveStatusService>>,
    refreshing: AtomicBool,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = WatchlistEntry>) -> Self {
        let watchlist = Self::new();
        for entry in entries {
            watchlist.insert(entry);
        }
        watchlist
    }

    /// Reads a JSON array of entries.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read watchlist {:?}", path))?;
        let entries: Vec<WatchlistEntry> =
            serde_json::from_str(&text).with_context(|| format!("invalid watchlist {:?}", path))?;
        info!("Loaded {} watchlist entries from {:?}", entries.len(), path);
        Ok(Self::from_entries(entries))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut entries: Vec<WatchlistEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        let text = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path.as_ref(), text).with_context(|| format!("failed to write watchlist {:?}", path.as_ref()))
    }

    pub fn with_live_service(mut self, service: Arc<dyn LiveStatusService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn is_listed(&self, account_id: &str) -> Option<WatchlistEntry> {
        if account_id.is_empty() {
            return None;
        }
        self.entries.get(account_id).map(|e| e.value().clone())
    }

    /// Cached live status; false for non-streamers and before the first refresh.
    pub fn is_live(&self, account_id: &str) -> bool {
        self.live.get(account_id).map(|v| *v).unwrap_or(false)
    }

    pub fn insert(&self, entry: WatchlistEntry) {
        if !entry.is_streamer {
            self.live.remove(&entry.account_id);
        }
        self.entries.insert(entry.account_id.clone(), entry);
    }

    pub fn remove(&self, account_id: &str) -> Option<WatchlistEntry> {
        self.live.remove(account_id);
        self.entries.remove(account_id).map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queries every streamer once and caches the answers. A failed query
    /// leaves the previous answer in place. Returns how many were queried.
    pub fn refresh_live_status(&self) -> usize {
        let Some(service) = &self.service else {
            return 0;
        };
        let streamers: Vec<WatchlistEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_streamer)
            .map(|e| e.value().clone())
            .collect();

        for entry in &streamers {
            match service.is_live(entry) {
                Ok(live) => {
                    debug!("{} ({}) live: {}", entry.account_id, entry.handle, live);
                    self.live.insert(entry.account_id.clone(), live);
                }
                Err(e) => warn!("Live status for {} failed: {:#}", entry.handle, e),
            }
        }
        streamers.len()
    }

    /// Runs `refresh_live_status` on the blocking pool. Returns false when a
    /// refresh is already in flight.
    pub fn spawn_refresh(self: &Arc<Self>) -> bool {
        if self.service.is_none() {
            return false;
        }
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return false;
        }
        let watchlist = Arc::clone(self);
        TOKIO_RUNTIME.spawn_blocking(move || {
            watchlist.refresh_live_status();
            watchlist.refreshing.store(false, Ordering::Release);
        });
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}
