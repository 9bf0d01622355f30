//! Rate-limited polling loop driving a `PlayerRegistry`.

use crate::entity::registry::{PlayerRegistry, PlayerSource};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Longest single sleep, so a stop request is seen promptly at low rates.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(50);

pub struct Poller {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Starts the loop: enumerate, sync, tick, then sleep out the rest of the
    /// tick interval.
    pub fn spawn(registry: Arc<PlayerRegistry>, source: Arc<dyn PlayerSource>, tick_rate_hz: u32) -> Result<Self> {
        let interval = Duration::from_nanos(1_000_000_000 / tick_rate_hz.max(1) as u64);
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let handle = std::thread::Builder::new()
            .name("player-poller".to_string())
            .spawn(move || Self::run(registry, source, interval, token))
            .context("failed to spawn poller thread")?;

        info!("Poller started at {} Hz", tick_rate_hz.max(1));
        Ok(Self {
            cancel_token,
            handle: Some(handle),
        })
    }

    fn run(registry: Arc<PlayerRegistry>, source: Arc<dyn PlayerSource>, interval: Duration, token: CancellationToken) {
        while !token.is_cancelled() {
            let started = Instant::now();

            match source.enumerate() {
                Ok(observed) => {
                    registry.sync(&observed);
                }
                Err(e) => warn!("Player enumeration failed: {:#}", e),
            }
            registry.tick();

            let deadline = started + interval;
            loop {
                let now = Instant::now();
                if now >= deadline || token.is_cancelled() {
                    break;
                }
                std::thread::sleep((deadline - now).min(MAX_SLEEP_SLICE));
            }
        }
        debug!("Poller stopped after {} ticks", registry.tick_count());
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels the loop and waits for the current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Poller thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
