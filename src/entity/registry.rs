//! The set of tracked players and the per-tick refresh.

use crate::core::channel::MemoryChannel;
use crate::core::config::RadarConfig;
use crate::core::interner::{GroupInterner, GROUP_INTERNER, NO_GROUP};
use crate::entity::player::{AssemblyContext, ObservedPlayer, Player, PlayerKind};
use crate::entity::stats::{HttpStatsService, StatsDispatcher};
use crate::entity::watchlist::{HttpLiveStatusService, Watchlist};
use crate::scatter::ScatterPlan;
use anyhow::Result;
use dashmap::DashMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// External enumeration of the player objects currently in the world.
pub trait PlayerSource: Send + Sync {
    fn enumerate(&self) -> Result<Vec<ObservedPlayer>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub failed: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub stats_applied: usize,
    pub refreshed: usize,
    pub refresh_failed: usize,
    pub batched_calls: usize,
}

pub struct PlayerRegistry {
    channel: Arc<dyn MemoryChannel>,
    config: RadarConfig,
    interner: Arc<GroupInterner>,
    stats: StatsDispatcher,
    watchlist: Arc<Watchlist>,
    players: DashMap<String, Arc<Player>>,
    ticks: AtomicU64,
}

impl PlayerRegistry {
    /// Registry without external services. Groups go into the process-wide
    /// interner.
    pub fn new(channel: Arc<dyn MemoryChannel>, config: RadarConfig) -> Self {
        Self {
            channel,
            config,
            interner: Arc::clone(&GROUP_INTERNER),
            stats: StatsDispatcher::disabled(),
            watchlist: Arc::new(Watchlist::new()),
            players: DashMap::new(),
            ticks: AtomicU64::new(0),
        }
    }

    /// Registry with the HTTP services and watch-list file named in `config`.
    pub fn from_config(channel: Arc<dyn MemoryChannel>, config: RadarConfig) -> Result<Self> {
        let stats = match &config.stats {
            Some(endpoint) => StatsDispatcher::new(Arc::new(HttpStatsService::new(endpoint.clone())?)),
            None => StatsDispatcher::disabled(),
        };

        let mut watchlist = match &config.watchlist_path {
            Some(path) if path.exists() => Watchlist::load(path)?,
            Some(path) => {
                warn!("Watchlist {:?} not found, starting empty", path);
                Watchlist::new()
            }
            None => Watchlist::new(),
        };
        if let Some(endpoint) = &config.live {
            watchlist = watchlist.with_live_service(Arc::new(HttpLiveStatusService::new(endpoint.clone())?));
        }

        Ok(Self::new(channel, config)
            .with_stats(stats)
            .with_watchlist(Arc::new(watchlist)))
    }

    pub fn with_stats(mut self, stats: StatsDispatcher) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_watchlist(mut self, watchlist: Arc<Watchlist>) -> Self {
        self.watchlist = watchlist;
        self
    }

    pub fn with_interner(mut self, interner: Arc<GroupInterner>) -> Self {
        self.interner = interner;
        self
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn watchlist(&self) -> &Arc<Watchlist> {
        &self.watchlist
    }

    pub fn get(&self, profile_id: &str) -> Option<Arc<Player>> {
        self.players.get(profile_id).map(|p| Arc::clone(p.value()))
    }

    pub fn players(&self) -> Vec<Arc<Player>> {
        self.players.iter().map(|p| Arc::clone(p.value())).collect()
    }

    pub fn local_player(&self) -> Option<Arc<Player>> {
        self.players.iter().find(|p| p.is_local()).map(|p| Arc::clone(p.value()))
    }

    pub fn local_group(&self) -> i32 {
        self.local_player().map(|p| p.group_id()).unwrap_or(NO_GROUP)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Matches the registry to one enumeration: assembles players not seen
    /// before and drops those no longer present. Failed assemblies are
    /// retried on the next call.
    pub fn sync(&self, observed: &[ObservedPlayer]) -> SyncReport {
        let mut report = SyncReport::default();

        let present: HashSet<&str> = observed.iter().map(|p| p.profile_id.as_str()).collect();
        self.players.retain(|profile_id, player| {
            if present.contains(profile_id.as_str()) {
                return true;
            }
            player.mark_departed();
            debug!("Player {} left", profile_id);
            report.removed += 1;
            false
        });

        // Client players first so the local group is known for everyone else.
        let (client, others): (Vec<&ObservedPlayer>, Vec<&ObservedPlayer>) = observed
            .iter()
            .filter(|p| !self.players.contains_key(&p.profile_id))
            .partition(|p| PlayerKind::from_class(&p.class_name) == Some(PlayerKind::Client));

        for batch in [client, others] {
            let ctx = AssemblyContext {
                channel: &*self.channel,
                config: &self.config,
                interner: &self.interner,
                stats: &self.stats,
                watchlist: &self.watchlist,
                local_group: self.local_group(),
            };
            for entry in batch {
                match Player::new(&ctx, entry) {
                    Ok(player) => {
                        self.players.insert(entry.profile_id.clone(), Arc::new(player));
                        report.added += 1;
                    }
                    Err(e) => {
                        debug!("Player {} not ready: {:#}", entry.profile_id, e);
                        report.failed += 1;
                    }
                }
            }
        }

        if report.added > 0 || report.removed > 0 {
            info!(
                "Players: {} tracked (+{} -{}, {} pending)",
                self.players.len(),
                report.added,
                report.removed,
                report.failed
            );
        }
        report
    }

    /// One refresh of every tracked player.
    ///
    /// Completed stats lookups are applied first. All per-player reads then
    /// go into one plan, so the whole tick costs one batched read. Base
    /// classification and the watch-list overlay run afterwards, in that
    /// order for each player.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let tables = &self.config.factions;

        for event in self.stats.drain() {
            let Some(player) = self.get(&event.profile_id) else {
                continue;
            };
            player.apply_stats(event.stats.as_ref());
            player.finalize(&self.watchlist, tables);
            report.stats_applied += 1;
        }

        let players: Vec<Arc<Player>> = self.players().into_iter().filter(|p| p.is_active()).collect();

        let mut plan = ScatterPlan::new(1);
        for (index, player) in players.iter().enumerate() {
            player.queue_refresh(&mut plan, index);
        }
        let stats = plan.execute(&*self.channel);
        report.batched_calls = stats.rounds_issued;

        for (index, player) in players.iter().enumerate() {
            let success = player.apply_refresh(plan.results(), index);
            player.record_refresh(success, self.config.max_refresh_errors);
            if success {
                report.refreshed += 1;
            } else {
                report.refresh_failed += 1;
            }
        }

        let local_group = self.local_group();
        let pve_mode = self.config.pve_mode;
        players
            .par_iter()
            .for_each(|player| player.reclassify(tables, &self.watchlist, local_group, pve_mode));

        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let every = self.config.watchlist_refresh_ticks;
        if every > 0 && tick % every == 0 && self.watchlist.spawn_refresh() {
            debug!("Live status refresh started at tick {}", tick);
        }

        report
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}
