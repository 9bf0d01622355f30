use crate::core::config::RadarConfig;
use crate::core::interner::{GroupInterner, NO_GROUP};
use crate::core::logging::init_test_logger;
use crate::entity::bones::PlayerBone;
use crate::entity::category::PlayerCategory;
use crate::entity::player::{AssemblyContext, ObservedPlayer, Player, PlayerKind, HUMAN_PLACEHOLDER};
use crate::entity::stats::{PlayerStats, StatsDispatcher};
use crate::entity::watchlist::{LiveStatusService, Watchlist, WatchlistEntry};
use crate::tests::fixtures::{joint_position, ClientSpec, ObservedSpec, WorldBuilder};
use crate::tests::mock_channel::MockChannel;
use glam::{Vec2, Vec3};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Harness {
    mock: MockChannel,
    config: RadarConfig,
    interner: GroupInterner,
    stats: StatsDispatcher,
    watchlist: Watchlist,
}

impl Harness {
    fn new() -> Self {
        init_test_logger();
        Self {
            mock: MockChannel::new(),
            config: RadarConfig::default(),
            interner: GroupInterner::new(),
            stats: StatsDispatcher::disabled(),
            watchlist: Watchlist::new(),
        }
    }

    fn world(&self) -> WorldBuilder<'_> {
        WorldBuilder::new(&self.mock, &self.config)
    }

    fn assemble(&self, class_name: &str, base: u64) -> anyhow::Result<Player> {
        let ctx = AssemblyContext {
            channel: &self.mock,
            config: &self.config,
            interner: &self.interner,
            stats: &self.stats,
            watchlist: &self.watchlist,
            local_group: NO_GROUP,
        };
        Player::new(&ctx, &ObservedPlayer::new(format!("profile-{:X}", base), class_name, base))
    }
}

#[test]
fn test_client_player_assembly() {
    let h = Harness::new();
    let spec = ClientSpec::default();
    let ptrs = h.world().client(&spec);

    let player = h.assemble("ClientPlayer", ptrs.base).unwrap();

    assert_eq!(player.kind(), PlayerKind::Client);
    assert!(player.is_human());
    assert!(player.is_local());
    assert_eq!(player.category(), PlayerCategory::LocalPlayer);
    assert_eq!(player.name(), "Local");
    assert_eq!(player.role(), 1);
    assert_eq!(player.group_id(), h.interner.get("squad-a").unwrap());
    assert_eq!(player.health(), 75);
    assert_eq!(player.health_status(), "Moderate");
    assert_eq!(player.velocity(), Vec3::new(1.0, 0.0, 0.5));
    assert_eq!(player.rotation(), Vec2::new(90.0, 10.0));
    assert_ne!(player.fireport(), 0);
    assert_eq!(player.bones().len(), h.config.bones.len());
    assert_eq!(player.head_position(), joint_position(PlayerBone::HumanHead, spec.origin));
    assert!(player.is_finalized());
}

#[test]
fn test_client_assembly_fits_one_plan() {
    let h = Harness::new();
    let ptrs = h.world().client(&ClientSpec::default());
    h.mock.clear_calls();

    h.assemble("LocalPlayer", ptrs.base).unwrap();

    // field plan (seven rounds with the skeleton) plus the slot array read;
    // the empty slot array needs no second gear plan
    assert_eq!(h.mock.batch_calls(), 8);
}

#[test]
fn test_client_missing_health_controller_aborts() {
    let h = Harness::new();
    let ptrs = h.world().client(&ClientSpec {
        with_health_controller: false,
        ..Default::default()
    });

    let err = h.assemble("ClientPlayer", ptrs.base).unwrap_err();
    assert!(err.to_string().contains("health controller"), "{}", err);
}

#[test]
fn test_unknown_class_is_rejected() {
    let h = Harness::new();
    let ptrs = h.world().client(&ClientSpec::default());
    assert!(h.assemble("Corpse", ptrs.base).is_err());
}

#[test]
fn test_client_bot_is_classified_from_name() {
    let h = Harness::new();
    let ptrs = h.world().client(&ClientSpec {
        nickname: "Решала".to_string(),
        registration_date: 0,
        role: 0,
        ..Default::default()
    });

    let player = h.assemble("ClientPlayer", ptrs.base).unwrap();
    assert!(!player.is_human());
    assert_eq!(player.name(), "Reshala");
    assert_eq!(player.category(), PlayerCategory::Boss);
}

#[test]
fn test_client_bot_reserved_role() {
    let h = Harness::new();
    let ptrs = h.world().client(&ClientSpec {
        nickname: "Vasya".to_string(),
        registration_date: 0,
        role: 51,
        ..Default::default()
    });
    let player = h.assemble("ClientPlayer", ptrs.base).unwrap();
    assert_eq!(player.category(), PlayerCategory::Bear);
}

#[test]
fn test_observed_ai_uses_cleaned_voice_name() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "0".to_string(),
        voice: "SectantWarrior_2".to_string(),
        ..Default::default()
    });

    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();
    assert!(!player.is_human());
    assert_eq!(player.name(), "Cultist");
    assert_eq!(player.category(), PlayerCategory::Cultist);
    assert_eq!(player.health(), 100);
    assert_eq!(player.rotation(), Vec2::new(0.0, 0.0));
    assert!(player.is_finalized());
}

#[test]
fn test_observed_btr_gunner_from_gear() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "0".to_string(),
        voice: "Scav".to_string(),
        gear: vec![("FirstPrimaryWeapon".to_string(), "AVS".to_string())],
        ..Default::default()
    });

    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();
    assert_eq!(player.gear().len(), 1);
    assert_eq!(player.name(), "BTR");
    assert_eq!(player.category(), PlayerCategory::Boss);
}

#[test]
fn test_observed_zombie_name_is_forced() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "0".to_string(),
        voice: "???".to_string(),
        ..Default::default()
    });

    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();
    assert_eq!(player.category(), PlayerCategory::Zombie);
    assert_eq!(player.name(), "Zombie");
}

#[test]
fn test_observed_human_waits_for_stats() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "777".to_string(),
        side: 2,
        voice: "SectantWarrior".to_string(),
        ..Default::default()
    });

    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();
    assert!(player.is_human());
    assert_eq!(player.account_id(), "777");
    assert_eq!(player.name(), HUMAN_PLACEHOLDER);
    assert_eq!(player.category(), PlayerCategory::Bear);
    assert!(!player.is_finalized());

    // the disabled dispatcher completes the request right away
    let events = h.stats.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].profile_id, player.profile_id());

    player.apply_stats(Some(&PlayerStats {
        nickname: "Sniper".to_string(),
        level: 55,
        kd: 4.2,
        hours: 1200,
    }));
    player.finalize(&h.watchlist, &h.config.factions);
    assert_eq!(player.name(), "Sniper");
    assert_eq!(player.level(), 55);
    assert_eq!(player.hours(), 1200);
    assert!(player.is_finalized());
}

#[test]
fn test_failed_stats_keep_placeholder() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec::default());
    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();

    player.apply_stats(None);
    player.finalize(&h.watchlist, &h.config.factions);
    assert_eq!(player.name(), HUMAN_PLACEHOLDER);
    assert_eq!(player.level(), 0);
}

#[test]
fn test_unresolved_head_reads_as_origin() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "0".to_string(),
        voice: "Assault".to_string(),
        missing_joints: vec![PlayerBone::HumanHead],
        ..Default::default()
    });

    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();
    assert!(player.bones().get(PlayerBone::HumanHead).is_none());
    assert_eq!(player.head_position(), Vec3::ZERO);
    assert_ne!(player.neck_position(), Vec3::ZERO);

    let lines = player.skeleton_lines();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0].0, Vec3::ZERO);
}

#[test]
fn test_watchlist_overlay_is_idempotent() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "4242".to_string(),
        side: 1,
        ..Default::default()
    });
    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();
    assert_eq!(player.category(), PlayerCategory::Usec);

    let watchlist = Watchlist::from_entries([WatchlistEntry::new("4242", "cheater")]);
    player.refresh_watchlist_status(&watchlist);
    let first = (player.classification(), player.tag());
    player.refresh_watchlist_status(&watchlist);
    let second = (player.classification(), player.tag());

    assert_eq!(first, second);
    assert_eq!(player.category(), PlayerCategory::Special);
    assert_eq!(player.base_category(), PlayerCategory::Usec);
    assert_eq!(player.tag(), "cheater");
    assert!(!player.is_live());

    watchlist.remove("4242");
    player.refresh_watchlist_status(&watchlist);
    assert_eq!(player.category(), PlayerCategory::Usec);
    assert_eq!(player.tag(), "");
    player.refresh_watchlist_status(&watchlist);
    assert_eq!(player.category(), PlayerCategory::Usec);
}

#[test]
fn test_untagged_entry_only_sets_live_flag() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "99".to_string(),
        side: 2,
        ..Default::default()
    });
    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();

    let watchlist = Watchlist::from_entries([WatchlistEntry::streamer("99", "", "somebody")]);
    player.refresh_watchlist_status(&watchlist);
    assert_eq!(player.category(), PlayerCategory::Bear);
    assert!(!player.is_live());
    assert_eq!(player.display_name(), HUMAN_PLACEHOLDER);
}

struct SwitchableLive {
    on_air: AtomicBool,
}

impl LiveStatusService for SwitchableLive {
    fn is_live(&self, _entry: &WatchlistEntry) -> anyhow::Result<bool> {
        Ok(self.on_air.load(Ordering::SeqCst))
    }
}

#[test]
fn test_live_streamer_overlay() {
    let h = Harness::new();
    let ptrs = h.world().observed(&ObservedSpec {
        account_id: "5150".to_string(),
        side: 1,
        ..Default::default()
    });
    let player = h.assemble("ObservedPlayerView", ptrs.base).unwrap();

    let live = Arc::new(SwitchableLive {
        on_air: AtomicBool::new(true),
    });
    let watchlist = Watchlist::from_entries([WatchlistEntry::streamer("5150", "ttv", "channel")])
        .with_live_service(live.clone());
    assert_eq!(watchlist.refresh_live_status(), 1);

    player.refresh_watchlist_status(&watchlist);
    let first = player.classification();
    assert!(player.is_live());
    assert_eq!(first.category, PlayerCategory::Special);
    assert_eq!(first.base, PlayerCategory::Usec);
    assert_eq!(player.display_name(), format!("{} (LIVE)", HUMAN_PLACEHOLDER));

    player.refresh_watchlist_status(&watchlist);
    assert_eq!(player.classification(), first);
    assert_eq!(player.display_name(), format!("{} (LIVE)", HUMAN_PLACEHOLDER));

    live.on_air.store(false, Ordering::SeqCst);
    watchlist.refresh_live_status();
    player.refresh_watchlist_status(&watchlist);
    assert!(!player.is_live());
    assert_eq!(player.category(), PlayerCategory::Special);
    assert_eq!(player.display_name(), HUMAN_PLACEHOLDER);
}
