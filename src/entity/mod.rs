//! Player reconstruction on top of the scatter scheduler.

pub mod bones;
pub mod category;
pub mod classifier;
pub mod gear;
pub mod offsets;
pub mod player;
pub mod policy;
pub mod poller;
pub mod registry;
pub mod stats;
pub mod watchlist;

pub use bones::{Bone, BoneTracker, PlayerBone, SkeletonLayout};
pub use category::{Classification, PlayerCategory};
pub use classifier::{classify, clean_ai_name, ClassifierContext, FactionTables};
pub use gear::{Gear, GearItem, GearReader};
pub use player::{AssemblyContext, ObservedPlayer, Player, PlayerKind};
pub use policy::{presentation, FilterGroup, PresentationPolicy};
pub use poller::Poller;
pub use registry::{PlayerRegistry, PlayerSource, SyncReport, TickReport};
pub use stats::{HttpStatsService, PlayerStats, StatsDispatcher, StatsEvent, StatsService};
pub use watchlist::{HttpLiveStatusService, LiveStatusService, Watchlist, WatchlistEntry};
