mod cards;
mod draw;
mod env;
mod user;

pub mod store;

pub use cards::{
    AccessRule, Card, CardPool, CardSelector, CardStatus, ContentSubtype, DrawMethod, DrawRecord,
    DrawRng, PityConfig, PityHistory, PityInfo, PityTracker, PoolCard, PoolMembership, PoolType, ProbabilityAdjuster, RarityBoost,
    RarityCatalog, RarityResolver, RarityTier, Resolution, Selection, TierSource,
    NEW_USER_BOOST, NEW_USER_DRAW_LIMIT,
};
pub use draw::{
    DrawCompleted, DrawEngine, DrawError, DrawEvents, DrawOutcome, DrawRequest, DrawState,
    DrawnCard, MAX_HISTORY_LIMIT,
};
pub use env::DrawEngineEnv;
pub use user::{User, UserQuota, UserRole};
