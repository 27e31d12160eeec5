use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

mod card;
mod card_pool;
mod draw_history;
mod pity;
mod probability;
mod rarity;
mod resolver;
mod selector;

pub use card::{Card, PoolCard, PoolMembership};
pub use card_pool::{CardPool, RarityBoost, NEW_USER_BOOST, NEW_USER_DRAW_LIMIT};
pub use draw_history::{DrawRecord, PityHistory};
pub use pity::{PityConfig, PityInfo, PityTracker};
pub use probability::ProbabilityAdjuster;
pub use rarity::{RarityCatalog, RarityTier, TierSource};
pub use resolver::{DrawRng, RarityResolver, Resolution};
pub use selector::{CardSelector, Selection};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, Default, Display, EnumString)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PoolType {
    #[default]
    Standard,
    NewUser,
    Contributor,
    Event,
}

/// Entitlement a user needs before drawing from a pool.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default, Display, EnumString)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessRule {
    #[default]
    Public,
    ContributorOnly,
    PremiumOnly,
    AdminOnly,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default, Display, EnumString)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CardStatus {
    Approved,
    #[default]
    Pending,
    Rejected,
    Flagged,
}

/// Content subtype of a card. Character, world and plot cards carry
/// structured data kept in a side table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, Default, Display, EnumString)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentSubtype {
    #[default]
    Prompt,
    Character,
    World,
    Plot,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default, Display, EnumString)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrawMethod {
    #[default]
    Random,
    /// The tier was forced by a pity guarantee.
    Guaranteed,
}
