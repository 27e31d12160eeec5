use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use promptdraw_database::{TableSchema, updated_at_trigger_sql};

use crate::cards::{CardStatus, ContentSubtype};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Card {
    pub id: Uuid,
    pub rarity_tier_id: i32,
    pub status: CardStatus,
    pub content_subtype: ContentSubtype,

    pub title: String,
    pub content: String,
    pub category: String,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    pub fn is_drawable(&self) -> bool {
        self.status == CardStatus::Approved
    }
}

impl TableSchema for Card {
    const TABLE_NAME: &'static str = "cards";
    const INDEXES_SQL: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_cards_tier_status ON \"cards\" (rarity_tier_id, status)",
    ];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "cards" (
            id UUID PRIMARY KEY,
            rarity_tier_id INTEGER NOT NULL REFERENCES "rarity_tiers" (id),
            status TEXT NOT NULL DEFAULT 'pending',
            content_subtype TEXT NOT NULL DEFAULT 'prompt',
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            created_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now())),
            updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        )"#.to_string()
    }

    fn trigger_sql() -> String {
        updated_at_trigger_sql(Self::TABLE_NAME)
    }
}

/// Many-to-many link between pools and cards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolMembership {
    pub pool_id: Uuid,
    pub card_id: Uuid,
    /// Relative weight within a tier; `None` means the pool does not weight this card.
    pub weight: Option<f64>,
}

impl TableSchema for PoolMembership {
    const TABLE_NAME: &'static str = "pool_memberships";
    const INDEXES_SQL: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_pool_memberships_card ON \"pool_memberships\" (card_id)",
    ];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "pool_memberships" (
            pool_id UUID NOT NULL REFERENCES "card_pools" (id) ON DELETE CASCADE,
            card_id UUID NOT NULL REFERENCES "cards" (id) ON DELETE CASCADE,
            weight DOUBLE PRECISION,
            PRIMARY KEY (pool_id, card_id)
        )"#.to_string()
    }
}

/// A drawable card as seen from one pool, with that pool's weight for it.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct PoolCard {
    #[sqlx(flatten)]
    pub card: Card,
    pub weight: Option<f64>,
}

impl PoolCard {
    pub fn new(card: Card, weight: Option<f64>) -> Self {
        Self { card, weight }
    }
}
