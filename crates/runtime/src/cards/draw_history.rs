use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use promptdraw_common::get_current_timestamp;
use promptdraw_database::TableSchema;

use crate::cards::{Card, CardPool, DrawMethod};

/// One successful draw. Append-only: rows are never updated or deleted, and
/// pity state is always derived from them.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DrawRecord {
    pub id: Uuid,
    /// Insertion sequence, assigned by the store. Orders draws that share a `drawn_at`.
    pub seq: i64,

    pub user_id: Uuid,
    pub card_id: Uuid,
    pub pool_id: Uuid,
    /// Tier of the card at the time it was drawn.
    pub rarity_tier_id: i32,
    pub draw_method: DrawMethod,

    pub drawn_at: i64,
}

impl DrawRecord {
    pub fn new(user_id: Uuid, pool: &CardPool, card: &Card, draw_method: DrawMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq: 0,
            user_id,
            card_id: card.id,
            pool_id: pool.id,
            rarity_tier_id: card.rarity_tier_id,
            draw_method,
            drawn_at: get_current_timestamp(),
        }
    }
}

impl TableSchema for DrawRecord {
    const TABLE_NAME: &'static str = "draw_records";
    const INDEXES_SQL: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_draw_records_user_seq ON \"draw_records\" (user_id, seq DESC)",
    ];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "draw_records" (
            id UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL UNIQUE,
            user_id UUID NOT NULL REFERENCES "users" (id),
            card_id UUID NOT NULL REFERENCES "cards" (id),
            pool_id UUID NOT NULL REFERENCES "card_pools" (id),
            rarity_tier_id INTEGER NOT NULL REFERENCES "rarity_tiers" (id),
            draw_method TEXT NOT NULL DEFAULT 'random',
            drawn_at BIGINT NOT NULL
        )"#.to_string()
    }
}

/// A user's draw history as the pity tracker consumes it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PityHistory {
    /// Lifetime number of draws.
    pub total_draws: i64,
    /// Tier ids of past draws, newest first.
    pub tiers_newest_first: Vec<i32>,
}

impl PityHistory {
    pub fn from_newest_first(tiers_newest_first: Vec<i32>) -> Self {
        Self {
            total_draws: tiers_newest_first.len() as i64,
            tiers_newest_first,
        }
    }

    /// Builds the history from records in any order.
    pub fn from_records(records: &[DrawRecord]) -> Self {
        let mut sorted: Vec<&DrawRecord> = records.iter().collect();
        sorted.sort_by(|a, b| b.seq.cmp(&a.seq).then(b.drawn_at.cmp(&a.drawn_at)));
        Self::from_newest_first(sorted.into_iter().map(|r| r.rarity_tier_id).collect())
    }
}
