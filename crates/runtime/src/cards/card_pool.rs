use serde::{Deserialize, Serialize};
use sqlx::types::{Json, Uuid};

use promptdraw_database::{TableSchema, updated_at_trigger_sql};

use crate::cards::{AccessRule, PoolType};
use crate::user::{User, UserQuota, UserRole};

/// Extra multiplier applied by `NewUser` pools to users with few lifetime draws.
pub const NEW_USER_BOOST: f64 = 1.5;
/// Lifetime draw count below which a user still counts as new.
pub const NEW_USER_DRAW_LIMIT: i64 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RarityBoost {
    pub factor: f64,
    pub description: String,
}

#[derive(Clone, Default, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CardPool {
    pub id: Uuid,
    pub name: String,

    pub pool_type: PoolType,
    pub active: bool,

    pub start_time: Option<i64>,
    pub end_time: Option<i64>,

    pub rarity_boost: Option<Json<RarityBoost>>,
    pub access_rule: AccessRule,

    pub created_at: i64,
    pub updated_at: i64,
}

impl CardPool {
    /// Whether `now` falls inside the pool's optional `[start_time, end_time]` window.
    pub fn is_within_window(&self, now: i64) -> bool {
        let started = self.start_time.map_or(true, |start| now >= start);
        let not_ended = self.end_time.map_or(true, |end| now <= end);
        started && not_ended
    }

    /// Contributor pools are never public, whatever their stored rule says.
    pub fn effective_access_rule(&self) -> AccessRule {
        match (self.pool_type, self.access_rule) {
            (PoolType::Contributor, AccessRule::Public) => AccessRule::ContributorOnly,
            (_, rule) => rule,
        }
    }

    pub fn is_accessible_by(&self, user: &User, quota: &UserQuota) -> bool {
        if user.role == UserRole::Admin {
            return true;
        }

        match self.effective_access_rule() {
            AccessRule::Public => true,
            AccessRule::ContributorOnly => user.role == UserRole::Contributor,
            AccessRule::PremiumOnly => quota.premium,
            AccessRule::AdminOnly => false,
        }
    }

    /// Pool-level boost before any pity inflation. New-user pools stack a fixed
    /// multiplier on top of their configured factor while the user is still new.
    /// `lifetime_draws` is `None` when the count could not be read.
    pub fn pool_boost(&self, lifetime_draws: Option<i64>) -> f64 {
        let base = self.rarity_boost
            .as_ref()
            .map(|boost| boost.factor)
            .filter(|factor| factor.is_finite() && *factor > 0.0)
            .unwrap_or(1.0);

        match (self.pool_type, lifetime_draws) {
            (PoolType::NewUser, Some(draws)) if draws < NEW_USER_DRAW_LIMIT => base * NEW_USER_BOOST,
            _ => base,
        }
    }
}

impl TableSchema for CardPool {
    const TABLE_NAME: &'static str = "card_pools";
    const INDEXES_SQL: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_card_pools_type_active ON \"card_pools\" (pool_type, active)",
    ];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "card_pools" (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            pool_type TEXT NOT NULL DEFAULT 'standard',
            active BOOLEAN NOT NULL DEFAULT TRUE,
            start_time BIGINT,
            end_time BIGINT,
            rarity_boost JSONB,
            access_rule TEXT NOT NULL DEFAULT 'public',
            created_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now())),
            updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        )"#.to_string()
    }

    fn trigger_sql() -> String {
        updated_at_trigger_sql(Self::TABLE_NAME)
    }
}
