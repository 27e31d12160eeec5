use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use promptdraw_database::{TableSchema, updated_at_trigger_sql};

/// Per-user daily draw allowance. Reset to `daily_draws_max` by an external
/// scheduler; the draw engine only ever decrements it.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct UserQuota {
    pub user_id: Uuid,
    pub daily_draws_remaining: i32,
    pub daily_draws_max: i32,
    pub premium: bool,
    pub updated_at: i64,
}

impl UserQuota {
    pub fn new(user_id: Uuid, daily_draws_max: i32) -> Self {
        Self {
            user_id,
            daily_draws_remaining: daily_draws_max,
            daily_draws_max,
            premium: false,
            updated_at: 0,
        }
    }

    pub fn has_draws(&self) -> bool {
        self.daily_draws_remaining > 0
    }
}

impl TableSchema for UserQuota {
    const TABLE_NAME: &'static str = "user_quotas";
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "user_quotas" (
            user_id UUID PRIMARY KEY REFERENCES "users" (id) ON DELETE CASCADE,
            daily_draws_remaining INTEGER NOT NULL CHECK (daily_draws_remaining >= 0),
            daily_draws_max INTEGER NOT NULL,
            premium BOOLEAN NOT NULL DEFAULT FALSE,
            updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        )"#.to_string()
    }

    fn trigger_sql() -> String {
        updated_at_trigger_sql(Self::TABLE_NAME)
    }
}
