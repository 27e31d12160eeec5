use serde_json::Value;
use sqlx::types::{Json, Uuid};
use sqlx::{Connection, PgPool, Postgres, Transaction};
use tracing::debug;

use promptdraw_database::TableSchema;

use crate::cards::{Card, CardPool, ContentSubtype, DrawRecord, PityHistory, PoolCard, RarityTier, TierSource};
use crate::draw::DrawError;
use crate::store::{CardSource, DrawStore, DrawTx};
use crate::user::{User, UserQuota};

const POOL_COLUMNS: &str =
    "id, name, pool_type, active, start_time, end_time, rarity_boost, access_rule, created_at, updated_at";
const RECORD_COLUMNS: &str =
    "id, seq, user_id, card_id, pool_id, rarity_tier_id, draw_method, drawn_at";
const PITY_HISTORY_SQL: &str =
    "SELECT rarity_tier_id FROM draw_records WHERE user_id = $1 ORDER BY seq DESC";

/// Side table holding the attachment of `subtype`, if it has one.
fn side_table_for(subtype: ContentSubtype) -> Option<&'static str> {
    match subtype {
        ContentSubtype::Prompt => None,
        ContentSubtype::Character => Some(CharacterSheets::TABLE_NAME),
        ContentSubtype::World => Some(WorldSettings::TABLE_NAME),
        ContentSubtype::Plot => Some(PlotOutlines::TABLE_NAME),
    }
}

/// [`DrawStore`] over a Postgres pool.
#[derive(Clone)]
pub struct PgDrawStore {
    pool: PgPool,
}

impl PgDrawStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TierSource for PgDrawStore {
    async fn load_tiers(&self) -> Result<Vec<RarityTier>, DrawError> {
        let tiers = sqlx::query_as::<_, RarityTier>(
            "SELECT id, name, min_score, max_score, base_probability, display_color FROM rarity_tiers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }
}

#[async_trait::async_trait]
impl DrawStore for PgDrawStore {
    type Tx = PgDrawTx;

    async fn begin(&self) -> Result<PgDrawTx, DrawError> {
        let tx = self.pool.begin().await?;
        Ok(PgDrawTx { tx })
    }

    async fn pity_history(&self, user_id: Uuid) -> Result<PityHistory, DrawError> {
        let tiers: Vec<i32> = sqlx::query_scalar(PITY_HISTORY_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(PityHistory::from_newest_first(tiers))
    }

    async fn recent_draws(&self, user_id: Uuid, limit: i64) -> Result<Vec<DrawRecord>, DrawError> {
        let sql = format!(
            "SELECT {} FROM draw_records WHERE user_id = $1 ORDER BY seq DESC LIMIT $2",
            RECORD_COLUMNS
        );
        let records = sqlx::query_as::<_, DrawRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn active_pools(&self, now: i64) -> Result<Vec<CardPool>, DrawError> {
        let sql = format!(
            "SELECT {} FROM card_pools
             WHERE active
               AND (start_time IS NULL OR start_time <= $1)
               AND (end_time IS NULL OR end_time >= $1)
             ORDER BY created_at DESC",
            POOL_COLUMNS
        );
        let pools = sqlx::query_as::<_, CardPool>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(pools)
    }
}

/// One draw's Postgres transaction. Dropping it without `commit` rolls back.
pub struct PgDrawTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl CardSource for PgDrawTx {
    async fn eligible_cards(&mut self, pool_id: Uuid, tier_id: i32) -> Result<Vec<PoolCard>, DrawError> {
        let cards = sqlx::query_as::<_, PoolCard>(
            "SELECT c.id, c.rarity_tier_id, c.status, c.content_subtype, c.title, c.content, c.category,
                    c.created_at, c.updated_at, m.weight
             FROM pool_memberships m
             JOIN cards c ON c.id = m.card_id
             WHERE m.pool_id = $1 AND c.rarity_tier_id = $2 AND c.status = 'approved'",
        )
        .bind(pool_id)
        .bind(tier_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(cards)
    }
}

#[async_trait::async_trait]
impl DrawTx for PgDrawTx {
    async fn load_user(&mut self, user_id: Uuid) -> Result<Option<User>, DrawError> {
        let user = sqlx::query_as::<_, User>("SELECT id, username, role, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(user)
    }

    async fn lock_quota(&mut self, user_id: Uuid) -> Result<Option<UserQuota>, DrawError> {
        let quota = sqlx::query_as::<_, UserQuota>(
            "SELECT user_id, daily_draws_remaining, daily_draws_max, premium, updated_at
             FROM user_quotas WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(quota)
    }

    async fn find_pool(&mut self, pool_id: Option<Uuid>, now: i64) -> Result<Option<CardPool>, DrawError> {
        let pool = match pool_id {
            Some(id) => {
                let sql = format!("SELECT {} FROM card_pools WHERE id = $1", POOL_COLUMNS);
                sqlx::query_as::<_, CardPool>(&sql)
                    .bind(id)
                    .fetch_optional(&mut *self.tx)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM card_pools
                     WHERE pool_type = 'standard' AND active
                       AND (start_time IS NULL OR start_time <= $1)
                       AND (end_time IS NULL OR end_time >= $1)
                     ORDER BY created_at DESC LIMIT 1",
                    POOL_COLUMNS
                );
                sqlx::query_as::<_, CardPool>(&sql)
                    .bind(now)
                    .fetch_optional(&mut *self.tx)
                    .await?
            }
        };

        Ok(pool)
    }

    async fn pity_history(&mut self, user_id: Uuid) -> Result<PityHistory, DrawError> {
        let mut savepoint = Connection::begin(&mut *self.tx).await?;
        let read = sqlx::query_scalar::<_, i32>(PITY_HISTORY_SQL)
            .bind(user_id)
            .fetch_all(&mut *savepoint)
            .await;

        match read {
            Ok(tiers) => {
                savepoint.commit().await?;
                Ok(PityHistory::from_newest_first(tiers))
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn fetch_attachment(&mut self, card: &Card) -> Result<Option<Value>, DrawError> {
        let Some(table) = side_table_for(card.content_subtype) else {
            return Ok(None);
        };

        let sql = format!("SELECT data FROM \"{}\" WHERE card_id = $1", table);
        let mut savepoint = Connection::begin(&mut *self.tx).await?;
        let read = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(card.id)
            .fetch_optional(&mut *savepoint)
            .await;

        match read {
            Ok(data) => {
                savepoint.commit().await?;
                debug!("[PgDrawTx] {} for card {}: {}", table, card.id, data.is_some());
                Ok(data.map(|Json(value)| value))
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn insert_draw_record(&mut self, record: DrawRecord) -> Result<DrawRecord, DrawError> {
        let seq: i64 = sqlx::query_scalar(
            "INSERT INTO draw_records (id, user_id, card_id, pool_id, rarity_tier_id, draw_method, drawn_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING seq",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.card_id)
        .bind(record.pool_id)
        .bind(record.rarity_tier_id)
        .bind(record.draw_method)
        .bind(record.drawn_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(DrawRecord { seq, ..record })
    }

    async fn decrement_quota(&mut self, user_id: Uuid) -> Result<Option<i32>, DrawError> {
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE user_quotas
             SET daily_draws_remaining = daily_draws_remaining - 1
             WHERE user_id = $1 AND daily_draws_remaining > 0
             RETURNING daily_draws_remaining",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(remaining)
    }

    async fn commit(self) -> Result<(), DrawError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), DrawError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

macro_rules! attachment_table {
    ($name:ident, $table:literal) => {
        /// Side table holding the structured attachment of one content subtype.
        pub struct $name;

        impl TableSchema for $name {
            const TABLE_NAME: &'static str = $table;
            const INDEXES_SQL: &'static [&'static str] = &[];

            fn create_table_sql() -> String {
                format!(
                    r#"CREATE TABLE IF NOT EXISTS "{}" (
                        card_id UUID PRIMARY KEY REFERENCES "cards" (id) ON DELETE CASCADE,
                        data JSONB NOT NULL,
                        updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
                    )"#,
                    $table
                )
            }

            fn trigger_sql() -> String {
                promptdraw_database::updated_at_trigger_sql($table)
            }
        }
    };
}

attachment_table!(CharacterSheets, "character_sheets");
attachment_table!(WorldSettings, "world_settings");
attachment_table!(PlotOutlines, "plot_outlines");
