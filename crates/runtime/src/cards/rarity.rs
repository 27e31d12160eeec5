use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use promptdraw_database::TableSchema;

use crate::draw::DrawError;

/// Tolerance used when checking that tier probabilities sum to one.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RarityTier {
    pub id: i32,
    pub name: String,
    pub min_score: i32,
    pub max_score: i32,
    pub base_probability: f64,
    pub display_color: String,
}

impl RarityTier {
    pub fn new(id: i32, name: impl Into<String>, base_probability: f64) -> Self {
        Self {
            id,
            name: name.into(),
            min_score: 0,
            max_score: 0,
            base_probability,
            display_color: String::new(),
        }
    }
}

impl TableSchema for RarityTier {
    const TABLE_NAME: &'static str = "rarity_tiers";
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "rarity_tiers" (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            min_score INTEGER NOT NULL,
            max_score INTEGER NOT NULL,
            base_probability DOUBLE PRECISION NOT NULL CHECK (base_probability >= 0),
            display_color TEXT NOT NULL DEFAULT ''
        )"#.to_string()
    }
}

/// Anything that can load the rarity tiers from durable storage.
#[async_trait::async_trait]
pub trait TierSource: Send + Sync {
    async fn load_tiers(&self) -> Result<Vec<RarityTier>, DrawError>;
}

struct CachedTiers {
    loaded_at: Instant,
    tiers: Arc<Vec<RarityTier>>,
}

/// Read-mostly cache over the rarity tiers, ordered by id.
///
/// Entries expire lazily after `ttl`; administrative writes call
/// [`RarityCatalog::invalidate`] to force the next read to reload.
pub struct RarityCatalog {
    source: Arc<dyn TierSource>,
    ttl: Duration,
    cache: RwLock<Option<CachedTiers>>,
}

impl RarityCatalog {
    pub fn new(source: Arc<dyn TierSource>, ttl: Duration) -> Self {
        Self { source, ttl, cache: RwLock::new(None) }
    }

    pub async fn list_tiers(&self) -> Result<Arc<Vec<RarityTier>>, DrawError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.tiers.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // another task may have refreshed while we waited for the write lock
        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.tiers.clone());
            }
        }

        let mut tiers = self.source.load_tiers().await?;
        tiers.sort_by_key(|tier| tier.id);

        let total: f64 = tiers.iter().map(|tier| tier.base_probability).sum();
        if !tiers.is_empty() && (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            warn!("[RarityCatalog] tier probabilities sum to {} instead of 1.0", total);
        }
        debug!("[RarityCatalog] loaded {} tiers", tiers.len());

        let tiers = Arc::new(tiers);
        *cache = Some(CachedTiers { loaded_at: Instant::now(), tiers: tiers.clone() });
        Ok(tiers)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
