use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Uuid;
use strum_macros::Display;
use tracing::{debug, info, warn};

use promptdraw_common::get_current_timestamp;

use crate::cards::{
    Card, CardPool, CardSelector, ContentSubtype, DrawMethod, DrawRecord, DrawRng, PityConfig,
    PityInfo, PityTracker, RarityCatalog, RarityResolver, RarityTier,
};
use crate::draw::{DrawCompleted, DrawError, DrawEvents};
use crate::env::DrawEngineEnv;
use crate::store::{DrawStore, DrawTx};

/// Upper bound for history listings.
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DrawState {
    Started,
    QuotaChecked,
    PoolValidated,
    RarityResolved,
    CardSelected,
    Recorded,
    Committed,
    RolledBack,
}

impl DrawState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DrawState::Committed | DrawState::RolledBack)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRequest {
    pub user_id: Uuid,
    /// `None` draws from the default standard pool.
    pub pool_id: Option<Uuid>,
}

/// The drawn card with its tier display fields resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawnCard {
    pub card: Card,
    pub rarity_name: String,
    pub rarity_color: String,
    pub category: String,
    pub content_subtype: ContentSubtype,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawOutcome {
    pub card: DrawnCard,
    pub remaining_draws: i32,
    pub pool_id: Uuid,
    pub pool_name: String,
    pub extra_attachment: Option<Value>,
    pub draw_method: DrawMethod,
    pub cascaded: bool,
    pub record_id: Uuid,
    /// Timestamp stored on the draw record.
    pub drawn_at: i64,

    #[serde(skip)]
    pub pity_degraded: bool,
}

/// Runs draws against a [`DrawStore`].
///
/// Each draw is one storage transaction walking
/// `Started -> QuotaChecked -> PoolValidated -> RarityResolved -> CardSelected -> Recorded -> Committed`.
/// Any failure on the way rolls the transaction back and returns the
/// originating error; the caller only ever sees a card from a committed draw.
///
/// The rarity tiers are read before the transaction opens. Everything else a
/// draw reads goes through the transaction itself.
pub struct DrawEngine<S: DrawStore> {
    store: Arc<S>,
    catalog: Arc<RarityCatalog>,
    pity_config: PityConfig,
    events: DrawEvents,
    draw_timeout: Duration,
}

impl<S: DrawStore> DrawEngine<S> {
    pub fn new(store: Arc<S>, env: &DrawEngineEnv, events: DrawEvents) -> Self {
        let catalog = Arc::new(RarityCatalog::new(store.clone(), env.rarity_cache_ttl()));
        Self {
            store,
            catalog,
            pity_config: env.pity.clone(),
            events,
            draw_timeout: env.draw_timeout(),
        }
    }

    pub fn pity_config(&self) -> &PityConfig {
        &self.pity_config
    }

    pub async fn draw(&self, request: DrawRequest) -> Result<DrawOutcome, DrawError> {
        let mut rng = StdRng::from_rng(&mut rand::rng());
        self.draw_with_rng(request, &mut rng).await
    }

    pub async fn draw_with_rng<R: DrawRng + ?Sized>(
        &self,
        request: DrawRequest,
        rng: &mut R,
    ) -> Result<DrawOutcome, DrawError> {
        let mut state = DrawState::Started;
        debug!("[DrawEngine] user {} draw {}", request.user_id, state);

        // a catalog reload must not wait for a connection while the tx holds one
        let opened = match self.catalog.list_tiers().await {
            Ok(tiers) => self.store.begin().await.map(|tx| (tiers, tx)),
            Err(e) => Err(e),
        };
        let (tiers, mut tx) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                transition(&mut state, DrawState::RolledBack, request.user_id);
                return Err(e);
            }
        };

        let steps = self.run_steps(&mut tx, &tiers, &request, rng, &mut state);
        let result = match tokio::time::timeout(self.draw_timeout, steps).await {
            Ok(result) => result,
            Err(_) => Err(DrawError::persistence(format!("draw timed out after {:?}", self.draw_timeout))),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[DrawEngine] user {} draw failed in state {}: {}", request.user_id, state, e);
                transition(&mut state, DrawState::RolledBack, request.user_id);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("[DrawEngine] rollback for user {} failed: {}", request.user_id, rollback_err);
                }
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            warn!("[DrawEngine] commit for user {} failed: {}", request.user_id, e);
            transition(&mut state, DrawState::RolledBack, request.user_id);
            return Err(e);
        }
        transition(&mut state, DrawState::Committed, request.user_id);

        self.events.publish(DrawCompleted {
            user_id: request.user_id,
            card_id: outcome.card.card.id,
            pool_id: outcome.pool_id,
            rarity_tier_id: outcome.card.card.rarity_tier_id,
            draw_method: outcome.draw_method,
            drawn_at: outcome.drawn_at,
        });

        info!(
            "[DrawEngine] user {} drew card {} ({}) from pool {}, {} draws left",
            request.user_id, outcome.card.card.id, outcome.card.rarity_name, outcome.pool_name, outcome.remaining_draws
        );
        Ok(outcome)
    }

    async fn run_steps<R: DrawRng + ?Sized>(
        &self,
        tx: &mut S::Tx,
        tiers: &[RarityTier],
        request: &DrawRequest,
        rng: &mut R,
        state: &mut DrawState,
    ) -> Result<DrawOutcome, DrawError> {
        let user = tx.load_user(request.user_id).await?
            .ok_or(DrawError::UserNotFound(request.user_id))?;
        let quota = tx.lock_quota(user.id).await?
            .ok_or(DrawError::InsufficientQuota)?;
        if !quota.has_draws() {
            return Err(DrawError::InsufficientQuota);
        }
        transition(state, DrawState::QuotaChecked, user.id);

        let now = get_current_timestamp();
        let pool = tx.find_pool(request.pool_id, now).await?
            .filter(|pool| pool.active)
            .ok_or(DrawError::PoolNotFound(request.pool_id))?;
        validate_pool(&pool, now)?;
        if !pool.is_accessible_by(&user, &quota) {
            return Err(DrawError::PoolAccessDenied(pool.id));
        }
        transition(state, DrawState::PoolValidated, user.id);

        let pity = self.pity_for(&mut *tx, user.id).await;
        let pool_boost = pool.pool_boost(pity.known_total_draws());
        let resolution = RarityResolver::resolve(tiers, pool_boost, &pity, &mut *rng)
            .ok_or_else(|| DrawError::persistence("no rarity tiers configured"))?;
        debug!(
            "[DrawEngine] user {} resolved tier {} via {} (pool boost {}, pity boost {})",
            user.id, resolution.tier_id, resolution.method, pool_boost, pity.dynamic_boost_factor
        );
        transition(state, DrawState::RarityResolved, user.id);

        let selection = CardSelector::select(&mut *tx, tiers, pool.id, resolution.tier_id, &mut *rng).await?;
        transition(state, DrawState::CardSelected, user.id);

        let record = DrawRecord::new(user.id, &pool, &selection.card, resolution.method);
        let record = tx.insert_draw_record(record).await?;
        let extra_attachment = match tx.fetch_attachment(&selection.card).await {
            Ok(attachment) => attachment,
            Err(e) => {
                warn!("[DrawEngine] {} attachment for card {} unavailable: {}", selection.card.content_subtype, selection.card.id, e);
                None
            }
        };
        transition(state, DrawState::Recorded, user.id);

        let remaining_draws = tx.decrement_quota(user.id).await?
            .ok_or(DrawError::InsufficientQuota)?;

        let tier = tiers.iter().find(|tier| tier.id == selection.tier_id);
        Ok(DrawOutcome {
            card: drawn_card(selection.card, tier),
            remaining_draws,
            pool_id: pool.id,
            pool_name: pool.name,
            extra_attachment,
            draw_method: resolution.method,
            cascaded: selection.cascaded,
            record_id: record.id,
            drawn_at: record.drawn_at,
            pity_degraded: pity.degraded,
        })
    }

    /// Pity state for a draw, read inside its transaction. A failed history
    /// read degrades to neutral values instead of failing the draw.
    async fn pity_for(&self, tx: &mut S::Tx, user_id: Uuid) -> PityInfo {
        match tx.pity_history(user_id).await {
            Ok(history) => PityTracker::compute(&history, &self.pity_config),
            Err(e) => {
                warn!("[DrawEngine] pity lookup degraded for user {}: {}", user_id, e);
                PityInfo::neutral()
            }
        }
    }

    /// Pity state as reported to the user; storage failures are returned.
    pub async fn pity_status(&self, user_id: Uuid) -> Result<PityInfo, DrawError> {
        let history = self.store.pity_history(user_id).await?;
        Ok(PityTracker::compute(&history, &self.pity_config))
    }

    pub async fn recent_draws(&self, user_id: Uuid, limit: i64) -> Result<Vec<DrawRecord>, DrawError> {
        self.store.recent_draws(user_id, limit.clamp(1, MAX_HISTORY_LIMIT)).await
    }

    pub async fn active_pools(&self) -> Result<Vec<CardPool>, DrawError> {
        self.store.active_pools(get_current_timestamp()).await
    }

    pub async fn tiers(&self) -> Result<Arc<Vec<RarityTier>>, DrawError> {
        self.catalog.list_tiers().await
    }

    pub async fn refresh_tiers(&self) -> Result<Arc<Vec<RarityTier>>, DrawError> {
        self.catalog.invalidate().await;
        self.catalog.list_tiers().await
    }
}

fn transition(state: &mut DrawState, next: DrawState, user_id: Uuid) {
    debug!("[DrawEngine] user {} draw {} -> {}", user_id, state, next);
    *state = next;
}

fn validate_pool(pool: &CardPool, now: i64) -> Result<(), DrawError> {
    if !pool.is_within_window(now) {
        return Err(DrawError::PoolInactive(pool.id));
    }
    Ok(())
}

fn drawn_card(card: Card, tier: Option<&RarityTier>) -> DrawnCard {
    let (rarity_name, rarity_color) = tier
        .map(|tier| (tier.name.clone(), tier.display_color.clone()))
        .unwrap_or_default();
    DrawnCard {
        category: card.category.clone(),
        content_subtype: card.content_subtype,
        card,
        rarity_name,
        rarity_color,
    }
}
