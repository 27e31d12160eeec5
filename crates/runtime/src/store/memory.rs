use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use sqlx::types::Uuid;
use tokio::sync::OwnedMutexGuard;

use crate::cards::{
    Card, CardPool, CardStatus, ContentSubtype, DrawMethod, DrawRecord, PityHistory, PoolCard, PoolMembership,
    PoolType, RarityTier, TierSource,
};
use crate::draw::DrawError;
use crate::store::{CardSource, DrawStore, DrawTx};
use crate::user::{User, UserQuota};

/// Operations of the in-memory store that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    EligibleCards,
    InsertRecord,
    DecrementQuota,
    Commit,
    PityHistory,
    Attachment,
    /// Blocks the quota decrement long enough for any draw timeout to fire.
    StallDecrement,
}

#[derive(Default)]
struct MemoryState {
    tiers: Vec<RarityTier>,
    users: HashMap<Uuid, User>,
    quotas: HashMap<Uuid, UserQuota>,
    pools: HashMap<Uuid, CardPool>,
    cards: HashMap<Uuid, Card>,
    memberships: Vec<PoolMembership>,
    attachments: HashMap<Uuid, Value>,
    records: Vec<DrawRecord>,
    next_seq: i64,
}

#[derive(Default)]
struct Inner {
    state: Mutex<MemoryState>,
    quota_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
    fail_points: Mutex<HashSet<FailPoint>>,
    open_txs: AtomicUsize,
    reads_during_draws: AtomicUsize,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, point: FailPoint) -> Result<(), DrawError> {
        let failing = self.fail_points.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&point);
        if failing {
            return Err(DrawError::persistence(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    /// Counts store-level reads that happen while a draw transaction is open.
    fn note_store_read(&self) {
        if self.open_txs.load(Ordering::SeqCst) > 0 {
            self.reads_during_draws.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn quota_lock(&self, user_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.quota_locks.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(user_id)
            .or_default()
            .clone()
    }
}

/// In-process [`DrawStore`] with the same isolation guarantees as the
/// Postgres store: per-user quota locks held for the life of a transaction
/// and writes that only become visible on commit.
#[derive(Clone, Default)]
pub struct MemoryDrawStore {
    inner: Arc<Inner>,
}

impl MemoryDrawStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.inner.fail_points.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(point);
    }

    pub fn clear_fail_points(&self) {
        self.inner.fail_points.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn add_tier(&self, tier: RarityTier) {
        let mut state = self.inner.state();
        state.tiers.retain(|existing| existing.id != tier.id);
        state.tiers.push(tier);
    }

    pub fn add_user(&self, user: User, quota: UserQuota) {
        let mut state = self.inner.state();
        state.quotas.insert(user.id, UserQuota { user_id: user.id, ..quota });
        state.users.insert(user.id, user);
    }

    pub fn add_pool(&self, pool: CardPool) {
        self.inner.state().pools.insert(pool.id, pool);
    }

    /// Adds `card` to the catalog if new and links it into `pool_id`.
    pub fn add_card(&self, pool_id: Uuid, card: Card, weight: Option<f64>) {
        let mut state = self.inner.state();
        state.memberships.push(PoolMembership { pool_id, card_id: card.id, weight });
        state.cards.insert(card.id, card);
    }

    /// Stores the side data returned for `card_id` when it is drawn.
    pub fn add_attachment(&self, card_id: Uuid, data: Value) {
        self.inner.state().attachments.insert(card_id, data);
    }

    /// Appends committed history for `user_id`, oldest draw first.
    pub fn seed_history(&self, user_id: Uuid, pool_id: Uuid, tiers_oldest_first: &[i32]) {
        let mut state = self.inner.state();
        for tier_id in tiers_oldest_first {
            state.next_seq += 1;
            let seq = state.next_seq;
            state.records.push(DrawRecord {
                id: Uuid::new_v4(),
                seq,
                user_id,
                card_id: Uuid::nil(),
                pool_id,
                rarity_tier_id: *tier_id,
                draw_method: DrawMethod::Random,
                drawn_at: 0,
            });
        }
    }

    pub fn quota(&self, user_id: Uuid) -> Option<UserQuota> {
        self.inner.state().quotas.get(&user_id).cloned()
    }

    /// Committed records of `user_id` in insertion order.
    pub fn records(&self, user_id: Uuid) -> Vec<DrawRecord> {
        self.inner.state().records.iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Store-level reads issued while some draw transaction was open. A draw
    /// that needs one would wait on a second connection in Postgres.
    pub fn reads_during_draws(&self) -> usize {
        self.inner.reads_during_draws.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TierSource for MemoryDrawStore {
    async fn load_tiers(&self) -> Result<Vec<RarityTier>, DrawError> {
        self.inner.note_store_read();
        Ok(self.inner.state().tiers.clone())
    }
}

#[async_trait::async_trait]
impl DrawStore for MemoryDrawStore {
    type Tx = MemoryDrawTx;

    async fn begin(&self) -> Result<MemoryDrawTx, DrawError> {
        self.inner.check(FailPoint::Begin)?;
        self.inner.open_txs.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryDrawTx {
            inner: self.inner.clone(),
            quota_guard: None,
            staged_records: Vec::new(),
            staged_decrements: HashMap::new(),
        })
    }

    async fn pity_history(&self, user_id: Uuid) -> Result<PityHistory, DrawError> {
        self.inner.note_store_read();
        self.inner.check(FailPoint::PityHistory)?;
        Ok(PityHistory::from_records(&self.records(user_id)))
    }

    async fn recent_draws(&self, user_id: Uuid, limit: i64) -> Result<Vec<DrawRecord>, DrawError> {
        self.inner.note_store_read();
        let mut records = self.records(user_id);
        records.sort_by(|a, b| b.seq.cmp(&a.seq));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    async fn active_pools(&self, now: i64) -> Result<Vec<CardPool>, DrawError> {
        self.inner.note_store_read();
        let mut pools: Vec<CardPool> = self.inner.state().pools.values()
            .filter(|pool| pool.active && pool.is_within_window(now))
            .cloned()
            .collect();
        pools.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pools)
    }
}

pub struct MemoryDrawTx {
    inner: Arc<Inner>,
    quota_guard: Option<OwnedMutexGuard<()>>,
    staged_records: Vec<DrawRecord>,
    staged_decrements: HashMap<Uuid, i32>,
}

impl Drop for MemoryDrawTx {
    fn drop(&mut self) {
        self.inner.open_txs.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CardSource for MemoryDrawTx {
    async fn eligible_cards(&mut self, pool_id: Uuid, tier_id: i32) -> Result<Vec<PoolCard>, DrawError> {
        self.inner.check(FailPoint::EligibleCards)?;
        let state = self.inner.state();
        Ok(state.memberships.iter()
            .filter(|membership| membership.pool_id == pool_id)
            .filter_map(|membership| {
                state.cards.get(&membership.card_id)
                    .filter(|card| card.rarity_tier_id == tier_id && card.status == CardStatus::Approved)
                    .map(|card| PoolCard::new(card.clone(), membership.weight))
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl DrawTx for MemoryDrawTx {
    async fn load_user(&mut self, user_id: Uuid) -> Result<Option<User>, DrawError> {
        Ok(self.inner.state().users.get(&user_id).cloned())
    }

    async fn lock_quota(&mut self, user_id: Uuid) -> Result<Option<UserQuota>, DrawError> {
        if self.quota_guard.is_none() {
            let lock = self.inner.quota_lock(user_id);
            self.quota_guard = Some(lock.lock_owned().await);
        }

        let state = self.inner.state();
        Ok(state.quotas.get(&user_id).map(|quota| {
            let staged = self.staged_decrements.get(&user_id).copied().unwrap_or(0);
            UserQuota { daily_draws_remaining: quota.daily_draws_remaining - staged, ..quota.clone() }
        }))
    }

    async fn find_pool(&mut self, pool_id: Option<Uuid>, now: i64) -> Result<Option<CardPool>, DrawError> {
        let state = self.inner.state();
        Ok(match pool_id {
            Some(id) => state.pools.get(&id).cloned(),
            None => state.pools.values()
                .filter(|pool| pool.active && pool.pool_type == PoolType::Standard && pool.is_within_window(now))
                .max_by_key(|pool| pool.created_at)
                .cloned(),
        })
    }

    async fn pity_history(&mut self, user_id: Uuid) -> Result<PityHistory, DrawError> {
        self.inner.check(FailPoint::PityHistory)?;
        let state = self.inner.state();
        let committed: Vec<DrawRecord> = state.records.iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        Ok(PityHistory::from_records(&committed))
    }

    async fn fetch_attachment(&mut self, card: &Card) -> Result<Option<Value>, DrawError> {
        if card.content_subtype == ContentSubtype::Prompt {
            return Ok(None);
        }
        self.inner.check(FailPoint::Attachment)?;
        Ok(self.inner.state().attachments.get(&card.id).cloned())
    }

    async fn insert_draw_record(&mut self, mut record: DrawRecord) -> Result<DrawRecord, DrawError> {
        self.inner.check(FailPoint::InsertRecord)?;
        {
            let mut state = self.inner.state();
            state.next_seq += 1;
            record.seq = state.next_seq;
        }
        self.staged_records.push(record.clone());
        Ok(record)
    }

    async fn decrement_quota(&mut self, user_id: Uuid) -> Result<Option<i32>, DrawError> {
        self.inner.check(FailPoint::DecrementQuota)?;
        if self.inner.check(FailPoint::StallDecrement).is_err() {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let committed = match self.inner.state().quotas.get(&user_id) {
            Some(quota) => quota.daily_draws_remaining,
            None => return Ok(None),
        };
        let staged = self.staged_decrements.entry(user_id).or_insert(0);
        let remaining = committed - *staged;
        if remaining <= 0 {
            return Ok(None);
        }
        *staged += 1;
        Ok(Some(remaining - 1))
    }

    async fn commit(mut self) -> Result<(), DrawError> {
        self.inner.check(FailPoint::Commit)?;
        let mut state = self.inner.state();

        for (user_id, decrement) in &self.staged_decrements {
            let quota = state.quotas.get(user_id)
                .ok_or_else(|| DrawError::persistence(format!("quota row for {} vanished", user_id)))?;
            if quota.daily_draws_remaining < *decrement {
                return Err(DrawError::persistence(format!("quota for {} would go negative", user_id)));
            }
        }
        for (user_id, decrement) in self.staged_decrements.drain() {
            if let Some(quota) = state.quotas.get_mut(&user_id) {
                quota.daily_draws_remaining -= decrement;
                quota.updated_at = promptdraw_common::get_current_timestamp();
            }
        }
        state.records.append(&mut self.staged_records);
        Ok(())
    }

    async fn rollback(self) -> Result<(), DrawError> {
        Ok(())
    }
}
