#![allow(dead_code)]

use std::sync::Arc;

use sqlx::types::{Json, Uuid};
use tokio::sync::mpsc;

use promptdraw_runtime::store::MemoryDrawStore;
use promptdraw_runtime::{
    AccessRule, Card, CardPool, CardStatus, DrawCompleted, DrawEngine,
    DrawEngineEnv, DrawEvents, DrawRng, PityConfig, PoolType, RarityBoost, RarityTier, User,
    UserQuota, UserRole,
};

pub struct FixedRoll(pub f64);

impl DrawRng for FixedRoll {
    fn unit(&mut self) -> f64 {
        self.0
    }
}

pub fn six_tiers() -> Vec<RarityTier> {
    [(1, 0.5), (2, 0.3), (3, 0.15), (4, 0.03), (5, 0.015), (6, 0.005)]
        .into_iter()
        .map(|(id, p)| RarityTier::new(id, format!("tier-{id}"), p))
        .collect()
}

pub fn engine_env() -> DrawEngineEnv {
    DrawEngineEnv {
        pity: PityConfig::default(),
        rarity_cache_ttl_secs: 300,
        draw_timeout_secs: 5,
        event_buffer: 64,
    }
}

pub fn approved_card(tier_id: i32) -> Card {
    Card {
        id: Uuid::new_v4(),
        rarity_tier_id: tier_id,
        status: CardStatus::Approved,
        title: format!("card at tier {tier_id}"),
        content: "a prompt".into(),
        category: "fantasy".into(),
        ..Default::default()
    }
}

pub fn pool(pool_type: PoolType, access_rule: AccessRule, boost: Option<f64>) -> CardPool {
    CardPool {
        id: Uuid::new_v4(),
        name: format!("{pool_type} pool"),
        pool_type,
        active: true,
        access_rule,
        rarity_boost: boost.map(|factor| Json(RarityBoost { factor, description: "boosted".into() })),
        created_at: 1,
        ..Default::default()
    }
}

pub struct Fixture {
    pub store: Arc<MemoryDrawStore>,
    pub engine: Arc<DrawEngine<MemoryDrawStore>>,
    pub standard_pool: CardPool,
    pub user: User,
    pub events: mpsc::Receiver<DrawCompleted>,
}

impl Fixture {
    /// Six tiers, one standard pool with one approved card per tier, and one
    /// user holding `quota` draws.
    pub fn new(quota: i32) -> Self {
        Self::build(quota, engine_env())
    }

    pub fn build(quota: i32, env: DrawEngineEnv) -> Self {
        let store = Arc::new(MemoryDrawStore::new());
        for tier in six_tiers() {
            store.add_tier(tier);
        }

        let standard_pool = pool(PoolType::Standard, AccessRule::Public, None);
        store.add_pool(standard_pool.clone());
        for tier_id in 1..=6 {
            store.add_card(standard_pool.id, approved_card(tier_id), None);
        }

        let user = User::new("drawer", UserRole::User);
        store.add_user(user.clone(), UserQuota::new(user.id, quota));

        let (events, rx) = DrawEvents::channel(env.event_buffer);
        let engine = Arc::new(DrawEngine::new(store.clone(), &env, events));

        Self { store, engine, standard_pool, user, events: rx }
    }

    pub fn add_user(&self, role: UserRole, quota: i32) -> User {
        let user = User::new(format!("{role}-{}", Uuid::new_v4()), role);
        self.store.add_user(user.clone(), UserQuota::new(user.id, quota));
        user
    }

    pub fn remaining(&self, user_id: Uuid) -> i32 {
        self.store.quota(user_id).map(|quota| quota.daily_draws_remaining).unwrap_or(-1)
    }
}
