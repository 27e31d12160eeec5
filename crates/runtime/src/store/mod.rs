mod memory;
mod postgres;

use serde_json::Value;
use sqlx::types::Uuid;

use crate::cards::{Card, CardPool, DrawRecord, PityHistory, PoolCard, TierSource};
use crate::draw::DrawError;
use crate::user::{User, UserQuota};

pub use memory::{FailPoint, MemoryDrawStore, MemoryDrawTx};
pub use postgres::{CharacterSheets, PgDrawStore, PgDrawTx, PlotOutlines, WorldSettings};

/// Approved cards of one pool at one tier.
#[async_trait::async_trait]
pub trait CardSource: Send {
    async fn eligible_cards(&mut self, pool_id: Uuid, tier_id: i32) -> Result<Vec<PoolCard>, DrawError>;
}

/// One storage transaction scoped to a single draw.
///
/// Nothing written through a `DrawTx` is visible to other readers until
/// [`DrawTx::commit`]. Dropping the transaction without committing discards
/// every write. Every read a draw needs goes through its transaction, so a
/// draw never waits on a second connection while holding the quota lock.
#[async_trait::async_trait]
pub trait DrawTx: CardSource {
    async fn load_user(&mut self, user_id: Uuid) -> Result<Option<User>, DrawError>;

    /// Loads the quota row and holds it exclusively until commit or rollback.
    async fn lock_quota(&mut self, user_id: Uuid) -> Result<Option<UserQuota>, DrawError>;

    /// `None` selects the newest active standard pool whose window contains `now`.
    async fn find_pool(&mut self, pool_id: Option<Uuid>, now: i64) -> Result<Option<CardPool>, DrawError>;

    /// Committed draw history of `user_id`. A failed read leaves the
    /// transaction usable.
    async fn pity_history(&mut self, user_id: Uuid) -> Result<PityHistory, DrawError>;

    /// Structured side data of a character, world or plot card. A failed read
    /// leaves the transaction usable.
    async fn fetch_attachment(&mut self, card: &Card) -> Result<Option<Value>, DrawError>;

    /// Appends a record and returns it with its store-assigned sequence.
    async fn insert_draw_record(&mut self, record: DrawRecord) -> Result<DrawRecord, DrawError>;

    /// Takes one draw if any remain. Returns the remaining count, or `None`
    /// when the quota was already exhausted.
    async fn decrement_quota(&mut self, user_id: Uuid) -> Result<Option<i32>, DrawError>;

    async fn commit(self) -> Result<(), DrawError>;
    async fn rollback(self) -> Result<(), DrawError>;
}

/// Durable state behind the draw engine. Reads outside a draw go through the
/// store directly and never touch an open transaction.
#[async_trait::async_trait]
pub trait DrawStore: TierSource + Send + Sync + 'static {
    type Tx: DrawTx + 'static;

    async fn begin(&self) -> Result<Self::Tx, DrawError>;

    async fn pity_history(&self, user_id: Uuid) -> Result<PityHistory, DrawError>;

    /// Newest first.
    async fn recent_draws(&self, user_id: Uuid, limit: i64) -> Result<Vec<DrawRecord>, DrawError>;

    /// Pools flagged active whose window contains `now`, newest first.
    async fn active_pools(&self, now: i64) -> Result<Vec<CardPool>, DrawError>;
}
