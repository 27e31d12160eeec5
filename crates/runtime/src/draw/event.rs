use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cards::DrawMethod;

/// Published once per committed draw for downstream activity consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawCompleted {
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub pool_id: Uuid,
    pub rarity_tier_id: i32,
    pub draw_method: DrawMethod,
    pub drawn_at: i64,
}

/// Sending half of the draw event channel.
#[derive(Clone, Default)]
pub struct DrawEvents {
    tx: Option<mpsc::Sender<DrawCompleted>>,
}

impl DrawEvents {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<DrawCompleted>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// Events are dropped silently.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Never blocks and never fails the caller; a full or closed channel
    /// only loses the event.
    pub fn publish(&self, event: DrawCompleted) {
        let Some(tx) = &self.tx else {
            return;
        };

        if let Err(e) = tx.try_send(event) {
            match e {
                mpsc::error::TrySendError::Full(event) => {
                    warn!("[DrawEvents] channel full, dropping draw event for user {}", event.user_id);
                }
                mpsc::error::TrySendError::Closed(event) => {
                    warn!("[DrawEvents] channel closed, dropping draw event for user {}", event.user_id);
                }
            }
        }
    }
}
