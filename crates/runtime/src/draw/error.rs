use sqlx::types::Uuid;
use thiserror::Error;

/// Everything that can abort a draw. Any of these rolls the whole
/// transaction back; a degraded pity lookup is not an error and never
/// shows up here.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("no draws remaining today")]
    InsufficientQuota,

    #[error("card pool {} not found", display_pool(.0))]
    PoolNotFound(Option<Uuid>),

    #[error("card pool {0} is outside its active window")]
    PoolInactive(Uuid),

    #[error("access to card pool {0} denied")]
    PoolAccessDenied(Uuid),

    #[error("no eligible card in pool {pool_id} at or below tier {tier_id}")]
    NoEligibleCard { pool_id: Uuid, tier_id: i32 },

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),
}

fn display_pool(pool_id: &Option<Uuid>) -> String {
    pool_id.map_or_else(|| "(default)".to_string(), |id| id.to_string())
}

impl From<sqlx::Error> for DrawError {
    fn from(err: sqlx::Error) -> Self {
        DrawError::Persistence(err.into())
    }
}

impl DrawError {
    /// Stable label for logs, metrics and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            DrawError::UserNotFound(_) => "user_not_found",
            DrawError::InsufficientQuota => "insufficient_quota",
            DrawError::PoolNotFound(_) => "pool_not_found",
            DrawError::PoolInactive(_) => "pool_inactive",
            DrawError::PoolAccessDenied(_) => "pool_access_denied",
            DrawError::NoEligibleCard { .. } => "no_eligible_card",
            DrawError::Persistence(_) => "persistence",
        }
    }

    /// Only transient storage failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DrawError::Persistence(_))
    }

    pub fn persistence(message: impl std::fmt::Display) -> Self {
        DrawError::Persistence(anyhow::anyhow!("{}", message))
    }
}
