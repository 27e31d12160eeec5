use anyhow::anyhow;
use axum::body::Bytes;
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode, middleware,
    routing::{get, post}, Router
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use promptdraw_runtime::store::DrawStore;
use promptdraw_runtime::{DrawError, DrawRequest};

use crate::metrics::{DRAWS_TOTAL, DRAW_CASCADES, DRAW_FAILURES, PITY_DEGRADED};
use crate::{
    middleware::{authenticate, AuthenticatedUser},
    response::{AppError, AppSuccess},
    GlobalState
};

/// Default page size for `/draw/history`.
const DEFAULT_HISTORY_LIMIT: i64 = 20;

pub fn draw_routes<S: DrawStore>() -> Router<GlobalState<S>> {
    Router::new()
        .route("/draw",
            post(draw::<S>)
            .route_layer(middleware::from_fn(authenticate))
        )
        .route("/draw/pity",
            get(pity::<S>)
            .route_layer(middleware::from_fn(authenticate))
        )
        .route("/draw/history",
            get(history::<S>)
            .route_layer(middleware::from_fn(authenticate))
        )
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DrawBody {
    pub pool_id: Option<Uuid>,
}

/// An empty body draws from the default pool.
async fn draw<S: DrawStore>(
    State(state): State<GlobalState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Bytes,
) -> Result<AppSuccess, AppError> {
    let payload: DrawBody = if body.iter().all(u8::is_ascii_whitespace) {
        DrawBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, anyhow!("[/draw] invalid body: {}", e)))?
    };

    let request = DrawRequest { user_id: user.user_id, pool_id: payload.pool_id };
    let outcome = state.engine.draw(request).await
        .inspect_err(|e: &DrawError| DRAW_FAILURES.with_label_values(&[e.kind()]).inc())?;

    let method = outcome.draw_method.to_string();
    let tier = outcome.card.card.rarity_tier_id.to_string();
    DRAWS_TOTAL.with_label_values(&[tier.as_str(), method.as_str()]).inc();
    if outcome.cascaded {
        DRAW_CASCADES.inc();
    }
    if outcome.pity_degraded {
        PITY_DEGRADED.inc();
    }

    Ok(AppSuccess::new(StatusCode::OK, "drawn", json!(outcome)))
}

async fn pity<S: DrawStore>(
    State(state): State<GlobalState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<AppSuccess, AppError> {
    let info = state.engine.pity_status(user.user_id).await?;
    Ok(AppSuccess::new(StatusCode::OK, "ok", json!({
        "pity": info,
        "config": state.engine.pity_config(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

async fn history<S: DrawStore>(
    State(state): State<GlobalState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<AppSuccess, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let records = state.engine.recent_draws(user.user_id, limit).await?;
    Ok(AppSuccess::new(StatusCode::OK, "ok", json!(records)))
}
