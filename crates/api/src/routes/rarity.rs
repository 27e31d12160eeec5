use axum::{
    extract::State,
    http::StatusCode, middleware,
    routing::{get, post}, Router
};
use serde_json::json;

use promptdraw_runtime::store::DrawStore;

use crate::{
    middleware::{admin_only, authenticate},
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn rarity_routes<S: DrawStore>() -> Router<GlobalState<S>> {
    Router::new()
        .route("/rarity/tiers",
            get(list_tiers::<S>)
        )
        .route("/rarity/tiers/refresh",
            post(refresh_tiers::<S>)
            .route_layer(middleware::from_fn(admin_only))
            .route_layer(middleware::from_fn(authenticate))
        )
}

async fn list_tiers<S: DrawStore>(
    State(state): State<GlobalState<S>>,
) -> Result<AppSuccess, AppError> {
    let tiers = state.engine.tiers().await?;
    Ok(AppSuccess::new(StatusCode::OK, "ok", json!(*tiers)))
}

async fn refresh_tiers<S: DrawStore>(
    State(state): State<GlobalState<S>>,
) -> Result<AppSuccess, AppError> {
    let tiers = state.engine.refresh_tiers().await?;
    tracing::info!("[/rarity/tiers/refresh] reloaded {} tiers", tiers.len());
    Ok(AppSuccess::new(StatusCode::OK, "refreshed", json!(*tiers)))
}
