use axum::{extract::State, http::StatusCode, middleware, routing::get, Router};
use serde_json::json;

use promptdraw_runtime::store::DrawStore;

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn pool_routes<S: DrawStore>() -> Router<GlobalState<S>> {
    Router::new()
        .route("/pools",
            get(active_pools::<S>)
            .route_layer(middleware::from_fn(authenticate))
        )
}

async fn active_pools<S: DrawStore>(
    State(state): State<GlobalState<S>>,
) -> Result<AppSuccess, AppError> {
    let pools = state.engine.active_pools().await?;
    Ok(AppSuccess::new(StatusCode::OK, "ok", json!(pools)))
}
