use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get, Router
};

use promptdraw_runtime::store::DrawStore;

use crate::{metrics, response::AppError, GlobalState};

pub fn misc_routes<S: DrawStore>() -> Router<GlobalState<S>> {
    Router::new()
        .route("/health",
            get(|| async { "OK" })
        )
}

pub fn metrics_routes<S: DrawStore>() -> Router<GlobalState<S>> {
    Router::new()
        .route("/metrics",
            get(render_metrics)
        )
}

async fn render_metrics() -> Result<impl IntoResponse, AppError> {
    let body = metrics::render()
        .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
