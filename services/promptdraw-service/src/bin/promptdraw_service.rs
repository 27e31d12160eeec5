use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use promptdraw_api::{api_routes, setup_tracing, ApiServerEnv, GlobalState};
use promptdraw_common::EnvVars;
use promptdraw_runtime::store::PgDrawStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let env = ApiServerEnv::load();
    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let (global_state, mut draw_events_rx) = GlobalState::<PgDrawStore>::new().await?;

    // activity and notification consumers subscribe here
    tokio::spawn(async move {
        while let Some(event) = draw_events_rx.recv().await {
            tracing::info!(
                "[draw_completed] user {} card {} pool {} tier {} ({})",
                event.user_id, event.card_id, event.pool_id, event.rarity_tier_id, event.draw_method
            );
        }
    });

    let app = Router::new()
        .merge(api_routes::<PgDrawStore>())
        .layer(TimeoutLayer::new(Duration::from_secs(env.request_timeout_secs)))
        .layer(cors)
        .layer(trace)
        .with_state(global_state);

    let listener = tokio::net::TcpListener::bind(format!(":::{}", env.port)).await?;

    tracing::info!("LISTENING ON {}", env.port);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
