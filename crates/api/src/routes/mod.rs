mod draw;
mod misc;
mod pools;
mod rarity;

use axum::Router;

use promptdraw_runtime::store::DrawStore;

use crate::GlobalState;

pub use draw::draw_routes;
pub use misc::{metrics_routes, misc_routes};
pub use pools::pool_routes;
pub use rarity::rarity_routes;

/// Every route the service exposes.
pub fn api_routes<S: DrawStore>() -> Router<GlobalState<S>> {
    Router::new()
        .merge(misc_routes())
        .merge(metrics_routes())
        .merge(draw_routes())
        .merge(pool_routes())
        .merge(rarity_routes())
}
