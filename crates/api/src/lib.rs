mod env;
mod global_state;
mod metrics;
mod middleware;
mod response;
mod routes;
mod utils;

pub use routes::{api_routes, draw_routes, metrics_routes, misc_routes, pool_routes, rarity_routes};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use utils::setup_tracing;
pub use middleware::{authenticate, admin_only, AuthenticatedUser, USER_ID_HEADER, USER_ROLE_HEADER};
pub use response::{AppError, AppSuccess, GenericResponse};
