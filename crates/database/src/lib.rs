mod env;
mod postgres_connect;
mod sqlx_postgres;

pub use env::DatabaseEnv;
pub use sqlx_postgres::{TableSchema, UPDATED_AT_TRIGGER_FUNCTION_SQL, updated_at_trigger_sql};

#[doc(hidden)]
pub use promptdraw_common::EnvVars as __EnvVars;
