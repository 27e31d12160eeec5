mod postgres;

pub use postgres::{PostgresClient, reset_schema};
