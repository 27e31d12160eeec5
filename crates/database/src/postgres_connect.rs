/// Initializes the application's database connection pool.
///
/// This macro is the single point of entry for setting up the Postgres pool.
/// It creates the pool from `DatabaseEnv`, and creates or drops the tables
/// of the listed types in order.
///
/// # Arguments
/// - `default: [$($default_type:ty),*]`: types implementing `TableSchema`, listed
///   so that referenced tables come before the tables referencing them.
///
/// # Generated Functions
/// - `async fn connect(drop_tables: bool, create_tables: bool) -> &'static PgPool`
///
/// # Example
/// ```rust,ignore
/// init_databases!(
///     default: [User, Card, DrawRecord]
/// );
///
/// #[tokio::main]
/// async fn main() {
///     let pool = connect(false, true).await;
/// }
/// ```
#[macro_export]
macro_rules! init_databases {
    (
        default: [$($default_type:ty),* $(,)?]
    ) => {
        static POOL: tokio::sync::OnceCell<sqlx::PgPool> = tokio::sync::OnceCell::const_new();

        async fn connect(drop_tables: bool, create_tables: bool) -> &'static sqlx::PgPool {
            POOL.get_or_init(|| async {
                let env = <$crate::DatabaseEnv as $crate::__EnvVars>::load();
                if env.database_url.is_empty() {
                    panic!("DATABASE_URL environment variable not set");
                }

                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(env.max_connections)
                    .acquire_timeout(std::time::Duration::from_secs(env.acquire_timeout_secs))
                    .connect(&env.database_url)
                    .await
                    .expect("Failed to connect to default database");

                if drop_tables {
                    // reverse order so referencing tables go first
                    let mut drops: Vec<(&'static str, String)> = Vec::new();
                    $(
                        drops.push((
                            stringify!($default_type),
                            <$default_type as $crate::TableSchema>::drop_table_sql(),
                        ));
                    )*
                    for (name, drop_table_sql_str) in drops.into_iter().rev() {
                        if let Err(e) = sqlx::query(&drop_table_sql_str).execute(&pool).await {
                            tracing::warn!("Failed to drop table for '{}'. Error: {:?}", name, e);
                        }
                    }
                }

                if create_tables {
                    sqlx::query($crate::UPDATED_AT_TRIGGER_FUNCTION_SQL).execute(&pool).await
                        .expect("Failed to create timestamp helper function.");

                    $(
                        let create_table_sql_str = <$default_type as $crate::TableSchema>::create_table_sql();
                        if !create_table_sql_str.trim().is_empty() {
                            sqlx::query(&create_table_sql_str).execute(&pool).await
                                .unwrap_or_else(|e| panic!("Failed to create table for '{}'. Error: {:?}", stringify!($default_type), e));
                        }
                    )*

                    $(
                        let trigger_sql_str = <$default_type as $crate::TableSchema>::trigger_sql();
                        for statement in trigger_sql_str.split(';').filter(|s| !s.trim().is_empty()) {
                            sqlx::query(statement).execute(&pool).await
                                .unwrap_or_else(|e| panic!("Failed to execute trigger for '{}'. SQL: {}. Error: {:?}", stringify!($default_type), statement, e));
                        }
                    )*

                    $(
                        for index_sql in <$default_type as $crate::TableSchema>::INDEXES_SQL {
                            sqlx::query(index_sql).execute(&pool).await
                                .unwrap_or_else(|e| panic!("Failed to create index for '{}'. SQL: {}. Error: {:?}", stringify!($default_type), index_sql, e));
                        }
                    )*
                }

                tracing::info!("[database] connected, pool size {}", env.max_connections);
                pool
            }).await
        }
    };
}
