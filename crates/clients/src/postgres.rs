use sqlx::PgPool;

use promptdraw_common::define_module_client;
use promptdraw_database::init_databases;
use promptdraw_runtime::store::{CharacterSheets, PlotOutlines, WorldSettings};

init_databases!(
    default: [
        promptdraw_runtime::RarityTier,
        promptdraw_runtime::User,
        promptdraw_runtime::UserQuota,
        promptdraw_runtime::CardPool,
        promptdraw_runtime::Card,
        promptdraw_runtime::PoolMembership,
        promptdraw_runtime::DrawRecord,

        CharacterSheets,
        WorldSettings,
        PlotOutlines,
    ]
);

define_module_client! {
    (struct PostgresClient, "postgres")
    client_type: PgPool,
    env: ["DATABASE_URL"],
    setup: async {
        connect(false, true).await.clone()
    }
}

/// Drops and recreates every listed table. Has no effect once the pool has
/// been opened by `PostgresClient`, so call it first and only from tooling.
pub async fn reset_schema() -> &'static PgPool {
    connect(true, true).await
}
