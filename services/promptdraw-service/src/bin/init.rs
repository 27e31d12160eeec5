use anyhow::Result;

use promptdraw_clients::PostgresClient;
use promptdraw_common::ModuleClient;
use promptdraw_runtime::RarityTier;

/// Default catalog: `(id, name, min_score, max_score, base_probability, display_color)`.
const DEFAULT_TIERS: &[(i32, &str, i32, i32, f64, &str)] = &[
    (1, "common", 0, 39, 0.5, "#9ca3af"),
    (2, "uncommon", 40, 59, 0.3, "#22c55e"),
    (3, "rare", 60, 79, 0.15, "#3b82f6"),
    (4, "epic", 80, 89, 0.03, "#a855f7"),
    (5, "legendary", 90, 97, 0.015, "#f59e0b"),
    (6, "mythic", 98, 100, 0.005, "#ef4444"),
];

/// Seeds the rarity catalog and a default standard pool. Safe to rerun.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let db = PostgresClient::setup_connection().await;
    let mut tx = db.get_client().begin().await?;

    for (id, name, min_score, max_score, base_probability, display_color) in DEFAULT_TIERS {
        let tier = RarityTier {
            id: *id,
            name: name.to_string(),
            min_score: *min_score,
            max_score: *max_score,
            base_probability: *base_probability,
            display_color: display_color.to_string(),
        };
        sqlx::query(
            "INSERT INTO rarity_tiers (id, name, min_score, max_score, base_probability, display_color)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                min_score = EXCLUDED.min_score,
                max_score = EXCLUDED.max_score,
                base_probability = EXCLUDED.base_probability,
                display_color = EXCLUDED.display_color",
        )
        .bind(tier.id)
        .bind(&tier.name)
        .bind(tier.min_score)
        .bind(tier.max_score)
        .bind(tier.base_probability)
        .bind(&tier.display_color)
        .execute(&mut *tx)
        .await?;
    }

    let standard_pools: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM card_pools WHERE pool_type = 'standard' AND active",
    )
    .fetch_one(&mut *tx)
    .await?;

    if standard_pools == 0 {
        sqlx::query("INSERT INTO card_pools (id, name, pool_type, active, access_rule) VALUES ($1, $2, 'standard', TRUE, 'public')")
            .bind(sqlx::types::Uuid::new_v4())
            .bind("Standard")
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    println!("Seeded {} rarity tiers", DEFAULT_TIERS.len());
    Ok(())
}
