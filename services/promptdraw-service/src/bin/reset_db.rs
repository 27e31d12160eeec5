use anyhow::Result;

use promptdraw_clients::reset_schema;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    reset_schema().await;
    println!("Database reset successfully");
    Ok(())
}
