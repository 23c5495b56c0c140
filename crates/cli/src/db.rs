use anyhow::{Context, Result};
use storage::classes::{table_exists, TABLE};

/// Creates the class log table if needed. Returns true when it was created now.
pub async fn update_db(db_path: &str) -> Result<bool> {
    let pool = storage::connect(db_path).await.context("db connect")?;
    let existed = table_exists(&pool).await?;
    storage::migrate(&pool).await.context("db migrate")?;
    if !existed {
        tracing::info!("created table {} in {}", TABLE, db_path);
    }
    Ok(!existed)
}
