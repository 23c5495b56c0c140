use anyhow::Context;
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub const TABLE: &str = "safelist_classes";

/// Content id used for rows written by a full scan.
pub const GLOBAL_POST_ID: u64 = 0;

/// Rows of `(class_name, post_id)` recording which content produced which class.
#[derive(Debug, Clone)]
pub struct ClassLog {
    pool: SqlitePool,
}

impl ClassLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a log only when the table has been created (see `migrate`).
    pub async fn open(pool: SqlitePool) -> anyhow::Result<Option<Self>> {
        if table_exists(&pool).await? {
            Ok(Some(Self::new(pool)))
        } else {
            Ok(None)
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Drops every row, then records `classes` under the global id.
    pub async fn replace_all(&self, classes: &[String]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM safelist_classes")
            .execute(&mut *tx)
            .await?;
        for class in classes {
            sqlx::query("INSERT INTO safelist_classes (class_name, post_id) VALUES (?1, ?2)")
                .bind(class)
                .bind(sql_id(GLOBAL_POST_ID)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!("class log replaced with {} global rows", classes.len());
        Ok(())
    }

    /// Replaces the rows owned by `post_id`; rows of other ids are untouched.
    pub async fn replace_for(&self, post_id: u64, classes: &[String]) -> anyhow::Result<()> {
        let id = sql_id(post_id)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM safelist_classes WHERE post_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for class in classes {
            sqlx::query("INSERT INTO safelist_classes (class_name, post_id) VALUES (?1, ?2)")
                .bind(class)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!("class log rows for {} replaced ({})", post_id, classes.len());
        Ok(())
    }

    pub async fn classes_for(&self, post_id: u64) -> anyhow::Result<Vec<String>> {
        let id = sql_id(post_id)?;
        let rows = sqlx::query(
            "SELECT DISTINCT class_name FROM safelist_classes WHERE post_id = ?1 ORDER BY class_name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>(0)).collect())
    }

    /// Distinct classes across all content ids, sorted.
    pub async fn distinct_classes(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT class_name FROM safelist_classes ORDER BY class_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>(0)).collect())
    }
}

/// SQLite integers are signed; ids past `i64::MAX` are rejected, not wrapped.
fn sql_id(post_id: u64) -> anyhow::Result<i64> {
    i64::try_from(post_id).with_context(|| format!("post id {} out of range", post_id))
}

pub async fn table_exists(pool: &SqlitePool) -> anyhow::Result<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(TABLE)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}
