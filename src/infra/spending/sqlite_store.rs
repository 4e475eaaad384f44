// SQLite implementation of the LedgerStore trait

use crate::core::spending::{LedgerError, LedgerStore, SpenderTotal};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

fn storage_error(e: sqlx::Error) -> LedgerError {
    LedgerError::StorageError(e.to_string())
}

impl SqliteLedgerStore {
    /// Open (or create) the ledger database at `database_path`.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}?mode=rwc", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS spending (
                user_id INTEGER PRIMARY KEY,
                total INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// SQLite integers are signed 64-bit; ids and totals are stored as i64 bit patterns.
fn to_db(value: u64) -> i64 {
    value as i64
}

fn from_db(value: i64) -> u64 {
    value as u64
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn total_for(&self, user_id: u64) -> Result<u64, LedgerError> {
        let row = sqlx::query("SELECT total FROM spending WHERE user_id = ?")
            .bind(to_db(user_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(|r| from_db(r.get::<i64, _>("total"))).unwrap_or(0))
    }

    async fn add_spend(&self, user_id: u64, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let current: Option<i64> = sqlx::query("SELECT total FROM spending WHERE user_id = ?")
            .bind(to_db(user_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?
            .map(|r| r.get("total"));

        let total = current.map(from_db).unwrap_or(0).saturating_add(amount);

        sqlx::query(
            r#"
            INSERT INTO spending (user_id, total, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                total = excluded.total,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(to_db(user_id))
        .bind(to_db(total))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(total)
    }

    async fn top_spenders(&self, limit: usize) -> Result<Vec<SpenderTotal>, LedgerError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT user_id, total FROM spending ORDER BY total DESC, user_id ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .iter()
            .map(|r| SpenderTotal {
                user_id: from_db(r.get("user_id")),
                total: from_db(r.get("total")),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn totals_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spending.db");
        let path = path.to_str().unwrap();

        let store = SqliteLedgerStore::new(path).await.unwrap();
        assert_eq!(store.add_spend(7, 100_000_000).await.unwrap(), 100_000_000);
        assert_eq!(store.add_spend(7, 700_000_000).await.unwrap(), 800_000_000);
        store.pool.close().await;

        let reopened = SqliteLedgerStore::new(path).await.unwrap();
        assert_eq!(reopened.total_for(7).await.unwrap(), 800_000_000);
        assert_eq!(reopened.total_for(8).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_total_then_user() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spending.db");
        let store = SqliteLedgerStore::new(path.to_str().unwrap()).await.unwrap();

        store.add_spend(1, 500_000_000).await.unwrap();
        store.add_spend(2, 2_000_000_000).await.unwrap();
        store.add_spend(4, 10).await.unwrap();
        store.add_spend(3, 10).await.unwrap();

        let board = store.top_spenders(10).await.unwrap();
        let order: Vec<u64> = board.iter().map(|s| s.user_id).collect();
        assert_eq!(order, vec![2, 1, 3, 4]);

        assert_eq!(store.top_spenders(1).await.unwrap().len(), 1);
        assert!(matches!(
            store.add_spend(1, 0).await,
            Err(LedgerError::NonPositiveAmount)
        ));
    }
}
