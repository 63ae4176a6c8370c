use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{SessionSnapshot, SessionStateRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl SessionStateRepository for SqliteRepository {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO session_state (id, snapshot, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                snapshot = excluded.snapshot,
                saved_at = excluded.saved_at
            ",
        )
        .bind(1_i64)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT snapshot
            FROM session_state
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let json: String = row
            .try_get("snapshot")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_state WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
