use chrono::Utc;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use ss4r_core::domain::session::Session;

#[derive(Debug, Error)]
pub enum SessionRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub async fn save_session(pool: &SqlitePool, session: &Session) -> Result<(), SessionRepoError> {
    let document = serde_json::to_string(session)?;
    sqlx::query(
        r#"
        INSERT INTO session (slot, document, updated_at)
        VALUES (1, ?, ?)
        ON CONFLICT (slot)
        DO UPDATE SET
            document = excluded.document,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(document)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_session(pool: &SqlitePool) -> Result<Option<Session>, SessionRepoError> {
    let row = sqlx::query(
        r#"
        SELECT document
        FROM session
        WHERE slot = 1
        "#,
    )
    .fetch_optional(pool)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let document: String = row.try_get("document")?;
    Ok(Some(serde_json::from_str(&document)?))
}

pub async fn clear_session(pool: &SqlitePool) -> Result<(), SessionRepoError> {
    sqlx::query("DELETE FROM session").execute(pool).await?;
    Ok(())
}
