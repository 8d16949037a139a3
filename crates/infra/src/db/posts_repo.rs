use std::collections::HashMap;

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use thiserror::Error;

use ss4r_core::domain::post::Post;

#[derive(Debug, Error)]
pub enum PostsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stores `posts` as the complete saved list, in the given order.
pub async fn replace_posts(pool: &SqlitePool, posts: &[Post]) -> Result<(), PostsRepoError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM saved_posts")
        .execute(&mut *tx)
        .await?;
    for (position, post) in posts.iter().enumerate() {
        let document = serde_json::to_string(post)?;
        sqlx::query(
            r#"
            INSERT INTO saved_posts (position, post_id, document)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(position as i64)
        .bind(&post.id)
        .bind(document)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn load_posts(pool: &SqlitePool) -> Result<Vec<Post>, PostsRepoError> {
    let rows = sqlx::query(
        r#"
        SELECT document
        FROM saved_posts
        ORDER BY position ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    decode_rows(rows)
}

pub async fn load_posts_page(
    pool: &SqlitePool,
    limit: usize,
    offset: usize,
) -> Result<Vec<Post>, PostsRepoError> {
    let Ok(offset) = i64::try_from(offset) else {
        return Ok(Vec::new());
    };
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = sqlx::query(
        r#"
        SELECT document
        FROM saved_posts
        ORDER BY position ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    decode_rows(rows)
}

/// Loads the posts with the given ids, in the order the ids are listed.
pub async fn load_posts_by_ids(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<Vec<Post>, PostsRepoError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder =
        QueryBuilder::<Sqlite>::new("SELECT document FROM saved_posts WHERE post_id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");
    let rows = builder.build().fetch_all(pool).await?;

    let mut by_id: HashMap<String, Post> = decode_rows(rows)?
        .into_iter()
        .map(|post| (post.id.clone(), post))
        .collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

pub async fn count_posts(pool: &SqlitePool) -> Result<i64, PostsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count
        FROM saved_posts
        "#,
    )
    .fetch_one(pool)
    .await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

pub async fn clear_posts(pool: &SqlitePool) -> Result<(), PostsRepoError> {
    sqlx::query("DELETE FROM saved_posts").execute(pool).await?;
    Ok(())
}

fn decode_rows(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Post>, PostsRepoError> {
    let mut posts = Vec::with_capacity(rows.len());
    for row in rows {
        let document: String = row.try_get("document")?;
        posts.push(serde_json::from_str(&document)?);
    }
    Ok(posts)
}
