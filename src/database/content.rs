//! Content Repository - PostgreSQL operations for content items

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::ContentFilter;
use crate::database::pool::parse_text;
use crate::error::{AppError, AppResult};
use crate::models::{Content, ContentType};

const CONTENT_COLUMNS: &str = r#"
    id, creator_id, title, description, content_type, platform, status,
    external_id, external_url, thumbnail_url, content_url, views, likes, shares,
    comments, duration, tags, categories, metadata, engagement_rate,
    reward_amount, published_at, last_analyzed_at, created_at, updated_at
"#;

pub struct ContentRepository {
    pool: PgPool,
}

fn content_from_row(row: &PgRow) -> AppResult<Content> {
    let content_type: String = row.try_get("content_type")?;
    Ok(Content {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        content_type: ContentType::from_stored(&content_type),
        platform: parse_text(row.try_get("platform")?)?,
        status: parse_text(row.try_get("status")?)?,
        external_id: row.try_get("external_id")?,
        external_url: row.try_get("external_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        content_url: row.try_get("content_url")?,
        views: row.try_get("views")?,
        likes: row.try_get("likes")?,
        shares: row.try_get("shares")?,
        comments: row.try_get("comments")?,
        duration: row.try_get("duration")?,
        tags: row.try_get("tags")?,
        categories: row.try_get("categories")?,
        metadata: row
            .try_get::<Option<Json<serde_json::Value>>, _>("metadata")?
            .map(|m| m.0),
        engagement_rate: row.try_get("engagement_rate")?,
        reward_amount: row.try_get("reward_amount")?,
        published_at: row.try_get("published_at")?,
        last_analyzed_at: row.try_get("last_analyzed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Stamp the reward amount on a content row inside the caller's transaction.
///
/// With `only_if_unrewarded` the update matches nothing once the item carries a
/// stamp; the return value says whether a row was claimed.
pub(crate) async fn stamp_reward(
    conn: &mut PgConnection,
    content_id: Uuid,
    amount: rust_decimal::Decimal,
    only_if_unrewarded: bool,
) -> AppResult<bool> {
    let sql = if only_if_unrewarded {
        r#"
        UPDATE content SET reward_amount = $2, updated_at = NOW()
        WHERE id = $1 AND reward_amount = 0
        "#
    } else {
        "UPDATE content SET reward_amount = $2, updated_at = NOW() WHERE id = $1"
    };
    let result = sqlx::query(sql)
        .bind(content_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, content: &Content) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO content
            (id, creator_id, title, description, content_type, platform, status,
             external_id, external_url, thumbnail_url, content_url, views, likes,
             shares, comments, duration, tags, categories, metadata, engagement_rate,
             reward_amount, published_at, last_analyzed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
            "#,
        )
        .bind(content.id)
        .bind(content.creator_id)
        .bind(&content.title)
        .bind(&content.description)
        .bind(content.content_type.as_str())
        .bind(content.platform.as_str())
        .bind(content.status.as_str())
        .bind(&content.external_id)
        .bind(&content.external_url)
        .bind(&content.thumbnail_url)
        .bind(&content.content_url)
        .bind(content.views)
        .bind(content.likes)
        .bind(content.shares)
        .bind(content.comments)
        .bind(content.duration)
        .bind(&content.tags)
        .bind(&content.categories)
        .bind(content.metadata.as_ref().map(Json))
        .bind(content.engagement_rate)
        .bind(content.reward_amount)
        .bind(content.published_at)
        .bind(content.last_analyzed_at)
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(content_id = %content.id, creator_id = %content.creator_id, "Content created");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Content>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM content WHERE id = $1",
            CONTENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(content_from_row).transpose()
    }

    pub async fn list(&self, filter: &ContentFilter) -> AppResult<Vec<Content>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM content
            WHERE ($1::uuid IS NULL OR creator_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR platform = $3)
            ORDER BY created_at DESC
            "#,
            CONTENT_COLUMNS
        ))
        .bind(filter.creator_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.platform.map(|p| p.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(content_from_row).collect()
    }

    pub async fn update(&self, content: &Content) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE content SET
                title = $2, description = $3, content_type = $4, platform = $5,
                status = $6, external_id = $7, external_url = $8, thumbnail_url = $9,
                content_url = $10, views = $11, likes = $12, shares = $13,
                comments = $14, duration = $15, tags = $16, categories = $17,
                metadata = $18, engagement_rate = $19, published_at = $20,
                last_analyzed_at = $21, updated_at = $22
            WHERE id = $1
            "#,
        )
        .bind(content.id)
        .bind(&content.title)
        .bind(&content.description)
        .bind(content.content_type.as_str())
        .bind(content.platform.as_str())
        .bind(content.status.as_str())
        .bind(&content.external_id)
        .bind(&content.external_url)
        .bind(&content.thumbnail_url)
        .bind(&content.content_url)
        .bind(content.views)
        .bind(content.likes)
        .bind(content.shares)
        .bind(content.comments)
        .bind(content.duration)
        .bind(&content.tags)
        .bind(&content.categories)
        .bind(content.metadata.as_ref().map(Json))
        .bind(content.engagement_rate)
        .bind(content.published_at)
        .bind(content.last_analyzed_at)
        .bind(content.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Content"));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<Content>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM content
            WHERE status = 'published'
              AND (title ILIKE $1 OR description ILIKE $1
                   OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $1))
            ORDER BY engagement_rate DESC
            "#,
            CONTENT_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(content_from_row).collect()
    }

    pub async fn top(
        &self,
        limit: usize,
        published_since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Content>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM content
            WHERE status = 'published'
              AND ($2::timestamptz IS NULL OR published_at >= $2)
            ORDER BY engagement_rate DESC, views DESC
            LIMIT $1
            "#,
            CONTENT_COLUMNS
        ))
        .bind(limit as i64)
        .bind(published_since)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(content_from_row).collect()
    }

    pub async fn list_unrewarded(&self) -> AppResult<Vec<Content>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM content
            WHERE status = 'published' AND reward_amount = 0
            ORDER BY created_at ASC
            "#,
            CONTENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(content_from_row).collect()
    }
}
