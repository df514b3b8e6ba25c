//! Engagement Repository - PostgreSQL operations for engagement events

use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::pool::parse_text;
use crate::error::AppResult;
use crate::models::Engagement;

pub struct EngagementRepository {
    pool: PgPool,
}

impl EngagementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, engagement: &Engagement) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO engagements
            (id, user_id, content_id, engagement_type, ip_address, user_agent,
             referrer, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(engagement.id)
        .bind(engagement.user_id)
        .bind(engagement.content_id)
        .bind(engagement.engagement_type.as_str())
        .bind(&engagement.ip_address)
        .bind(&engagement.user_agent)
        .bind(&engagement.referrer)
        .bind(engagement.metadata.as_ref().map(Json))
        .bind(engagement.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_content(&self, content_id: Uuid) -> AppResult<Vec<Engagement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, content_id, engagement_type, ip_address, user_agent,
                   referrer, metadata, created_at
            FROM engagements
            WHERE content_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<_> {
                Ok(Engagement {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    content_id: row.try_get("content_id")?,
                    engagement_type: parse_text(row.try_get("engagement_type")?)?,
                    ip_address: row.try_get("ip_address")?,
                    user_agent: row.try_get("user_agent")?,
                    referrer: row.try_get("referrer")?,
                    metadata: row
                        .try_get::<Option<Json<serde_json::Value>>, _>("metadata")?
                        .map(|m| m.0),
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
