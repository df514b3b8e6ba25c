//! Creator Repository - PostgreSQL operations for creator profiles
//!
//! Balance columns are read here but only written by the reward repository.

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::pool::parse_text;
use crate::error::{AppError, AppResult};
use crate::models::{Creator, CreatorBalance, CreatorTier, SocialMediaLinks};

pub(crate) const CREATOR_COLUMNS: &str = r#"
    c.id, c.user_id, c.creator_code, c.status, c.tier, c.total_earnings,
    c.pending_earnings, c.total_content, c.total_views, c.total_likes,
    c.total_shares, c.engagement_rate, c.social_media_links,
    c.content_categories, c.analytics, c.verified_at, c.last_active_at,
    c.created_at, c.updated_at
"#;

pub struct CreatorRepository {
    pool: PgPool,
}

pub(crate) fn creator_from_row(row: &PgRow) -> AppResult<Creator> {
    let tier: String = row.try_get("tier")?;
    Ok(Creator {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        creator_code: row.try_get("creator_code")?,
        status: parse_text(row.try_get("status")?)?,
        tier: CreatorTier::from_stored(&tier),
        balance: CreatorBalance {
            total_earnings: row.try_get("total_earnings")?,
            pending_earnings: row.try_get("pending_earnings")?,
        },
        total_content: row.try_get("total_content")?,
        total_views: row.try_get("total_views")?,
        total_likes: row.try_get("total_likes")?,
        total_shares: row.try_get("total_shares")?,
        engagement_rate: row.try_get("engagement_rate")?,
        social_media_links: row
            .try_get::<Option<Json<SocialMediaLinks>>, _>("social_media_links")?
            .map(|l| l.0),
        content_categories: row.try_get("content_categories")?,
        analytics: row
            .try_get::<Option<Json<serde_json::Value>>, _>("analytics")?
            .map(|a| a.0),
        verified_at: row.try_get("verified_at")?,
        last_active_at: row.try_get("last_active_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Lock a creator row for the rest of the transaction and return its balance.
pub(crate) async fn lock_balance(
    conn: &mut PgConnection,
    creator_id: Uuid,
) -> AppResult<CreatorBalance> {
    let row = sqlx::query(
        "SELECT total_earnings, pending_earnings FROM creators WHERE id = $1 FOR UPDATE",
    )
    .bind(creator_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Creator"))?;

    Ok(CreatorBalance {
        total_earnings: row.try_get("total_earnings")?,
        pending_earnings: row.try_get("pending_earnings")?,
    })
}

pub(crate) async fn write_balance(
    conn: &mut PgConnection,
    creator_id: Uuid,
    balance: &CreatorBalance,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE creators
        SET total_earnings = $2, pending_earnings = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(creator_id)
    .bind(balance.total_earnings)
    .bind(balance.pending_earnings)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl CreatorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, creator: &Creator) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO creators
            (id, user_id, creator_code, status, tier, total_earnings, pending_earnings,
             total_content, total_views, total_likes, total_shares, engagement_rate,
             social_media_links, content_categories, analytics, verified_at,
             last_active_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19)
            "#,
        )
        .bind(creator.id)
        .bind(creator.user_id)
        .bind(&creator.creator_code)
        .bind(creator.status.as_str())
        .bind(creator.tier.as_str())
        .bind(creator.balance.total_earnings)
        .bind(creator.balance.pending_earnings)
        .bind(creator.total_content)
        .bind(creator.total_views)
        .bind(creator.total_likes)
        .bind(creator.total_shares)
        .bind(creator.engagement_rate)
        .bind(creator.social_media_links.as_ref().map(Json))
        .bind(&creator.content_categories)
        .bind(creator.analytics.as_ref().map(Json))
        .bind(creator.verified_at)
        .bind(creator.last_active_at)
        .bind(creator.created_at)
        .bind(creator.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(creator_id = %creator.id, code = %creator.creator_code, "Creator created");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Creator>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM creators c WHERE c.id = $1",
            CREATOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(creator_from_row).transpose()
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<Creator>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM creators c WHERE c.user_id = $1",
            CREATOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(creator_from_row).transpose()
    }

    pub async fn get_by_code(&self, code: &str) -> AppResult<Option<Creator>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM creators c WHERE c.creator_code = $1",
            CREATOR_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(creator_from_row).transpose()
    }

    pub async fn list(&self) -> AppResult<Vec<Creator>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM creators c ORDER BY c.created_at DESC",
            CREATOR_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(creator_from_row).collect()
    }

    pub async fn update_profile(&self, creator: &Creator) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE creators SET
                creator_code = $2, status = $3, tier = $4, total_content = $5,
                total_views = $6, total_likes = $7, total_shares = $8,
                engagement_rate = $9, social_media_links = $10,
                content_categories = $11, analytics = $12, verified_at = $13,
                last_active_at = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(creator.id)
        .bind(&creator.creator_code)
        .bind(creator.status.as_str())
        .bind(creator.tier.as_str())
        .bind(creator.total_content)
        .bind(creator.total_views)
        .bind(creator.total_likes)
        .bind(creator.total_shares)
        .bind(creator.engagement_rate)
        .bind(creator.social_media_links.as_ref().map(Json))
        .bind(&creator.content_categories)
        .bind(creator.analytics.as_ref().map(Json))
        .bind(creator.verified_at)
        .bind(creator.last_active_at)
        .bind(creator.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Creator"));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM creators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<Creator>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM creators c
            JOIN users u ON u.id = c.user_id
            WHERE c.creator_code ILIKE $1 OR u.username ILIKE $1
               OR u.first_name ILIKE $1 OR u.last_name ILIKE $1
            ORDER BY c.total_earnings DESC
            "#,
            CREATOR_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(creator_from_row).collect()
    }

    pub async fn top(&self, limit: usize) -> AppResult<Vec<Creator>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM creators c
            WHERE c.status = 'verified'
            ORDER BY c.total_earnings DESC
            LIMIT $1
            "#,
            CREATOR_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(creator_from_row).collect()
    }
}
