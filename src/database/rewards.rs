//! Reward Repository - PostgreSQL operations for rewards using sqlx
//!
//! Every write here runs in one transaction with the creator balance change.
//! Lock order is reward row, then creator row, then content row.

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::content::stamp_reward;
use crate::database::creators::{lock_balance, write_balance};
use crate::database::pool::parse_text;
use crate::database::{AppliedTransition, ContentClaim, RewardFilter, TransitionPlanner};
use crate::error::{AppError, AppResult};
use crate::models::{CreatorBalance, Reward, RewardCriteria};
use crate::rewards::{BalanceEffect, settle_balance};

const REWARD_COLUMNS: &str = r#"
    id, creator_id, user_id, content_id, reward_type, status, amount, currency,
    description, criteria, metadata, approved_at, paid_at, transaction_reference,
    created_at, updated_at
"#;

pub struct RewardRepository {
    pool: PgPool,
}

fn reward_from_row(row: &PgRow) -> AppResult<Reward> {
    Ok(Reward {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        user_id: row.try_get("user_id")?,
        content_id: row.try_get("content_id")?,
        reward_type: parse_text(row.try_get("reward_type")?)?,
        status: parse_text(row.try_get("status")?)?,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        description: row.try_get("description")?,
        criteria: row.try_get::<Json<RewardCriteria>, _>("criteria")?.0,
        metadata: row
            .try_get::<Json<serde_json::Map<String, serde_json::Value>>, _>("metadata")?
            .0,
        approved_at: row.try_get("approved_at")?,
        paid_at: row.try_get("paid_at")?,
        transaction_reference: row.try_get("transaction_reference")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn insert_row(conn: &mut PgConnection, reward: &Reward) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rewards
        (id, creator_id, user_id, content_id, reward_type, status, amount, currency,
         description, criteria, metadata, approved_at, paid_at, transaction_reference,
         created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(reward.id)
    .bind(reward.creator_id)
    .bind(reward.user_id)
    .bind(reward.content_id)
    .bind(reward.reward_type.as_str())
    .bind(reward.status.as_str())
    .bind(reward.amount)
    .bind(&reward.currency)
    .bind(&reward.description)
    .bind(Json(&reward.criteria))
    .bind(Json(&reward.metadata))
    .bind(reward.approved_at)
    .bind(reward.paid_at)
    .bind(&reward.transaction_reference)
    .bind(reward.created_at)
    .bind(reward.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn credit_creation(conn: &mut PgConnection, reward: &Reward) -> AppResult<CreatorBalance> {
    let balance = lock_balance(conn, reward.creator_id).await?;
    let next = settle_balance(
        reward.creator_id,
        &balance,
        &BalanceEffect::for_creation(reward.amount),
    );
    write_balance(conn, reward.creator_id, &next).await?;
    Ok(next)
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, reward: &Reward) -> AppResult<CreatorBalance> {
        let mut tx = self.pool.begin().await?;
        let balance = credit_creation(&mut tx, reward).await?;
        insert_row(&mut tx, reward).await?;
        tx.commit().await?;

        debug!(reward_id = %reward.id, creator_id = %reward.creator_id, "Reward inserted");
        Ok(balance)
    }

    pub async fn insert_for_content(
        &self,
        reward: &Reward,
        claim: ContentClaim,
    ) -> AppResult<Option<CreatorBalance>> {
        let content_id = reward
            .content_id
            .ok_or_else(|| AppError::validation("content reward requires a content id"))?;

        let mut tx = self.pool.begin().await?;
        let balance = credit_creation(&mut tx, reward).await?;

        let claimed = stamp_reward(
            &mut tx,
            content_id,
            reward.amount,
            claim == ContentClaim::IfUnrewarded,
        )
        .await?;
        if !claimed {
            tx.rollback().await?;
            return match claim {
                ContentClaim::IfUnrewarded => Ok(None),
                ContentClaim::Always => Err(AppError::not_found("Content")),
            };
        }

        insert_row(&mut tx, reward).await?;
        tx.commit().await?;

        debug!(
            reward_id = %reward.id,
            content_id = %content_id,
            "Content reward inserted"
        );
        Ok(Some(balance))
    }

    pub async fn transition(
        &self,
        id: Uuid,
        planner: TransitionPlanner<'_>,
    ) -> AppResult<AppliedTransition> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM rewards WHERE id = $1 FOR UPDATE",
            REWARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Reward"))?;
        let current = reward_from_row(&row)?;

        // an Err here drops the transaction, which rolls it back
        let update = planner(&current)?;

        let balance = lock_balance(&mut tx, update.reward.creator_id).await?;
        let balance = if update.effect.is_noop() {
            balance
        } else {
            let next = settle_balance(update.reward.creator_id, &balance, &update.effect);
            write_balance(&mut tx, update.reward.creator_id, &next).await?;
            next
        };

        sqlx::query(
            r#"
            UPDATE rewards SET
                status = $2, metadata = $3, approved_at = $4, paid_at = $5,
                transaction_reference = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.reward.status.as_str())
        .bind(Json(&update.reward.metadata))
        .bind(update.reward.approved_at)
        .bind(update.reward.paid_at)
        .bind(&update.reward.transaction_reference)
        .bind(update.reward.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AppliedTransition {
            previous: current.status,
            reward: update.reward,
            balance,
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Reward>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM rewards WHERE id = $1",
            REWARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(reward_from_row).transpose()
    }

    pub async fn list(&self, filter: &RewardFilter) -> AppResult<Vec<Reward>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM rewards
            WHERE ($1::uuid IS NULL OR creator_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
            ORDER BY created_at DESC
            "#,
            REWARD_COLUMNS
        ))
        .bind(filter.creator_id)
        .bind(filter.user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.since)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(reward_from_row).collect()
    }
}
