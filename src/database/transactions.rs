//! Transaction Repository - PostgreSQL operations for payment transactions

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::pool::parse_text;
use crate::error::AppResult;
use crate::models::Transaction;

const TRANSACTION_COLUMNS: &str = r#"
    id, user_id, transaction_type, status, amount, currency, payment_method,
    external_transaction_id, description, metadata, failure_reason,
    processed_at, completed_at, created_at, updated_at
"#;

pub struct TransactionRepository {
    pool: PgPool,
}

fn transaction_from_row(row: &PgRow) -> AppResult<Transaction> {
    let payment_method: Option<String> = row.try_get("payment_method")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        transaction_type: parse_text(row.try_get("transaction_type")?)?,
        status: parse_text(row.try_get("status")?)?,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        payment_method: payment_method.map(parse_text).transpose()?,
        external_transaction_id: row.try_get("external_transaction_id")?,
        description: row.try_get("description")?,
        metadata: row
            .try_get::<Option<Json<serde_json::Value>>, _>("metadata")?
            .map(|m| m.0),
        failure_reason: row.try_get("failure_reason")?,
        processed_at: row.try_get("processed_at")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, transaction: &Transaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions
            (id, user_id, transaction_type, status, amount, currency, payment_method,
             external_transaction_id, description, metadata, failure_reason,
             processed_at, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.payment_method.map(|m| m.as_str()))
        .bind(&transaction.external_transaction_id)
        .bind(&transaction.description)
        .bind(transaction.metadata.as_ref().map(Json))
        .bind(&transaction.failure_reason)
        .bind(transaction.processed_at)
        .bind(transaction.completed_at)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(
            transaction_id = %transaction.id,
            user_id = %transaction.user_id,
            "Transaction recorded"
        );
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    pub async fn list(&self, user_id: Option<Uuid>) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM transactions
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }
}
