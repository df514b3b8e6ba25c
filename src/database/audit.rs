//! Audit Repository - append-only audit log table

use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::database::pool::parse_text;
use crate::error::AppResult;
use crate::models::AuditLog;

pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &AuditLog) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
            (id, user_id, entity_type, entity_id, action, old_values, new_values,
             ip_address, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.action.as_str())
        .bind(entry.old_values.as_ref().map(Json))
        .bind(entry.new_values.as_ref().map(Json))
        .bind(&entry.ip_address)
        .bind(&entry.description)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent(&self, limit: usize) -> AppResult<Vec<AuditLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, entity_type, entity_id, action, old_values, new_values,
                   ip_address, description, created_at
            FROM audit_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<_> {
                Ok(AuditLog {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    entity_type: row.try_get("entity_type")?,
                    entity_id: row.try_get("entity_id")?,
                    action: parse_text(row.try_get("action")?)?,
                    old_values: row
                        .try_get::<Option<Json<serde_json::Value>>, _>("old_values")?
                        .map(|v| v.0),
                    new_values: row
                        .try_get::<Option<Json<serde_json::Value>>, _>("new_values")?
                        .map(|v| v.0),
                    ip_address: row.try_get("ip_address")?,
                    description: row.try_get("description")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
