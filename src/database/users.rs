//! User Repository - PostgreSQL operations for users using sqlx

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::pool::parse_text;
use crate::error::AppResult;
use crate::models::User;

const USER_COLUMNS: &str = r#"
    id, email, username, password_hash, first_name, last_name, role, status,
    profile_image, bio, phone_number, wallet_address, email_verified_at,
    last_login_at, metadata, created_at, updated_at
"#;

pub struct UserRepository {
    pool: PgPool,
}

fn user_from_row(row: &PgRow) -> AppResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        role: parse_text(row.try_get("role")?)?,
        status: parse_text(row.try_get("status")?)?,
        profile_image: row.try_get("profile_image")?,
        bio: row.try_get("bio")?,
        phone_number: row.try_get("phone_number")?,
        wallet_address: row.try_get("wallet_address")?,
        email_verified_at: row.try_get("email_verified_at")?,
        last_login_at: row.try_get("last_login_at")?,
        metadata: row
            .try_get::<Option<Json<serde_json::Value>>, _>("metadata")?
            .map(|m| m.0),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users
            (id, email, username, password_hash, first_name, last_name, role, status,
             profile_image, bio, phone_number, wallet_address, email_verified_at,
             last_login_at, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(&user.profile_image)
        .bind(&user.bio)
        .bind(&user.phone_number)
        .bind(&user.wallet_address)
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.metadata.as_ref().map(Json))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user.id, "User created");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(user_from_row).collect()
    }

    pub async fn update(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2, username = $3, password_hash = $4, first_name = $5,
                last_name = $6, role = $7, status = $8, profile_image = $9, bio = $10,
                phone_number = $11, wallet_address = $12, email_verified_at = $13,
                last_login_at = $14, metadata = $15, updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(&user.profile_image)
        .bind(&user.bio)
        .bind(&user.phone_number)
        .bind(&user.wallet_address)
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.metadata.as_ref().map(Json))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::AppError::not_found("User"));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
