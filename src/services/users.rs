//! User accounts

use chrono::Utc;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditSeverity};
use crate::database::Store;
use crate::error::{AppError, AppResult};
use crate::models::{AuditAction, AuditLog, User, UserRole, UserStatus};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub wallet_address: Option<String>,
}

/// `salt$sha256(salt || password)`, both hex
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    format!("{}${}", salt, salted_digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, password) == digest,
        None => false,
    }
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn is_wallet_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn check_wallet(wallet: Option<&str>) -> AppResult<()> {
    match wallet {
        Some(w) if !is_wallet_address(w) => Err(AppError::validation(
            "wallet_address must be 0x followed by 40 hex digits",
        )),
        _ => Ok(()),
    }
}

pub struct UserService {
    store: Arc<dyn Store>,
    audit: Arc<AuditLogger>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditLogger>) -> Self {
        Self { store, audit }
    }

    pub async fn create(&self, request: CreateUser) -> AppResult<User> {
        if !request.email.contains('@') {
            return Err(AppError::validation("email is not valid"));
        }
        if request.username.trim().is_empty() {
            return Err(AppError::validation("username is required"));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        check_wallet(request.wallet_address.as_deref())?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: request.email.trim().to_lowercase(),
            username: request.username.trim().to_string(),
            password_hash: hash_password(&request.password),
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.role.unwrap_or(UserRole::User),
            status: UserStatus::Pending,
            profile_image: None,
            bio: request.bio,
            phone_number: request.phone_number,
            wallet_address: request.wallet_address,
            email_verified_at: None,
            last_login_at: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.audit
            .log(
                AuditLog::new(AuditAction::Create, "user", Some(user.id)).with_user(Some(user.id)),
                AuditSeverity::Info,
            )
            .await;
        Ok(user)
    }

    /// Check credentials and record the login time.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        let mut user = self
            .store
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.email == email)
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if !verify_password(password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
        if user.status == UserStatus::Suspended {
            return Err(AppError::Forbidden("Account is suspended".to_string()));
        }

        let now = Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        self.store.update_user(&user).await?;

        self.audit
            .log(
                AuditLog::new(AuditAction::Login, "user", Some(user.id)).with_user(Some(user.id)),
                AuditSeverity::Debug,
            )
            .await;
        Ok(user)
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn find(&self, id: Uuid) -> AppResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        check_wallet(changes.wallet_address.as_deref())?;
        let mut user = self.find(id).await?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(phone_number) = changes.phone_number {
            user.phone_number = Some(phone_number);
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(profile_image) = changes.profile_image {
            user.profile_image = Some(profile_image);
        }
        if let Some(wallet_address) = changes.wallet_address {
            user.wallet_address = Some(wallet_address);
        }
        user.updated_at = Utc::now();

        self.store.update_user(&user).await?;
        Ok(user)
    }

    pub async fn verify_email(&self, id: Uuid) -> AppResult<User> {
        let mut user = self.find(id).await?;
        let now = Utc::now();
        user.email_verified_at = Some(now);
        user.status = UserStatus::Active;
        user.updated_at = now;
        self.store.update_user(&user).await?;
        info!(user_id = %id, "Email verified");
        Ok(user)
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_user(id).await? {
            return Err(AppError::not_found("User"));
        }
        self.audit
            .log(
                AuditLog::new(AuditAction::Delete, "user", Some(id)),
                AuditSeverity::Warning,
            )
            .await;
        Ok(())
    }
}
