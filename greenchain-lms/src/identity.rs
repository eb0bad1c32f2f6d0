//! Identity provider
//!
//! Issues and validates bearer tokens and owns user profile metadata. The
//! services only see the [`IdentityProvider`] trait; [`SqliteIdentityProvider`]
//! is the implementation the server runs with.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use greenchain_common::api::{generate_token, hash_password, hash_token, verify_password};
use greenchain_common::models::{MetadataUpdate, Role, User, UserMetadata};
use greenchain_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// New account request
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account. Duplicate email is a `Conflict`.
    async fn sign_up(&self, request: SignUp) -> Result<User>;

    /// Exchange credentials for a bearer token
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Resolve a bearer token to its user, `Unauthorized` when unknown or expired
    async fn verify_token(&self, token: &str) -> Result<User>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Merge `update` into the user's metadata and return the updated user
    async fn update_metadata(&self, user_id: &str, update: MetadataUpdate) -> Result<User>;
}

/// Users and sessions stored in the `users` / `sessions` tables
#[derive(Clone)]
pub struct SqliteIdentityProvider {
    pool: SqlitePool,
    session_ttl: Duration,
}

type UserRow = (String, String, String, String);

impl SqliteIdentityProvider {
    pub fn new(pool: SqlitePool, session_ttl: Duration) -> Self {
        Self { pool, session_ttl }
    }

    fn user_from_row((guid, email, metadata, created_at): UserRow) -> Result<User> {
        let metadata: UserMetadata = serde_json::from_str(&metadata)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Internal(format!("Bad created_at for user {}: {}", guid, e)))?
            .with_timezone(&Utc);
        Ok(User::from_parts(guid, email, metadata, created_at))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn sign_up(&self, request: SignUp) -> Result<User> {
        let email = normalize_email(&request.email);
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidInput(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let guid = Uuid::new_v4().to_string();
        let password = request.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))??;
        let metadata = UserMetadata {
            name: request.name.trim().to_string(),
            role: request.role,
            ..Default::default()
        };
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (guid, email, password_hash, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&guid)
        .bind(&email)
        .bind(&password_hash)
        .bind(serde_json::to_string(&metadata)?)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(Error::Conflict(
                    "A user with this email address has already been registered".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        info!("Created user {} ({})", guid, metadata.role.as_str());
        Ok(User::from_parts(guid, email, metadata, now))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let row: Option<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT guid, email, metadata, created_at, password_hash
            FROM users WHERE email = ?
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some((guid, email, metadata, created_at, password_hash)) = row else {
            return Err(Error::Unauthorized("Invalid login credentials".to_string()));
        };
        let password = password.to_string();
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))?;
        if !verified {
            return Err(Error::Unauthorized("Invalid login credentials".to_string()));
        }

        let user = Self::user_from_row((guid, email, metadata, created_at))?;
        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at_ms <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_guid, expires_at_ms, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(hash_token(&token))
        .bind(&user.id)
        .bind(expires_at.timestamp_millis())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Issued session for user {}", user.id);
        Ok(Session {
            access_token: token,
            expires_at,
            user,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT u.guid, u.email, u.metadata, u.created_at
            FROM sessions s
            JOIN users u ON u.guid = s.user_guid
            WHERE s.token_hash = ? AND s.expires_at_ms > ?
            "#,
        )
        .bind(hash_token(token))
        .bind(Utc::now().timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::user_from_row(row),
            None => Err(Error::Unauthorized("Invalid or expired token".to_string())),
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT guid, email, metadata, created_at FROM users WHERE guid = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::user_from_row).transpose()
    }

    async fn update_metadata(&self, user_id: &str, update: MetadataUpdate) -> Result<User> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT guid, email, metadata, created_at FROM users WHERE guid = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((guid, email, metadata, created_at)) = row else {
            return Err(Error::NotFound(format!("User {}", user_id)));
        };

        let mut metadata: UserMetadata = serde_json::from_str(&metadata)?;
        metadata.apply(&update);

        sqlx::query("UPDATE users SET metadata = ?, updated_at = ? WHERE guid = ?")
            .bind(serde_json::to_string(&metadata)?)
            .bind(Utc::now().to_rfc3339())
            .bind(&guid)
            .execute(&self.pool)
            .await?;

        Self::user_from_row((guid, email, serde_json::to_string(&metadata)?, created_at))
    }
}
