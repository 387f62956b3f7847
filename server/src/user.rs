use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::auth::AuthError;

/// Value of `image_file` before a user has uploaded a picture.
pub const DEFAULT_IMAGE_FILE: &str = "default.svg";

/// A registered account.
///
/// `username` and `email` are unique (case-sensitively) across all users;
/// the database enforces this. `password_hash` is an argon2 PHC string and
/// is only ever replaced wholesale, never read back as a plaintext.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Reference to the profile picture under the uploads directory.
    pub image_file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A login session resolvable from the session cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        user_id: row.get("user_id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        image_file: row.get("image_file"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

impl User {
    /// Insert a new account. A username or email collision surfaces as
    /// [`AuthError::DuplicateKey`]; the two cases are not distinguished.
    pub async fn create(
        pool: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, image_file, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(DEFAULT_IMAGE_FILE)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::DuplicateKey
            } else {
                AuthError::Database(err)
            }
        })?;

        Ok(user_from_row(&row))
    }

    pub async fn get_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, AuthError> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    /// Update username, email and (optionally) the profile picture reference.
    ///
    /// Concurrent updates to the same account are last-write-wins; the
    /// database serializes them and nothing else coordinates.
    pub async fn update_profile(
        pool: &SqlitePool,
        user_id: i64,
        username: &str,
        email: &str,
        image_file: Option<&str>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $1,
                email = $2,
                image_file = COALESCE($3, image_file),
                updated_at = $4
            WHERE user_id = $5
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(image_file)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::DuplicateKey
            } else {
                AuthError::Database(err)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    /// Replace the stored password hash.
    pub async fn update_password(
        pool: &SqlitePool,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = $2 WHERE user_id = $3",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, AuthError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(pool)
            .await?;
        Ok(row.get("n"))
    }
}

impl Session {
    /// Create a new session for a user
    pub async fn create(
        pool: &SqlitePool,
        user_id: i64,
        duration_days: i64,
    ) -> Result<Session, AuthError> {
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(duration_days);

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, expires_at, is_active, created_at)
            VALUES ($1, $2, $3, TRUE, $4)
            "#,
        )
        .bind(session_id.to_string())
        .bind(user_id)
        .bind(expires_at)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(Session {
            session_id,
            user_id,
            expires_at,
            is_active: true,
            created_at: now,
        })
    }

    pub async fn get_by_id(
        pool: &SqlitePool,
        session_id: Uuid,
    ) -> Result<Option<Session>, AuthError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE session_id = $1")
            .bind(session_id.to_string())
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| Session {
            session_id,
            user_id: r.get("user_id"),
            expires_at: r.get("expires_at"),
            is_active: r.get("is_active"),
            created_at: r.get("created_at"),
        }))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Deactivate this session. Resolving it afterwards yields anonymous.
    pub async fn invalidate(&mut self, pool: &SqlitePool) -> Result<(), AuthError> {
        sqlx::query("UPDATE sessions SET is_active = FALSE WHERE session_id = $1")
            .bind(self.session_id.to_string())
            .execute(pool)
            .await?;

        self.is_active = false;
        Ok(())
    }

    /// Resolve the owning user; `None` if the account has since been deleted.
    pub async fn get_user(&self, pool: &SqlitePool) -> Result<Option<User>, AuthError> {
        User::get_by_id(pool, self.user_id).await
    }
}
