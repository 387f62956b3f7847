use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha512};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::tokens::{TokenSigner, DEFAULT_RESET_TOKEN_MAX_AGE};

/// Immutable configuration, read once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute URL prefix used when building links that leave the app,
    /// such as the reset link in mails.
    pub base_url: String,
    pub port: u16,
    /// Where uploaded profile pictures are written and served from.
    pub uploads_dir: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub cookie_key: tower_cookies::Key,
    pub tokens: Arc<TokenSigner>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble the state from its parts. The cookie key is derived from the
    /// same process-wide secret that signs reset tokens.
    pub fn new(
        db: SqlitePool,
        secret: &[u8],
        reset_token_max_age: u64,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        let cookie_key = tower_cookies::Key::from(Sha512::digest(secret).as_slice());

        Self {
            db,
            cookie_key,
            tokens: Arc::new(TokenSigner::new(secret, reset_token_max_age)),
            mailer,
            config: Arc::new(config),
        }
    }

    pub async fn from_env() -> color_eyre::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:quill.db".to_string());
        let pool = setup_db_pool(&database_url).await?;

        let secret = secret_from_env()?;

        let reset_token_max_age = match std::env::var("RESET_TOKEN_MAX_AGE") {
            Ok(raw) => raw.parse()?,
            Err(_) => DEFAULT_RESET_TOKEN_MAX_AGE,
        };

        let config = Config {
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: match std::env::var("PORT") {
                Ok(raw) => raw.parse()?,
                Err(_) => 3000,
            },
            uploads_dir: std::env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
        };
        std::fs::create_dir_all(&config.uploads_dir)?;

        Ok(Self::new(
            pool,
            &secret,
            reset_token_max_age,
            mailer_from_env()?,
            config,
        ))
    }
}

/// Read `SECRET_KEY` (base64), or generate a throwaway secret.
///
/// A generated secret invalidates all sessions and outstanding reset tokens
/// on restart, so it is only suitable for local development.
fn secret_from_env() -> color_eyre::Result<Vec<u8>> {
    match std::env::var("SECRET_KEY") {
        Ok(encoded) => Ok(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?),
        Err(_) => {
            let mut secret = vec![0u8; 64];
            rand::thread_rng().fill_bytes(&mut secret);
            warn!(
                "SECRET_KEY is not set; generated a one-off secret. \
                 Sessions and reset tokens will not survive a restart. \
                 Run `generate-key` and export the result to pin one."
            );
            Ok(secret)
        }
    }
}

fn mailer_from_env() -> color_eyre::Result<Arc<dyn Mailer>> {
    let (Ok(host), Ok(username), Ok(password)) = (
        std::env::var("SMTP_HOST"),
        std::env::var("SMTP_USERNAME"),
        std::env::var("SMTP_PASSWORD"),
    ) else {
        warn!("SMTP_* not fully configured; outbound mail will be logged instead of sent");
        return Ok(Arc::new(LogMailer));
    };

    let port = match std::env::var("SMTP_PORT") {
        Ok(raw) => raw.parse()?,
        Err(_) => 587,
    };
    let from = std::env::var("MAIL_FROM")
        .unwrap_or_else(|_| "Quill <noreply@quill.example>".to_string());

    Ok(Arc::new(SmtpMailer::new(
        &host, port, username, password, &from,
    )?))
}

#[tracing::instrument(err)]
pub async fn setup_db_pool(database_url: &str) -> color_eyre::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}
