#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quill::mail::Mailer;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// A migrated in-memory database. Limited to a single connection: every
/// connection would otherwise see its own empty `:memory:` instance.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    sqlx::migrate!().run(&pool).await.expect("migrations failed");

    pool
}

#[derive(Debug)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Stands in for the SMTP transport and remembers everything handed to it.
#[derive(Default, Clone)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> color_eyre::Result<()> {
        self.sent.lock().expect("mailer lock poisoned").push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
