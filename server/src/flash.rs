use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::cookies::{Cookie, CookieJar};
use crate::state::AppState;

const FLASH_COOKIE_NAME: &str = "quill_flash";

/// Severity of a flash message; maps onto the banner styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Danger,
    Info,
    Warning,
}

impl Level {
    pub fn banner_classes(self) -> &'static str {
        match self {
            Level::Success => "bg-green-50 border-green-400 text-green-800",
            Level::Danger => "bg-red-50 border-red-400 text-red-800",
            Level::Info => "bg-blue-50 border-blue-400 text-blue-800",
            Level::Warning => "bg-yellow-50 border-yellow-400 text-yellow-800",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

/// One-shot messages carried across a redirect in a private cookie.
///
/// Messages pushed during one request are rendered (and cleared) by the next
/// page that calls [`FlashJar::take`].
pub struct FlashJar {
    jar: CookieJar,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for FlashJar {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await?;
        Ok(FlashJar { jar })
    }
}

impl FlashJar {
    pub fn push(&self, level: Level, message: impl Into<String>) {
        let mut pending = self.pending();
        pending.push(Flash {
            level,
            message: message.into(),
        });

        // Serializing a Vec<Flash> cannot fail
        let payload = serde_json::to_string(&pending).unwrap_or_default();
        let mut cookie = Cookie::new(FLASH_COOKIE_NAME, payload);
        cookie.set_path("/");
        cookie.set_http_only(true);
        self.jar.add(cookie);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn danger(&self, message: impl Into<String>) {
        self.push(Level::Danger, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(Level::Warning, message);
    }

    /// Drain the pending messages, clearing the cookie.
    pub fn take(&self) -> Vec<Flash> {
        let pending = self.pending();
        if !pending.is_empty() {
            let mut cookie = Cookie::new(FLASH_COOKIE_NAME, "");
            cookie.set_path("/");
            self.jar.remove(cookie);
        }
        pending
    }

    fn pending(&self) -> Vec<Flash> {
        self.jar
            .get(FLASH_COOKIE_NAME)
            .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
            .unwrap_or_default()
    }
}
