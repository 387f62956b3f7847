use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::cookies::{Cookie, CookieJar};
use crate::mail::Mailer;
use crate::password;
use crate::state::AppState;
use crate::tokens::TokenSigner;
use crate::user::{Session, User};

/// Cookie name for storing the session ID
pub const SESSION_COOKIE_NAME: &str = "quill_session";

/// Server-side lifetime of a "remember me" session, in days.
pub const REMEMBERED_SESSION_DAYS: i64 = 30;

/// Server-side lifetime of a plain session. The cookie itself dies with the
/// browser; this is the backstop for clients that never close.
pub const SESSION_DAYS: i64 = 1;

/// Everything that can go wrong inside the auth flows. Each variant is
/// converted locally into a flash message and a redirect; none of them are
/// fatal to the process.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration or profile update collided with an existing username or
    /// email. The two cases are deliberately not distinguished.
    #[error("username or email already taken")]
    DuplicateKey,
    /// Unknown email or wrong password; callers must not reveal which.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Bad signature, undecodable payload or expired reset token.
    #[error("invalid or expired token")]
    InvalidToken,
    /// The identity a flow was operating on no longer exists.
    #[error("account no longer exists")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Register a new account. Hashes the password and inserts the identity;
/// success does not log the user in.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    plaintext_password: &str,
) -> Result<User, AuthError> {
    let password_hash = password::hash(plaintext_password)?;
    let user = User::create(pool, username, email, &password_hash).await?;

    info!(user_id = user.user_id, "registered new account");
    Ok(user)
}

/// Check an email/password pair against the store.
///
/// An unknown email and a wrong password produce the same
/// [`AuthError::InvalidCredentials`], so the outcome never reveals which
/// half was wrong.
pub async fn authenticate(
    pool: &SqlitePool,
    email: &str,
    plaintext_password: &str,
) -> Result<User, AuthError> {
    let Some(user) = User::get_by_email(pool, email).await? else {
        return Err(AuthError::InvalidCredentials);
    };

    if password::verify(&user.password_hash, plaintext_password)? {
        Ok(user)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Issue a reset token for the account behind `email` and hand the reset
/// link to the mailer.
///
/// An unknown email is a silent no-op: callers show the same outcome either
/// way, so the form cannot be used to probe which addresses are registered.
/// Mail delivery is fire-and-forget; a transport failure is logged and
/// otherwise swallowed.
pub async fn request_password_reset(
    pool: &SqlitePool,
    signer: &TokenSigner,
    mailer: &dyn Mailer,
    base_url: &str,
    email: &str,
) -> Result<(), AuthError> {
    let Some(user) = User::get_by_email(pool, email).await? else {
        info!("password reset requested for unknown email");
        return Ok(());
    };

    let token = signer.issue(user.user_id)?;
    let body = format!(
        "To reset your password, visit the following link:\n\
         {base_url}/reset_password/{token}\n\
         \n\
         If you did not make this request then simply ignore this email \
         and no changes will be made.\n"
    );

    if let Err(err) = mailer
        .send(&user.email, "Password Reset Request", &body)
        .await
    {
        error!(error = ?err, "failed to send password reset mail");
    }

    Ok(())
}

/// Verify a reset token and replace the account's password.
///
/// The token is not consumed: until it expires, it can complete any number
/// of resets. Other outstanding tokens for the same user are untouched.
pub async fn complete_password_reset(
    pool: &SqlitePool,
    signer: &TokenSigner,
    token: &str,
    new_plaintext_password: &str,
) -> Result<User, AuthError> {
    let user_id = signer.verify(token)?;

    let Some(user) = User::get_by_id(pool, user_id).await? else {
        return Err(AuthError::NotFound);
    };

    let password_hash = password::hash(new_plaintext_password)?;
    User::update_password(pool, user.user_id, &password_hash).await?;

    info!(user_id = user.user_id, "password reset completed");
    Ok(user)
}

// ---------------------------------------------------------------------------
// Session management
// ---------------------------------------------------------------------------

/// Create a new session for a user and set the session cookie.
///
/// With `remember`, the cookie persists for [`REMEMBERED_SESSION_DAYS`];
/// otherwise it is a browser-session cookie backed by a shorter server-side
/// expiry.
pub async fn create_session_and_set_cookie(
    state: &AppState,
    cookies: &CookieJar,
    user_id: i64,
    remember: bool,
) -> Result<Session, AuthError> {
    let duration_days = if remember {
        REMEMBERED_SESSION_DAYS
    } else {
        SESSION_DAYS
    };
    let session = Session::create(&state.db, user_id, duration_days).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session.session_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(std::env::var("PROTO").ok() == Some("https".to_owned()));
    if remember {
        cookie.set_max_age(time::Duration::days(duration_days));
    }
    cookies.add(cookie);

    info!(
        session_id = %session.session_id,
        user_id,
        remember,
        "created new session"
    );
    Ok(session)
}

/// Clear the session cookie and deactivate the session row.
///
/// Idempotent: with no cookie, or a cookie pointing at a session that no
/// longer exists, this quietly does nothing.
pub async fn end_session(state: &AppState, cookies: &CookieJar) -> Result<(), AuthError> {
    if let Some(session_id) = get_session_id_from_cookie(cookies) {
        invalidate_session(&state.db, session_id).await?;
    }

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookies.remove(cookie);

    Ok(())
}

/// Deactivate a session if it exists; a no-op otherwise.
pub async fn invalidate_session(pool: &SqlitePool, session_id: Uuid) -> Result<(), AuthError> {
    if let Some(mut session) = Session::get_by_id(pool, session_id).await? {
        session.invalidate(pool).await?;
        info!(%session_id, "session invalidated");
    }
    Ok(())
}

fn get_session_id_from_cookie(cookies: &CookieJar) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .and_then(|cookie| cookie.value().parse::<Uuid>().ok())
}

/// Look up a session and reject it if expired or deactivated.
pub async fn validate_session(
    pool: &SqlitePool,
    session_id: Uuid,
) -> Result<Option<Session>, AuthError> {
    let session = Session::get_by_id(pool, session_id).await?;

    if let Some(ref session) = session {
        if session.is_expired() {
            info!(%session_id, "session is expired");
            return Ok(None);
        }
        if !session.is_active {
            info!(%session_id, "session is inactive");
            return Ok(None);
        }
    }

    Ok(session)
}

/// Resolve a session id all the way to its user.
///
/// Anonymous (`None`) when the session is missing, expired, inactive, or
/// points at an account that has since been deleted.
pub async fn resolve_session_user(
    pool: &SqlitePool,
    session_id: Uuid,
) -> Result<Option<User>, AuthError> {
    let Some(session) = validate_session(pool, session_id).await? else {
        return Ok(None);
    };
    session.get_user(pool).await
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Extractor for pages that require a logged-in user.
///
/// An anonymous request is redirected to the login page, carrying the
/// original destination in `next` so login can come back to it.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned());
        let login = format!("/login?next={}", urlencoding::encode(&next));

        let OptionalUser(user) = OptionalUser::from_request_parts(parts, state).await?;
        match user {
            Some(user) => Ok(AuthUser(user)),
            None => Err(Redirect::to(&login).into_response()),
        }
    }
}

/// Extractor for pages that render differently for logged-in users but do
/// not require one.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_request_parts(parts, state).await?;

        let Some(session_id) = get_session_id_from_cookie(&cookies) else {
            return Ok(OptionalUser(None));
        };

        match resolve_session_user(&state.db, session_id).await {
            Ok(user) => Ok(OptionalUser(user)),
            Err(err) => {
                error!(%session_id, error = ?err, "error resolving session");
                Err(crate::errors::ServerError(
                    err.into(),
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_response())
            }
        }
    }
}
