use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// How long a password-reset token stays valid, in seconds.
pub const DEFAULT_RESET_TOKEN_MAX_AGE: u64 = 1800;

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    /// The user this token permits a password change for.
    sub: i64,
    iat: i64,
    exp: i64,
}

/// Issues and verifies the signed, self-contained tokens used by the
/// password-reset flow.
///
/// Tokens are HS256 JWTs carrying `{sub, iat, exp}` and nothing else. The
/// signing key is fixed at startup and never rotated while the process runs.
/// There is no revocation list: a token remains valid until its expiry, even
/// if the password changes in the meantime.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    max_age_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: &[u8], max_age_secs: u64) -> Self {
        let mut validation = Validation::default();
        // The spec'd expiry is exact; the default 60s leeway would keep
        // short-lived tokens alive past it.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            max_age_secs,
        }
    }

    /// Produce a signed token for `user_id`, expiring `max_age_secs` from now.
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = ResetClaims {
            sub: user_id,
            iat: now,
            exp: now + self.max_age_secs as i64,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthError::InvalidToken)
    }

    /// Check signature and expiry, returning the embedded user id.
    ///
    /// A bad signature, an undecodable payload and an expired token all
    /// collapse into the same failure; callers present them as one
    /// "invalid or expired" outcome.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        decode::<ResetClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test secret", DEFAULT_RESET_TOKEN_MAX_AGE)
    }

    #[test]
    fn issue_then_verify_returns_the_user_id() {
        let signer = signer();
        let token = signer.issue(42).unwrap();

        assert_eq!(signer.verify(&token).unwrap(), 42);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = TokenSigner::new(b"different secret", DEFAULT_RESET_TOKEN_MAX_AGE);
        let token = other.issue(42).unwrap();

        assert!(matches!(
            signer().verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = signer();
        let mut token = signer.issue(42).unwrap();

        // Flip a character in the payload segment
        let mid = token.len() / 2;
        let replacement = if token.as_bytes()[mid] == b'A' { 'B' } else { 'A' };
        token.replace_range(mid..=mid, &replacement.to_string());

        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            signer().verify("not a token at all"),
            Err(AuthError::InvalidToken)
        ));
    }
}
