use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

use crate::auth::AuthError;

/// Argon2id with the OWASP-recommended cost parameters:
/// 64 MiB of memory, 3 iterations, 1 lane.
fn hasher() -> Argon2<'static> {
    let params = Params::new(64 * 1024, 3, 1, None).expect("argon2 params are valid");
    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
}

/// Hash a plaintext password with a fresh random salt.
///
/// Returns the PHC string, which carries the algorithm, parameters and salt
/// alongside the digest. The output differs between calls for the same input.
pub fn hash(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored PHC string.
pub fn verify(stored: &str, plaintext: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hash(e.to_string()))?;

    match hasher().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash("correct horse battery staple").expect("hashing failed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify(&hash, "correct horse battery staple").unwrap());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash("right password").expect("hashing failed");

        assert!(!verify(&hash, "wrong password").unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash("same input").expect("hashing failed");
        let second = hash("same input").expect("hashing failed");

        // Fresh salt per call
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_stored_hash_is_an_error() {
        assert!(verify("not a phc string", "anything").is_err());
    }
}
