use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use std::sync::OnceLock;

const DUMMY_PASSWORD: &str = "taskdesk-dummy-password";

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Returns false for a wrong password and for an unparseable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Runs a full verify against a throwaway hash so that a login for an unknown
/// email costs the same as one with a wrong password. Always false.
pub fn verify_dummy(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let hash = DUMMY_HASH.get_or_init(|| match hash_password(DUMMY_PASSWORD) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::error!("Failed to build dummy password hash: {}", e);
            None
        }
    });

    if let Some(hash) = hash {
        let _ = verify_password(password, hash);
    }
    false
}
