//! Argon2id password hashing for credential accounts.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn hashing_error(stage: &'static str) -> impl FnOnce(password_hash::Error) -> anyhow::Error {
    move |e| {
        error!(error = %e, stage, "argon2 failure");
        anyhow::anyhow!("argon2 {stage}: {e}")
    }
}

/// PHC-formatted hash with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(hashing_error("hash"))?;
    Ok(phc.to_string())
}

/// Google-only accounts carry no hash and never match. A stored hash that
/// cannot be parsed is an error, not a mismatch.
pub fn verify_password(plain: &str, stored: Option<&str>) -> anyhow::Result<bool> {
    let Some(stored) = stored.filter(|h| !h.is_empty()) else {
        return Ok(false);
    };
    let phc = PasswordHash::new(stored).map_err(hashing_error("parse"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &phc)
        .is_ok())
}
