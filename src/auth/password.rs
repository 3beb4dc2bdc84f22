use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    /// The stored digest is not a parseable PHC or modular-crypt string.
    #[error("stored password hash is corrupt: {0}")]
    Corrupt(String),
}

/// Scheme identifier of a `$<ident>$...` digest, e.g. `argon2id` or bcrypt's `2b`.
fn scheme_ident(digest: &str) -> Option<&str> {
    let ident = digest.strip_prefix('$')?.split('$').next()?;
    let well_formed = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    well_formed.then_some(ident)
}

/// Argon2id, default cost. Salt and parameters travel inside the PHC output.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plain.as_bytes(), &salt) {
        Ok(phc) => Ok(phc.to_string()),
        Err(e) => {
            error!(error = %e, "password hashing failed");
            Err(PasswordError::Hash(e.to_string()))
        }
    }
}

/// `Ok(false)` on a mismatch and on digests from other schemes (bcrypt, scrypt, ...).
/// Only a digest that cannot be read at all is an error.
pub fn verify_password(plain: &str, digest: &str) -> Result<bool, PasswordError> {
    match scheme_ident(digest) {
        Some(ident) if !ident.starts_with("argon2") => {
            warn!(scheme = ident, "stored hash uses an unsupported scheme");
            return Ok(false);
        }
        Some(_) => {}
        None => return Err(PasswordError::Corrupt("missing scheme identifier".into())),
    }

    let parsed = PasswordHash::new(digest).map_err(|e| {
        error!(error = %e, "stored argon2 hash does not parse");
        PasswordError::Corrupt(e.to_string())
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            warn!(error = %e, "argon2 verification failed");
            Ok(false)
        }
    }
}
