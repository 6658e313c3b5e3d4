use anyhow::Context;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use secrecy::{ExposeSecret, Secret};

/// Hash a plaintext password with a fresh random salt.
///
/// Argon2id with the crate defaults; the plaintext is never stored or
/// logged.
pub fn hash_password(password: &Secret<String>) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .context("Failed to hash password")?
        .to_string();

    Ok(hash)
}

/// Verify a plaintext password against a stored PHC-format hash.
///
/// Returns `Ok(false)` on a mismatch; only infrastructure problems (a
/// corrupt stored hash) surface as errors.
pub fn verify_password(
    password: &Secret<String>,
    password_hash: &Secret<String>,
) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(password_hash.expose_secret())
        .context("Failed to parse stored password hash")?;

    match Argon2::default().verify_password(password.expose_secret().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e).context("Failed to verify password hash"),
    }
}
