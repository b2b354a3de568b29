use super::AuthError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;

/// Hash a password for storage
pub fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored hash
pub fn verify_password(
    hasher: &Argon2<'_>,
    password: &str,
    hash: &str,
) -> Result<bool, AuthError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::Hashing(format!("Invalid hash format: {}", e)))?;

    Ok(hasher
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
