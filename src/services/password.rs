//! Room password hashing. Hashes are scrypt PHC strings, so the parameters travel with
//! the stored value and verification needs no configuration.

use scrypt::{
    Params, Scrypt,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::error::ServiceError;

const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const SCRYPT_LEN: usize = 32;

fn hash_blocking(password: &str, log_n: u8) -> Result<String, ServiceError> {
    let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, SCRYPT_LEN)
        .map_err(|err| ServiceError::Internal(format!("invalid scrypt parameters: {err}")))?;
    let salt = SaltString::generate(&mut OsRng);
    Scrypt
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))
}

fn verify_blocking(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Scrypt.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Hash `password` on the blocking pool.
pub async fn hash_password(password: String, log_n: u8) -> Result<String, ServiceError> {
    task::spawn_blocking(move || hash_blocking(&password, log_n))
        .await
        .map_err(|err| ServiceError::Internal(format!("hashing task failed: {err}")))?
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
pub async fn verify_password(password: String, stored: String) -> Result<bool, ServiceError> {
    task::spawn_blocking(move || verify_blocking(&password, &stored))
        .await
        .map_err(|err| ServiceError::Internal(format!("verification task failed: {err}")))
}
