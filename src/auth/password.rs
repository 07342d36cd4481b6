//! bcrypt password hashing.

use thiserror::Error;

/// Work factor for every hash this crate produces.
pub const BCRYPT_COST: u32 = 12;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password does not match")]
    Mismatch,

    #[error("bcrypt failure: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash `plaintext` with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plaintext, BCRYPT_COST)?)
}

/// Check `plaintext` against a stored bcrypt hash.
///
/// A malformed hash is reported as [`PasswordError::Hash`], a wrong password
/// as [`PasswordError::Mismatch`].
pub fn verify_password(plaintext: &str, hash: &str) -> Result<(), PasswordError> {
    if bcrypt::verify(plaintext, hash)? {
        Ok(())
    } else {
        Err(PasswordError::Mismatch)
    }
}
