// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, which carry their own salt and
//! parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is unreadable: {0}")]
    InvalidHash(String),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is corrupt.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("pikachu").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pikachu", &hash).unwrap());
        assert!(!verify_password("raichu", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        assert_ne!(hash_password("pikachu").unwrap(), hash_password("pikachu").unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        assert!(matches!(
            verify_password("pikachu", "plaintext"),
            Err(PasswordError::InvalidHash(_))
        ));
    }
}
