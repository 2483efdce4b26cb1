//! Password hashing seam.
//!
//! The engine never stores or compares plain passwords itself: it goes
//! through a [`PasswordHasher`]. [`Argon2Hasher`] is the default.

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::{EngineError, ResultEngine};

pub trait PasswordHasher: fmt::Debug + Send + Sync {
    /// Hash `plain` into a self-describing string (salt included).
    fn hash(&self, plain: &str) -> ResultEngine<String>;

    /// `true` when `plain` matches `hash`. A malformed hash never matches.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Clone, Debug, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> ResultEngine<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| EngineError::PasswordHash(err.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}
