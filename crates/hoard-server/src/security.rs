//! Hashing passwords on behalf of user records.

use std::sync::Arc;

use anyhow::{bail, Result};
use hoard_auth::PasswordHasher;

/// A record that can authenticate with a password.
pub trait PasswordAuthenticatedUser {
    /// Identifier the user logs in with.
    fn user_identifier(&self) -> &str;

    /// Stored password (a hash once persisted).
    fn password(&self) -> Option<&str>;
}

/// Hashes and checks passwords for a given user record.
pub trait UserPasswordHasher: Send + Sync {
    fn hash_password(&self, user: &dyn PasswordAuthenticatedUser, plaintext: &str)
        -> Result<String>;

    fn is_password_valid(
        &self,
        user: &dyn PasswordAuthenticatedUser,
        plaintext: &str,
    ) -> Result<bool>;
}

/// Default [`UserPasswordHasher`] delegating to a [`PasswordHasher`].
#[derive(Clone)]
pub struct NativeUserPasswordHasher {
    hasher: Arc<dyn PasswordHasher>,
}

impl NativeUserPasswordHasher {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { hasher }
    }
}

impl UserPasswordHasher for NativeUserPasswordHasher {
    fn hash_password(
        &self,
        user: &dyn PasswordAuthenticatedUser,
        plaintext: &str,
    ) -> Result<String> {
        if user.user_identifier().is_empty() {
            bail!("Cannot hash a password for a user without an identifier");
        }
        tracing::debug!(
            user = %user.user_identifier(),
            hasher = %self.hasher.hasher_name(),
            "Hashing user password"
        );
        self.hasher.hash_password(plaintext)
    }

    fn is_password_valid(
        &self,
        user: &dyn PasswordAuthenticatedUser,
        plaintext: &str,
    ) -> Result<bool> {
        match user.password() {
            Some(hash) if !hash.is_empty() => self.hasher.verify_password(plaintext, hash),
            _ => Ok(false),
        }
    }
}
