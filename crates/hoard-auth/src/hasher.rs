// Argon2id password hashing

use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;

/// One-way transform from a plaintext password to a storable credential.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a PHC-formatted string.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Checks a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is malformed.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool>;

    fn hasher_name(&self) -> &str;
}

/// Argon2id hasher with configurable cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Hasher {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Argon2Hasher {
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Cost preset for servers handling real credentials.
    pub fn production() -> Self {
        Self::new(65536, 4, 4)
    }

    /// Cheap preset for fixtures and tests.
    pub fn development() -> Self {
        Self::new(4096, 2, 1)
    }

    /// Looks up a preset by name (`default`, `production`, `development`).
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "production" => Ok(Self::production()),
            "development" => Ok(Self::development()),
            other => Err(anyhow!(
                "Unknown hasher preset '{}' (expected 'default', 'production' or 'development')",
                other
            )),
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| anyhow!("Invalid Argon2 parameters: {}", e))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(19456, 2, 1)
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow!("Malformed password hash: {}", e))?;
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn hasher_name(&self) -> &str {
        "argon2id"
    }
}
