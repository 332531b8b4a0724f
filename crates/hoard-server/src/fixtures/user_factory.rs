//! User fixtures with hashed passwords.

use std::sync::Arc;

use anyhow::{Context, Result};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use sqlx::PgPool;

use crate::models::{NewUser, User};
use crate::repository;
use crate::security::UserPasswordHasher;

/// Pool the generated usernames are drawn from.
pub const USERNAMES: &[&str] = &[
    "FlamingInferno",
    "ScaleSorcerer",
    "TheDragonWithBadBreath",
    "BurnedOut",
    "ForgotMyOwnName",
    "ClumsyClaws",
    "HoarderOfUselessTrinkets",
];

/// Plaintext every fixture user starts with.
pub const DEFAULT_PASSWORD: &str = "password";

/// Attempts before giving up on a unique email/username.
const MAX_CREATE_ATTEMPTS: usize = 5;

type Hook = Box<dyn Fn(&mut NewUser) -> Result<()> + Send + Sync>;

/// Builds and persists randomized users.
///
/// Hooks registered with [`UserFactory::after_instantiate`] run on every
/// built user, in registration order. The password hashing hook is
/// registered by [`UserFactory::new`].
pub struct UserFactory {
    hooks: Vec<Hook>,
}

impl UserFactory {
    pub fn new(hasher: Arc<dyn UserPasswordHasher>) -> Self {
        Self { hooks: Vec::new() }.after_instantiate(move |user| {
            let hashed = hasher.hash_password(&*user, &user.password)?;
            user.password = hashed;
            Ok(())
        })
    }

    /// Registers a hook run after each user is built.
    pub fn after_instantiate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut NewUser) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Random attribute values, password still in plaintext.
    pub fn defaults() -> NewUser {
        let index: usize = (0..USERNAMES.len()).fake();
        let suffix: u32 = (0..1000).fake();
        NewUser {
            email: SafeEmail().fake(),
            username: format!("{}{}", USERNAMES[index], suffix),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }

    /// Builds a user from the defaults and runs the hooks.
    pub fn instantiate(&self) -> Result<NewUser> {
        self.instantiate_with(Self::defaults())
    }

    /// Runs the hooks on caller-supplied attributes.
    pub fn instantiate_with(&self, mut user: NewUser) -> Result<NewUser> {
        for hook in &self.hooks {
            hook(&mut user)?;
        }
        Ok(user)
    }

    /// Builds and persists one user, retrying when the random email or
    /// username is already taken.
    pub async fn create_one(&self, pool: &PgPool) -> Result<User> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let user = self.instantiate()?;
            match repository::insert_user(pool, &user).await {
                Ok(created) => {
                    tracing::debug!(user_id = created.id, username = %created.username, "Created fixture user");
                    return Ok(created);
                }
                Err(sqlx::Error::Database(e))
                    if e.is_unique_violation() && attempt < MAX_CREATE_ATTEMPTS =>
                {
                    tracing::debug!(username = %user.username, "Fixture user collided, retrying");
                }
                Err(e) => return Err(e).context("Failed to insert fixture user"),
            }
        }
    }

    /// Persists a user built from caller-supplied attributes.
    pub async fn create_one_with(&self, pool: &PgPool, attributes: NewUser) -> Result<User> {
        let user = self.instantiate_with(attributes)?;
        repository::insert_user(pool, &user)
            .await
            .context("Failed to insert fixture user")
    }

    pub async fn create_many(&self, pool: &PgPool, count: usize) -> Result<Vec<User>> {
        let mut users = Vec::with_capacity(count);
        for _ in 0..count {
            users.push(self.create_one(pool).await?);
        }
        Ok(users)
    }
}
