//! User model: the owner side of every treasure.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::models::DragonTreasure;
use crate::security::PasswordAuthenticatedUser;
use crate::validation::{not_blank, violation};

/// IRI prefix under which users are addressed.
pub const USER_IRI_PREFIX: &str = "/api/users/";

/// A persisted user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[validate(custom(function = "validate_user_email"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    /// PHC-formatted password hash. Never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Data required to create a new user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Plaintext until a password hasher replaces it.
    pub password: String,
}

/// A user together with the treasures it owns, as exposed by the user endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithTreasures {
    pub user: User,
    pub treasures: Vec<DragonTreasure>,
}

impl User {
    /// Returns the IRI identifying this user.
    pub fn iri(&self) -> String {
        format!("{}{}", USER_IRI_PREFIX, self.id)
    }
}

impl PasswordAuthenticatedUser for User {
    fn user_identifier(&self) -> &str {
        &self.email
    }

    fn password(&self) -> Option<&str> {
        Some(&self.password)
    }
}

impl PasswordAuthenticatedUser for NewUser {
    fn user_identifier(&self) -> &str {
        &self.email
    }

    fn password(&self) -> Option<&str> {
        Some(&self.password)
    }
}

/// Parses a user IRI (`/api/users/42`) back into an id.
pub fn parse_user_iri(iri: &str) -> Option<i64> {
    iri.strip_prefix(USER_IRI_PREFIX)?.parse().ok()
}

fn validate_user_email(email: &str) -> Result<(), ValidationError> {
    not_blank(email)?;
    if !email.validate_email() {
        return Err(violation("email", "This value is not a valid email address."));
    }
    Ok(())
}
