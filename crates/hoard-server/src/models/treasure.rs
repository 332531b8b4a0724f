//! Dragon treasure model: a sellable item owned by a user.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use validator::{Validate, ValidationError};

use crate::models::User;
use crate::validation::{not_blank, violation};

/// IRI prefix under which treasures are addressed.
pub const TREASURE_IRI_PREFIX: &str = "/api/treasures/";

/// Column list for selecting treasures joined with their owner (`t` and `u` aliases).
pub const TREASURE_COLUMNS: &str = "t.id, t.name, t.description, t.value, t.cool_factor, \
     t.is_published, t.created_at, t.updated_at, t.owner_id, \
     u.email AS owner_email, u.username AS owner_username, u.password AS owner_password";

/// Number of characters kept by [`DragonTreasure::short_description`].
const SHORT_DESCRIPTION_LENGTH: usize = 40;

/// A rare and valuable treasure.
///
/// Fields are only reachable through accessors. Setters return `&mut Self`
/// so a record can be configured in one chain:
///
/// ```ignore
/// let mut treasure = DragonTreasure::new();
/// treasure.set_name("Golden goblet").set_value(500).set_cool_factor(7);
/// ```
///
/// Setters never validate; constraints are checked by
/// [`crate::validation::validate_treasure`] before persistence.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct DragonTreasure {
    id: Option<i64>,
    #[validate(
        required(message = "This value should not be blank."),
        custom(function = "validate_loot_name")
    )]
    name: Option<String>,
    #[validate(
        required(message = "This value should not be blank."),
        custom(function = "not_blank")
    )]
    description: Option<String>,
    /// Estimated value of the treasure, in gold coins.
    #[validate(range(min = 0, message = "This value should be greater than or equal to 0."))]
    value: i32,
    #[validate(custom(function = "validate_cool_factor"))]
    cool_factor: i32,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[validate(required(message = "This value should not be null."), nested)]
    owner: Option<User>,
}

impl DragonTreasure {
    /// Creates an unsaved treasure with both timestamps set to now.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: None,
            description: None,
            value: 0,
            cool_factor: 0,
            is_published: false,
            created_at: now,
            updated_at: now,
            owner: None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Returns the IRI of a persisted treasure.
    pub fn iri(&self) -> Option<String> {
        self.id.map(|id| format!("{}{}", TREASURE_IRI_PREFIX, id))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Assigns the description verbatim.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Write-side alias of `description`: every line break becomes `<br />`.
    pub fn set_text_description(&mut self, description: &str) -> &mut Self {
        self.description = Some(normalize_line_breaks(description));
        self
    }

    /// First 40 characters of the description, with `...` appended when cut.
    pub fn short_description(&self) -> Option<String> {
        let description = self.description.as_deref()?;
        if description.chars().count() <= SHORT_DESCRIPTION_LENGTH {
            return Some(description.to_string());
        }
        let mut short: String = description.chars().take(SHORT_DESCRIPTION_LENGTH).collect();
        short.push_str("...");
        Some(short)
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) -> &mut Self {
        self.value = value;
        self
    }

    pub fn cool_factor(&self) -> i32 {
        self.cool_factor
    }

    pub fn set_cool_factor(&mut self, cool_factor: i32) -> &mut Self {
        self.cool_factor = cool_factor;
        self
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn set_is_published(&mut self, is_published: bool) -> &mut Self {
        self.is_published = is_published;
        self
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) -> &mut Self {
        self.created_at = created_at;
        self
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_updated_at(&mut self, updated_at: DateTime<Utc>) -> &mut Self {
        self.updated_at = updated_at;
        self
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) -> &mut Self {
        self.updated_at = Utc::now();
        self
    }

    pub fn owner(&self) -> Option<&User> {
        self.owner.as_ref()
    }

    pub fn set_owner(&mut self, owner: Option<User>) -> &mut Self {
        self.owner = owner;
        self
    }
}

impl Default for DragonTreasure {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> FromRow<'r, PgRow> for DragonTreasure {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let owner = User {
            id: row.try_get("owner_id")?,
            email: row.try_get("owner_email")?,
            username: row.try_get("owner_username")?,
            password: row.try_get("owner_password")?,
        };

        Ok(Self {
            id: Some(row.try_get("id")?),
            name: Some(row.try_get("name")?),
            description: Some(row.try_get("description")?),
            value: row.try_get("value")?,
            cool_factor: row.try_get("cool_factor")?,
            is_published: row.try_get("is_published")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            owner: Some(owner),
        })
    }
}

/// Replaces each line break (`\r\n`, `\n\r`, `\n` or `\r`) with `<br />`.
pub fn normalize_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push_str("<br />");
            }
            '\n' => {
                chars.next_if_eq(&'\r');
                out.push_str("<br />");
            }
            other => out.push(other),
        }
    }
    out
}

fn validate_loot_name(name: &str) -> Result<(), ValidationError> {
    not_blank(name)?;
    let length = name.chars().count();
    if length < 2 {
        return Err(violation(
            "length",
            "This value is too short. It should have 2 characters or more.",
        ));
    }
    if length > 50 {
        return Err(violation(
            "length",
            "Describe your loot in 50 characters or less",
        ));
    }
    Ok(())
}

fn validate_cool_factor(cool_factor: i32) -> Result<(), ValidationError> {
    if cool_factor < 0 {
        return Err(violation(
            "range",
            "This value should be greater than or equal to 0.",
        ));
    }
    if cool_factor > 10 {
        return Err(violation(
            "range",
            "This value should be less than or equal to 10.",
        ));
    }
    Ok(())
}
