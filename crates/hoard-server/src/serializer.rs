//! Exposure groups and (de)normalization of resources.
//!
//! Every exposed field is listed in a static table together with the
//! groups it belongs to. An operation picks its groups; the normalizer
//! emits only fields in one of them, and the denormalizer only accepts
//! writable keys. Fields missing from the tables (`isPublished`,
//! `password`) never cross the API boundary.

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::user::parse_user_iri;
use crate::models::{DragonTreasure, UserWithTreasures};

/// Named exposure group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    TreasureRead,
    TreasureItemGet,
    TreasureWrite,
    UserRead,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::TreasureRead => "treasure:read",
            Group::TreasureItemGet => "treasure:item:get",
            Group::TreasureWrite => "treasure:write",
            Group::UserRead => "user:read",
        }
    }
}

/// A field and the groups it is exposed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldExposure {
    pub name: &'static str,
    pub groups: &'static [Group],
}

impl FieldExposure {
    pub fn is_exposed_in(&self, groups: &[Group]) -> bool {
        self.groups.iter().any(|g| groups.contains(g))
    }
}

const fn field(name: &'static str, groups: &'static [Group]) -> FieldExposure {
    FieldExposure { name, groups }
}

use Group::{TreasureRead, TreasureWrite, UserRead};

/// Readable treasure fields.
pub const TREASURE_READ_FIELDS: &[FieldExposure] = &[
    field("id", &[TreasureRead, UserRead]),
    field("name", &[TreasureRead, TreasureWrite, UserRead]),
    field("description", &[TreasureRead, UserRead]),
    field("value", &[TreasureRead, TreasureWrite, UserRead]),
    field("coolFactor", &[TreasureRead, TreasureWrite, UserRead]),
    field("createdAt", &[TreasureRead]),
    field("updatedAt", &[TreasureRead]),
    field("owner", &[TreasureRead, TreasureWrite]),
    field("shortDescription", &[TreasureRead]),
];

/// Writable treasure keys. `description` is routed through the
/// line-break normalizing `set_text_description`.
pub const TREASURE_WRITE_FIELDS: &[FieldExposure] = &[
    field("name", &[TreasureWrite]),
    field("description", &[TreasureWrite]),
    field("value", &[TreasureWrite]),
    field("coolFactor", &[TreasureWrite]),
    field("owner", &[TreasureWrite]),
];

/// Readable user fields.
pub const USER_READ_FIELDS: &[FieldExposure] = &[
    field("id", &[UserRead]),
    field("email", &[UserRead]),
    field("username", &[UserRead]),
    field("dragonTreasures", &[UserRead]),
];

/// Groups and optional property projection for one normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationContext {
    pub groups: Vec<Group>,
    /// Only these properties are emitted when set.
    pub properties: Option<Vec<String>>,
}

impl NormalizationContext {
    pub fn new(groups: &[Group]) -> Self {
        Self {
            groups: groups.to_vec(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Option<Vec<String>>) -> Self {
        self.properties = properties;
        self
    }

    /// Context for embedded resources: same groups, no projection.
    fn embedded(&self) -> Self {
        Self::new(&self.groups)
    }

    fn allows(&self, field: &FieldExposure) -> bool {
        if !field.is_exposed_in(&self.groups) {
            return false;
        }
        match &self.properties {
            Some(properties) => properties.iter().any(|p| p == field.name),
            None => true,
        }
    }
}

/// A resource that can be normalized through its read field table.
pub trait Resource {
    const READ_FIELDS: &'static [FieldExposure];

    fn iri(&self) -> Option<String>;

    /// Value of one readable field; `None` for names the resource does not know.
    fn read_field(&self, name: &str, context: &NormalizationContext) -> Option<Value>;
}

/// Normalizes a resource into a JSON object holding the fields allowed by `context`.
pub fn normalize<R: Resource>(resource: &R, context: &NormalizationContext) -> Value {
    let mut object = Map::new();
    if let Some(iri) = resource.iri() {
        object.insert("@id".to_string(), Value::String(iri));
    }
    for field in R::READ_FIELDS.iter().filter(|f| context.allows(f)) {
        if let Some(value) = resource.read_field(field.name, context) {
            object.insert(field.name.to_string(), value);
        }
    }
    Value::Object(object)
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

impl Resource for DragonTreasure {
    const READ_FIELDS: &'static [FieldExposure] = TREASURE_READ_FIELDS;

    fn iri(&self) -> Option<String> {
        DragonTreasure::iri(self)
    }

    fn read_field(&self, name: &str, _context: &NormalizationContext) -> Option<Value> {
        let value = match name {
            "id" => self.id().map_or(Value::Null, Value::from),
            "name" => optional_string(self.name()),
            "description" => optional_string(self.description()),
            "value" => Value::from(self.value()),
            "coolFactor" => Value::from(self.cool_factor()),
            "createdAt" => Value::String(self.created_at().to_rfc3339()),
            "updatedAt" => Value::String(self.updated_at().to_rfc3339()),
            "owner" => self.owner().map_or(Value::Null, |o| Value::String(o.iri())),
            "shortDescription" => optional_string(self.short_description().as_deref()),
            _ => return None,
        };
        Some(value)
    }
}

impl Resource for UserWithTreasures {
    const READ_FIELDS: &'static [FieldExposure] = USER_READ_FIELDS;

    fn iri(&self) -> Option<String> {
        Some(self.user.iri())
    }

    fn read_field(&self, name: &str, context: &NormalizationContext) -> Option<Value> {
        let value = match name {
            "id" => Value::from(self.user.id),
            "email" => Value::String(self.user.email.clone()),
            "username" => Value::String(self.user.username.clone()),
            "dragonTreasures" => {
                let embedded = context.embedded();
                Value::Array(
                    self.treasures
                        .iter()
                        .map(|t| normalize(t, &embedded))
                        .collect(),
                )
            }
            _ => return None,
        };
        Some(value)
    }
}

/// Owner reference found in a write body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRef {
    /// Explicit `null`.
    Null,
    Id(i64),
}

/// Writable treasure attributes decoded from a request body.
///
/// Each field is `None` when the key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreasureInput {
    pub name: Option<String>,
    pub text_description: Option<String>,
    pub value: Option<i32>,
    pub cool_factor: Option<i32>,
    pub owner: Option<OwnerRef>,
}

impl TreasureInput {
    /// Decodes a JSON object through the given write groups.
    ///
    /// Keys that are not writable in `groups` are ignored.
    pub fn from_json(body: &Value, groups: &[Group]) -> Result<Self, AppError> {
        let object = body.as_object().ok_or_else(|| {
            AppError::BadRequest(format!(
                "Expected a JSON object, \"{}\" given.",
                json_type_name(body)
            ))
        })?;

        let mut input = TreasureInput::default();
        for (key, value) in object {
            let writable = TREASURE_WRITE_FIELDS
                .iter()
                .any(|f| f.name == key && f.is_exposed_in(groups));
            if !writable {
                tracing::debug!(attribute = %key, "Ignoring non-writable attribute");
                continue;
            }
            match key.as_str() {
                "name" => input.name = Some(expect_string(key, value)?),
                "description" => input.text_description = Some(expect_string(key, value)?),
                "value" => input.value = Some(expect_int(key, value)?),
                "coolFactor" => input.cool_factor = Some(expect_int(key, value)?),
                "owner" => input.owner = Some(parse_owner(value)?),
                _ => {}
            }
        }
        Ok(input)
    }

    /// Applies the scalar attributes. The owner is resolved by the caller.
    pub fn apply(&self, treasure: &mut DragonTreasure) {
        if let Some(name) = &self.name {
            treasure.set_name(name.clone());
        }
        if let Some(description) = &self.text_description {
            treasure.set_text_description(description);
        }
        if let Some(value) = self.value {
            treasure.set_value(value);
        }
        if let Some(cool_factor) = self.cool_factor {
            treasure.set_cool_factor(cool_factor);
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "array",
    }
}

fn type_error(attribute: &str, expected: &str, given: &Value) -> AppError {
    AppError::BadRequest(format!(
        "The type of the \"{}\" attribute must be \"{}\", \"{}\" given.",
        attribute,
        expected,
        json_type_name(given)
    ))
}

fn expect_string(attribute: &str, value: &Value) -> Result<String, AppError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_error(attribute, "string", value))
}

fn expect_int(attribute: &str, value: &Value) -> Result<i32, AppError> {
    let number = value
        .as_i64()
        .ok_or_else(|| type_error(attribute, "int", value))?;
    i32::try_from(number).map_err(|_| {
        AppError::BadRequest(format!(
            "The \"{}\" attribute is out of range: {}",
            attribute, number
        ))
    })
}

fn parse_owner(value: &Value) -> Result<OwnerRef, AppError> {
    match value {
        Value::Null => Ok(OwnerRef::Null),
        Value::String(iri) => parse_user_iri(iri)
            .map(OwnerRef::Id)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid IRI \"{}\".", iri))),
        Value::Number(n) => n
            .as_i64()
            .map(OwnerRef::Id)
            .ok_or_else(|| type_error("owner", "IRI", value)),
        other => Err(type_error("owner", "IRI", other)),
    }
}
