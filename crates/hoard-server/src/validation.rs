//! Constraint checking and violation reporting.
//!
//! Records declare their constraints with `validator` attributes. This
//! module runs them and flattens the result into a list of violations
//! keyed by API property path (`coolFactor`, `owner.email`, ...).

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::DragonTreasure;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintViolation {
    pub property_path: String,
    pub message: String,
    #[serde(skip)]
    pub code: String,
}

/// All constraints a record failed, ordered by property path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConstraintViolationList(Vec<ConstraintViolation>);

impl ConstraintViolationList {
    pub fn from_errors(errors: &ValidationErrors) -> Self {
        let mut violations = Vec::new();
        collect_violations(errors, "", &mut violations);
        violations.sort_by(|a, b| a.property_path.cmp(&b.property_path));
        Self(violations)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.0.iter()
    }

    /// Returns the violations reported for one property path.
    pub fn for_property<'a>(
        &'a self,
        property_path: &'a str,
    ) -> impl Iterator<Item = &'a ConstraintViolation> + 'a {
        self.0
            .iter()
            .filter(move |v| v.property_path == property_path)
    }
}

impl fmt::Display for ConstraintViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.property_path, v.message))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Runs the declared constraints of any record.
pub fn validate<T: Validate>(record: &T) -> Result<(), ConstraintViolationList> {
    record
        .validate()
        .map_err(|errors| ConstraintViolationList::from_errors(&errors))
}

/// Validates a treasure, including its owner.
pub fn validate_treasure(treasure: &DragonTreasure) -> Result<(), ConstraintViolationList> {
    validate(treasure)
}

/// Rejects empty strings. Whitespace-only strings are not blank.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(violation("not_blank", "This value should not be blank."));
    }
    Ok(())
}

/// Builds a validation error carrying a user-facing message.
pub fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn collect_violations(errors: &ValidationErrors, prefix: &str, out: &mut Vec<ConstraintViolation>) {
    for (field, kind) in errors.errors() {
        let path = format!("{}{}", prefix, to_camel_case(&field.to_string()));
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(ConstraintViolation {
                        property_path: path.clone(),
                        message: error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "This value is not valid.".to_string()),
                        code: error.code.to_string(),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_violations(nested, &format!("{}.", path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(nested, &format!("{}[{}].", path, index), out);
                }
            }
        }
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
