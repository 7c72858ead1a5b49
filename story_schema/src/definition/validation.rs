//! Validation errors collected while reading definitions.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// One problem in a definition, located by a dotted/indexed path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    /// Location of the offending value, e.g. `entity_types[0].entities[1].id`.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// All problems found in one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a collection holding exactly one error.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![ValidationError::new(path, message)])
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(path, message));
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("No validation errors"),
            [only] => write!(f, "{only}"),
            errors => {
                write!(f, "Multiple validation errors ({} issues):", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    write!(f, "\n  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

/// Append `.key` to a path.
pub(crate) fn field_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Append `[index]` to a path.
pub(crate) fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Report every key of `map` that is not in `allowed`.
pub(crate) fn reject_unknown_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
    errors: &mut ValidationErrors,
) {
    for key in map.keys().filter(|key| !allowed.contains(&key.as_str())) {
        errors.push(field_path(path, key), "Extra inputs are not permitted");
    }
}

pub(crate) fn required_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(
                field_path(path, key),
                format!("Input should be a valid string, got {}", kind_of(other)),
            );
            None
        }
        None => {
            errors.push(field_path(path, key), "Field required");
            None
        }
    }
}

pub(crate) fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(_) => required_string(map, key, path, errors),
    }
}

/// The list under `key`. `None` when the key is absent or the value is not a list.
pub(crate) fn list<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    required: bool,
    errors: &mut ValidationErrors,
) -> Option<&'a Vec<Value>> {
    match map.get(key) {
        Some(Value::Array(items)) => Some(items),
        None | Some(Value::Null) if !required => None,
        None => {
            errors.push(field_path(path, key), "Field required");
            None
        }
        Some(other) => {
            errors.push(
                field_path(path, key),
                format!("Input should be a valid list, got {}", kind_of(other)),
            );
            None
        }
    }
}
