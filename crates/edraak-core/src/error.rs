//! Error types for the Edraak core
//!
//! All fallible operations return `Result<T, Error>`.
//! Validation failures carry field-keyed messages ready for display.

use std::collections::BTreeMap;
use std::fmt;

/// Field name used for signature failures in the field-keyed error shape
pub const SIGNATURE_FIELD: &str = "forus_hmac";

/// Accumulated per-field validation messages
///
/// Keys are field names, values are the messages in the order they were
/// raised. A field present in the map always has at least one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages for a field, empty if the field is valid
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All messages flattened, in field order
    pub fn messages(&self) -> Vec<&str> {
        self.0.values().flatten().map(String::as_str).collect()
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, messages)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

/// Edraak core error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Signature missing or not matching; the request is rejected outright
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// One or more fields failed their checks
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// A collaborator could not resolve a lookup
    #[error("Lookup failure: {0}")]
    LookupFailure(String),

    /// Course identifier could not be parsed
    #[error("Invalid course key: {0}")]
    InvalidCourseKey(String),

    /// Settings are missing or malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Field-keyed messages for display to an end user.
    ///
    /// Signature failures map to a single `forus_hmac` entry and are never
    /// mixed with field errors.
    pub fn field_messages(&self) -> FieldErrors {
        match self {
            Error::ValidationError(errors) => errors.clone(),
            Error::SignatureError(msg) => {
                let mut errors = FieldErrors::new();
                errors.add(SIGNATURE_FIELD, msg.clone());
                errors
            }
            other => {
                let mut errors = FieldErrors::new();
                errors.add("__all__", other.to_string());
                errors
            }
        }
    }
}

/// Result type alias for Edraak core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_keep_message_order() {
        let mut errors = FieldErrors::new();
        errors.add("course_id", "first");
        errors.add("course_id", "second");
        assert_eq!(errors.get("course_id"), ["first", "second"]);
        assert_eq!(errors.len(), 1);
        assert!(errors.get("email").is_empty());
    }

    #[test]
    fn test_signature_error_maps_to_single_field() {
        let err = Error::SignatureError("bad".into());
        let fields = err.field_messages();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get(SIGNATURE_FIELD), ["bad"]);
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("time", "Request has expired");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"time": ["Request has expired"]}));
    }

    #[test]
    fn test_display() {
        let mut errors = FieldErrors::new();
        errors.add("gender", "Invalid gender has been provided");
        errors.add("lang", "Invalid language has been provided");
        let err = Error::ValidationError(errors);
        assert_eq!(
            err.to_string(),
            "Validation error: gender: Invalid gender has been provided; \
             lang: Invalid language has been provided"
        );
    }
}
