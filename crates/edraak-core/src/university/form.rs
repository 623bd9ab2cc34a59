//! University ID submission form
//!
//! Each field stops at its first failing rule, so an invalid field always
//! carries exactly one message.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::FieldErrors;
use crate::{Error, Result};

const FULL_NAME_LENGTH: (usize, usize) = (2, 50);
const UNIVERSITY_ID_LENGTH: (usize, usize) = (4, 50);
const SECTION_NUMBER_MAX: usize = 10;

/// Raw form input
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UniversityIdForm {
    pub full_name: String,
    pub university_id: String,
    pub section_number: String,
}

impl UniversityIdForm {
    pub fn new(
        full_name: impl Into<String>,
        university_id: impl Into<String>,
        section_number: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            university_id: university_id.into(),
            section_number: section_number.into(),
        }
    }

    /// Validate and return the trimmed values
    ///
    /// # Errors
    /// Returns `ValidationError` with one message per invalid field.
    pub fn clean(&self) -> Result<UniversityIdForm> {
        let cleaned = UniversityIdForm::new(
            self.full_name.trim(),
            self.university_id.trim(),
            self.section_number.trim(),
        );

        let mut errors = FieldErrors::new();

        if let Some(msg) = check_length(&cleaned.full_name, FULL_NAME_LENGTH) {
            errors.add("full_name", msg);
        }

        if let Some(msg) = check_length(&cleaned.university_id, UNIVERSITY_ID_LENGTH)
            .or_else(|| check_id_chars(&cleaned.university_id))
        {
            errors.add("university_id", msg);
        }

        if let Some(msg) = check_length(&cleaned.section_number, (1, SECTION_NUMBER_MAX)) {
            errors.add("section_number", msg);
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(Error::ValidationError(errors))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.clean().is_ok()
    }
}

fn check_length(value: &str, (min, max): (usize, usize)) -> Option<String> {
    let len = value.chars().count();
    if len == 0 {
        Some("This field is required.".to_string())
    } else if len < min {
        Some(format!(
            "Ensure this value has at least {} characters (it has {}).",
            min, len
        ))
    } else if len > max {
        Some(format!(
            "Ensure this value has at most {} characters (it has {}).",
            max, len
        ))
    } else {
        None
    }
}

fn check_id_chars(value: &str) -> Option<String> {
    static ID_CHARS: OnceLock<Regex> = OnceLock::new();
    let re = ID_CHARS.get_or_init(|| Regex::new(r"^[0-9A-Za-z_-]+$").expect("static pattern"));
    if re.is_match(value) {
        None
    } else {
        Some("The university ID may only contain letters, numbers, dashes and underscores.".into())
    }
}
