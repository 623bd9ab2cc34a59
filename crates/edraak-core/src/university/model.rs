//! University ID record as stored by the host platform

use std::fmt;

/// A learner's university ID for one course
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UniversityId {
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Profile name; `None` when the learner has no profile
    #[serde(default)]
    pub full_name: Option<String>,
    pub course_key: String,
    pub university_id: String,
    #[serde(default)]
    pub section_number: String,
}

impl UniversityId {
    pub fn new(
        username: impl Into<String>,
        course_key: impl Into<String>,
        university_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: String::new(),
            full_name: None,
            course_key: course_key.into(),
            university_id: university_id.into(),
            section_number: String::new(),
        }
    }

    pub fn get_full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn get_email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for UniversityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.username, self.course_key, self.university_id)
    }
}
