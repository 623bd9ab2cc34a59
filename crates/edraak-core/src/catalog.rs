//! Collaborators the validator consults: course catalog and account directory
//!
//! The host platform provides the real implementations. In-memory versions
//! are included for the CLI and for tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::{Error, Result};

// ── Course Keys ───────────────────────────────────────────

/// A parsed course identifier
///
/// Accepts both the deprecated `org/course/run` form and the
/// `course-v1:org+course+run` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseKey {
    pub org: String,
    pub course: String,
    pub run: String,
    deprecated: bool,
}

impl CourseKey {
    /// Parse a course key from either supported string form
    ///
    /// # Errors
    /// Returns `InvalidCourseKey` when the string matches neither form.
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(rest) = raw.strip_prefix("course-v1:") {
            let parts: Vec<&str> = rest.split('+').collect();
            if let [org, course, run] = parts.as_slice() {
                if [org, course, run].iter().all(|p| is_valid_part(p, true)) {
                    return Ok(Self::new(org, course, run, false));
                }
            }
            return Err(Error::InvalidCourseKey(raw.to_string()));
        }

        let parts: Vec<&str> = raw.split('/').collect();
        match parts.as_slice() {
            [org, course, run] if [org, course, run].iter().all(|p| is_valid_part(p, false)) => {
                Ok(Self::new(org, course, run, true))
            }
            _ => Err(Error::InvalidCourseKey(raw.to_string())),
        }
    }

    fn new(org: &str, course: &str, run: &str, deprecated: bool) -> Self {
        Self {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
            deprecated,
        }
    }

    /// Whether this key was written in the slash-separated form
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deprecated {
            write!(f, "{}/{}/{}", self.org, self.course, self.run)
        } else {
            write!(f, "course-v1:{}+{}+{}", self.org, self.course, self.run)
        }
    }
}

fn is_valid_part(part: &str, allow_percent: bool) -> bool {
    static SLASH_PART: OnceLock<Regex> = OnceLock::new();
    static V1_PART: OnceLock<Regex> = OnceLock::new();

    let re = if allow_percent {
        V1_PART.get_or_init(|| Regex::new(r"^[\w\-~.:%]+$").expect("static pattern"))
    } else {
        SLASH_PART.get_or_init(|| Regex::new(r"^[\w\-~.:]+$").expect("static pattern"))
    };
    re.is_match(part)
}

// ── Course Catalog ────────────────────────────────────────

/// What the validator needs to know about a course
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CourseInfo {
    pub self_paced: bool,
    pub enrollment_start: Option<DateTime<Utc>>,
    pub enrollment_end: Option<DateTime<Utc>>,
    /// Per-course switch for the University ID tab
    pub enable_university_id: bool,
}

impl CourseInfo {
    /// No start date means enrollment has always been open
    pub fn enrollment_has_started(&self, now: DateTime<Utc>) -> bool {
        self.enrollment_start.map_or(true, |start| now >= start)
    }

    pub fn enrollment_has_ended(&self, now: DateTime<Utc>) -> bool {
        self.enrollment_end.map_or(false, |end| now > end)
    }
}

/// Course lookups
pub trait CourseCatalog: Send + Sync {
    /// `Ok(None)` when the course does not exist.
    fn get_course(&self, key: &CourseKey) -> Result<Option<CourseInfo>>;
}

/// Catalog backed by a map keyed on the course key string
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct InMemoryCatalog {
    courses: BTreeMap<String, CourseInfo>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &CourseKey, info: CourseInfo) {
        self.courses.insert(key.to_string(), info);
    }

    pub fn with_course(mut self, key: &str, info: CourseInfo) -> Result<Self> {
        let key = CourseKey::parse(key)?;
        self.insert(&key, info);
        Ok(self)
    }
}

impl CourseCatalog for InMemoryCatalog {
    fn get_course(&self, key: &CourseKey) -> Result<Option<CourseInfo>> {
        Ok(self.courses.get(&key.to_string()).cloned())
    }
}

// ── Account Directory ─────────────────────────────────────

/// Privilege flags of an existing account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Account {
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Account {
    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// Account lookups by email
pub trait AccountDirectory: Send + Sync {
    /// `Ok(None)` when no account uses this email.
    fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
}

/// Directory backed by a map keyed on email
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct InMemoryDirectory {
    accounts: BTreeMap<String, Account>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, email: &str, account: Account) -> Self {
        self.accounts.insert(email.to_string(), account);
        self
    }
}

impl AccountDirectory for InMemoryDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.get(email).copied())
    }
}
