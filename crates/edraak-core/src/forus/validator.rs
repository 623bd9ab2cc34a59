//! ForUs request validator: signature check, then field rules
//!
//! A request is rejected immediately when its signature is missing or wrong.
//! Once the signature holds, every field rule runs and all failures are
//! collected into one [`FieldErrors`] map.
//!
//! # Field rules
//!
//! - `email`: valid address; an existing staff or superuser account is refused
//! - `gender`, `level_of_education`, `country`, `lang`: injected enumerations
//! - `course_id`: parseable, existing, and open for enrollment unless self-paced
//! - `year_of_birth`: integer inside the accepted range
//! - `time`: `%Y-%m-%dT%H:%M:%S`, not in the future, not older than the
//!   freshness window

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Utc};
use regex::Regex;

use super::signing::{verify_signature, SignedRequest};
use crate::catalog::{AccountDirectory, CourseCatalog, CourseKey};
use crate::choices::Choices;
use crate::config::{ForUsSettings, Settings};
use crate::error::{FieldErrors, SIGNATURE_FIELD};
use crate::{Error, Result};

/// Format of the `time` field (UTC, no offset)
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Clean Output ──────────────────────────────────────────

/// The signed fields of an accepted request
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CleanFields {
    pub course_id: String,
    pub email: String,
    pub name: String,
    pub enrollment_action: String,
    pub country: String,
    pub level_of_education: String,
    pub gender: String,
    pub year_of_birth: String,
    pub lang: String,
    pub time: String,
    pub forus_hmac: String,
}

impl CleanFields {
    fn from_request(request: &SignedRequest) -> Self {
        let field = |key: &str| request.value(key).to_string();
        Self {
            course_id: field("course_id"),
            email: field("email"),
            name: field("name"),
            enrollment_action: field("enrollment_action"),
            country: field("country"),
            level_of_education: field("level_of_education"),
            gender: field("gender"),
            year_of_birth: field("year_of_birth"),
            lang: field("lang"),
            time: field("time"),
            forus_hmac: field(SIGNATURE_FIELD),
        }
    }
}

// ── Validator ─────────────────────────────────────────────

/// Validates inbound ForUs requests against the shared secret and the
/// platform's collaborators
pub struct ForUsValidator<'a> {
    secret: Vec<u8>,
    settings: ForUsSettings,
    choices: Choices,
    catalog: &'a dyn CourseCatalog,
    accounts: &'a dyn AccountDirectory,
}

impl<'a> ForUsValidator<'a> {
    /// Validator with default enumerations and limits
    pub fn new(
        secret: impl Into<Vec<u8>>,
        catalog: &'a dyn CourseCatalog,
        accounts: &'a dyn AccountDirectory,
    ) -> Self {
        Self {
            secret: secret.into(),
            settings: ForUsSettings::default(),
            choices: Choices::default(),
            catalog,
            accounts,
        }
    }

    /// Validator configured from settings
    ///
    /// # Errors
    /// Returns `ConfigError` when no secret is configured or the limits are
    /// out of range.
    pub fn from_settings(
        settings: &Settings,
        catalog: &'a dyn CourseCatalog,
        accounts: &'a dyn AccountDirectory,
    ) -> Result<Self> {
        let secret = settings.secret_key()?;
        settings.forus.check_limits()?;
        Ok(Self::new(secret.as_bytes(), catalog, accounts)
            .with_choices(settings.choices.clone())
            .with_limits(settings.forus.clone()))
    }

    pub fn with_choices(mut self, choices: Choices) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_limits(mut self, settings: ForUsSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate a request against the current UTC time
    pub fn validate(&self, request: &SignedRequest) -> Result<CleanFields> {
        self.validate_at(request, Utc::now())
    }

    /// Validate a request against an explicit clock
    ///
    /// # Errors
    /// - `SignatureError` when `forus_hmac` is missing or wrong; no field
    ///   rules run in that case
    /// - `ValidationError` with every failing field otherwise
    pub fn validate_at(&self, request: &SignedRequest, now: DateTime<Utc>) -> Result<CleanFields> {
        verify_signature(request, &self.secret)?;

        let errors = self.check_values(request, now);
        if !errors.is_empty() {
            tracing::debug!(fields = errors.len(), "ForUs request has invalid fields");
            return Err(Error::ValidationError(errors));
        }

        Ok(CleanFields::from_request(request))
    }

    /// Run every field rule and collect the failures
    pub fn check_values(&self, request: &SignedRequest, now: DateTime<Utc>) -> FieldErrors {
        let mut errors = FieldErrors::new();

        self.check_email(request, &mut errors);
        self.check_choices(request, &mut errors);
        self.check_course(request, now, &mut errors);
        self.check_year_of_birth(request, now, &mut errors);
        self.check_time(request, now, &mut errors);

        errors
    }

    fn check_email(&self, request: &SignedRequest, errors: &mut FieldErrors) {
        let email = request.value("email");
        if !is_valid_email(email) {
            errors.add("email", "The provided email format is invalid");
            return;
        }

        match self.accounts.find_by_email(email) {
            Ok(Some(account)) if account.is_privileged() => {
                errors.add("email", "ForUs profile cannot be created for admins and staff.");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(email, error = %e, "account lookup failed");
                errors.add("email", "Unable to verify the provided email");
            }
        }
    }

    fn check_choices(&self, request: &SignedRequest, errors: &mut FieldErrors) {
        if !self.choices.is_valid_gender(request.value("gender")) {
            mark_as_invalid(errors, "gender", "gender");
        }

        if !self.choices.is_enabled_language(request.value("lang")) {
            mark_as_invalid(errors, "lang", "language");
        }

        if !self.choices.is_valid_country(request.value("country")) {
            mark_as_invalid(errors, "country", "country");
        }

        if !self
            .choices
            .is_valid_education_level(request.value("level_of_education"))
        {
            mark_as_invalid(errors, "level_of_education", "level of education");
        }
    }

    fn check_course(&self, request: &SignedRequest, now: DateTime<Utc>, errors: &mut FieldErrors) {
        let raw = request.value("course_id");
        let key = match CourseKey::parse(raw) {
            Ok(key) => key,
            Err(_) => {
                tracing::warn!(
                    action = request.value("enrollment_action"),
                    course_id = raw,
                    "ForUs request with invalid course id"
                );
                mark_as_invalid(errors, "course_id", "course id");
                return;
            }
        };

        let course = match self.catalog.get_course(&key) {
            Ok(Some(course)) => course,
            Ok(None) => {
                errors.add("course_id", "The requested course does not exist");
                return;
            }
            Err(e) => {
                tracing::warn!(course_id = %key, error = %e, "course lookup failed");
                errors.add("course_id", "The requested course does not exist");
                return;
            }
        };

        if course.self_paced {
            return;
        }

        if !course.enrollment_has_started(now) {
            errors.add("course_id", "The course has not yet been opened for enrollment");
        }

        if course.enrollment_has_ended(now) {
            errors.add("course_id", "Enrollment for this course has been closed");
        }
    }

    fn check_year_of_birth(
        &self,
        request: &SignedRequest,
        now: DateTime<Utc>,
        errors: &mut FieldErrors,
    ) {
        let span = self.settings.year_of_birth_span;
        let newest = now.year();
        let oldest = newest.saturating_sub(span.saturating_sub(1));

        let valid = span > 0
            && request
                .value("year_of_birth")
                .trim()
                .parse::<i32>()
                .map(|year| (oldest..=newest).contains(&year))
                .unwrap_or(false);

        if !valid {
            mark_as_invalid(errors, "year_of_birth", "birth year");
        }
    }

    fn check_time(&self, request: &SignedRequest, now: DateTime<Utc>, errors: &mut FieldErrors) {
        let time = match NaiveDateTime::parse_from_str(request.value("time"), DATE_TIME_FORMAT) {
            Ok(time) => time.and_utc(),
            Err(_) => {
                mark_as_invalid(errors, "time", "date format");
                return;
            }
        };

        if time > now {
            errors.add("time", "future date has been provided");
        }

        // A window too wide to represent has no lower bound
        let oldest = Duration::try_hours(self.settings.freshness_hours)
            .and_then(|window| now.checked_sub_signed(window));
        if oldest.is_some_and(|oldest| time < oldest) {
            errors.add("time", "Request has expired");
        }
    }
}

fn mark_as_invalid(errors: &mut FieldErrors, field: &str, label: &str) {
    errors.add(field, format!("Invalid {} has been provided", label));
}

// ── Email Syntax ──────────────────────────────────────────

/// Check an address the way the platform's form validator does: dot-atom
/// local part, dotted domain with a label-shaped top-level part
pub fn is_valid_email(value: &str) -> bool {
    static USER: OnceLock<Regex> = OnceLock::new();
    static DOMAIN: OnceLock<Regex> = OnceLock::new();

    let Some((user, domain)) = value.rsplit_once('@') else {
        return false;
    };

    let user_re = USER.get_or_init(|| {
        Regex::new(r"(?i)^[-!#$%&'*+/=?^_`{}|~0-9A-Z]+(\.[-!#$%&'*+/=?^_`{}|~0-9A-Z]+)*$")
            .expect("static pattern")
    });
    if !user_re.is_match(user) {
        return false;
    }

    if domain == "localhost" {
        return true;
    }

    let domain_re = DOMAIN.get_or_init(|| {
        Regex::new(r"(?i)^(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z0-9-]{2,63}$")
            .expect("static pattern")
    });
    domain_re.is_match(domain) && !domain.ends_with('-')
}
