//! Form validation accumulator and predicate helpers.
//!
//! Predicates are pure functions over submitted values; the [`Validator`]
//! records which ones failed. Keeping the two apart lets every form type
//! reuse the same accumulation and reporting machinery while defining its own
//! field set and rule list. Checks never short-circuit, so a single pass over
//! a form surfaces every violation at once.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Accumulates field-level and form-level validation errors.
///
/// Messages for the same field are retained in the order they were recorded;
/// a later check never overwrites an earlier one.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    field_errors: BTreeMap<String, Vec<String>>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// Create an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` when `is_valid` is false.
    pub fn check_field(&mut self, is_valid: bool, field: &str, message: &str) {
        if !is_valid {
            self.add_field_error(field, message);
        }
    }

    /// Unconditionally record a field error, e.g. a duplicate email reported
    /// by the storage layer after the predicate checks already passed.
    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_owned())
            .or_default()
            .push(message.to_owned());
    }

    /// Unconditionally record an error spanning the whole submission.
    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_owned());
    }

    /// True iff no field or form-level error has been recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Recorded messages per field, in recording order within each field.
    #[must_use]
    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.field_errors
    }

    /// Recorded form-level messages.
    #[must_use]
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// True when `value` contains at least one non-whitespace character.
#[must_use]
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True when `value` is at most `max` characters long.
#[must_use]
pub fn max_chars(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// True when `value` is at least `min` characters long.
#[must_use]
pub fn min_chars(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// True when `value` is shaped like an email address.
#[must_use]
pub fn matches_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// True when `value` is one of the `permitted` values.
#[must_use]
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True when both values are equal, e.g. a password and its confirmation.
#[must_use]
pub fn is_same(a: &str, b: &str) -> bool {
    a == b
}
