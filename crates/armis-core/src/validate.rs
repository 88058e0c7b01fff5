//! Input validation for write operations.
//!
//! Failures are collected per field so forms can show every problem at once.

use std::{fmt, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::profile::{Gender, MaritalStatus};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
    .expect("static email pattern")
});

// ─── Error collection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.push(FieldError { field: field.into(), message: message.into() });
  }

  /// Record `message` against `field` unless `ok` holds.
  pub fn check(&mut self, ok: bool, field: &str, message: &str) {
    if !ok {
      self.push(field, message);
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(|e| e.field.as_str())
  }

  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> =
      self.0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
    f.write_str(&parts.join("; "))
  }
}

// ─── Field checks ────────────────────────────────────────────────────────────

pub fn is_valid_email(value: &str) -> bool { EMAIL.is_match(value.trim()) }

/// 7–15 digits, optionally with a leading `+` and common separators.
pub fn is_valid_phone(value: &str) -> bool {
  let trimmed = value.trim();
  let allowed = trimmed
    .chars()
    .enumerate()
    .all(|(i, c)| c.is_ascii_digit() || " -().".contains(c) || (c == '+' && i == 0));
  let digits = trimmed.chars().filter(char::is_ascii_digit).count();
  allowed && (7..=15).contains(&digits)
}

fn blank(value: &str) -> bool { value.trim().is_empty() }

fn optional_ok(value: &Option<String>, check: fn(&str) -> bool) -> bool {
  value.as_deref().is_none_or(|v| blank(v) || check(v))
}

// ─── Personal-information update ─────────────────────────────────────────────

/// Replacement values for the editable personal-information fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityUpdate {
  pub prefix:         Option<String>,
  pub first_name:     String,
  pub middle_name:    Option<String>,
  pub last_name:      String,
  pub suffix:         Option<String>,
  pub date_of_birth:  Option<NaiveDate>,
  pub gender:         Option<Gender>,
  pub national_id:    Option<String>,
  pub nationality:    Option<String>,
  pub marital_status: Option<MaritalStatus>,
  pub religion:       Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
}

impl IdentityUpdate {
  pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(!blank(&self.first_name), "firstName", "first name is required");
    errors.check(!blank(&self.last_name), "lastName", "last name is required");
    errors.check(
      self.date_of_birth.is_none_or(|dob| dob <= today),
      "dateOfBirth",
      "date of birth cannot be in the future",
    );
    errors.check(optional_ok(&self.email, is_valid_email), "email", "invalid email address");
    errors.check(optional_ok(&self.phone, is_valid_phone), "phone", "invalid phone number");
    errors.into_result()
  }
}

// ─── Family member ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewFamilyMember {
  pub name:                 String,
  pub relationship:         String,
  pub date_of_birth:        Option<NaiveDate>,
  pub phone:                Option<String>,
  pub email:                Option<String>,
  pub address:              Option<String>,
  pub is_emergency_contact: bool,
  pub is_dependent:         bool,
}

impl NewFamilyMember {
  pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    self.collect_errors(today, "", &mut errors);
    errors.into_result()
  }

  /// Append this member's problems to `errors`, with field names prefixed by
  /// `prefix` (used for list validation, e.g. `"members[2]."`).
  pub fn collect_errors(&self, today: NaiveDate, prefix: &str, errors: &mut ValidationErrors) {
    let field = |name: &str| format!("{prefix}{name}");
    if blank(&self.name) {
      errors.push(field("name"), "name is required");
    }
    if blank(&self.relationship) {
      errors.push(field("relationship"), "relationship is required");
    }
    if self.date_of_birth.is_some_and(|dob| dob > today) {
      errors.push(field("dateOfBirth"), "date of birth cannot be in the future");
    }
    if !optional_ok(&self.email, is_valid_email) {
      errors.push(field("email"), "invalid email address");
    }
    if !optional_ok(&self.phone, is_valid_phone) {
      errors.push(field("phone"), "invalid phone number");
    }
  }
}

/// Validate a full replacement list of family members.
pub fn validate_family(
  members: &[NewFamilyMember],
  today: NaiveDate,
) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();
  for (i, member) in members.iter().enumerate() {
    member.collect_errors(today, &format!("members[{i}]."), &mut errors);
  }
  errors.into_result()
}
