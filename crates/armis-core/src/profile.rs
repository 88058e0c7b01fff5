//! The unified `PersonProfile` read model and the records it is built from.
//!
//! Every record here is in canonical shape: backends that store legacy column
//! names hand back raw rows which [`crate::canonical`] translates before they
//! reach these types. Presentation code only ever sees these names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{PersonId, expiry::ExpiryStatus, scoring::ReadinessBlocker};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
  #[strum(to_string = "male", serialize = "m")]
  Male,
  #[strum(to_string = "female", serialize = "f")]
  Female,
  Other,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MaritalStatus {
  Single,
  Married,
  Divorced,
  Widowed,
  Separated,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServiceStatus {
  Active,
  Inactive,
  Retired,
  Deceased,
}

/// The type-class of a contact method. At most one method per class may be
/// primary.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContactType {
  Mobile,
  Home,
  Work,
  Email,
  Emergency,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AddressKind {
  Residential,
  Postal,
  Permanent,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EducationLevel {
  Primary,
  Secondary,
  Certificate,
  Diploma,
  Bachelor,
  Master,
  Doctorate,
  Other,
}

impl EducationLevel {
  /// Best-effort level guess from a free-text qualification line.
  pub fn infer(text: &str) -> Self {
    let lower = text.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
    if has(&["phd", "ph.d", "doctor"]) {
      Self::Doctorate
    } else if has(&["master", "msc", "m.sc", "mba", "m.a."]) {
      Self::Master
    } else if has(&["bachelor", "bsc", "b.sc", "b.a.", "beng", "b.eng", "degree"]) {
      Self::Bachelor
    } else if has(&["diploma"]) {
      Self::Diploma
    } else if has(&["grade 12", "secondary", "high school", "school certificate"]) {
      Self::Secondary
    } else if has(&["certificate"]) {
      Self::Certificate
    } else {
      Self::Other
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TrainingStatus {
  Planned,
  InProgress,
  Completed,
  Failed,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Proficiency {
  Basic,
  Intermediate,
  Advanced,
  Expert,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AwardKind {
  Medal,
  Decoration,
  Commendation,
  Other,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeploymentStatus {
  Planned,
  Active,
  Completed,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ClearanceLevel {
  Restricted,
  Confidential,
  Secret,
  TopSecret,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClearanceStatus {
  Active,
  Pending,
  Suspended,
  Revoked,
  Expired,
}

// ─── Identity & assignment ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub id:             PersonId,
  pub service_number: Option<String>,
  pub prefix:         Option<String>,
  pub first_name:     Option<String>,
  pub middle_name:    Option<String>,
  pub last_name:      Option<String>,
  pub suffix:         Option<String>,
  pub date_of_birth:  Option<NaiveDate>,
  pub gender:         Option<Gender>,
  pub national_id:    Option<String>,
  pub nationality:    Option<String>,
  pub marital_status: Option<MaritalStatus>,
  pub religion:       Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  /// Path relative to the configured upload directory.
  pub photo_path:     Option<String>,
}

impl Identity {
  /// Prefix, given names, surname and suffix joined by single spaces.
  pub fn full_name(&self) -> String {
    [
      &self.prefix,
      &self.first_name,
      &self.middle_name,
      &self.last_name,
      &self.suffix,
    ]
    .into_iter()
    .filter_map(|part| part.as_deref().map(str::trim))
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub rank_id:         Option<i64>,
  pub rank_name:       Option<String>,
  pub unit_id:         Option<i64>,
  pub unit_name:       Option<String>,
  pub corps:           Option<String>,
  pub service_status:  Option<ServiceStatus>,
  pub enlistment_date: Option<NaiveDate>,
}

impl Assignment {
  pub fn has_rank(&self) -> bool {
    self.rank_id.is_some() || is_filled(&self.rank_name)
  }

  pub fn has_unit(&self) -> bool {
    self.unit_id.is_some() || is_filled(&self.unit_name)
  }
}

// ─── Child records ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMethod {
  pub id:           i64,
  #[serde(rename = "type")]
  pub contact_type: ContactType,
  pub value:        String,
  pub is_primary:   bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub id:          i64,
  pub kind:        AddressKind,
  pub line1:       String,
  pub line2:       Option<String>,
  pub city:        Option<String>,
  pub province:    Option<String>,
  pub country:     Option<String>,
  pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
  pub id:                   i64,
  pub name:                 String,
  pub relationship:         String,
  pub date_of_birth:        Option<NaiveDate>,
  pub phone:                Option<String>,
  pub email:                Option<String>,
  pub address:              Option<String>,
  pub is_emergency_contact: bool,
  pub is_dependent:         bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
  pub id:              i64,
  /// Qualification as written, e.g. "BSc Computer Science".
  pub qualification:   String,
  pub institution:     Option<String>,
  pub level:           EducationLevel,
  pub completion_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
  pub id:          i64,
  pub course_name: String,
  pub provider:    Option<String>,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
  pub due_date:    Option<NaiveDate>,
  pub status:      TrainingStatus,
  pub mandatory:   bool,
}

impl Training {
  /// Not yet completed and past its due date.
  pub fn is_overdue(&self, today: NaiveDate) -> bool {
    self.status != TrainingStatus::Completed
      && self.due_date.is_some_and(|due| due < today)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
  pub id:          i64,
  pub name:        String,
  pub proficiency: Option<Proficiency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
  pub id:          i64,
  pub name:        String,
  pub issuer:      Option<String>,
  pub issue_date:  Option<NaiveDate>,
  pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
  pub id:         i64,
  pub name:       String,
  pub kind:       AwardKind,
  pub awarded_on: Option<NaiveDate>,
  pub citation:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
  pub id:         i64,
  pub mission:    String,
  pub location:   Option<String>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
  pub status:     DeploymentStatus,
}

/// One posting in a person's service history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePosting {
  pub id:          i64,
  pub unit_name:   String,
  pub appointment: Option<String>,
  pub from_date:   Option<NaiveDate>,
  pub to_date:     Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityClearance {
  pub level:       ClearanceLevel,
  pub issue_date:  Option<NaiveDate>,
  pub expiry_date: Option<NaiveDate>,
  pub status:      ClearanceStatus,
}

impl SecurityClearance {
  /// Expired by status, or by date as of `today`.
  pub fn is_expired(&self, today: NaiveDate) -> bool {
    self.status == ClearanceStatus::Expired
      || self.expiry_date.is_some_and(|expiry| expiry < today)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalReadiness {
  pub fitness_category:    String,
  pub exam_date:           Option<NaiveDate>,
  pub exam_expiry:         Option<NaiveDate>,
  pub deployment_eligible: bool,
}

// ─── Collections ─────────────────────────────────────────────────────────────

/// A child collection (or single child record) fetched independently of the
/// identity row. Used to report which parts of a profile degraded to empty.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
  ContactMethods,
  Addresses,
  FamilyMembers,
  Education,
  Training,
  Skills,
  Certifications,
  Awards,
  Deployments,
  ServiceHistory,
  SecurityClearance,
  MedicalReadiness,
}

// ─── PersonProfile ───────────────────────────────────────────────────────────

/// The computed read model for a person. Never stored; always derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProfile {
  pub identity:                   Identity,
  pub assignment:                 Assignment,
  pub contact_methods:            Vec<ContactMethod>,
  pub addresses:                  Vec<Address>,
  pub family_members:             Vec<FamilyMember>,
  pub education:                  Vec<Education>,
  pub training:                   Vec<Training>,
  pub skills:                     Vec<Skill>,
  pub certifications:             Vec<Certification>,
  pub awards:                     Vec<Award>,
  pub deployments:                Vec<Deployment>,
  pub service_history:            Vec<ServicePosting>,
  pub security_clearance:         Option<SecurityClearance>,
  pub medical_readiness:          Option<MedicalReadiness>,

  // ── Derived ─────────────────────────────────────────────────────────────
  pub full_name:                  String,
  /// Whole years since birth; `None` renders as "N/A".
  pub age:                        Option<u32>,
  /// Whole years since enlistment; `None` renders as "N/A".
  pub years_of_service:           Option<u32>,
  pub expiries:                   Vec<ExpiryStatus>,
  pub profile_completion_percent: u8,
  pub deployment_ready:           bool,
  pub readiness_blockers:         Vec<ReadinessBlocker>,

  /// Collections whose fetch failed and were served empty. Diagnostic only;
  /// never serialised to end users.
  #[serde(skip)]
  pub unavailable:                Vec<Section>,
}

pub(crate) fn is_filled(value: &Option<String>) -> bool {
  value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
