//! Draft profile data extracted from an uploaded CV, and the user-confirmed
//! subset that may be applied to the child stores.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::{PersonId, validate::ValidationErrors};

// ─── Extracted draft ─────────────────────────────────────────────────────────

/// A best-effort, always well-shaped partial profile. Every part may be
/// empty; none is ever absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftProfile {
  pub personal:  DraftPersonal,
  pub contact:   DraftContact,
  pub education: Vec<DraftEducation>,
  pub skills:    Vec<String>,
}

impl DraftProfile {
  /// Nothing was recognised; the UI should invite manual entry.
  pub fn is_empty(&self) -> bool {
    self.personal == DraftPersonal::default()
      && self.contact == DraftContact::default()
      && self.education.is_empty()
      && self.skills.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftPersonal {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name:  Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftContact {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

/// An education line as found in the document. No institution/date split is
/// attempted beyond spotting a plausible year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEducation {
  pub text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub year: Option<i32>,
}

// ─── Stored CV documents ─────────────────────────────────────────────────────

/// Metadata for an uploaded CV file, as recorded by a
/// [`crate::store::CvDocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvDocument {
  pub reference:    Uuid,
  pub person_id:    PersonId,
  pub file_name:    String,
  pub media_type:   String,
  pub size_bytes:   u64,
  /// SHA-256 hex digest of the stored file.
  pub content_hash: String,
  /// Path relative to the configured upload directory.
  pub stored_path:  String,
  pub extracted:    DraftProfile,
  pub uploaded_at:  DateTime<Utc>,
}

// ─── Confirmed data ──────────────────────────────────────────────────────────

/// A section of extracted data the user can opt into applying.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplySection {
  Contact,
  Education,
  Skills,
  Certifications,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmedContact {
  pub email:        Option<String>,
  pub phone:        Option<String>,
  /// Make the applied values the primary method of their type.
  pub make_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedCertification {
  pub name:        String,
  #[serde(default)]
  pub issuer:      Option<String>,
  #[serde(default)]
  pub issue_date:  Option<NaiveDate>,
  #[serde(default)]
  pub expiry_date: Option<NaiveDate>,
}

/// Per-section confirmed values. `None` means the user opted the section out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmedSections {
  pub contact:        Option<ConfirmedContact>,
  pub education:      Option<Vec<DraftEducation>>,
  pub skills:         Option<Vec<String>>,
  pub certifications: Option<Vec<ConfirmedCertification>>,
}

impl ConfirmedSections {
  pub fn selected(&self) -> Vec<ApplySection> {
    let mut sections = Vec::new();
    if self.contact.is_some() {
      sections.push(ApplySection::Contact);
    }
    if self.education.is_some() {
      sections.push(ApplySection::Education);
    }
    if self.skills.is_some() {
      sections.push(ApplySection::Skills);
    }
    if self.certifications.is_some() {
      sections.push(ApplySection::Certifications);
    }
    sections
  }
}

/// Body of an apply request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedDraft {
  pub cv_reference:                 Uuid,
  pub per_section_confirmed_fields: ConfirmedSections,
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Rows written for one section; `skipped` counts rows already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionWrite {
  pub inserted: usize,
  pub skipped:  usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
  Success { inserted: usize, skipped: usize },
  Failure {
    message: String,
    /// Field-level problems when the section was rejected before writing.
    #[serde(default, skip_serializing_if = "ValidationErrors::is_empty")]
    fields:  ValidationErrors,
  },
}

impl SectionOutcome {
  pub fn is_success(&self) -> bool { matches!(self, Self::Success { .. }) }

  /// A section whose values failed validation.
  pub fn invalid(errors: ValidationErrors) -> Self {
    Self::Failure { message: "validation failed".to_owned(), fields: errors }
  }
}

impl From<SectionWrite> for SectionOutcome {
  fn from(write: SectionWrite) -> Self {
    Self::Success { inserted: write.inserted, skipped: write.skipped }
  }
}

/// Per-section result of an apply request. Sections the user opted out of
/// are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplyReport {
  pub sections: BTreeMap<ApplySection, SectionOutcome>,
}

impl ApplyReport {
  pub fn get(&self, section: ApplySection) -> Option<&SectionOutcome> {
    self.sections.get(&section)
  }
}
