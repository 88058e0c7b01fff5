//! Store capability traits and their write-input types.
//!
//! Each trait covers one record store. Backends (e.g. `armis-store-sqlite`)
//! implement all of them; the aggregator, applier and HTTP layer depend only
//! on the capabilities they use, so any one can be swapped or mocked.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  PersonId,
  canonical::RawRecord,
  draft::{CvDocument, SectionWrite},
  profile::{
    Address, Award, Certification, ContactMethod, ContactType, Deployment,
    Education, EducationLevel, MedicalReadiness, Proficiency,
    SecurityClearance, ServicePosting, Skill, Training,
  },
  report::{ExpiryEntry, GroupBy, ReportRow},
  validate::{IdentityUpdate, NewFamilyMember},
};

// ─── Write inputs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContactMethod {
  #[serde(rename = "type")]
  pub contact_type: ContactType,
  pub value:        String,
  /// Demotes any existing primary of the same type.
  pub is_primary:   bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEducation {
  pub qualification:   String,
  pub institution:     Option<String>,
  pub level:           EducationLevel,
  pub completion_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkill {
  pub name:        String,
  pub proficiency: Option<Proficiency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCertification {
  pub name:        String,
  pub issuer:      Option<String>,
  pub issue_date:  Option<NaiveDate>,
  pub expiry_date: Option<NaiveDate>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type for every capability a backend implements.
pub trait StoreBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Person rows: identity, posting and photo.
pub trait IdentityStore: StoreBackend {
  /// The person row as stored, with its own column names. `None` if absent.
  fn get_identity(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<RawRecord>, Self::Error>> + Send + '_;

  /// Overwrite the editable personal fields. Returns `false` if the person
  /// does not exist.
  fn update_identity(
    &self,
    id: PersonId,
    update: IdentityUpdate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record the stored photo path. Returns `false` if the person does not
  /// exist.
  fn set_photo(
    &self,
    id: PersonId,
    path: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the person and every child record. Returns `false` if the person
  /// did not exist.
  fn delete_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

pub trait ContactStore: StoreBackend {
  fn list_contacts(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<ContactMethod>, Self::Error>> + Send + '_;

  fn list_addresses(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Address>, Self::Error>> + Send + '_;

  /// Insert contact methods in one transaction, skipping any `(type, value)`
  /// pair already present.
  fn insert_contacts(
    &self,
    id: PersonId,
    contacts: Vec<NewContactMethod>,
  ) -> impl Future<Output = Result<SectionWrite, Self::Error>> + Send + '_;
}

pub trait FamilyStore: StoreBackend {
  /// Family rows as stored, with their own column names.
  fn list_family(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<RawRecord>, Self::Error>> + Send + '_;

  /// Returns the new row id, or `None` if the person does not exist.
  fn add_family_member(
    &self,
    id: PersonId,
    member: NewFamilyMember,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Replace the whole family list: delete then insert, in one transaction.
  /// Returns the number of rows written, or `None` if the person does not
  /// exist.
  fn replace_family(
    &self,
    id: PersonId,
    members: Vec<NewFamilyMember>,
  ) -> impl Future<Output = Result<Option<usize>, Self::Error>> + Send + '_;
}

pub trait EducationStore: StoreBackend {
  fn list_education(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Education>, Self::Error>> + Send + '_;

  fn list_training(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Training>, Self::Error>> + Send + '_;

  /// Insert in one transaction, skipping rows whose qualification
  /// (case-insensitive) and completion year already exist.
  fn insert_education(
    &self,
    id: PersonId,
    rows: Vec<NewEducation>,
  ) -> impl Future<Output = Result<SectionWrite, Self::Error>> + Send + '_;
}

pub trait SkillStore: StoreBackend {
  fn list_skills(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + '_;

  fn list_certifications(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Certification>, Self::Error>> + Send + '_;

  /// Insert in one transaction, skipping names already present
  /// (case-insensitive).
  fn insert_skills(
    &self,
    id: PersonId,
    skills: Vec<NewSkill>,
  ) -> impl Future<Output = Result<SectionWrite, Self::Error>> + Send + '_;

  /// Insert in one transaction, skipping names already present
  /// (case-insensitive).
  fn insert_certifications(
    &self,
    id: PersonId,
    certifications: Vec<NewCertification>,
  ) -> impl Future<Output = Result<SectionWrite, Self::Error>> + Send + '_;
}

/// Awards, deployments and postings.
pub trait ServiceRecordStore: StoreBackend {
  fn list_awards(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Award>, Self::Error>> + Send + '_;

  fn list_deployments(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Deployment>, Self::Error>> + Send + '_;

  fn list_service_history(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<ServicePosting>, Self::Error>> + Send + '_;
}

pub trait ReadinessStore: StoreBackend {
  fn get_security_clearance(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<SecurityClearance>, Self::Error>> + Send + '_;

  fn get_medical_readiness(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<MedicalReadiness>, Self::Error>> + Send + '_;
}

pub trait CvDocumentStore: StoreBackend {
  fn record_cv(
    &self,
    document: CvDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_cv(
    &self,
    reference: Uuid,
  ) -> impl Future<Output = Result<Option<CvDocument>, Self::Error>> + Send + '_;
}

pub trait ReportStore: StoreBackend {
  /// Head counts ordered by count descending, then label.
  fn staff_count_by(
    &self,
    group: GroupBy,
  ) -> impl Future<Output = Result<Vec<ReportRow>, Self::Error>> + Send + '_;

  /// Every dated clearance, medical exam and certification expiry.
  fn list_expiry_dates(
    &self,
  ) -> impl Future<Output = Result<Vec<ExpiryEntry>, Self::Error>> + Send + '_;
}

// ─── Capability sets ─────────────────────────────────────────────────────────

/// Everything [`crate::aggregate::ProfileAggregator`] reads.
pub trait ProfileSource:
  IdentityStore
  + ContactStore
  + FamilyStore
  + EducationStore
  + SkillStore
  + ServiceRecordStore
  + ReadinessStore
{
}

impl<T> ProfileSource for T where
  T: IdentityStore
    + ContactStore
    + FamilyStore
    + EducationStore
    + SkillStore
    + ServiceRecordStore
    + ReadinessStore
{
}

/// Everything [`crate::apply::ProfileDataApplier`] writes to.
pub trait DraftTarget: ContactStore + EducationStore + SkillStore + CvDocumentStore {}

impl<T> DraftTarget for T where T: ContactStore + EducationStore + SkillStore + CvDocumentStore {}

/// A complete backend.
pub trait PersonnelStore: ProfileSource + DraftTarget + ReportStore {}

impl<T> PersonnelStore for T where T: ProfileSource + DraftTarget + ReportStore {}
