//! `ProfileDataApplier`: the explicit, user-gated write of confirmed CV data.
//!
//! Each confirmed section is validated and then written by one store call,
//! which the store commits atomically. Sections are independent: a section
//! with invalid values or a failed write is reported as a failure and the
//! rest still run.

use std::{fmt::Display, sync::Arc};

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::{
  Error, PersonId, Result,
  context::RequestContext,
  draft::{
    ApplyReport, ApplySection, ConfirmedCertification, ConfirmedContact,
    ConfirmedDraft, ConfirmedSections, DraftEducation, SectionOutcome, SectionWrite,
  },
  profile::{ContactType, EducationLevel},
  store::{DraftTarget, NewCertification, NewContactMethod, NewEducation, NewSkill},
  validate::{ValidationErrors, is_valid_email, is_valid_phone},
};

/// Longest accepted skill or certification name.
const MAX_NAME_LEN: usize = 100;

/// Earliest plausible completion year for an education record.
const MIN_EDUCATION_YEAR: i32 = 1900;

pub struct ProfileDataApplier<S> {
  store: Arc<S>,
}

impl<S> Clone for ProfileDataApplier<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: DraftTarget> ProfileDataApplier<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Write the confirmed sections of a previously uploaded CV into the
  /// person's child stores.
  ///
  /// Fails with [`Error::Validation`] only if the CV reference is unknown or
  /// belongs to someone else. Otherwise returns one outcome per confirmed
  /// section; invalid values fail their own section and nothing else.
  pub async fn apply(
    &self,
    ctx: &RequestContext,
    person_id: PersonId,
    confirmed: ConfirmedDraft,
  ) -> Result<ApplyReport> {
    let reference = confirmed.cv_reference;
    let document = self.store.get_cv(reference).await.map_err(Error::store)?;
    if document.is_none_or(|doc| doc.person_id != person_id) {
      let mut errors = ValidationErrors::default();
      errors.push("cvReference", "unknown CV reference for this person");
      return Err(errors.into());
    }

    let sections = &confirmed.per_section_confirmed_fields;
    let mut report = ApplyReport::default();
    for section in sections.selected() {
      let outcome = self.apply_section(person_id, section, sections, ctx.today).await;
      report.sections.insert(section, outcome);
    }

    info!(
      person_id,
      actor = %ctx.actor,
      cv_reference = %reference,
      sections = report.sections.len(),
      failed = report.sections.values().filter(|o| !o.is_success()).count(),
      "applied confirmed CV data"
    );
    Ok(report)
  }

  async fn apply_section(
    &self,
    person_id: PersonId,
    section: ApplySection,
    sections: &ConfirmedSections,
    today: NaiveDate,
  ) -> SectionOutcome {
    let mut errors = ValidationErrors::default();
    match section {
      ApplySection::Contact => {
        let rows = sections.contact.as_ref().map(|c| contacts(c, &mut errors)).unwrap_or_default();
        settle(person_id, section, errors, self.store.insert_contacts(person_id, rows)).await
      }
      ApplySection::Education => {
        let rows = education(sections.education.as_deref().unwrap_or_default(), today, &mut errors);
        settle(person_id, section, errors, self.store.insert_education(person_id, rows)).await
      }
      ApplySection::Skills => {
        let rows = skills(sections.skills.as_deref().unwrap_or_default(), &mut errors);
        settle(person_id, section, errors, self.store.insert_skills(person_id, rows)).await
      }
      ApplySection::Certifications => {
        let rows =
          certifications(sections.certifications.as_deref().unwrap_or_default(), &mut errors);
        settle(person_id, section, errors, self.store.insert_certifications(person_id, rows)).await
      }
    }
  }
}

/// Run `write` unless validation failed; the write future is dropped unpolled
/// in that case, so nothing reaches the store.
async fn settle<F, E>(
  person_id: PersonId,
  section: ApplySection,
  errors: ValidationErrors,
  write: F,
) -> SectionOutcome
where
  F: Future<Output = std::result::Result<SectionWrite, E>>,
  E: Display,
{
  if !errors.is_empty() {
    warn!(person_id, %section, %errors, "section rejected");
    return SectionOutcome::invalid(errors);
  }
  match write.await {
    Ok(write) => write.into(),
    Err(e) => {
      warn!(person_id, %section, error = %e, "section apply failed");
      SectionOutcome::Failure { message: e.to_string(), fields: ValidationErrors::default() }
    }
  }
}

// ─── Validation and mapping ──────────────────────────────────────────────────

fn non_blank(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contacts(contact: &ConfirmedContact, errors: &mut ValidationErrors) -> Vec<NewContactMethod> {
  let mut rows = Vec::new();
  if let Some(email) = non_blank(&contact.email) {
    errors.check(is_valid_email(email), "contact.email", "invalid email address");
    rows.push(NewContactMethod {
      contact_type: ContactType::Email,
      value:        email.to_owned(),
      is_primary:   contact.make_primary,
    });
  }
  if let Some(phone) = non_blank(&contact.phone) {
    errors.check(is_valid_phone(phone), "contact.phone", "invalid phone number");
    rows.push(NewContactMethod {
      contact_type: ContactType::Mobile,
      value:        phone.to_owned(),
      is_primary:   contact.make_primary,
    });
  }
  rows
}

fn education(
  entries: &[DraftEducation],
  today: NaiveDate,
  errors: &mut ValidationErrors,
) -> Vec<NewEducation> {
  let mut rows = Vec::with_capacity(entries.len());
  for (i, entry) in entries.iter().enumerate() {
    let text = entry.text.trim();
    if text.is_empty() {
      errors.push(format!("education[{i}].text"), "qualification is required");
      continue;
    }
    if entry.year.is_some_and(|y| !(MIN_EDUCATION_YEAR..=today.year()).contains(&y)) {
      errors.push(format!("education[{i}].year"), "completion year is out of range");
    }
    rows.push(NewEducation {
      qualification:   text.to_owned(),
      institution:     None,
      level:           EducationLevel::infer(text),
      completion_year: entry.year,
    });
  }
  rows
}

fn skills(names: &[String], errors: &mut ValidationErrors) -> Vec<NewSkill> {
  let mut rows = Vec::with_capacity(names.len());
  for (i, name) in names.iter().enumerate() {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
      errors.push(format!("skills[{i}]"), "skill must be 1-100 characters");
      continue;
    }
    rows.push(NewSkill { name: name.to_owned(), proficiency: None });
  }
  rows
}

fn certifications(
  entries: &[ConfirmedCertification],
  errors: &mut ValidationErrors,
) -> Vec<NewCertification> {
  let mut rows = Vec::with_capacity(entries.len());
  for (i, entry) in entries.iter().enumerate() {
    let name = entry.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
      errors.push(format!("certifications[{i}].name"), "name must be 1-100 characters");
      continue;
    }
    if let (Some(issued), Some(expires)) = (entry.issue_date, entry.expiry_date) {
      errors.check(
        expires >= issued,
        &format!("certifications[{i}].expiryDate"),
        "expiry precedes issue date",
      );
    }
    rows.push(NewCertification {
      name:        name.to_owned(),
      issuer:      non_blank(&entry.issuer).map(str::to_owned),
      issue_date:  entry.issue_date,
      expiry_date: entry.expiry_date,
    });
  }
  rows
}
