//! `ProfileAggregator`: one person's scattered records in, one
//! [`PersonProfile`] out.

use std::{collections::BTreeSet, fmt::Display, sync::Arc};

use tracing::{debug, warn};

use crate::{
  Error, PersonId, Result,
  canonical::{normalize_family, normalize_identity},
  context::RequestContext,
  dates::years_since,
  expiry::{ExpiryItem, ExpiryStatus, ExpiryTracker},
  profile::{ContactMethod, PersonProfile, Section},
  scoring::{CompletionScorer, ScoringPolicy},
  store::ProfileSource,
};

/// Read-only composition service over a [`ProfileSource`].
///
/// Only the identity row is mandatory. Every other collection is fetched on
/// its own; a failing fetch is logged, recorded in
/// [`PersonProfile::unavailable`] and served as empty.
pub struct ProfileAggregator<S> {
  store:   Arc<S>,
  scorer:  CompletionScorer,
  tracker: ExpiryTracker,
}

impl<S> Clone for ProfileAggregator<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      scorer:  self.scorer.clone(),
      tracker: self.tracker,
    }
  }
}

impl<S: ProfileSource> ProfileAggregator<S> {
  pub fn new(store: Arc<S>, policy: ScoringPolicy) -> Self {
    let tracker = ExpiryTracker::new(policy.expiry);
    Self { store, scorer: CompletionScorer::new(policy), tracker }
  }

  pub fn scorer(&self) -> &CompletionScorer { &self.scorer }

  pub fn tracker(&self) -> &ExpiryTracker { &self.tracker }

  /// Fetch, normalise and derive the full profile for `id` as of
  /// `ctx.today`.
  pub async fn get_profile(&self, ctx: &RequestContext, id: PersonId) -> Result<PersonProfile> {
    let raw = match self.store.get_identity(id).await {
      Ok(Some(raw)) => raw,
      Ok(None) => {
        debug!(person_id = id, actor = %ctx.actor, "no identity record");
        return Err(Error::NotFound(id));
      }
      Err(e) => {
        warn!(person_id = id, error = %e, "identity fetch failed");
        return Err(Error::NotFound(id));
      }
    };
    let (identity, assignment) = normalize_identity(id, &raw);

    let mut unavailable = Vec::new();
    let store = &self.store;

    let contact_methods = degrade(
      id,
      Section::ContactMethods,
      store.list_contacts(id).await,
      &mut unavailable,
    );
    let addresses =
      degrade(id, Section::Addresses, store.list_addresses(id).await, &mut unavailable);
    let family_rows =
      degrade(id, Section::FamilyMembers, store.list_family(id).await, &mut unavailable);
    let education =
      degrade(id, Section::Education, store.list_education(id).await, &mut unavailable);
    let training = degrade(id, Section::Training, store.list_training(id).await, &mut unavailable);
    let skills = degrade(id, Section::Skills, store.list_skills(id).await, &mut unavailable);
    let certifications = degrade(
      id,
      Section::Certifications,
      store.list_certifications(id).await,
      &mut unavailable,
    );
    let awards = degrade(id, Section::Awards, store.list_awards(id).await, &mut unavailable);
    let deployments =
      degrade(id, Section::Deployments, store.list_deployments(id).await, &mut unavailable);
    let service_history = degrade(
      id,
      Section::ServiceHistory,
      store.list_service_history(id).await,
      &mut unavailable,
    );
    let security_clearance = degrade(
      id,
      Section::SecurityClearance,
      store.get_security_clearance(id).await,
      &mut unavailable,
    );
    let medical_readiness = degrade(
      id,
      Section::MedicalReadiness,
      store.get_medical_readiness(id).await,
      &mut unavailable,
    );

    let mut profile = PersonProfile {
      identity,
      assignment,
      contact_methods: single_primary_per_type(id, contact_methods),
      addresses,
      family_members: family_rows.iter().filter_map(normalize_family).collect(),
      education,
      training,
      skills,
      certifications,
      awards,
      deployments,
      service_history,
      security_clearance,
      medical_readiness,
      unavailable,
      ..PersonProfile::default()
    };
    self.derive(&mut profile, ctx);

    debug!(
      person_id = id,
      completion = profile.profile_completion_percent,
      deployment_ready = profile.deployment_ready,
      unavailable = ?profile.unavailable,
      "profile aggregated"
    );
    Ok(profile)
  }

  /// Recompute every derived field from the profile's current contents.
  pub fn derive(&self, profile: &mut PersonProfile, ctx: &RequestContext) {
    let today = ctx.today;
    profile.full_name = profile.identity.full_name();
    profile.age = years_since(profile.identity.date_of_birth, today);
    profile.years_of_service = years_since(profile.assignment.enlistment_date, today);
    profile.expiries = self.expiries(profile, ctx);

    let assessment = self.scorer.assess(profile, today);
    profile.profile_completion_percent = assessment.completion_percent;
    profile.deployment_ready = assessment.deployment_ready;
    profile.readiness_blockers = assessment.blockers;
  }

  fn expiries(&self, profile: &PersonProfile, ctx: &RequestContext) -> Vec<ExpiryStatus> {
    let status = |item, label: &str, date| {
      ExpiryStatus::new(&self.tracker, ctx.today, item, label, date)
    };
    let mut expiries = Vec::new();

    if let Some(clearance) = &profile.security_clearance {
      if let Some(date) = clearance.expiry_date {
        expiries.push(status(ExpiryItem::SecurityClearance, clearance.level.as_ref(), date));
      }
    }
    if let Some(medical) = &profile.medical_readiness {
      if let Some(date) = medical.exam_expiry {
        expiries.push(status(ExpiryItem::MedicalExam, &medical.fitness_category, date));
      }
    }
    for cert in &profile.certifications {
      if let Some(date) = cert.expiry_date {
        expiries.push(status(ExpiryItem::Certification, &cert.name, date));
      }
    }

    expiries.sort_by_key(|e| e.days_remaining);
    expiries
  }
}

fn degrade<T: Default, E: Display>(
  id: PersonId,
  section: Section,
  result: std::result::Result<T, E>,
  unavailable: &mut Vec<Section>,
) -> T {
  result.unwrap_or_else(|e| {
    warn!(person_id = id, %section, error = %e, "collection unavailable; serving empty");
    unavailable.push(section);
    T::default()
  })
}

/// Keep the first primary of each contact type; demote the rest.
fn single_primary_per_type(id: PersonId, mut contacts: Vec<ContactMethod>) -> Vec<ContactMethod> {
  let mut seen = BTreeSet::new();
  for contact in contacts.iter_mut().filter(|c| c.is_primary) {
    if !seen.insert(contact.contact_type) {
      warn!(
        person_id = id,
        contact_id = contact.id,
        contact_type = %contact.contact_type,
        "extra primary contact demoted"
      );
      contact.is_primary = false;
    }
  }
  contacts
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, NaiveDate};
  use serde_json::json;

  use super::*;
  use crate::{
    expiry::ExpiryBand,
    mock::MockStore,
    profile::{
      Certification, ClearanceLevel, ClearanceStatus, ContactType, Gender,
      SecurityClearance,
    },
  };

  fn ctx() -> RequestContext {
    RequestContext::system(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
  }

  fn jane_row() -> serde_json::Value {
    json!({
      "fname": "Jane", "lname": "Doe", "dob": "1990-01-01", "sex": "Female",
      "email": "", "phone": "", "nrc": "", "rank": "Captain", "unit": "1st Battalion",
      "marital_status": "", "attest_date": "2010-06-02",
    })
  }

  fn aggregator(store: MockStore) -> ProfileAggregator<MockStore> {
    ProfileAggregator::new(Arc::new(store), ScoringPolicy::default())
  }

  #[tokio::test]
  async fn unknown_person_is_not_found() {
    let agg = aggregator(MockStore::default());
    let err = agg.get_profile(&ctx(), 99).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(99)));
  }

  #[tokio::test]
  async fn identity_failure_is_not_found() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    store.fail_identity();
    let err = aggregator(store).get_profile(&ctx(), 1).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(1)));
  }

  #[tokio::test]
  async fn identity_only_profile_scores_from_identity_fields() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();

    assert_eq!(profile.full_name, "Jane Doe");
    assert_eq!(profile.identity.gender, Some(Gender::Female));
    assert_eq!(profile.age, Some(34));
    assert_eq!(profile.years_of_service, Some(13));
    assert!(profile.contact_methods.is_empty());
    assert!(profile.family_members.is_empty());
    assert!(profile.unavailable.is_empty());
    assert_eq!(profile.profile_completion_percent, 44);
    assert!(!profile.deployment_ready);
  }

  #[tokio::test]
  async fn failing_collections_degrade_to_empty() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    store.add_family(1, json!({ "name": "John Doe", "relationship": "Spouse" }));
    store.fail_read(Section::FamilyMembers);
    store.fail_read(Section::Education);

    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();
    assert!(profile.family_members.is_empty());
    assert_eq!(profile.unavailable, vec![Section::FamilyMembers, Section::Education]);
    assert_eq!(profile.profile_completion_percent, 44);
  }

  #[tokio::test]
  async fn every_collection_failing_still_renders() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    store.fail_all_reads();
    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();
    assert_eq!(profile.unavailable.len(), 12);
    assert_eq!(profile.full_name, "Jane Doe");
  }

  #[tokio::test]
  async fn legacy_family_rows_are_normalised() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    store.add_family(1, json!({ "fname": "John", "lname": "Doe", "relation": "Spouse" }));
    store.add_family(1, json!({ "relation": "Child" }));

    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();
    assert_eq!(profile.family_members.len(), 1);
    assert_eq!(profile.family_members[0].name, "John Doe");
    assert_eq!(profile.family_members[0].relationship, "Spouse");
  }

  #[tokio::test]
  async fn only_first_primary_per_type_survives() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    store.add_contact(1, ContactType::Mobile, "0971111111", true);
    store.add_contact(1, ContactType::Mobile, "0972222222", true);
    store.add_contact(1, ContactType::Email, "jane@example.mil", true);

    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();
    let primaries: Vec<_> = profile
      .contact_methods
      .iter()
      .filter(|c| c.is_primary)
      .map(|c| c.value.as_str())
      .collect();
    assert_eq!(primaries, ["0971111111", "jane@example.mil"]);
  }

  #[tokio::test]
  async fn expiries_are_listed_soonest_first() {
    let today = ctx().today;
    let store = MockStore::default();
    store.add_person(1, jane_row());
    store.set_clearance(1, SecurityClearance {
      level:       ClearanceLevel::Secret,
      issue_date:  None,
      expiry_date: Some(today - Duration::days(5)),
      status:      ClearanceStatus::Active,
    });
    store.add_certification(1, Certification {
      id:          1,
      name:        "Paramedic".into(),
      issuer:      None,
      issue_date:  None,
      expiry_date: Some(today + Duration::days(60)),
    });

    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();
    let summary: Vec<_> =
      profile.expiries.iter().map(|e| (e.item, e.days_remaining, e.band)).collect();
    assert_eq!(summary, vec![
      (ExpiryItem::SecurityClearance, -5, ExpiryBand::Urgent),
      (ExpiryItem::Certification, 60, ExpiryBand::Warning),
    ]);
  }

  #[tokio::test]
  async fn profile_serialises_with_canonical_names() {
    let store = MockStore::default();
    store.add_person(1, jane_row());
    let profile = aggregator(store).get_profile(&ctx(), 1).await.unwrap();
    let value = serde_json::to_value(&profile).unwrap();

    assert_eq!(value["identity"]["firstName"], "Jane");
    assert_eq!(value["assignment"]["rankName"], "Captain");
    assert_eq!(value["profileCompletionPercent"], 44);
    assert_eq!(value["contactMethods"], json!([]));
    assert!(value.get("unavailable").is_none());
    assert!(value["identity"].get("fname").is_none());
  }
}
