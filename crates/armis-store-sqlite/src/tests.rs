//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use armis_core::{
  aggregate::ProfileAggregator,
  apply::ProfileDataApplier,
  canonical::RawRecord,
  context::RequestContext,
  draft::{
    ApplySection, ConfirmedCertification, ConfirmedContact, ConfirmedDraft,
    ConfirmedSections, CvDocument, DraftEducation, DraftProfile, SectionOutcome,
  },
  expiry::ExpiryItem,
  profile::{
    Address, AddressKind, Award, AwardKind, ClearanceLevel, ClearanceStatus,
    ContactType, Deployment, DeploymentStatus, EducationLevel, Gender,
    MedicalReadiness, SecurityClearance, ServicePosting, Training, TrainingStatus,
  },
  report::{GroupBy, ReadinessSummary, UNSPECIFIED},
  scoring::ScoringPolicy,
  store::{
    ContactStore, CvDocumentStore, EducationStore, FamilyStore, IdentityStore,
    NewContactMethod, NewEducation, NewSkill, ReadinessStore, ReportStore,
    SkillStore,
  },
  validate::{IdentityUpdate, NewFamilyMember},
};
use chrono::{NaiveDate, TimeZone as _, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn ctx() -> RequestContext { RequestContext::new("tester", date(2024, 6, 1)) }

fn record(value: serde_json::Value) -> RawRecord { serde_json::from_value(value).unwrap() }

async fn jane(s: &SqliteStore) -> i64 {
  let rank = s.upsert_rank("Captain").await.unwrap();
  let unit = s.upsert_unit("1st Signals").await.unwrap();
  s.insert_person(record(json!({
    "first_name": "Jane",
    "last_name": "Doe",
    "date_of_birth": "1990-01-15",
    "gender": "female",
    "rank_id": rank,
    "unit_id": unit,
    "enlistment_date": "2011-03-01",
  })))
  .await
  .unwrap()
}

fn cv(person_id: i64) -> CvDocument {
  CvDocument {
    reference: Uuid::new_v4(),
    person_id,
    file_name: "cv.pdf".into(),
    media_type: "application/pdf".into(),
    size_bytes: 1024,
    content_hash: "ab".repeat(32),
    stored_path: "cv/x.pdf".into(),
    extracted: DraftProfile {
      skills: vec!["Driving".into()],
      ..DraftProfile::default()
    },
    uploaded_at: Utc.with_ymd_and_hms(2024, 5, 30, 12, 0, 0).unwrap(),
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn identity_row_includes_rank_and_unit_names() {
  let s = store().await;
  let id = jane(&s).await;

  let raw = s.get_identity(id).await.unwrap().unwrap();
  assert_eq!(raw["first_name"], json!("Jane"));
  assert_eq!(raw["rank_name"], json!("Captain"));
  assert_eq!(raw["unit_name"], json!("1st Signals"));
  assert!(s.get_identity(id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn legacy_columns_are_read_through_the_canonical_layer() {
  let s = store().await;
  let id = s
    .insert_person(record(json!({ "fname": "John", "lname": "Banda", "dob": "15/01/1980", "sex": "M" })))
    .await
    .unwrap();

  let aggregator = ProfileAggregator::new(Arc::new(s), ScoringPolicy::default());
  let profile = aggregator.get_profile(&ctx(), id).await.unwrap();
  assert_eq!(profile.identity.first_name.as_deref(), Some("John"));
  assert_eq!(profile.identity.last_name.as_deref(), Some("Banda"));
  assert_eq!(profile.identity.gender, Some(Gender::Male));
  assert_eq!(profile.full_name, "John Banda");
}

#[tokio::test]
async fn unknown_staff_columns_are_rejected() {
  let s = store().await;
  let err = s.insert_person(record(json!({ "shoe_size": 44 }))).await.unwrap_err();
  assert!(matches!(err, Error::UnknownColumn(column) if column == "shoe_size"));
}

#[tokio::test]
async fn update_identity_retires_legacy_values() {
  let s = store().await;
  let id = s
    .insert_person(record(json!({ "fname": "Jon", "lname": "Banda", "dob": "1980-01-15" })))
    .await
    .unwrap();

  let update = IdentityUpdate {
    first_name: "John".into(),
    last_name: "Banda".into(),
    email: Some("john@example.mil".into()),
    ..IdentityUpdate::default()
  };
  assert!(s.update_identity(id, update.clone()).await.unwrap());
  assert!(!s.update_identity(id + 1, update).await.unwrap());

  let raw = s.get_identity(id).await.unwrap().unwrap();
  assert_eq!(raw["first_name"], json!("John"));
  assert_eq!(raw["fname"], serde_json::Value::Null);
  assert_eq!(raw["dob"], serde_json::Value::Null);
  assert_eq!(raw["email"], json!("john@example.mil"));
}

#[tokio::test]
async fn photo_path_is_recorded() {
  let s = store().await;
  let id = jane(&s).await;
  assert!(s.set_photo(id, "photos/1.jpg".into()).await.unwrap());
  assert!(!s.set_photo(id + 1, "photos/2.jpg".into()).await.unwrap());
  let raw = s.get_identity(id).await.unwrap().unwrap();
  assert_eq!(raw["photo_path"], json!("photos/1.jpg"));
}

#[tokio::test]
async fn deleting_a_person_cascades_to_child_records() {
  let s = store().await;
  let id = jane(&s).await;
  let other = jane(&s).await;
  s.insert_skills(id, vec![NewSkill { name: "Driving".into(), proficiency: None }])
    .await
    .unwrap();
  s.insert_skills(other, vec![NewSkill { name: "Driving".into(), proficiency: None }])
    .await
    .unwrap();
  s.add_family_member(id, NewFamilyMember {
    name: "John Doe".into(),
    relationship: "Spouse".into(),
    ..NewFamilyMember::default()
  })
  .await
  .unwrap();
  s.record_cv(cv(id)).await.unwrap();

  assert!(s.delete_person(id).await.unwrap());
  assert!(!s.delete_person(id).await.unwrap());
  assert!(s.get_identity(id).await.unwrap().is_none());
  assert!(s.list_skills(id).await.unwrap().is_empty());
  assert!(s.list_family(id).await.unwrap().is_empty());
  assert_eq!(s.list_skills(other).await.unwrap().len(), 1);
}

// ─── Child records ───────────────────────────────────────────────────────────

#[tokio::test]
async fn contacts_skip_duplicates_and_keep_one_primary_per_type() {
  let s = store().await;
  let id = jane(&s).await;
  let contact = |value: &str, is_primary| NewContactMethod {
    contact_type: ContactType::Email,
    value: value.into(),
    is_primary,
  };

  let write = s
    .insert_contacts(id, vec![contact("a@example.mil", true), contact("a@example.mil", false)])
    .await
    .unwrap();
  assert_eq!((write.inserted, write.skipped), (1, 1));

  s.insert_contacts(id, vec![contact("b@example.mil", true)]).await.unwrap();
  let contacts = s.list_contacts(id).await.unwrap();
  let primaries: Vec<&str> =
    contacts.iter().filter(|c| c.is_primary).map(|c| c.value.as_str()).collect();
  assert_eq!(contacts.len(), 2);
  assert_eq!(primaries, ["b@example.mil"]);
}

#[tokio::test]
async fn existing_contact_is_promoted_when_applied_as_primary() {
  let s = store().await;
  let id = jane(&s).await;
  let contact = |value: &str, is_primary| NewContactMethod {
    contact_type: ContactType::Email,
    value: value.into(),
    is_primary,
  };
  s.insert_contacts(id, vec![contact("a@example.mil", true), contact("b@example.mil", false)])
    .await
    .unwrap();

  let write = s.insert_contacts(id, vec![contact("b@example.mil", true)]).await.unwrap();
  assert_eq!((write.inserted, write.skipped), (0, 1));

  let contacts = s.list_contacts(id).await.unwrap();
  let primaries: Vec<&str> =
    contacts.iter().filter(|c| c.is_primary).map(|c| c.value.as_str()).collect();
  assert_eq!(contacts.len(), 2);
  assert_eq!(primaries, ["b@example.mil"]);
}

#[tokio::test]
async fn education_is_deduplicated_on_qualification_and_year() {
  let s = store().await;
  let id = jane(&s).await;
  let row = |qualification: &str, year| NewEducation {
    qualification: qualification.into(),
    institution: None,
    level: EducationLevel::infer(qualification),
    completion_year: year,
  };

  let first = s
    .insert_education(id, vec![row("BSc Computer Science", Some(2012)), row("Diploma", None)])
    .await
    .unwrap();
  assert_eq!((first.inserted, first.skipped), (2, 0));

  let second = s
    .insert_education(id, vec![
      row("bsc computer science", Some(2012)),
      row("BSc Computer Science", Some(2015)),
      row("DIPLOMA", None),
    ])
    .await
    .unwrap();
  assert_eq!((second.inserted, second.skipped), (1, 2));

  let education = s.list_education(id).await.unwrap();
  assert_eq!(education.len(), 3);
  assert_eq!(education[0].completion_year, Some(2015));
  assert_eq!(education[0].level, EducationLevel::Bachelor);
}

#[tokio::test]
async fn replace_family_swaps_the_whole_list() {
  let s = store().await;
  let id = jane(&s).await;
  let member = |name: &str| NewFamilyMember {
    name: name.into(),
    relationship: "Child".into(),
    is_dependent: true,
    ..NewFamilyMember::default()
  };

  s.add_family_member(id, member("Old Entry")).await.unwrap();
  let written = s.replace_family(id, vec![member("Amy Doe"), member("Ben Doe")]).await.unwrap();
  assert_eq!(written, Some(2));

  let rows = s.list_family(id).await.unwrap();
  let names: Vec<&serde_json::Value> = rows.iter().map(|r| &r["name"]).collect();
  assert_eq!(names, [&json!("Amy Doe"), &json!("Ben Doe")]);
  assert_eq!(rows[0]["is_dependent"], json!(1));

  assert_eq!(s.replace_family(id + 1, vec![member("Nobody")]).await.unwrap(), None);
  assert_eq!(s.add_family_member(id + 1, member("Nobody")).await.unwrap(), None);
}

#[tokio::test]
async fn child_inserts_for_missing_people_fail() {
  let s = store().await;
  let training = Training {
    id:          0,
    course_name: "First Aid".into(),
    provider:    None,
    start_date:  None,
    end_date:    None,
    due_date:    Some(date(2024, 1, 1)),
    status:      TrainingStatus::Planned,
    mandatory:   true,
  };
  let err = s.add_training(42, training).await.unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(42)));
}

#[tokio::test]
async fn readiness_records_are_replaced_not_duplicated() {
  let s = store().await;
  let id = jane(&s).await;
  let clearance = |status| SecurityClearance {
    level: ClearanceLevel::Secret,
    issue_date: Some(date(2020, 1, 1)),
    expiry_date: Some(date(2025, 1, 1)),
    status,
  };

  s.set_security_clearance(id, clearance(ClearanceStatus::Active)).await.unwrap();
  s.set_security_clearance(id, clearance(ClearanceStatus::Suspended)).await.unwrap();
  let stored = s.get_security_clearance(id).await.unwrap().unwrap();
  assert_eq!(stored.status, ClearanceStatus::Suspended);
  assert!(s.get_medical_readiness(id).await.unwrap().is_none());
}

#[tokio::test]
async fn service_records_read_back_through_the_aggregator() {
  let s = Arc::new(store().await);
  let id = jane(&s).await;
  let aggregator = ProfileAggregator::new(s.clone(), ScoringPolicy::default());
  let before = aggregator.get_profile(&ctx(), id).await.unwrap();

  s.add_address(id, Address {
    id:          0,
    kind:        AddressKind::Postal,
    line1:       "P.O. Box 31931".into(),
    line2:       Some("  ".into()),
    city:        Some("Lusaka".into()),
    province:    None,
    country:     Some("Zambia".into()),
    postal_code: None,
  })
  .await
  .unwrap();
  s.add_award(id, Award {
    id:         0,
    name:       "Long Service Medal".into(),
    kind:       AwardKind::Medal,
    awarded_on: Some(date(2021, 9, 1)),
    citation:   None,
  })
  .await
  .unwrap();
  s.add_deployment(id, Deployment {
    id:         0,
    mission:    "MINUSCA".into(),
    location:   Some("Bangui".into()),
    start_date: Some(date(2022, 2, 1)),
    end_date:   None,
    status:     DeploymentStatus::Active,
  })
  .await
  .unwrap();
  for (unit, from) in [("Depot", date(2011, 3, 1)), ("1st Signals", date(2016, 7, 1))] {
    s.add_posting(id, ServicePosting {
      id:          0,
      unit_name:   unit.into(),
      appointment: Some("Signals Officer".into()),
      from_date:   Some(from),
      to_date:     None,
    })
    .await
    .unwrap();
  }

  let profile = aggregator.get_profile(&ctx(), id).await.unwrap();
  assert!(profile.unavailable.is_empty());

  assert_eq!(profile.addresses.len(), 1);
  let address = &profile.addresses[0];
  assert_eq!(address.kind, AddressKind::Postal);
  assert_eq!(address.line1, "P.O. Box 31931");
  assert_eq!(address.line2, None);
  assert_eq!(address.city.as_deref(), Some("Lusaka"));

  assert_eq!(profile.awards[0].kind, AwardKind::Medal);
  assert_eq!(profile.awards[0].awarded_on, Some(date(2021, 9, 1)));
  assert_eq!(profile.deployments[0].status, DeploymentStatus::Active);
  assert_eq!(profile.deployments[0].location.as_deref(), Some("Bangui"));

  let units: Vec<_> = profile.service_history.iter().map(|p| p.unit_name.as_str()).collect();
  assert_eq!(units, ["1st Signals", "Depot"]);

  // Only the address carries a completion bonus.
  assert_eq!(profile.profile_completion_percent, before.profile_completion_percent + 5);
}

// ─── CV documents ────────────────────────────────────────────────────────────

#[tokio::test]
async fn cv_documents_round_trip() {
  let s = store().await;
  let id = jane(&s).await;
  let document = cv(id);

  s.record_cv(document.clone()).await.unwrap();
  assert_eq!(s.get_cv(document.reference).await.unwrap(), Some(document));
  assert!(s.get_cv(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn cv_for_missing_person_is_refused() {
  let s = store().await;
  let err = s.record_cv(cv(7)).await.unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(7)));
}

#[tokio::test]
async fn applied_draft_shows_up_in_the_profile() {
  let s = Arc::new(store().await);
  let id = jane(&s).await;
  let document = cv(id);
  s.record_cv(document.clone()).await.unwrap();

  let applier = ProfileDataApplier::new(s.clone());
  let confirmed = ConfirmedDraft {
    cv_reference: document.reference,
    per_section_confirmed_fields: ConfirmedSections {
      contact: Some(ConfirmedContact {
        email: Some("jane@example.mil".into()),
        phone: None,
        make_primary: true,
      }),
      education: Some(vec![DraftEducation { text: "BSc Nursing".into(), year: Some(2012) }]),
      skills: Some(vec!["Driving".into(), "First Aid".into()]),
      certifications: Some(vec![ConfirmedCertification {
        name: "Advanced Trauma Life Support".into(),
        issuer: None,
        issue_date: None,
        expiry_date: Some(date(2026, 1, 1)),
      }]),
    },
  };
  let report = applier.apply(&ctx(), id, confirmed.clone()).await.unwrap();
  assert_eq!(
    report.get(ApplySection::Skills),
    Some(&SectionOutcome::Success { inserted: 2, skipped: 0 })
  );

  let again = applier.apply(&ctx(), id, confirmed).await.unwrap();
  assert_eq!(
    again.get(ApplySection::Education),
    Some(&SectionOutcome::Success { inserted: 0, skipped: 1 })
  );

  let aggregator = ProfileAggregator::new(s.clone(), ScoringPolicy::default());
  let profile = aggregator.get_profile(&ctx(), id).await.unwrap();
  assert_eq!(profile.skills.len(), 2);
  assert_eq!(profile.education[0].qualification, "BSc Nursing");
  assert_eq!(profile.contact_methods.len(), 1);
  assert!(profile.contact_methods[0].is_primary);
  assert_eq!(profile.certifications.len(), 1);
  assert!(profile.unavailable.is_empty());
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn staff_counts_group_and_label_missing_values() {
  let s = store().await;
  jane(&s).await;
  jane(&s).await;
  s.insert_person(record(json!({ "sex": "F" }))).await.unwrap();
  s.insert_person(record(json!({ "gender": "male" }))).await.unwrap();

  let by_rank = s.staff_count_by(GroupBy::Rank).await.unwrap();
  let by_rank: Vec<(&str, u64)> = by_rank.iter().map(|r| (r.label.as_str(), r.count)).collect();
  assert_eq!(by_rank, [("Captain", 2), (UNSPECIFIED, 2)]);

  let by_gender = s.staff_count_by(GroupBy::Gender).await.unwrap();
  let by_gender: Vec<(&str, u64)> =
    by_gender.iter().map(|r| (r.label.as_str(), r.count)).collect();
  assert_eq!(by_gender, [("female", 3), ("male", 1)]);
}

#[tokio::test]
async fn expiry_dates_feed_the_readiness_summary() {
  let s = store().await;
  let id = jane(&s).await;
  s.set_security_clearance(id, SecurityClearance {
    level:       ClearanceLevel::Secret,
    issue_date:  None,
    expiry_date: Some(date(2024, 5, 20)),
    status:      ClearanceStatus::Active,
  })
  .await
  .unwrap();
  s.set_medical_readiness(id, MedicalReadiness {
    fitness_category:    "A1".into(),
    exam_date:           Some(date(2023, 8, 1)),
    exam_expiry:         Some(date(2024, 8, 1)),
    deployment_eligible: true,
  })
  .await
  .unwrap();

  let entries = s.list_expiry_dates().await.unwrap();
  let items: Vec<ExpiryItem> = entries.iter().map(|e| e.item).collect();
  assert_eq!(items, [ExpiryItem::SecurityClearance, ExpiryItem::MedicalExam]);

  let aggregator = ProfileAggregator::new(Arc::new(s), ScoringPolicy::default());
  let summary = ReadinessSummary::build(aggregator.tracker(), date(2024, 6, 1), &entries);
  assert_eq!(summary.security_clearance.overdue, 1);
  assert_eq!(summary.medical_exam.warning, 1);
}
