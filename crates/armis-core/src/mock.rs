//! In-memory store for core tests. Any read section or write section can be
//! forced to fail.

use std::{
  collections::{BTreeMap, HashSet},
  sync::{Mutex, MutexGuard},
};

use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  PersonId,
  canonical::RawRecord,
  draft::{ApplySection, CvDocument, SectionWrite},
  profile::{
    Address, Award, Certification, ContactMethod, ContactType, Deployment,
    Education, MedicalReadiness, SecurityClearance, Section, ServicePosting,
    Skill, Training,
  },
  store::{
    ContactStore, CvDocumentStore, EducationStore, FamilyStore, IdentityStore,
    NewCertification, NewContactMethod, NewEducation, NewSkill,
    ReadinessStore, ServiceRecordStore, SkillStore, StoreBackend,
  },
  validate::{IdentityUpdate, NewFamilyMember},
};

#[derive(Debug, thiserror::Error)]
#[error("mock store failure: {0}")]
pub struct MockError(String);

#[derive(Debug, Default, Clone)]
struct Records {
  contacts:        Vec<ContactMethod>,
  addresses:       Vec<Address>,
  family:          Vec<RawRecord>,
  education:       Vec<Education>,
  training:        Vec<Training>,
  skills:          Vec<Skill>,
  certifications:  Vec<Certification>,
  awards:          Vec<Award>,
  deployments:     Vec<Deployment>,
  service_history: Vec<ServicePosting>,
  clearance:       Option<SecurityClearance>,
  medical:         Option<MedicalReadiness>,
}

#[derive(Default)]
struct Inner {
  identities:     BTreeMap<PersonId, RawRecord>,
  records:        BTreeMap<PersonId, Records>,
  cvs:            BTreeMap<Uuid, CvDocument>,
  failing_reads:  HashSet<Section>,
  failing_writes: HashSet<ApplySection>,
  identity_fails: bool,
  next_id:        i64,
}

impl Inner {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

#[derive(Default)]
pub struct MockStore {
  inner: Mutex<Inner>,
}

const ALL_SECTIONS: [Section; 12] = [
  Section::ContactMethods,
  Section::Addresses,
  Section::FamilyMembers,
  Section::Education,
  Section::Training,
  Section::Skills,
  Section::Certifications,
  Section::Awards,
  Section::Deployments,
  Section::ServiceHistory,
  Section::SecurityClearance,
  Section::MedicalReadiness,
];

// ─── Test setup helpers ──────────────────────────────────────────────────────

impl MockStore {
  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn records(&self, id: PersonId) -> Records {
    self.lock().records.get(&id).cloned().unwrap_or_default()
  }

  fn edit(&self, id: PersonId, f: impl FnOnce(&mut Records)) {
    f(self.lock().records.entry(id).or_default());
  }

  pub fn add_person(&self, id: PersonId, row: Value) {
    let raw: RawRecord = serde_json::from_value(row).unwrap();
    let mut inner = self.lock();
    inner.identities.insert(id, raw);
    inner.records.entry(id).or_default();
  }

  pub fn add_family(&self, id: PersonId, row: Value) {
    let raw: RawRecord = serde_json::from_value(row).unwrap();
    self.edit(id, |r| r.family.push(raw));
  }

  pub fn add_contact(&self, id: PersonId, contact_type: ContactType, value: &str, primary: bool) {
    let contact_id = self.lock().next_id();
    self.edit(id, |r| {
      r.contacts.push(ContactMethod {
        id: contact_id,
        contact_type,
        value: value.into(),
        is_primary: primary,
      })
    });
  }

  pub fn add_certification(&self, id: PersonId, cert: Certification) {
    self.edit(id, |r| r.certifications.push(cert));
  }

  pub fn set_clearance(&self, id: PersonId, clearance: SecurityClearance) {
    self.edit(id, |r| r.clearance = Some(clearance));
  }

  pub fn add_cv(&self, doc: CvDocument) { self.lock().cvs.insert(doc.reference, doc); }

  pub fn fail_identity(&self) { self.lock().identity_fails = true; }

  pub fn fail_read(&self, section: Section) { self.lock().failing_reads.insert(section); }

  pub fn fail_all_reads(&self) { self.lock().failing_reads.extend(ALL_SECTIONS); }

  pub fn fail_write(&self, section: ApplySection) { self.lock().failing_writes.insert(section); }

  pub fn skills_of(&self, id: PersonId) -> usize { self.records(id).skills.len() }

  pub fn education_of(&self, id: PersonId) -> usize { self.records(id).education.len() }

  fn read<T>(
    &self,
    section: Section,
    id: PersonId,
    f: impl FnOnce(&Records) -> T,
  ) -> Result<T, MockError> {
    let inner = self.lock();
    if inner.failing_reads.contains(&section) {
      return Err(MockError(format!("{section} table missing")));
    }
    let records = inner.records.get(&id).cloned().unwrap_or_default();
    Ok(f(&records))
  }

  /// Run `f` against the person's records unless `section` is set to fail.
  /// `f` sees a copy that is only committed when it returns.
  fn write(
    &self,
    section: ApplySection,
    id: PersonId,
    f: impl FnOnce(&mut Records, &mut i64) -> SectionWrite,
  ) -> Result<SectionWrite, MockError> {
    let mut inner = self.lock();
    if inner.failing_writes.contains(&section) {
      return Err(MockError(format!("{section} insert failed")));
    }
    let mut records = inner.records.get(&id).cloned().unwrap_or_default();
    let mut next_id = inner.next_id;
    let write = f(&mut records, &mut next_id);
    inner.next_id = next_id;
    inner.records.insert(id, records);
    Ok(write)
  }
}

fn same(a: &str, b: &str) -> bool { a.trim().eq_ignore_ascii_case(b.trim()) }

// ─── Capability impls ────────────────────────────────────────────────────────

impl StoreBackend for MockStore {
  type Error = MockError;
}

impl IdentityStore for MockStore {
  async fn get_identity(&self, id: PersonId) -> Result<Option<RawRecord>, MockError> {
    let inner = self.lock();
    if inner.identity_fails {
      return Err(MockError("identity table unreadable".into()));
    }
    Ok(inner.identities.get(&id).cloned())
  }

  async fn update_identity(&self, id: PersonId, update: IdentityUpdate) -> Result<bool, MockError> {
    let mut inner = self.lock();
    let Some(raw) = inner.identities.get_mut(&id) else { return Ok(false) };
    raw.insert("first_name".into(), Value::String(update.first_name));
    raw.insert("last_name".into(), Value::String(update.last_name));
    Ok(true)
  }

  async fn set_photo(&self, id: PersonId, path: String) -> Result<bool, MockError> {
    let mut inner = self.lock();
    let Some(raw) = inner.identities.get_mut(&id) else { return Ok(false) };
    raw.insert("photo_path".into(), Value::String(path));
    Ok(true)
  }

  async fn delete_person(&self, id: PersonId) -> Result<bool, MockError> {
    let mut inner = self.lock();
    inner.records.remove(&id);
    Ok(inner.identities.remove(&id).is_some())
  }
}

impl ContactStore for MockStore {
  async fn list_contacts(&self, id: PersonId) -> Result<Vec<ContactMethod>, MockError> {
    self.read(Section::ContactMethods, id, |r| r.contacts.clone())
  }

  async fn list_addresses(&self, id: PersonId) -> Result<Vec<Address>, MockError> {
    self.read(Section::Addresses, id, |r| r.addresses.clone())
  }

  async fn insert_contacts(
    &self,
    id: PersonId,
    contacts: Vec<NewContactMethod>,
  ) -> Result<SectionWrite, MockError> {
    self.write(ApplySection::Contact, id, |r, next_id| {
      let mut write = SectionWrite::default();
      for new in contacts {
        let existing =
          r.contacts.iter().position(|c| c.contact_type == new.contact_type && c.value == new.value);
        if new.is_primary {
          for c in r.contacts.iter_mut().filter(|c| c.contact_type == new.contact_type) {
            c.is_primary = false;
          }
        }
        if let Some(index) = existing {
          r.contacts[index].is_primary |= new.is_primary;
          write.skipped += 1;
          continue;
        }
        *next_id += 1;
        r.contacts.push(ContactMethod {
          id:           *next_id,
          contact_type: new.contact_type,
          value:        new.value,
          is_primary:   new.is_primary,
        });
        write.inserted += 1;
      }
      write
    })
  }
}

impl FamilyStore for MockStore {
  async fn list_family(&self, id: PersonId) -> Result<Vec<RawRecord>, MockError> {
    self.read(Section::FamilyMembers, id, |r| r.family.clone())
  }

  async fn add_family_member(
    &self,
    id: PersonId,
    member: NewFamilyMember,
  ) -> Result<Option<i64>, MockError> {
    let mut inner = self.lock();
    if !inner.identities.contains_key(&id) {
      return Ok(None);
    }
    let member_id = inner.next_id();
    let row = json!({
      "id": member_id,
      "name": member.name,
      "relationship": member.relationship,
      "date_of_birth": member.date_of_birth.map(|d| d.to_string()),
      "phone": member.phone,
      "email": member.email,
      "is_emergency_contact": member.is_emergency_contact,
      "is_dependent": member.is_dependent,
    });
    let raw: RawRecord = serde_json::from_value(row).map_err(|e| MockError(e.to_string()))?;
    inner.records.entry(id).or_default().family.push(raw);
    Ok(Some(member_id))
  }

  async fn replace_family(
    &self,
    id: PersonId,
    members: Vec<NewFamilyMember>,
  ) -> Result<Option<usize>, MockError> {
    if !self.lock().identities.contains_key(&id) {
      return Ok(None);
    }
    self.edit(id, |r| r.family.clear());
    let count = members.len();
    for member in members {
      self.add_family_member(id, member).await?;
    }
    Ok(Some(count))
  }
}

impl EducationStore for MockStore {
  async fn list_education(&self, id: PersonId) -> Result<Vec<Education>, MockError> {
    self.read(Section::Education, id, |r| r.education.clone())
  }

  async fn list_training(&self, id: PersonId) -> Result<Vec<Training>, MockError> {
    self.read(Section::Training, id, |r| r.training.clone())
  }

  async fn insert_education(
    &self,
    id: PersonId,
    rows: Vec<NewEducation>,
  ) -> Result<SectionWrite, MockError> {
    self.write(ApplySection::Education, id, |r, next_id| {
      let mut write = SectionWrite::default();
      for new in rows {
        if r.education.iter().any(|e| {
          same(&e.qualification, &new.qualification) && e.completion_year == new.completion_year
        }) {
          write.skipped += 1;
          continue;
        }
        *next_id += 1;
        r.education.push(Education {
          id:              *next_id,
          qualification:   new.qualification,
          institution:     new.institution,
          level:           new.level,
          completion_year: new.completion_year,
        });
        write.inserted += 1;
      }
      write
    })
  }
}

impl SkillStore for MockStore {
  async fn list_skills(&self, id: PersonId) -> Result<Vec<Skill>, MockError> {
    self.read(Section::Skills, id, |r| r.skills.clone())
  }

  async fn list_certifications(&self, id: PersonId) -> Result<Vec<Certification>, MockError> {
    self.read(Section::Certifications, id, |r| r.certifications.clone())
  }

  async fn insert_skills(
    &self,
    id: PersonId,
    skills: Vec<NewSkill>,
  ) -> Result<SectionWrite, MockError> {
    self.write(ApplySection::Skills, id, |r, next_id| {
      let mut write = SectionWrite::default();
      for new in skills {
        if r.skills.iter().any(|s| same(&s.name, &new.name)) {
          write.skipped += 1;
          continue;
        }
        *next_id += 1;
        r.skills.push(Skill { id: *next_id, name: new.name, proficiency: new.proficiency });
        write.inserted += 1;
      }
      write
    })
  }

  async fn insert_certifications(
    &self,
    id: PersonId,
    certifications: Vec<NewCertification>,
  ) -> Result<SectionWrite, MockError> {
    self.write(ApplySection::Certifications, id, |r, next_id| {
      let mut write = SectionWrite::default();
      for new in certifications {
        if r.certifications.iter().any(|c| same(&c.name, &new.name)) {
          write.skipped += 1;
          continue;
        }
        *next_id += 1;
        r.certifications.push(Certification {
          id:          *next_id,
          name:        new.name,
          issuer:      new.issuer,
          issue_date:  new.issue_date,
          expiry_date: new.expiry_date,
        });
        write.inserted += 1;
      }
      write
    })
  }
}

impl ServiceRecordStore for MockStore {
  async fn list_awards(&self, id: PersonId) -> Result<Vec<Award>, MockError> {
    self.read(Section::Awards, id, |r| r.awards.clone())
  }

  async fn list_deployments(&self, id: PersonId) -> Result<Vec<Deployment>, MockError> {
    self.read(Section::Deployments, id, |r| r.deployments.clone())
  }

  async fn list_service_history(&self, id: PersonId) -> Result<Vec<ServicePosting>, MockError> {
    self.read(Section::ServiceHistory, id, |r| r.service_history.clone())
  }
}

impl ReadinessStore for MockStore {
  async fn get_security_clearance(
    &self,
    id: PersonId,
  ) -> Result<Option<SecurityClearance>, MockError> {
    self.read(Section::SecurityClearance, id, |r| r.clearance.clone())
  }

  async fn get_medical_readiness(
    &self,
    id: PersonId,
  ) -> Result<Option<MedicalReadiness>, MockError> {
    self.read(Section::MedicalReadiness, id, |r| r.medical.clone())
  }
}

impl CvDocumentStore for MockStore {
  async fn record_cv(&self, document: CvDocument) -> Result<(), MockError> {
    self.add_cv(document);
    Ok(())
  }

  async fn get_cv(&self, reference: Uuid) -> Result<Option<CvDocument>, MockError> {
    Ok(self.lock().cvs.get(&reference).cloned())
  }
}
