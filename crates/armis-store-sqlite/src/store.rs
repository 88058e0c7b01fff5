//! [`SqliteStore`]: the SQLite implementation of every ARMIS store
//! capability.

use std::path::Path;

use armis_core::{
  PersonId,
  canonical::RawRecord,
  draft::{CvDocument, SectionWrite},
  expiry::ExpiryItem,
  profile::{
    Address, Award, Certification, ContactMethod, Deployment, Education,
    MedicalReadiness, SecurityClearance, ServicePosting, Skill, Training,
  },
  report::{self, ExpiryEntry, GroupBy, ReportRow},
  store::{
    ContactStore, CvDocumentStore, EducationStore, FamilyStore, IdentityStore,
    NewCertification, NewContactMethod, NewEducation, NewSkill, ReadinessStore,
    ReportStore, ServiceRecordStore, SkillStore, StoreBackend,
  },
  validate::{IdentityUpdate, NewFamilyMember},
};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawCvDocument, column_names, encode_uuid, enum_column, json_to_sql, opt_enum_column,
    row_to_record, sql_date, sql_enum, sql_text,
  },
  schema::{SCHEMA, STAFF_COLUMNS},
};

const IDENTITY_SQL: &str = "
SELECT s.*, r.name AS rank_name, u.name AS unit_name
FROM staff s
LEFT JOIN ranks r ON r.rank_id = s.rank_id
LEFT JOIN units u ON u.unit_id = s.unit_id
WHERE s.staff_id = ?1";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A personnel store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a `staff` row from column/value pairs and return its id. Keys
  /// must name columns in the `staff` table (legacy columns included).
  pub async fn insert_person(&self, record: RawRecord) -> Result<PersonId> {
    let mut columns = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());
    for (key, value) in &record {
      let column = STAFF_COLUMNS
        .iter()
        .find(|c| c.eq_ignore_ascii_case(key))
        .ok_or_else(|| Error::UnknownColumn(key.clone()))?;
      columns.push(*column);
      values.push(json_to_sql(value));
    }

    let sql = if columns.is_empty() {
      "INSERT INTO staff DEFAULT VALUES".to_owned()
    } else {
      let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
      format!("INSERT INTO staff ({}) VALUES ({})", columns.join(", "), placeholders.join(", "))
    };

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    debug!(person_id = id, "inserted staff row");
    Ok(id)
  }

  /// Id of the rank called `name`, creating it if needed.
  pub async fn upsert_rank(&self, name: &str) -> Result<i64> {
    self.upsert_lookup("ranks", "rank_id", name).await
  }

  /// Id of the unit called `name`, creating it if needed.
  pub async fn upsert_unit(&self, name: &str) -> Result<i64> {
    self.upsert_lookup("units", "unit_id", name).await
  }

  async fn upsert_lookup(
    &self,
    table: &'static str,
    key: &'static str,
    name: &str,
  ) -> Result<i64> {
    let name = name.trim().to_owned();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO {table} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING"),
          [&name],
        )?;
        let id: i64 =
          conn.query_row(&format!("SELECT {key} FROM {table} WHERE name = ?1"), [&name], |r| {
            r.get(0)
          })?;
        Ok(id)
      })
      .await?;
    Ok(id)
  }

  pub async fn add_address(&self, id: PersonId, address: Address) -> Result<i64> {
    self
      .insert_child(
        id,
        "INSERT INTO addresses (staff_id, kind, line1, line2, city, province, country, \
         postal_code) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        vec![
          sql_enum(Some(address.kind)),
          address.line1.into(),
          sql_text(address.line2),
          sql_text(address.city),
          sql_text(address.province),
          sql_text(address.country),
          sql_text(address.postal_code),
        ],
      )
      .await
  }

  pub async fn add_training(&self, id: PersonId, training: Training) -> Result<i64> {
    self
      .insert_child(
        id,
        "INSERT INTO training (staff_id, course_name, provider, start_date, end_date, \
         due_date, status, mandatory) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        vec![
          training.course_name.into(),
          sql_text(training.provider),
          sql_date(training.start_date),
          sql_date(training.end_date),
          sql_date(training.due_date),
          sql_enum(Some(training.status)),
          training.mandatory.into(),
        ],
      )
      .await
  }

  pub async fn add_award(&self, id: PersonId, award: Award) -> Result<i64> {
    self
      .insert_child(
        id,
        "INSERT INTO awards (staff_id, name, kind, awarded_on, citation) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          award.name.into(),
          sql_enum(Some(award.kind)),
          sql_date(award.awarded_on),
          sql_text(award.citation),
        ],
      )
      .await
  }

  pub async fn add_deployment(&self, id: PersonId, deployment: Deployment) -> Result<i64> {
    self
      .insert_child(
        id,
        "INSERT INTO deployments (staff_id, mission, location, start_date, end_date, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          deployment.mission.into(),
          sql_text(deployment.location),
          sql_date(deployment.start_date),
          sql_date(deployment.end_date),
          sql_enum(Some(deployment.status)),
        ],
      )
      .await
  }

  pub async fn add_posting(&self, id: PersonId, posting: ServicePosting) -> Result<i64> {
    self
      .insert_child(
        id,
        "INSERT INTO service_history (staff_id, unit_name, appointment, from_date, to_date) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          posting.unit_name.into(),
          sql_text(posting.appointment),
          sql_date(posting.from_date),
          sql_date(posting.to_date),
        ],
      )
      .await
  }

  /// Replace the person's current clearance.
  pub async fn set_security_clearance(
    &self,
    id: PersonId,
    clearance: SecurityClearance,
  ) -> Result<()> {
    self
      .insert_child(
        id,
        "INSERT OR REPLACE INTO security_clearances (staff_id, level, issue_date, \
         expiry_date, status) VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          sql_enum(Some(clearance.level)),
          sql_date(clearance.issue_date),
          sql_date(clearance.expiry_date),
          sql_enum(Some(clearance.status)),
        ],
      )
      .await?;
    Ok(())
  }

  /// Replace the person's medical readiness record.
  pub async fn set_medical_readiness(
    &self,
    id: PersonId,
    medical: MedicalReadiness,
  ) -> Result<()> {
    self
      .insert_child(
        id,
        "INSERT OR REPLACE INTO medical_readiness (staff_id, fitness_category, exam_date, \
         exam_expiry, deployment_eligible) VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          medical.fitness_category.into(),
          sql_date(medical.exam_date),
          sql_date(medical.exam_expiry),
          medical.deployment_eligible.into(),
        ],
      )
      .await?;
    Ok(())
  }

  /// Run a single-row child insert whose `?1` is the person id. Fails with
  /// [`Error::PersonNotFound`] if the person does not exist.
  async fn insert_child(
    &self,
    id: PersonId,
    sql: &'static str,
    values: Vec<SqlValue>,
  ) -> Result<i64> {
    let row_id = self
      .conn
      .call(move |conn| {
        if !staff_exists(conn, id)? {
          return Ok(None);
        }
        let params = std::iter::once(SqlValue::Integer(id)).chain(values);
        conn.execute(sql, rusqlite::params_from_iter(params))?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;
    row_id.ok_or(Error::PersonNotFound(id))
  }
}

fn staff_exists(conn: &rusqlite::Connection, id: PersonId) -> rusqlite::Result<bool> {
  conn.query_row("SELECT EXISTS(SELECT 1 FROM staff WHERE staff_id = ?1)", [id], |r| r.get(0))
}

fn insert_family(
  conn: &rusqlite::Connection,
  id: PersonId,
  member: NewFamilyMember,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO family_members (staff_id, name, relationship, date_of_birth, phone, email, \
     address, is_emergency_contact, is_dependent) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      id,
      member.name.trim(),
      member.relationship.trim(),
      sql_date(member.date_of_birth),
      sql_text(member.phone),
      sql_text(member.email),
      sql_text(member.address),
      member.is_emergency_contact,
      member.is_dependent,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

// ─── Capabilities ────────────────────────────────────────────────────────────

impl StoreBackend for SqliteStore {
  type Error = Error;
}

impl IdentityStore for SqliteStore {
  async fn get_identity(&self, id: PersonId) -> Result<Option<RawRecord>> {
    let record = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(IDENTITY_SQL)?;
        let names = column_names(&stmt);
        let record = stmt.query_row([id], |row| row_to_record(&names, row)).optional()?;
        Ok(record)
      })
      .await?;
    Ok(record)
  }

  async fn update_identity(&self, id: PersonId, update: IdentityUpdate) -> Result<bool> {
    // Writing the canonical columns retires any legacy import values for the
    // same fields.
    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE staff SET prefix = ?2, first_name = ?3, middle_name = ?4, last_name = ?5, \
           suffix = ?6, date_of_birth = ?7, gender = ?8, national_id = ?9, nationality = ?10, \
           marital_status = ?11, religion = ?12, email = ?13, phone = ?14, \
           fname = NULL, lname = NULL, dob = NULL, nrc = NULL, sex = NULL \
           WHERE staff_id = ?1",
          rusqlite::params![
            id,
            sql_text(update.prefix),
            update.first_name.trim(),
            sql_text(update.middle_name),
            update.last_name.trim(),
            sql_text(update.suffix),
            sql_date(update.date_of_birth),
            sql_enum(update.gender),
            sql_text(update.national_id),
            sql_text(update.nationality),
            sql_enum(update.marital_status),
            sql_text(update.religion),
            sql_text(update.email),
            sql_text(update.phone),
          ],
        )?;
        Ok(changed > 0)
      })
      .await?;
    Ok(changed)
  }

  async fn set_photo(&self, id: PersonId, path: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE staff SET photo_path = ?2 WHERE staff_id = ?1",
          rusqlite::params![id, path],
        )?;
        Ok(changed > 0)
      })
      .await?;
    Ok(changed)
  }

  async fn delete_person(&self, id: PersonId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let deleted = conn.execute("DELETE FROM staff WHERE staff_id = ?1", [id])?;
        Ok(deleted > 0)
      })
      .await?;
    Ok(deleted)
  }
}

impl ContactStore for SqliteStore {
  async fn list_contacts(&self, id: PersonId) -> Result<Vec<ContactMethod>> {
    let contacts = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT contact_id, contact_type, value, is_primary FROM contact_methods
           WHERE staff_id = ?1 ORDER BY contact_type, is_primary DESC, contact_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(ContactMethod {
              id:           row.get(0)?,
              contact_type: enum_column(row, 1)?,
              value:        row.get(2)?,
              is_primary:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(contacts)
  }

  async fn list_addresses(&self, id: PersonId) -> Result<Vec<Address>> {
    let addresses = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT address_id, kind, line1, line2, city, province, country, postal_code
           FROM addresses WHERE staff_id = ?1 ORDER BY address_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Address {
              id:          row.get(0)?,
              kind:        enum_column(row, 1)?,
              line1:       row.get(2)?,
              line2:       row.get(3)?,
              city:        row.get(4)?,
              province:    row.get(5)?,
              country:     row.get(6)?,
              postal_code: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(addresses)
  }

  async fn insert_contacts(
    &self,
    id: PersonId,
    contacts: Vec<NewContactMethod>,
  ) -> Result<SectionWrite> {
    let write = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut write = SectionWrite::default();
        for contact in contacts {
          let kind = contact.contact_type.to_string();
          let value = contact.value.trim().to_owned();
          let existing: Option<(i64, bool)> = tx
            .query_row(
              "SELECT contact_id, is_primary FROM contact_methods
               WHERE staff_id = ?1 AND contact_type = ?2 AND value = ?3",
              rusqlite::params![id, kind, value],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
          if contact.is_primary && existing.is_none_or(|(_, primary)| !primary) {
            tx.execute(
              "UPDATE contact_methods SET is_primary = 0
               WHERE staff_id = ?1 AND contact_type = ?2",
              rusqlite::params![id, kind],
            )?;
          }
          // Already present: no new row, but a primary request still promotes it.
          if let Some((contact_id, primary)) = existing {
            if contact.is_primary && !primary {
              tx.execute(
                "UPDATE contact_methods SET is_primary = 1 WHERE contact_id = ?1",
                [contact_id],
              )?;
            }
            write.skipped += 1;
            continue;
          }
          tx.execute(
            "INSERT INTO contact_methods (staff_id, contact_type, value, is_primary)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, kind, value, contact.is_primary],
          )?;
          write.inserted += 1;
        }
        tx.commit()?;
        Ok(write)
      })
      .await?;
    Ok(write)
  }
}

impl FamilyStore for SqliteStore {
  async fn list_family(&self, id: PersonId) -> Result<Vec<RawRecord>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT * FROM family_members WHERE staff_id = ?1 ORDER BY family_id")?;
        let names = column_names(&stmt);
        let rows = stmt
          .query_map([id], |row| row_to_record(&names, row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn add_family_member(
    &self,
    id: PersonId,
    member: NewFamilyMember,
  ) -> Result<Option<i64>> {
    let row_id = self
      .conn
      .call(move |conn| {
        if !staff_exists(conn, id)? {
          return Ok(None);
        }
        Ok(Some(insert_family(conn, id, member)?))
      })
      .await?;
    Ok(row_id)
  }

  async fn replace_family(
    &self,
    id: PersonId,
    members: Vec<NewFamilyMember>,
  ) -> Result<Option<usize>> {
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !staff_exists(&tx, id)? {
          return Ok(None);
        }
        tx.execute("DELETE FROM family_members WHERE staff_id = ?1", [id])?;
        let count = members.len();
        for member in members {
          insert_family(&tx, id, member)?;
        }
        tx.commit()?;
        Ok(Some(count))
      })
      .await?;
    Ok(written)
  }
}

impl EducationStore for SqliteStore {
  async fn list_education(&self, id: PersonId) -> Result<Vec<Education>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT education_id, qualification, institution, level, completion_year
           FROM education WHERE staff_id = ?1
           ORDER BY completion_year IS NULL, completion_year DESC, education_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Education {
              id:              row.get(0)?,
              qualification:   row.get(1)?,
              institution:     row.get(2)?,
              level:           enum_column(row, 3)?,
              completion_year: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn list_training(&self, id: PersonId) -> Result<Vec<Training>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT training_id, course_name, provider, start_date, end_date, due_date, status,
                  mandatory
           FROM training WHERE staff_id = ?1 ORDER BY training_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Training {
              id:          row.get(0)?,
              course_name: row.get(1)?,
              provider:    row.get(2)?,
              start_date:  row.get(3)?,
              end_date:    row.get(4)?,
              due_date:    row.get(5)?,
              status:      enum_column(row, 6)?,
              mandatory:   row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn insert_education(&self, id: PersonId, rows: Vec<NewEducation>) -> Result<SectionWrite> {
    let write = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut write = SectionWrite::default();
        for row in rows {
          let qualification = row.qualification.trim().to_owned();
          let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM education WHERE staff_id = ?1
             AND lower(qualification) = lower(?2) AND completion_year IS ?3)",
            rusqlite::params![id, qualification, row.completion_year],
            |r| r.get(0),
          )?;
          if exists {
            write.skipped += 1;
            continue;
          }
          tx.execute(
            "INSERT INTO education (staff_id, qualification, institution, level, completion_year)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              id,
              qualification,
              sql_text(row.institution),
              row.level.to_string(),
              row.completion_year,
            ],
          )?;
          write.inserted += 1;
        }
        tx.commit()?;
        Ok(write)
      })
      .await?;
    Ok(write)
  }
}

impl SkillStore for SqliteStore {
  async fn list_skills(&self, id: PersonId) -> Result<Vec<Skill>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT skill_id, name, proficiency FROM skills WHERE staff_id = ?1
           ORDER BY skill_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Skill {
              id:          row.get(0)?,
              name:        row.get(1)?,
              proficiency: opt_enum_column(row, 2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn list_certifications(&self, id: PersonId) -> Result<Vec<Certification>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT certification_id, name, issuer, issue_date, expiry_date
           FROM certifications WHERE staff_id = ?1 ORDER BY certification_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Certification {
              id:          row.get(0)?,
              name:        row.get(1)?,
              issuer:      row.get(2)?,
              issue_date:  row.get(3)?,
              expiry_date: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn insert_skills(&self, id: PersonId, skills: Vec<NewSkill>) -> Result<SectionWrite> {
    let write = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut write = SectionWrite::default();
        for skill in skills {
          let name = skill.name.trim().to_owned();
          let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM skills WHERE staff_id = ?1 AND lower(name) = lower(?2))",
            rusqlite::params![id, name],
            |r| r.get(0),
          )?;
          if exists {
            write.skipped += 1;
            continue;
          }
          tx.execute(
            "INSERT INTO skills (staff_id, name, proficiency) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, name, sql_enum(skill.proficiency)],
          )?;
          write.inserted += 1;
        }
        tx.commit()?;
        Ok(write)
      })
      .await?;
    Ok(write)
  }

  async fn insert_certifications(
    &self,
    id: PersonId,
    certifications: Vec<NewCertification>,
  ) -> Result<SectionWrite> {
    let write = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut write = SectionWrite::default();
        for certification in certifications {
          let name = certification.name.trim().to_owned();
          let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM certifications
             WHERE staff_id = ?1 AND lower(name) = lower(?2))",
            rusqlite::params![id, name],
            |r| r.get(0),
          )?;
          if exists {
            write.skipped += 1;
            continue;
          }
          tx.execute(
            "INSERT INTO certifications (staff_id, name, issuer, issue_date, expiry_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              id,
              name,
              sql_text(certification.issuer),
              sql_date(certification.issue_date),
              sql_date(certification.expiry_date),
            ],
          )?;
          write.inserted += 1;
        }
        tx.commit()?;
        Ok(write)
      })
      .await?;
    Ok(write)
  }
}

impl ServiceRecordStore for SqliteStore {
  async fn list_awards(&self, id: PersonId) -> Result<Vec<Award>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT award_id, name, kind, awarded_on, citation FROM awards
           WHERE staff_id = ?1 ORDER BY awarded_on IS NULL, awarded_on DESC, award_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Award {
              id:         row.get(0)?,
              name:       row.get(1)?,
              kind:       enum_column(row, 2)?,
              awarded_on: row.get(3)?,
              citation:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn list_deployments(&self, id: PersonId) -> Result<Vec<Deployment>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT deployment_id, mission, location, start_date, end_date, status
           FROM deployments WHERE staff_id = ?1
           ORDER BY start_date IS NULL, start_date DESC, deployment_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(Deployment {
              id:         row.get(0)?,
              mission:    row.get(1)?,
              location:   row.get(2)?,
              start_date: row.get(3)?,
              end_date:   row.get(4)?,
              status:     enum_column(row, 5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn list_service_history(&self, id: PersonId) -> Result<Vec<ServicePosting>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT posting_id, unit_name, appointment, from_date, to_date
           FROM service_history WHERE staff_id = ?1
           ORDER BY from_date IS NULL, from_date DESC, posting_id",
        )?;
        let rows = stmt
          .query_map([id], |row| {
            Ok(ServicePosting {
              id:          row.get(0)?,
              unit_name:   row.get(1)?,
              appointment: row.get(2)?,
              from_date:   row.get(3)?,
              to_date:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

impl ReadinessStore for SqliteStore {
  async fn get_security_clearance(&self, id: PersonId) -> Result<Option<SecurityClearance>> {
    let clearance = self
      .conn
      .call(move |conn| {
        let clearance = conn
          .query_row(
            "SELECT level, issue_date, expiry_date, status FROM security_clearances
             WHERE staff_id = ?1",
            [id],
            |row| {
              Ok(SecurityClearance {
                level:       enum_column(row, 0)?,
                issue_date:  row.get(1)?,
                expiry_date: row.get(2)?,
                status:      enum_column(row, 3)?,
              })
            },
          )
          .optional()?;
        Ok(clearance)
      })
      .await?;
    Ok(clearance)
  }

  async fn get_medical_readiness(&self, id: PersonId) -> Result<Option<MedicalReadiness>> {
    let medical = self
      .conn
      .call(move |conn| {
        let medical = conn
          .query_row(
            "SELECT fitness_category, exam_date, exam_expiry, deployment_eligible
             FROM medical_readiness WHERE staff_id = ?1",
            [id],
            |row| {
              Ok(MedicalReadiness {
                fitness_category:    row.get(0)?,
                exam_date:           row.get(1)?,
                exam_expiry:         row.get(2)?,
                deployment_eligible: row.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(medical)
      })
      .await?;
    Ok(medical)
  }
}

impl CvDocumentStore for SqliteStore {
  async fn record_cv(&self, document: CvDocument) -> Result<()> {
    let person_id = document.person_id;
    let raw = RawCvDocument::encode(&document)?;
    let recorded = self
      .conn
      .call(move |conn| {
        if !staff_exists(conn, raw.person_id)? {
          return Ok(false);
        }
        conn.execute(
          &format!(
            "INSERT INTO cv_documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            RawCvDocument::COLUMNS
          ),
          rusqlite::params![
            raw.reference,
            raw.person_id,
            raw.file_name,
            raw.media_type,
            raw.size_bytes,
            raw.content_hash,
            raw.stored_path,
            raw.extracted_json,
            raw.uploaded_at,
          ],
        )?;
        Ok(true)
      })
      .await?;
    if !recorded {
      return Err(Error::PersonNotFound(person_id));
    }
    debug!(person_id, reference = %document.reference, "recorded CV document");
    Ok(())
  }

  async fn get_cv(&self, reference: Uuid) -> Result<Option<CvDocument>> {
    let key = encode_uuid(reference);
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {} FROM cv_documents WHERE reference = ?1", RawCvDocument::COLUMNS),
            [&key],
            RawCvDocument::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawCvDocument::into_document).transpose()
  }
}

impl ReportStore for SqliteStore {
  async fn staff_count_by(&self, group: GroupBy) -> Result<Vec<ReportRow>> {
    let expr = match group {
      GroupBy::Rank => "r.name",
      GroupBy::Unit => "u.name",
      GroupBy::Corps => "s.corps",
      GroupBy::Gender => "COALESCE(NULLIF(TRIM(s.gender), ''), s.sex)",
      GroupBy::ServiceStatus => "s.service_status",
      GroupBy::MaritalStatus => "s.marital_status",
    };
    let sql = format!(
      "SELECT {expr} AS label, COUNT(*) FROM staff s
       LEFT JOIN ranks r ON r.rank_id = s.rank_id
       LEFT JOIN units u ON u.unit_id = s.unit_id
       GROUP BY label"
    );
    let groups = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, u64>(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(report::tally(group, groups))
  }

  async fn list_expiry_dates(&self) -> Result<Vec<ExpiryEntry>> {
    let entries = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT staff_id, 0, expiry_date FROM security_clearances WHERE expiry_date IS NOT NULL
           UNION ALL
           SELECT staff_id, 1, exam_expiry FROM medical_readiness WHERE exam_expiry IS NOT NULL
           UNION ALL
           SELECT staff_id, 2, expiry_date FROM certifications WHERE expiry_date IS NOT NULL
           ORDER BY 3, 1",
        )?;
        let rows = stmt
          .query_map([], |row| {
            let item = match row.get::<_, i64>(1)? {
              0 => ExpiryItem::SecurityClearance,
              1 => ExpiryItem::MedicalExam,
              _ => ExpiryItem::Certification,
            };
            Ok(ExpiryEntry { person_id: row.get(0)?, item, date: row.get(2)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(entries)
  }
}
