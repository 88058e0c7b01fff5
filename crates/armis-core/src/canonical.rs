//! Canonical-schema translation layer.
//!
//! Person and family rows have been written by several generations of forms,
//! each with its own column names (`fname` vs `first_name`, `NRC` vs
//! `national_id`, ...). Stores return those rows untouched as [`RawRecord`]s;
//! this module is the only place that knows the variants. Everything
//! downstream works with canonical [`Identity`], [`Assignment`] and
//! [`FamilyMember`] values.

use std::{collections::BTreeMap, str::FromStr};

use chrono::NaiveDate;
use serde_json::Value;

use crate::{
  PersonId,
  dates::parse_loose_date,
  profile::{Assignment, FamilyMember, Identity},
};

/// A row as returned by a backend: column name → JSON scalar.
pub type RawRecord = BTreeMap<String, Value>;

// ─── Alias tables ────────────────────────────────────────────────────────────

type AliasTable = &'static [(&'static str, &'static [&'static str])];

/// Canonical identity/assignment field → accepted source columns, in priority
/// order. Matching is ASCII case-insensitive.
const PERSON_FIELDS: AliasTable = &[
  ("service_number", &["service_number", "svc_no", "service_no", "force_number"]),
  ("prefix", &["prefix", "title"]),
  ("first_name", &["first_name", "fname", "firstname", "given_name"]),
  ("middle_name", &["middle_name", "mname", "middlename", "other_names"]),
  ("last_name", &["last_name", "lname", "lastname", "surname"]),
  ("suffix", &["suffix"]),
  ("date_of_birth", &["date_of_birth", "dob", "birth_date", "birthdate"]),
  ("gender", &["gender", "sex"]),
  ("national_id", &["national_id", "nrc", "nrc_no", "id_number"]),
  ("nationality", &["nationality", "country"]),
  ("marital_status", &["marital_status", "marital", "marital_stat"]),
  ("religion", &["religion", "denomination"]),
  ("email", &["email", "email_address", "mail"]),
  ("phone", &["phone", "tel", "phone_number", "mobile"]),
  ("photo_path", &["photo_path", "photo", "picture"]),
  ("rank_id", &["rank_id", "rankid"]),
  ("rank_name", &["rank_name", "rank", "rank_title"]),
  ("unit_id", &["unit_id", "unitid"]),
  ("unit_name", &["unit_name", "unit"]),
  ("corps", &["corps", "corps_name"]),
  ("service_status", &["service_status", "svc_status", "status"]),
  ("enlistment_date", &["enlistment_date", "attest_date", "date_of_enlistment", "attestdate"]),
];

const FAMILY_FIELDS: AliasTable = &[
  ("id", &["id", "family_id", "member_id"]),
  ("name", &["name", "full_name", "fullname"]),
  ("first_name", &["first_name", "fname"]),
  ("last_name", &["last_name", "lname", "surname"]),
  ("relationship", &["relationship", "relation", "relationship_type"]),
  ("date_of_birth", &["date_of_birth", "dob", "birth_date"]),
  ("phone", &["phone", "tel", "contact", "phone_number"]),
  ("email", &["email", "email_address"]),
  ("address", &["address", "residential_address"]),
  ("is_emergency_contact", &["is_emergency_contact", "emergency_contact", "is_emergency"]),
  ("is_dependent", &["is_dependent", "dependent", "is_dependant"]),
];

// ─── Record view ─────────────────────────────────────────────────────────────

/// Read canonical fields out of a [`RawRecord`] through an alias table.
pub struct CanonicalView<'a> {
  raw:   &'a RawRecord,
  table: AliasTable,
}

impl<'a> CanonicalView<'a> {
  pub fn person(raw: &'a RawRecord) -> Self { Self { raw, table: PERSON_FIELDS } }

  pub fn family(raw: &'a RawRecord) -> Self { Self { raw, table: FAMILY_FIELDS } }

  fn variants(&self, canonical: &'static str) -> &'static [&'static str] {
    self
      .table
      .iter()
      .find(|(name, _)| *name == canonical)
      .map(|(_, variants)| *variants)
      .unwrap_or(&[])
  }

  /// First non-empty value among the canonical field's variants.
  fn value(&self, canonical: &'static str) -> Option<&'a Value> {
    self.variants(canonical).iter().find_map(|variant| {
      self
        .raw
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(variant))
        .map(|(_, value)| value)
        .filter(|value| !is_blank(value))
    })
  }

  pub fn text(&self, canonical: &'static str) -> Option<String> {
    match self.value(canonical)? {
      Value::String(s) => Some(s.trim().to_owned()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  pub fn int(&self, canonical: &'static str) -> Option<i64> {
    match self.value(canonical)? {
      Value::Number(n) => n.as_i64(),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  pub fn date(&self, canonical: &'static str) -> Option<NaiveDate> {
    self.text(canonical).as_deref().and_then(parse_loose_date)
  }

  pub fn flag(&self, canonical: &'static str) -> bool {
    match self.value(canonical) {
      Some(Value::Bool(b)) => *b,
      Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
      Some(Value::String(s)) => {
        matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "y" | "yes" | "true")
      }
      _ => false,
    }
  }

  /// Parse an enumeration; unrecognised values are treated as absent.
  pub fn parsed<T: FromStr>(&self, canonical: &'static str) -> Option<T> {
    let text = self.text(canonical)?;
    let parsed = text.parse().ok();
    if parsed.is_none() {
      tracing::debug!(field = canonical, value = %text, "unrecognised enumeration value");
    }
    parsed
  }
}

fn is_blank(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    _ => false,
  }
}

// ─── Normalisers ─────────────────────────────────────────────────────────────

/// Translate a person row into canonical identity and assignment records.
pub fn normalize_identity(id: PersonId, raw: &RawRecord) -> (Identity, Assignment) {
  let view = CanonicalView::person(raw);

  let identity = Identity {
    id,
    service_number: view.text("service_number"),
    prefix:         view.text("prefix"),
    first_name:     view.text("first_name"),
    middle_name:    view.text("middle_name"),
    last_name:      view.text("last_name"),
    suffix:         view.text("suffix"),
    date_of_birth:  view.date("date_of_birth"),
    gender:         view.parsed("gender"),
    national_id:    view.text("national_id"),
    nationality:    view.text("nationality"),
    marital_status: view.parsed("marital_status"),
    religion:       view.text("religion"),
    email:          view.text("email"),
    phone:          view.text("phone"),
    photo_path:     view.text("photo_path"),
  };

  let assignment = Assignment {
    rank_id:         view.int("rank_id"),
    rank_name:       view.text("rank_name"),
    unit_id:         view.int("unit_id"),
    unit_name:       view.text("unit_name"),
    corps:           view.text("corps"),
    service_status:  view.parsed("service_status"),
    enlistment_date: view.date("enlistment_date"),
  };

  (identity, assignment)
}

/// Translate a family row. Rows without any usable name are dropped.
pub fn normalize_family(raw: &RawRecord) -> Option<FamilyMember> {
  let view = CanonicalView::family(raw);

  let name = view.text("name").or_else(|| {
    let joined = [view.text("first_name"), view.text("last_name")]
      .into_iter()
      .flatten()
      .collect::<Vec<_>>()
      .join(" ");
    (!joined.is_empty()).then_some(joined)
  });

  let Some(name) = name else {
    tracing::warn!(?raw, "dropping family row without a name");
    return None;
  };

  Some(FamilyMember {
    id: view.int("id").unwrap_or_default(),
    name,
    relationship: view.text("relationship").unwrap_or_default(),
    date_of_birth: view.date("date_of_birth"),
    phone: view.text("phone"),
    email: view.text("email"),
    address: view.text("address"),
    is_emergency_contact: view.flag("is_emergency_contact"),
    is_dependent: view.flag("is_dependent"),
  })
}
