//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text, timestamps as RFC 3339 strings,
//! enumerations by their lowercase names and UUIDs as hyphenated lowercase
//! strings. Row-level helpers return [`rusqlite::Result`] so they can be used
//! inside `query_map` closures.

use std::str::FromStr;

use armis_core::{PersonId, canonical::RawRecord, draft::CvDocument};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{
  Row, Statement,
  types::{Type, Value as SqlValue, ValueRef},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid / DateTime ─────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column values ───────────────────────────────────────────────────────────

/// An enumeration column held a name the domain type does not know.
#[derive(Debug, thiserror::Error)]
#[error("unrecognised value {0:?}")]
pub struct UnknownValue(pub String);

/// Decode a required enumeration column.
pub fn enum_column<T: FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
  let text: String = row.get(idx)?;
  text.parse().map_err(|_| {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(UnknownValue(text)))
  })
}

/// Decode a nullable enumeration column.
pub fn opt_enum_column<T: FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
  let text: Option<String> = row.get(idx)?;
  text
    .map(|text| {
      text.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(UnknownValue(text)))
      })
    })
    .transpose()
}

pub fn sql_text(value: Option<String>) -> SqlValue {
  value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()).into()
}

pub fn sql_date(value: Option<NaiveDate>) -> SqlValue { value.map(|d| d.to_string()).into() }

pub fn sql_enum<T: ToString>(value: Option<T>) -> SqlValue { value.map(|v| v.to_string()).into() }

// ─── Raw records ─────────────────────────────────────────────────────────────

pub fn column_names(stmt: &Statement<'_>) -> Vec<String> {
  stmt.column_names().into_iter().map(str::to_owned).collect()
}

/// A row as a column-name → JSON scalar map. Blobs are dropped.
pub fn row_to_record(names: &[String], row: &Row<'_>) -> rusqlite::Result<RawRecord> {
  let mut record = RawRecord::new();
  for (idx, name) in names.iter().enumerate() {
    let value = match row.get_ref(idx)? {
      ValueRef::Null | ValueRef::Blob(_) => Value::Null,
      ValueRef::Integer(i) => Value::from(i),
      ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
      ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    };
    record.insert(name.clone(), value);
  }
  Ok(record)
}

/// Bind a JSON scalar to a SQL parameter. Composite values are stored as
/// JSON text.
pub fn json_to_sql(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}

// ─── Raw CV document row ─────────────────────────────────────────────────────

pub struct RawCvDocument {
  pub reference:      String,
  pub person_id:      PersonId,
  pub file_name:      String,
  pub media_type:     String,
  pub size_bytes:     u64,
  pub content_hash:   String,
  pub stored_path:    String,
  pub extracted_json: String,
  pub uploaded_at:    String,
}

impl RawCvDocument {
  pub const COLUMNS: &str = "reference, staff_id, file_name, media_type, size_bytes, \
                             content_hash, stored_path, extracted_json, uploaded_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reference:      row.get(0)?,
      person_id:      row.get(1)?,
      file_name:      row.get(2)?,
      media_type:     row.get(3)?,
      size_bytes:     row.get(4)?,
      content_hash:   row.get(5)?,
      stored_path:    row.get(6)?,
      extracted_json: row.get(7)?,
      uploaded_at:    row.get(8)?,
    })
  }

  pub fn encode(document: &CvDocument) -> Result<Self> {
    Ok(Self {
      reference:      encode_uuid(document.reference),
      person_id:      document.person_id,
      file_name:      document.file_name.clone(),
      media_type:     document.media_type.clone(),
      size_bytes:     document.size_bytes,
      content_hash:   document.content_hash.clone(),
      stored_path:    document.stored_path.clone(),
      extracted_json: serde_json::to_string(&document.extracted)?,
      uploaded_at:    encode_dt(document.uploaded_at),
    })
  }

  pub fn into_document(self) -> Result<CvDocument> {
    Ok(CvDocument {
      reference:    decode_uuid(&self.reference)?,
      person_id:    self.person_id,
      file_name:    self.file_name,
      media_type:   self.media_type,
      size_bytes:   self.size_bytes,
      content_hash: self.content_hash,
      stored_path:  self.stored_path,
      extracted:    serde_json::from_str(&self.extracted_json)?,
      uploaded_at:  decode_dt(&self.uploaded_at)?,
    })
  }
}
