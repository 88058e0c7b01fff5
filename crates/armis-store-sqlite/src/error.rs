//! Error type for `armis-store-sqlite`.

use armis_core::PersonId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A seeding call named a column the `staff` table does not have.
  #[error("unknown staff column: {0:?}")]
  UnknownColumn(String),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
