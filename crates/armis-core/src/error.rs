//! Error types for `armis-core`.

use thiserror::Error;

use crate::{PersonId, validate::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  /// No identity record exists for the given person, or it could not be read.
  #[error("profile not found: {0}")]
  NotFound(PersonId),

  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
