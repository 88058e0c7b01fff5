//! Error types for `armis-cv`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("text extraction failed: {0}")]
  Extraction(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Why an uploaded file was refused. Nothing is persisted for a rejected
/// upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
  #[error("file is empty")]
  Empty,

  #[error("file is {size} bytes; the limit is {max} bytes")]
  TooLarge { size: usize, max: usize },

  /// The request body was cut off before the whole file was read.
  #[error("file exceeds the limit of {max} bytes")]
  ExceedsLimit { max: usize },

  #[error("unsupported file type: {0}")]
  UnsupportedType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
