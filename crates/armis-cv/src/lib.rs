//! CV upload handling for ARMIS: upload screening, document-to-text
//! conversion and the heuristic `CvExtractor` that turns CV text into a
//! [`DraftProfile`](armis_core::draft::DraftProfile) for human review.
//!
//! Everything here is synchronous; async callers run it on a blocking
//! thread.

pub mod document;
pub mod error;
pub mod extract;
pub mod upload;

pub use document::{DocumentExtractors, DocumentTextExtractor, ExtractorConfig};
pub use error::{Error, Result, UploadRejection};
pub use extract::{CvExtractor, extract_draft, extract_draft_bytes};
pub use upload::{DocumentKind, UploadPolicy};
