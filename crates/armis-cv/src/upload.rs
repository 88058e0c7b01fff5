//! Upload screening: size caps and content sniffing.
//!
//! The declared content type and file name are not trusted; the file kind is
//! taken from the leading bytes. The file-name extension only breaks the tie
//! when the bytes identify a generic container (ZIP for `.docx`, OLE compound
//! file for `.doc`).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::error::UploadRejection;

/// Default CV size cap.
pub const CV_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Default photo size cap.
pub const PHOTO_MAX_BYTES: usize = 5 * 1024 * 1024;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentKind {
  Pdf,
  Doc,
  Docx,
  Jpeg,
  Png,
}

impl DocumentKind {
  pub fn media_type(self) -> &'static str {
    match self {
      Self::Pdf => "application/pdf",
      Self::Doc => "application/msword",
      Self::Docx => DOCX_MIME,
      Self::Jpeg => "image/jpeg",
      Self::Png => "image/png",
    }
  }

  /// Extension used for the stored copy.
  pub fn extension(self) -> &'static str {
    match self {
      Self::Pdf => "pdf",
      Self::Doc => "doc",
      Self::Docx => "docx",
      Self::Jpeg => "jpg",
      Self::Png => "png",
    }
  }

  /// Classify `bytes`, using `file_name` only to resolve container formats.
  pub fn sniff(bytes: &[u8], file_name: &str) -> Option<Self> {
    let kind = infer::get(bytes)?;
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match (kind.mime_type(), ext.as_deref()) {
      ("application/pdf", _) => Some(Self::Pdf),
      ("application/msword", _) => Some(Self::Doc),
      (DOCX_MIME, _) => Some(Self::Docx),
      ("image/jpeg", _) => Some(Self::Jpeg),
      ("image/png", _) => Some(Self::Png),
      ("application/zip", Some("docx")) => Some(Self::Docx),
      ("application/x-ole-storage", Some("doc")) => Some(Self::Doc),
      _ => None,
    }
  }
}

/// Size cap plus allow-list for one upload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
  pub max_bytes: usize,
  pub allowed:   Vec<DocumentKind>,
}

impl UploadPolicy {
  /// PDF, DOC or DOCX.
  pub fn cv(max_bytes: usize) -> Self {
    Self {
      max_bytes,
      allowed: vec![DocumentKind::Pdf, DocumentKind::Doc, DocumentKind::Docx],
    }
  }

  /// JPEG or PNG.
  pub fn photo(max_bytes: usize) -> Self {
    Self { max_bytes, allowed: vec![DocumentKind::Jpeg, DocumentKind::Png] }
  }

  /// Accept or reject an upload before anything is written.
  pub fn check(&self, bytes: &[u8], file_name: &str) -> Result<DocumentKind, UploadRejection> {
    if bytes.is_empty() {
      return Err(UploadRejection::Empty);
    }
    if bytes.len() > self.max_bytes {
      return Err(UploadRejection::TooLarge { size: bytes.len(), max: self.max_bytes });
    }
    match DocumentKind::sniff(bytes, file_name) {
      Some(kind) if self.allowed.contains(&kind) => Ok(kind),
      Some(kind) => Err(UploadRejection::UnsupportedType(kind.media_type().to_owned())),
      None => {
        let detected = infer::get(bytes).map_or("unknown", |t| t.mime_type());
        Err(UploadRejection::UnsupportedType(detected.to_owned()))
      }
    }
  }
}
