//! Document-to-text conversion behind the [`DocumentTextExtractor`] seam.
//!
//! PDFs are read in-process with `pdf-extract`. Word documents are handed to
//! an external converter (e.g. `antiword`, `pandoc`) configured per kind; an
//! unconfigured kind yields no text, which the extractor treats as an empty
//! draft.

use std::{
  io::Write,
  panic::{self, AssertUnwindSafe},
  process::Command,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  upload::DocumentKind,
};

/// Placeholder in [`CommandSpec::args`] replaced by the input file path.
pub const INPUT_PLACEHOLDER: &str = "{input}";

pub trait DocumentTextExtractor: Send + Sync {
  fn extract_text(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String>;
}

// ─── PDF ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl DocumentTextExtractor for PdfTextExtractor {
  fn extract_text(&self, _kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs.
    panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
      .map_err(|_| Error::Extraction("PDF parser panicked".into()))?
      .map_err(|e| Error::Extraction(e.to_string()))
  }
}

// ─── External command ────────────────────────────────────────────────────────

/// An external converter that prints the document's text on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
  pub program: String,
  /// Arguments; [`INPUT_PLACEHOLDER`] is replaced by the input path. If no
  /// argument contains it, the path is appended.
  #[serde(default)]
  pub args:    Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandTextExtractor {
  spec: CommandSpec,
}

impl CommandTextExtractor {
  pub fn new(spec: CommandSpec) -> Self { Self { spec } }
}

impl DocumentTextExtractor for CommandTextExtractor {
  fn extract_text(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    let mut input = tempfile::Builder::new()
      .prefix("armis-cv-")
      .suffix(&format!(".{}", kind.extension()))
      .tempfile()?;
    input.write_all(bytes)?;
    input.flush()?;

    let path = input.path().to_string_lossy().into_owned();
    let mut args: Vec<String> =
      self.spec.args.iter().map(|a| a.replace(INPUT_PLACEHOLDER, &path)).collect();
    if !self.spec.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
      args.push(path);
    }

    debug!(program = %self.spec.program, ?args, "running document converter");
    let output = Command::new(&self.spec.program).args(&args).output()?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(Error::Extraction(format!(
        "{} exited with {}: {}",
        self.spec.program,
        output.status,
        stderr.trim()
      )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}

// ─── Plain text ──────────────────────────────────────────────────────────────

/// Lossy UTF-8 decode. Used in tests and for text already extracted
/// elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl DocumentTextExtractor for PlainTextExtractor {
  fn extract_text(&self, _kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8_lossy(bytes).into_owned())
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// `[extractors]` configuration: optional converters for Word documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
  pub doc:  Option<CommandSpec>,
  pub docx: Option<CommandSpec>,
}

/// Routes each [`DocumentKind`] to its converter.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractors {
  pdf:  PdfTextExtractor,
  doc:  Option<CommandTextExtractor>,
  docx: Option<CommandTextExtractor>,
}

impl DocumentExtractors {
  pub fn from_config(config: &ExtractorConfig) -> Self {
    Self {
      pdf:  PdfTextExtractor,
      doc:  config.doc.clone().map(CommandTextExtractor::new),
      docx: config.docx.clone().map(CommandTextExtractor::new),
    }
  }
}

impl DocumentTextExtractor for DocumentExtractors {
  fn extract_text(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    let converter = match kind {
      DocumentKind::Pdf => return self.pdf.extract_text(kind, bytes),
      DocumentKind::Doc => self.doc.as_ref(),
      DocumentKind::Docx => self.docx.as_ref(),
      DocumentKind::Jpeg | DocumentKind::Png => {
        return Err(Error::Extraction(format!("{kind} is not a text document")));
      }
    };
    match converter {
      Some(converter) => converter.extract_text(kind, bytes),
      None => {
        warn!(%kind, "no converter configured; returning no text");
        Ok(String::new())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unconfigured_word_documents_yield_no_text() {
    let extractors = DocumentExtractors::from_config(&ExtractorConfig::default());
    assert_eq!(extractors.extract_text(DocumentKind::Docx, b"PK\x03\x04").unwrap(), "");
  }

  #[test]
  fn images_are_not_text_documents() {
    let extractors = DocumentExtractors::default();
    assert!(matches!(
      extractors.extract_text(DocumentKind::Png, &[0x89, 0x50]),
      Err(Error::Extraction(_))
    ));
  }

  #[test]
  fn malformed_pdf_never_panics() {
    let result = PdfTextExtractor.extract_text(DocumentKind::Pdf, b"%PDF-1.4 garbage");
    assert!(result.map_or(true, |text| text.trim().is_empty()));
  }

  #[test]
  fn plain_text_is_decoded_lossily() {
    let text = PlainTextExtractor.extract_text(DocumentKind::Pdf, b"Jane \xff Doe").unwrap();
    assert_eq!(text, "Jane \u{FFFD} Doe");
  }

  #[test]
  fn extractor_config_parses_commands() {
    let config: ExtractorConfig = serde_json::from_str(
      r#"{ "doc": { "program": "antiword", "args": ["{input}"] } }"#,
    )
    .unwrap();
    assert_eq!(config.doc.unwrap().program, "antiword");
    assert!(config.docx.is_none());
  }

  #[cfg(unix)]
  #[test]
  fn command_converter_reads_stdout() {
    let converter =
      CommandTextExtractor::new(CommandSpec { program: "cat".into(), args: vec![] });
    let text = converter.extract_text(DocumentKind::Doc, b"Skills: Rust").unwrap();
    assert_eq!(text, "Skills: Rust");
  }

  #[cfg(unix)]
  #[test]
  fn failing_command_is_an_extraction_error() {
    let converter = CommandTextExtractor::new(CommandSpec {
      program: "sh".into(),
      args:    vec!["-c".into(), "exit 3".into()],
    });
    assert!(matches!(
      converter.extract_text(DocumentKind::Doc, b"x"),
      Err(Error::Extraction(_))
    ));
  }
}
