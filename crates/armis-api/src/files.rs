//! On-disk storage for uploaded CVs and photos.

use std::path::PathBuf;

use armis_cv::DocumentKind;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A file written under the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
  pub reference:     Uuid,
  /// Relative to the upload directory, e.g. `cv/<uuid>.pdf`.
  pub relative_path: String,
  /// SHA-256, lowercase hex.
  pub content_hash:  String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
  root: PathBuf,
}

impl UploadStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Write `bytes` to `<root>/<folder>/<uuid>.<ext>`.
  pub async fn save(
    &self,
    folder: &str,
    kind: DocumentKind,
    bytes: &[u8],
  ) -> std::io::Result<StoredFile> {
    let reference = Uuid::new_v4();
    let relative_path = format!("{folder}/{reference}.{}", kind.extension());
    let path = self.path_of(&relative_path);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, bytes).await?;
    Ok(StoredFile { reference, relative_path, content_hash: content_hash(bytes) })
  }

  /// Best-effort removal of a file written by [`Self::save`].
  pub async fn remove(&self, relative_path: &str) {
    if let Err(e) = tokio::fs::remove_file(self.path_of(relative_path)).await {
      tracing::warn!(path = relative_path, error = %e, "failed to remove stored upload");
    }
  }

  /// Absolute location of a stored file.
  pub fn path_of(&self, relative_path: &str) -> PathBuf { self.root.join(relative_path) }
}

pub fn content_hash(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_is_lowercase_sha256_hex() {
    assert_eq!(
      content_hash(b"abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[tokio::test]
  async fn saved_files_land_under_their_folder() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path());
    let stored = store.save("cv", DocumentKind::Pdf, b"%PDF-1.4").await.unwrap();

    assert!(stored.relative_path.starts_with("cv/"));
    assert!(stored.relative_path.ends_with(".pdf"));
    assert_eq!(std::fs::read(store.path_of(&stored.relative_path)).unwrap(), b"%PDF-1.4");

    store.remove(&stored.relative_path).await;
    assert!(!store.path_of(&stored.relative_path).exists());
  }
}
