//! Handlers for CV upload and apply.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/profiles/{id}/cv` | multipart field `file`; PDF, DOC or DOCX |
//! | `POST` | `/profiles/{id}/cv/apply` | body: [`ConfirmedDraft`] |

use armis_core::{
  Error, PersonId,
  draft::{ApplyReport, ConfirmedDraft, CvDocument, DraftProfile},
  parse_person_id,
  store::{CvDocumentStore as _, IdentityStore as _, PersonnelStore},
};
use axum::{
  Json,
  extract::{Multipart, Path, State, multipart::MultipartError},
  http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  ApiState,
  context::Ctx,
  error::{ApiError, store_error},
};

const EMPTY_EXTRACTION_MESSAGE: &str =
  "No details could be read from this CV. Please review and enter the profile manually.";

/// A file part read from a multipart body.
pub(crate) struct Upload {
  pub file_name: String,
  pub bytes:     Vec<u8>,
}

/// Read the `file` field; other fields are ignored. `max_bytes` is the cap
/// reported when the body is cut off at the router limit.
pub(crate) async fn read_file_field(
  multipart: &mut Multipart,
  max_bytes: usize,
) -> Result<Upload, ApiError> {
  let rejected = |e: MultipartError| ApiError::multipart(e, max_bytes);
  while let Some(field) = multipart.next_field().await.map_err(rejected)? {
    if field.name() != Some("file") {
      continue;
    }
    let file_name = field.file_name().unwrap_or("upload").to_owned();
    let bytes = field.bytes().await.map_err(rejected)?.to_vec();
    return Ok(Upload { file_name, bytes });
  }
  Err(ApiError::BadRequest("multipart field `file` is required".into()))
}

/// 404 unless the person exists.
pub(crate) async fn require_person<S>(state: &ApiState<S>, id: PersonId) -> Result<(), ApiError>
where
  S: PersonnelStore,
{
  match state.store.get_identity(id).await.map_err(store_error)? {
    Some(_) => Ok(()),
    None => Err(Error::NotFound(id).into()),
  }
}

// ─── Upload ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvUploadResponse {
  pub success:          bool,
  pub extracted_data:   DraftProfile,
  pub file_reference:   Uuid,
  /// Nothing was recognised; the form should invite manual entry.
  pub extraction_empty: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:          Option<String>,
}

/// `POST /profiles/{id}/cv`
///
/// The file is screened before anything is written, stored under
/// `cv/<uuid>.<ext>`, scraped into a draft and recorded. If recording fails
/// the stored file is removed again.
pub async fn upload<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<CvUploadResponse>), ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  require_person(&state, id).await?;

  let upload = read_file_field(&mut multipart, state.cv_policy.max_bytes).await?;
  let kind = state.cv_policy.check(&upload.bytes, &upload.file_name)?;
  let stored = state.files.save("cv", kind, &upload.bytes).await?;

  let extractor = state.extractor.clone();
  let bytes = upload.bytes;
  let size_bytes = bytes.len() as u64;
  let extracted = tokio::task::spawn_blocking(move || extractor.extract(kind, &bytes))
    .await
    .unwrap_or_else(|e| {
      warn!(person_id = id, error = %e, "CV extraction task failed");
      DraftProfile::default()
    });

  let document = CvDocument {
    reference: stored.reference,
    person_id: id,
    file_name: upload.file_name,
    media_type: kind.media_type().to_owned(),
    size_bytes,
    content_hash: stored.content_hash.clone(),
    stored_path: stored.relative_path.clone(),
    extracted: extracted.clone(),
    uploaded_at: Utc::now(),
  };
  if let Err(e) = state.store.record_cv(document).await {
    state.files.remove(&stored.relative_path).await;
    return Err(store_error(e));
  }

  let extraction_empty = extracted.is_empty();
  info!(
    person_id = id,
    actor = %ctx.actor,
    reference = %stored.reference,
    %kind,
    extraction_empty,
    "stored CV upload"
  );
  Ok((
    StatusCode::CREATED,
    Json(CvUploadResponse {
      success: true,
      extracted_data: extracted,
      file_reference: stored.reference,
      extraction_empty,
      message: extraction_empty.then(|| EMPTY_EXTRACTION_MESSAGE.to_owned()),
    }),
  ))
}

// ─── Apply ───────────────────────────────────────────────────────────────────

/// `POST /profiles/{id}/cv/apply`; returns one outcome per confirmed
/// section.
pub async fn apply<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
  Json(confirmed): Json<ConfirmedDraft>,
) -> Result<Json<ApplyReport>, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  let report = state.applier.apply(&ctx, id, confirmed).await?;
  Ok(Json(report))
}
