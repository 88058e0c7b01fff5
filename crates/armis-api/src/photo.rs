//! `POST /profiles/{id}/photo`: JPEG or PNG, multipart field `file`.

use armis_core::{Error, parse_person_id, store::{IdentityStore as _, PersonnelStore}};
use axum::{
  Json,
  extract::{Multipart, Path, State},
};
use serde_json::{Value, json};
use tracing::info;

use crate::{
  ApiState,
  context::Ctx,
  cv::{read_file_field, require_person},
  error::{ApiError, store_error},
};

pub async fn upload<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
  mut multipart: Multipart,
) -> Result<Json<Value>, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  require_person(&state, id).await?;

  let upload = read_file_field(&mut multipart, state.photo_policy.max_bytes).await?;
  let kind = state.photo_policy.check(&upload.bytes, &upload.file_name)?;
  let stored = state.files.save("photo", kind, &upload.bytes).await?;

  match state.store.set_photo(id, stored.relative_path.clone()).await {
    Ok(true) => {}
    Ok(false) => {
      state.files.remove(&stored.relative_path).await;
      return Err(Error::NotFound(id).into());
    }
    Err(e) => {
      state.files.remove(&stored.relative_path).await;
      return Err(store_error(e));
    }
  }

  info!(person_id = id, actor = %ctx.actor, path = %stored.relative_path, "stored photo");
  Ok(Json(json!({ "success": true, "photoPath": stored.relative_path })))
}
