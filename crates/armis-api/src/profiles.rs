//! Handlers for `/profiles/{id}` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/profiles/{id}` | 404 `profile_not_available` if absent |
//! | `GET`    | `/profiles/{id}/readiness` | completion, readiness and expiries |
//! | `PUT`    | `/profiles/{id}/personal` | body: [`IdentityUpdate`] |
//! | `POST`   | `/profiles/{id}/family` | body: [`NewFamilyMember`] |
//! | `PUT`    | `/profiles/{id}/family` | body: `{"members":[..]}` |
//! | `DELETE` | `/profiles/{id}` | cascades to every child record |

use armis_core::{
  Error, PersonId,
  expiry::ExpiryStatus,
  parse_person_id,
  profile::PersonProfile,
  scoring::ReadinessBlocker,
  store::{FamilyStore as _, IdentityStore as _, PersonnelStore},
  validate::{IdentityUpdate, NewFamilyMember, validate_family},
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
  ApiState,
  context::Ctx,
  error::{ApiError, store_error},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /profiles/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
) -> Result<Json<PersonProfile>, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  let profile = state.aggregator.get_profile(&ctx, id).await?;
  Ok(Json(profile))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessView {
  pub person_id:                  PersonId,
  pub profile_completion_percent: u8,
  pub deployment_ready:           bool,
  pub readiness_blockers:         Vec<ReadinessBlocker>,
  pub expiries:                   Vec<ExpiryStatus>,
}

/// `GET /profiles/{id}/readiness`
pub async fn readiness<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
) -> Result<Json<ReadinessView>, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  let profile = state.aggregator.get_profile(&ctx, id).await?;
  Ok(Json(ReadinessView {
    person_id:                  id,
    profile_completion_percent: profile.profile_completion_percent,
    deployment_ready:           profile.deployment_ready,
    readiness_blockers:         profile.readiness_blockers,
    expiries:                   profile.expiries,
  }))
}

// ─── Personal information ────────────────────────────────────────────────────

/// `PUT /profiles/{id}/personal`; returns the refreshed profile.
pub async fn update_personal<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
  Json(update): Json<IdentityUpdate>,
) -> Result<Json<PersonProfile>, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  update.validate(ctx.today).map_err(Error::from)?;
  let updated = state.store.update_identity(id, update).await.map_err(store_error)?;
  if !updated {
    return Err(Error::NotFound(id).into());
  }
  info!(person_id = id, actor = %ctx.actor, "updated personal information");
  let profile = state.aggregator.get_profile(&ctx, id).await?;
  Ok(Json(profile))
}

// ─── Family ──────────────────────────────────────────────────────────────────

/// `POST /profiles/{id}/family`
pub async fn add_family<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
  Json(member): Json<NewFamilyMember>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  member.validate(ctx.today).map_err(Error::from)?;
  let row_id = state
    .store
    .add_family_member(id, member)
    .await
    .map_err(store_error)?
    .ok_or(Error::NotFound(id))?;
  info!(person_id = id, actor = %ctx.actor, family_id = row_id, "added family member");
  Ok((StatusCode::CREATED, Json(json!({ "id": row_id }))))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceFamilyBody {
  pub members: Vec<NewFamilyMember>,
}

/// `PUT /profiles/{id}/family`; body: `{"members":[..]}`
pub async fn replace_family<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
  Json(body): Json<ReplaceFamilyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  validate_family(&body.members, ctx.today).map_err(Error::from)?;
  let written = state
    .store
    .replace_family(id, body.members)
    .await
    .map_err(store_error)?
    .ok_or(Error::NotFound(id))?;
  info!(person_id = id, actor = %ctx.actor, written, "replaced family list");
  Ok(Json(json!({ "written": written })))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /profiles/{id}`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
  Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: PersonnelStore,
{
  let id = parse_person_id(&raw_id)?;
  if !state.store.delete_person(id).await.map_err(store_error)? {
    return Err(Error::NotFound(id).into());
  }
  info!(person_id = id, actor = %ctx.actor, "deleted person");
  Ok(StatusCode::NO_CONTENT)
}
