//! Handlers for `/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/staff` | `?group_by=rank\|unit\|corps\|gender\|service_status\|marital_status` |
//! | `GET`  | `/reports/readiness` | expiry band counts per item type |

use armis_core::{
  report::{GroupBy, ReadinessSummary, ReportRow},
  store::{PersonnelStore, ReportStore as _},
};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  context::Ctx,
  error::{ApiError, store_error},
};

#[derive(Debug, Deserialize)]
pub struct StaffParams {
  pub group_by: GroupBy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffReport {
  pub group_by: GroupBy,
  pub rows:     Vec<ReportRow>,
}

/// `GET /reports/staff?group_by=<dimension>`
pub async fn staff<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<StaffParams>,
) -> Result<Json<StaffReport>, ApiError>
where
  S: PersonnelStore,
{
  let rows = state.store.staff_count_by(params.group_by).await.map_err(store_error)?;
  Ok(Json(StaffReport { group_by: params.group_by, rows }))
}

/// `GET /reports/readiness`
pub async fn readiness<S>(
  State(state): State<ApiState<S>>,
  Ctx(ctx): Ctx,
) -> Result<Json<ReadinessSummary>, ApiError>
where
  S: PersonnelStore,
{
  let entries = state.store.list_expiry_dates().await.map_err(store_error)?;
  let summary = ReadinessSummary::build(state.aggregator.tracker(), ctx.today, &entries);
  Ok(Json(summary))
}
