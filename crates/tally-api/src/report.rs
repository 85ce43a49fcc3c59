//! Handlers for the gated `/report` endpoints.
//!
//! Both accept the [`ReportFilter`] fields as query parameters: `from`, `to`,
//! `plant_id`, `type_id`, `aggregate` (`count` | `distinct_reporters`).

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::IntoResponse,
};
use tally_core::{
  report::{Report, ReportFilter},
  store::IncidentStore,
};

use crate::{ApiState, error::ApiError, gate::Admin};

/// `GET /report`
pub async fn show<S>(
  _: Admin,
  State(state): State<ApiState<S>>,
  Query(filter): Query<ReportFilter>,
) -> Result<Json<Report>, ApiError>
where
  S: IncidentStore,
{
  let report = state
    .store
    .build_report(&filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(report))
}

/// `GET /report/export`: the same report as an XLSX attachment.
pub async fn export<S>(
  _: Admin,
  State(state): State<ApiState<S>>,
  Query(filter): Query<ReportFilter>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let report = state
    .store
    .build_report(&filter)
    .await
    .map_err(ApiError::from_store)?;
  let bytes = tally_xlsx::to_bytes(&report)?;
  let name = tally_xlsx::file_name(chrono::Local::now().date_naive());
  tracing::info!(rows = report.data.len(), file = %name, "report exported");

  Ok((
    [
      (header::CONTENT_TYPE, tally_xlsx::CONTENT_TYPE.to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
    ],
    bytes,
  ))
}
