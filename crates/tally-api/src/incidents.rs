//! Handlers for `/incidents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/incidents` | Newest first; optional `?limit` (default 50) |
//! | `POST` | `/incidents` | Body: [`IncidentForm`]; returns 201 + stored record |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{incident::IncidentForm, report::DataRow, store::IncidentStore};

use crate::{ApiState, error::ApiError};

pub const DEFAULT_LIMIT: usize = 50;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /incidents[?limit=N]`
pub async fn recent<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DataRow>>, ApiError>
where
  S: IncidentStore,
{
  let rows = state
    .store
    .recent_incidents(params.limit.unwrap_or(DEFAULT_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /incidents`
///
/// ```json
/// {"date":"2024-01-08","plant_id":1,"type_id":2,"description":"…","reporter":"ana"}
/// ```
///
/// `date` defaults to today (server local time) and `reporter` is optional.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(form): Json<IncidentForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let input = form.validate(chrono::Local::now().date_naive())?;
  let record = state
    .store
    .submit_incident(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}
