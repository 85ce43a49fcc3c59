//! Handlers for `/catalogs` endpoints.
//!
//! `{kind}` is `plants` or `incident_types`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/catalogs/{kind}` | Ordered by name |
//! | `POST`   | `/catalogs/{kind}` | Body: `{"name":"..."}`; 201, or 409 on duplicate |
//! | `PUT`    | `/catalogs/{kind}/{id}` | Body: `{"name":"..."}`; rename in place |
//! | `DELETE` | `/catalogs/{kind}/{id}` | 204, or 409 while incidents reference it |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  catalog::{CatalogEntry, CatalogKind},
  store::IncidentStore,
};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /catalogs/{kind}`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(kind): Path<CatalogKind>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError>
where
  S: IncidentStore,
{
  let entries = state
    .store
    .list_catalog(kind)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NameBody {
  pub name: String,
}

/// `POST /catalogs/{kind}`, body: `{"name":"Planta A"}`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(kind): Path<CatalogKind>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let entry = state
    .store
    .add_catalog_entry(kind, body.name)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Rename ───────────────────────────────────────────────────────────────────

/// `PUT /catalogs/{kind}/{id}`, body: `{"name":"Planta Norte"}`
pub async fn rename<S>(
  State(state): State<ApiState<S>>,
  Path((kind, id)): Path<(CatalogKind, i64)>,
  Json(body): Json<NameBody>,
) -> Result<Json<CatalogEntry>, ApiError>
where
  S: IncidentStore,
{
  let entry = state
    .store
    .rename_catalog_entry(kind, id, body.name)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entry))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /catalogs/{kind}/{id}`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path((kind, id)): Path<(CatalogKind, i64)>,
) -> Result<StatusCode, ApiError>
where
  S: IncidentStore,
{
  state
    .store
    .remove_catalog_entry(kind, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
