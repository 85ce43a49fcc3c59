//! Admin PIN extractor for the consolidated endpoints.

use axum::{
  extract::{FromRequestParts, Query},
  http::request::Parts,
};
use serde::Deserialize;
use tally_core::store::IncidentStore;

use crate::{ApiState, error::ApiError};

/// Request header carrying the PIN. A `?pin=` query parameter is accepted
/// as a fallback so a plain browser link can reach the export.
pub const PIN_HEADER: &str = "x-admin-pin";

#[derive(Debug, Default, Deserialize)]
pub struct PinQuery {
  pub pin: Option<String>,
}

/// Zero-size marker: present in the handler means the gate admitted the
/// request.
pub struct Admin;

/// The candidate PIN from the header, else from the query string.
pub fn candidate_pin(parts: &Parts) -> Option<String> {
  let header = parts
    .headers
    .get(PIN_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  header.or_else(|| {
    Query::<PinQuery>::try_from_uri(&parts.uri)
      .ok()
      .and_then(|Query(q)| q.pin)
  })
}

impl<S> FromRequestParts<ApiState<S>> for Admin
where
  S: IncidentStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    if state.gate.admits(candidate_pin(parts).as_deref()) {
      Ok(Admin)
    } else {
      Err(ApiError::Unauthorized)
    }
  }
}
