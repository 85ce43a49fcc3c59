//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::store::StoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// Well-formed input that fails a required-field or reference check.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("admin PIN required")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("export error: {0}")]
  Export(#[from] tally_xlsx::Error),
}

impl ApiError {
  /// Map a backend error onto a rejection when it carries a domain failure,
  /// or onto an internal error otherwise.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    let rejection = e.domain().and_then(Self::from_domain);
    rejection.unwrap_or_else(|| ApiError::Store(Box::new(e)))
  }

  fn from_domain(e: &tally_core::Error) -> Option<Self> {
    use tally_core::Error as E;
    let message = e.to_string();
    match e {
      E::Validation { .. } | E::UnknownCatalogEntry { .. } => {
        Some(ApiError::Unprocessable(message))
      }
      E::DuplicateName { .. } | E::Referenced { .. } => Some(ApiError::Conflict(message)),
      E::NotFound { .. } => Some(ApiError::NotFound(message)),
      E::Seed(_) => None,
    }
  }
}

impl From<tally_core::Error> for ApiError {
  fn from(e: tally_core::Error) -> Self {
    Self::from_domain(&e).unwrap_or_else(|| ApiError::Store(Box::new(e)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Store(_) | ApiError::Export(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
      }
    };
    if status.is_client_error() {
      tracing::warn!(%status, %message, "request rejected");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}
