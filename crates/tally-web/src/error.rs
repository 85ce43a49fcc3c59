//! Error types and axum `IntoResponse` implementation for the HTML pages.

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use tally_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Unprocessable(String),
  #[error("{0}")]
  Conflict(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("template error: {0}")]
  Template(#[from] tera::Error),
  #[error("export error: {0}")]
  Export(#[from] tally_xlsx::Error),
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Keep domain rejections distinguishable from backend faults.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.domain().and_then(Self::from_domain) {
      Some(rejection) => rejection,
      None => Error::Store(Box::new(e)),
    }
  }

  fn from_domain(e: &tally_core::Error) -> Option<Self> {
    use tally_core::Error as E;
    let message = e.to_string();
    match e {
      E::Validation { .. } | E::UnknownCatalogEntry { .. } => Some(Error::Unprocessable(message)),
      E::DuplicateName { .. } | E::Referenced { .. } => Some(Error::Conflict(message)),
      E::NotFound { .. } => Some(Error::NotFound(message)),
      E::Seed(_) => None,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Error::Conflict(_) => StatusCode::CONFLICT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// A rejected user action, as opposed to an internal failure. Pages show
  /// rejections inline next to the form that caused them.
  pub fn is_rejection(&self) -> bool { self.status().is_client_error() }
}

impl From<tally_core::Error> for Error {
  fn from(e: tally_core::Error) -> Self {
    Self::from_domain(&e).unwrap_or_else(|| Error::Store(Box::new(e)))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = if self.is_rejection() {
      tracing::warn!(%status, error = %self, "request rejected");
      self.to_string()
    } else {
      tracing::error!(error = %self, "request failed");
      "Something went wrong. The error has been logged.".to_owned()
    };
    let body = format!(
      "<!doctype html><title>{code}</title><h1>{code}</h1><p>{msg}</p><p><a href=\"/\">Back</a></p>",
      code = status,
      msg = tera::escape_html(&message),
    );
    (status, Html(body)).into_response()
  }
}
