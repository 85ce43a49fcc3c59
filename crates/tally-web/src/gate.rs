//! Admin PIN extractor for the HTML report pages.
//!
//! The PIN travels as the `pin` query parameter so the report, its filter form
//! and the download link can all carry it without a session.

use axum::{
  extract::{FromRequestParts, Query},
  http::{StatusCode, request::Parts},
  response::{IntoResponse, Response},
};
use tally_api::gate::PinQuery;
use tally_core::store::IncidentStore;
use tera::Context;

use crate::AppState;

/// Present in a handler means the gate admitted the request. `pin` is the
/// accepted PIN, kept only when one is configured, so pages can thread it
/// through their links.
pub struct Admin {
  pub pin: Option<String>,
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: IncidentStore + Clone + Send + Sync + 'static,
{
  type Rejection = Response;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let pin = Query::<PinQuery>::try_from_uri(&parts.uri)
      .ok()
      .and_then(|Query(q)| q.pin);

    if state.gate.admits(pin.as_deref()) {
      return Ok(Admin { pin: pin.filter(|_| state.gate.is_protected()) });
    }

    if pin.is_some() {
      tracing::warn!(path = %parts.uri.path(), "admin PIN rejected");
    }
    let mut ctx = Context::new();
    ctx.insert("title", "Admin PIN");
    ctx.insert("target", parts.uri.path());
    ctx.insert("wrong", &pin.is_some());
    Err(match state.views.render("pin.html", &ctx) {
      Ok(page) => (StatusCode::UNAUTHORIZED, page).into_response(),
      Err(e) => e.into_response(),
    })
  }
}
