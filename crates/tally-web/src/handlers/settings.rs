//! Read-only view of the running configuration.

use axum::{extract::State, response::Html};
use tally_core::store::IncidentStore;
use tera::Context;

use crate::{
  AppState,
  error::{Error, Result},
};

/// `GET /settings`. Never shows the PIN itself.
pub async fn page<S>(State(state): State<AppState<S>>) -> Result<Html<String>>
where
  S: IncidentStore,
{
  let plants = state.store.list_plants().await.map_err(Error::from_store)?;
  let types = state.store.list_incident_types().await.map_err(Error::from_store)?;
  let config = &state.config;

  let mut ctx = Context::new();
  ctx.insert("title", "Settings");
  ctx.insert("database_path", &config.database_path.display().to_string());
  ctx.insert("plant_seed_path", &config.plant_seed_path.display().to_string());
  ctx.insert("protected", &state.gate.is_protected());
  ctx.insert("plant_count", &plants.len());
  ctx.insert("type_count", &types.len());
  ctx.insert("incident_types", &config.incident_types);
  ctx.insert("recent_limit", &config.recent_limit);
  state.views.render("settings.html", &ctx)
}
