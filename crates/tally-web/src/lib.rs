//! HTML front end for Tally.
//!
//! Serves the weekly submission form, catalog maintenance pages, the gated
//! consolidated report and its spreadsheet download, and mounts the JSON API
//! from `tally-api` under `/api`.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod views;

pub use error::{Error, Result};

use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use axum::{
  Router,
  response::Redirect,
  routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tally_api::ApiState;
use tally_core::{
  catalog::{CatalogKind, SeedEntry, parse_seed},
  gate::AccessGate,
  store::IncidentStore,
};
use tower_http::trace::TraceLayer;

use views::Views;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `tally.toml` and
/// `TALLY_*` environment variables. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub database_path:   PathBuf,
  /// JSON array of plant names or `{id, name}` objects.
  pub plant_seed_path: PathBuf,
  /// Seeded into an empty incident-type catalog at startup.
  pub incident_types:  Vec<String>,
  /// Unset or blank leaves the report open.
  pub admin_pin:       Option<String>,
  pub recent_limit:    usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            8080,
      database_path:   PathBuf::from("incidents.db"),
      plant_seed_path: PathBuf::from("seeds/plants.json"),
      incident_types:  ["FALTA", "RETARDO", "PERMISO", "INCAPACIDAD", "OTRO", "VACACIONES"]
        .map(String::from)
        .to_vec(),
      admin_pin:       None,
      recent_limit:    tally_api::incidents::DEFAULT_LIMIT,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub gate:   Arc<AccessGate>,
  pub views:  Arc<Views>,
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Result<Self> {
    Ok(Self {
      store:  Arc::new(store),
      gate:   Arc::new(AccessGate::new(config.admin_pin.as_deref())),
      config: Arc::new(config),
      views:  Arc::new(Views::new()?),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: HTML pages plus `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: IncidentStore + Clone + Send + Sync + 'static,
{
  use handlers::{catalogs, incidents, report, settings};

  let api = tally_api::api_router(ApiState {
    store: state.store.clone(),
    gate:  state.gate.clone(),
  });

  Router::new()
    .route("/",                             get(|| async { Redirect::to("/incidents/new") }))
    .route("/incidents/new",                get(incidents::form::<S>))
    .route("/incidents",                    post(incidents::submit::<S>))
    .route("/catalogs/{kind}",              get(catalogs::page::<S>).post(catalogs::add::<S>))
    .route("/catalogs/{kind}/{id}/rename",  post(catalogs::rename::<S>))
    .route("/catalogs/{kind}/{id}/delete",  post(catalogs::delete::<S>))
    .route("/report",                       get(report::page::<S>))
    .route("/report/export",                get(report::export::<S>))
    .route("/settings",                     get(settings::page::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Startup ──────────────────────────────────────────────────────────────────

/// Populate empty catalogs: plants from the seed file, incident types from
/// the configured list. Catalogs that already have entries are left alone.
/// A missing seed file is skipped; a malformed one is an error.
pub async fn seed_catalogs<S>(store: &S, config: &ServerConfig) -> Result<()>
where
  S: IncidentStore,
{
  let path = &config.plant_seed_path;
  match tokio::fs::read_to_string(path).await {
    Ok(json) => {
      let entries = parse_seed(&json)?;
      store
        .seed_catalog(CatalogKind::Plant, entries)
        .await
        .map_err(Error::from_store)?;
    }
    Err(e) if e.kind() == ErrorKind::NotFound => {
      tracing::info!(path = %path.display(), "no plant seed file; skipping");
    }
    Err(e) => return Err(e.into()),
  }

  let types: Vec<SeedEntry> =
    config.incident_types.iter().map(|name| SeedEntry::from(name.as_str())).collect();
  store
    .seed_catalog(CatalogKind::IncidentType, types)
    .await
    .map_err(Error::from_store)?;
  Ok(())
}
