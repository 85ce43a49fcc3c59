//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::store::IncidentStore`].
//! TLS and transport concerns are the caller's responsibility; the only
//! access control is the advisory admin PIN on `/report`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(ApiState { store, gate }))
//! ```

pub mod catalogs;
pub mod error;
pub mod gate;
pub mod incidents;
pub mod report;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use tally_core::{gate::AccessGate, store::IncidentStore};

pub use error::ApiError;

/// State shared by every API handler.
#[derive(Clone)]
pub struct ApiState<S> {
  pub store: Arc<S>,
  pub gate:  Arc<AccessGate>,
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: IncidentStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Catalogs
    .route("/catalogs/{kind}", get(catalogs::list::<S>).post(catalogs::create::<S>))
    .route(
      "/catalogs/{kind}/{id}",
      put(catalogs::rename::<S>).delete(catalogs::remove::<S>),
    )
    // Incidents
    .route("/incidents", get(incidents::recent::<S>).post(incidents::create::<S>))
    // Consolidation
    .route("/report", get(report::show::<S>))
    .route("/report/export", get(report::export::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tally_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn make_state(pin: Option<&str>) -> ApiState<SqliteStore> {
    ApiState {
      store: Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      gate:  Arc::new(AccessGate::new(pin)),
    }
  }

  async fn oneshot_raw(
    state:   ApiState<SqliteStore>,
    method:  &str,
    uri:     &str,
    headers: Vec<(&str, &str)>,
    body:    Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    api_router(state).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn post(state: &ApiState<SqliteStore>, uri: &str, body: Value) -> Value {
    let resp = oneshot_raw(state.clone(), "POST", uri, vec![], Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
  }

  // ── Catalogs ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_list_catalog() {
    let state = make_state(None).await;
    let created = post(&state, "/catalogs/plants", json!({ "name": "  planta   b " })).await;
    assert_eq!(created["name"], "PLANTA B");
    post(&state, "/catalogs/plants", json!({ "name": "Planta A" })).await;

    let resp = oneshot_raw(state, "GET", "/catalogs/plants", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let names: Vec<Value> = json_body(resp)
      .await
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["name"].clone())
      .collect();
    assert_eq!(names, [json!("PLANTA A"), json!("PLANTA B")]);
  }

  #[tokio::test]
  async fn duplicate_name_is_conflict() {
    let state = make_state(None).await;
    post(&state, "/catalogs/incident_types", json!({ "name": "Falta" })).await;
    let resp = oneshot_raw(
      state,
      "POST",
      "/catalogs/incident_types",
      vec![],
      Some(json!({ "name": "FALTA" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(json_body(resp).await["error"].as_str().unwrap().contains("FALTA"));
  }

  #[tokio::test]
  async fn unknown_catalog_kind_is_rejected() {
    let state = make_state(None).await;
    let resp = oneshot_raw(state, "GET", "/catalogs/employees", vec![], None).await;
    assert!(resp.status().is_client_error());
  }

  #[tokio::test]
  async fn rename_and_remove() {
    let state = make_state(None).await;
    let plant = post(&state, "/catalogs/plants", json!({ "name": "Norte" })).await;
    let id = plant["id"].as_i64().unwrap();

    let resp = oneshot_raw(
      state.clone(),
      "PUT",
      &format!("/catalogs/plants/{id}"),
      vec![],
      Some(json!({ "name": "planta norte" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "id": id, "name": "PLANTA NORTE" }));

    let uri = format!("/catalogs/plants/{id}");
    let resp = oneshot_raw(state.clone(), "DELETE", &uri, vec![], None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = oneshot_raw(state, "DELETE", &uri, vec![], None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Incidents ───────────────────────────────────────────────────────────────

  async fn seed_pair(state: &ApiState<SqliteStore>) -> (i64, i64) {
    let plant = post(state, "/catalogs/plants", json!({ "name": "Planta A" })).await;
    let ty = post(state, "/catalogs/incident_types", json!({ "name": "Safety" })).await;
    (plant["id"].as_i64().unwrap(), ty["id"].as_i64().unwrap())
  }

  #[tokio::test]
  async fn submit_and_list_recent() {
    let state = make_state(None).await;
    let (plant, ty) = seed_pair(&state).await;
    let record = post(&state, "/incidents", json!({
      "date": "2024-01-08",
      "plant_id": plant,
      "type_id": ty,
      "description": "  slipped on wet floor ",
      "reporter": "",
    }))
    .await;
    assert_eq!(record["description"], "slipped on wet floor");
    assert_eq!(record["reporter"], Value::Null);

    let resp = oneshot_raw(state, "GET", "/incidents?limit=5", vec![], None).await;
    let rows = json_body(resp).await;
    assert_eq!(rows[0]["plant"], "PLANTA A");
    assert_eq!(rows[0]["incident_type"], "SAFETY");
  }

  #[tokio::test]
  async fn huge_limit_lists_everything() {
    let state = make_state(None).await;
    let (plant, ty) = seed_pair(&state).await;
    for _ in 0..2 {
      post(&state, "/incidents", json!({ "plant_id": plant, "type_id": ty, "description": "x" }))
        .await;
    }
    let resp =
      oneshot_raw(state, "GET", "/incidents?limit=18446744073709551615", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn missing_description_is_unprocessable() {
    let state = make_state(None).await;
    let (plant, ty) = seed_pair(&state).await;
    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/incidents",
      vec![],
      Some(json!({ "plant_id": plant, "type_id": ty, "description": "   " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = oneshot_raw(state, "GET", "/incidents", vec![], None).await;
    assert_eq!(json_body(resp).await, json!([]));
  }

  #[tokio::test]
  async fn referenced_entry_cannot_be_removed() {
    let state = make_state(None).await;
    let (plant, ty) = seed_pair(&state).await;
    post(&state, "/incidents", json!({ "plant_id": plant, "type_id": ty, "description": "x" })).await;

    let resp =
      oneshot_raw(state, "DELETE", &format!("/catalogs/plants/{plant}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  // ── Report ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn report_requires_pin() {
    let state = make_state(Some("1234")).await;
    let resp = oneshot_raw(state.clone(), "GET", "/report", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp =
      oneshot_raw(state.clone(), "GET", "/report", vec![(gate::PIN_HEADER, "0000")], None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp =
      oneshot_raw(state.clone(), "GET", "/report", vec![(gate::PIN_HEADER, "1234")], None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_raw(state, "GET", "/report?pin=1234", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["data"], json!([]));
  }

  #[tokio::test]
  async fn report_filters_and_summarises() {
    let state = make_state(None).await;
    let (plant, ty) = seed_pair(&state).await;
    for (date, reporter) in [("2024-01-01", "ana"), ("2024-01-02", "ana"), ("2024-02-01", "luis")] {
      post(&state, "/incidents", json!({
        "date": date, "plant_id": plant, "type_id": ty, "description": "x", "reporter": reporter,
      }))
      .await;
    }

    let resp = oneshot_raw(
      state.clone(),
      "GET",
      "/report?from=2024-01-01&to=2024-01-31",
      vec![],
      None,
    )
    .await;
    let report = json_body(resp).await;
    assert_eq!(report["data"].as_array().unwrap().len(), 2);
    assert_eq!(report["summary"][0]["value"], 2);

    let resp =
      oneshot_raw(state, "GET", "/report?aggregate=distinct_reporters", vec![], None).await;
    let report = json_body(resp).await;
    assert_eq!(report["summary"], json!([
      { "plant": "PLANTA A", "incident_type": "SAFETY", "count": 3, "value": 2 }
    ]));
  }

  #[tokio::test]
  async fn export_is_an_xlsx_attachment() {
    let state = make_state(Some("1234")).await;
    let resp = oneshot_raw(state.clone(), "GET", "/report/export", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = oneshot_raw(state, "GET", "/report/export?pin=1234", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], tally_xlsx::CONTENT_TYPE);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_owned();
    assert!(disposition.starts_with("attachment; filename=\"incidents_consolidated_"));
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..2], b"PK");
  }
}
