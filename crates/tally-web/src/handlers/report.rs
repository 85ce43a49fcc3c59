//! The gated consolidated view and its spreadsheet download.

use axum::{
  extract::{Query, RawQuery, State},
  http::header,
  response::{Html, IntoResponse},
};
use serde::Serialize;
use tally_core::{
  report::{Aggregate, DATA_HEADERS, ReportFilter, summary_headers},
  store::IncidentStore,
};
use tera::Context;

use crate::{
  AppState,
  error::{Error, Result},
  gate::Admin,
};

/// The active filter as the form inputs expect it.
#[derive(Debug, Serialize)]
struct FilterValues {
  from:      String,
  to:        String,
  plant_id:  Option<i64>,
  type_id:   Option<i64>,
  aggregate: &'static str,
}

impl From<&ReportFilter> for FilterValues {
  fn from(f: &ReportFilter) -> Self {
    let date = |d: Option<chrono::NaiveDate>| {
      d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
    };
    Self {
      from:      date(f.from),
      to:        date(f.to),
      plant_id:  f.plant_id,
      type_id:   f.type_id,
      aggregate: f.aggregate.as_str(),
    }
  }
}

#[derive(Debug, Serialize)]
struct AggregateOption {
  value: &'static str,
  label: &'static str,
}

/// `GET /report`
pub async fn page<S>(
  admin: Admin,
  State(state): State<AppState<S>>,
  Query(filter): Query<ReportFilter>,
  RawQuery(raw): RawQuery,
) -> Result<Html<String>>
where
  S: IncidentStore,
{
  let report = state.store.build_report(&filter).await.map_err(Error::from_store)?;
  let plants = state.store.list_plants().await.map_err(Error::from_store)?;
  let types = state.store.list_incident_types().await.map_err(Error::from_store)?;
  let aggregates: Vec<_> = Aggregate::ALL
    .into_iter()
    .map(|a| AggregateOption { value: a.as_str(), label: a.column() })
    .collect();
  let export_href = match raw {
    Some(q) if !q.is_empty() => format!("/report/export?{q}"),
    _ => "/report/export".to_owned(),
  };

  let mut ctx = Context::new();
  ctx.insert("title", "Consolidated report");
  ctx.insert("filter", &FilterValues::from(&filter));
  ctx.insert("plants", &plants);
  ctx.insert("types", &types);
  ctx.insert("aggregates", &aggregates);
  ctx.insert("data_headers", &DATA_HEADERS);
  ctx.insert("summary_headers", &summary_headers(report.aggregate));
  ctx.insert("rows", &super::table(&report.data));
  let summary: Vec<_> = report.summary.iter().map(|r| r.cells(report.aggregate)).collect();
  ctx.insert("summary", &summary);
  ctx.insert("empty", &report.is_empty());
  ctx.insert("pin", &admin.pin);
  ctx.insert("export_href", &export_href);
  state.views.render("report.html", &ctx)
}

/// `GET /report/export`
pub async fn export<S>(
  _: Admin,
  State(state): State<AppState<S>>,
  Query(filter): Query<ReportFilter>,
) -> Result<impl IntoResponse>
where
  S: IncidentStore,
{
  let report = state.store.build_report(&filter).await.map_err(Error::from_store)?;
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
