//! The submission form.

use axum::{
  Form,
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_core::{incident::IncidentForm, report::DATA_HEADERS, store::IncidentStore};
use tera::Context;

use crate::{
  AppState,
  error::{Error, Result},
};

#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
  /// Id of the record just stored, set by the post-submit redirect.
  pub saved: Option<i64>,
}

/// Values echoed back into the form inputs.
#[derive(Debug, Default, Serialize)]
struct FormValues {
  date:        String,
  plant_id:    Option<i64>,
  type_id:     Option<i64>,
  description: String,
  reporter:    String,
}

impl FormValues {
  fn blank(today: NaiveDate) -> Self {
    Self { date: today.format("%Y-%m-%d").to_string(), ..Self::default() }
  }

  fn echo(form: &IncidentForm, today: NaiveDate) -> Self {
    Self {
      date:        form.date.clone().unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
      plant_id:    form.plant_id,
      type_id:     form.type_id,
      description: form.description.clone().unwrap_or_default(),
      reporter:    form.reporter.clone().unwrap_or_default(),
    }
  }
}

async fn render<S>(
  state: &AppState<S>,
  values: FormValues,
  error: Option<String>,
  saved: Option<i64>,
) -> Result<Html<String>>
where
  S: IncidentStore,
{
  let plants = state.store.list_plants().await.map_err(Error::from_store)?;
  let types = state.store.list_incident_types().await.map_err(Error::from_store)?;
  let recent = state
    .store
    .recent_incidents(state.config.recent_limit)
    .await
    .map_err(Error::from_store)?;

  let mut ctx = Context::new();
  ctx.insert("title", "Record incident");
  ctx.insert("plants", &plants);
  ctx.insert("types", &types);
  ctx.insert("headers", &DATA_HEADERS);
  ctx.insert("recent", &super::table(&recent));
  ctx.insert("form", &values);
  ctx.insert("error", &error);
  ctx.insert("saved", &saved);
  state.views.render("incident_form.html", &ctx)
}

/// `GET /incidents/new`
pub async fn form<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<FormQuery>,
) -> Result<Html<String>>
where
  S: IncidentStore,
{
  let today = chrono::Local::now().date_naive();
  render(&state, FormValues::blank(today), None, query.saved).await
}

/// `POST /incidents`
///
/// Stores the record and redirects back to an empty form, or re-renders the
/// form with the submitted values and a message.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<IncidentForm>,
) -> Result<Response>
where
  S: IncidentStore,
{
  let today = chrono::Local::now().date_naive();
  let values = FormValues::echo(&form, today);

  let outcome = match form.validate(today) {
    Ok(input) => state.store.submit_incident(input).await.map_err(Error::from_store),
    Err(e) => Err(Error::from(e)),
  };

  match outcome {
    Ok(record) => Ok(Redirect::to(&format!("/incidents/new?saved={}", record.id)).into_response()),
    Err(e) if e.is_rejection() => {
      tracing::warn!(error = %e, "submission rejected");
      let page = render(&state, values, Some(e.to_string()), None).await?;
      Ok((e.status(), page).into_response())
    }
    Err(e) => Err(e),
  }
}
