//! Catalog maintenance pages: one per [`CatalogKind`].

use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tally_core::{catalog::CatalogKind, store::IncidentStore};
use tera::Context;

use crate::{
  AppState,
  error::{Error, Result},
};

#[derive(Debug, Deserialize)]
pub struct NameForm {
  #[serde(default)]
  pub name: String,
}

async fn render<S>(
  state: &AppState<S>,
  kind: CatalogKind,
  error: Option<String>,
) -> Result<Html<String>>
where
  S: IncidentStore,
{
  let entries = state.store.list_catalog(kind).await.map_err(Error::from_store)?;
  let mut ctx = Context::new();
  ctx.insert("title", kind.label());
  ctx.insert("kind", kind.slug());
  ctx.insert("entries", &entries);
  ctx.insert("error", &error);
  state.views.render("catalog.html", &ctx)
}

/// Redirect back to the list on success; show a rejection inline.
async fn finish<S>(state: &AppState<S>, kind: CatalogKind, result: Result<()>) -> Result<Response>
where
  S: IncidentStore,
{
  match result {
    Ok(()) => Ok(Redirect::to(&format!("/catalogs/{}", kind.slug())).into_response()),
    Err(e) if e.is_rejection() => {
      tracing::warn!(%kind, error = %e, "catalog edit rejected");
      let page = render(state, kind, Some(e.to_string())).await?;
      Ok((e.status(), page).into_response())
    }
    Err(e) => Err(e),
  }
}

/// `GET /catalogs/{kind}`
pub async fn page<S>(
  State(state): State<AppState<S>>,
  Path(kind): Path<CatalogKind>,
) -> Result<Html<String>>
where
  S: IncidentStore,
{
  render(&state, kind, None).await
}

/// `POST /catalogs/{kind}`
pub async fn add<S>(
  State(state): State<AppState<S>>,
  Path(kind): Path<CatalogKind>,
  Form(form): Form<NameForm>,
) -> Result<Response>
where
  S: IncidentStore,
{
  let result = state
    .store
    .add_catalog_entry(kind, form.name)
    .await
    .map(drop)
    .map_err(Error::from_store);
  finish(&state, kind, result).await
}

/// `POST /catalogs/{kind}/{id}/rename`
pub async fn rename<S>(
  State(state): State<AppState<S>>,
  Path((kind, id)): Path<(CatalogKind, i64)>,
  Form(form): Form<NameForm>,
) -> Result<Response>
where
  S: IncidentStore,
{
  let result = state
    .store
    .rename_catalog_entry(kind, id, form.name)
    .await
    .map(drop)
    .map_err(Error::from_store);
  finish(&state, kind, result).await
}

/// `POST /catalogs/{kind}/{id}/delete`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path((kind, id)): Path<(CatalogKind, i64)>,
) -> Result<Response>
where
  S: IncidentStore,
{
  let result = state
    .store
    .remove_catalog_entry(kind, id)
    .await
    .map_err(Error::from_store);
  finish(&state, kind, result).await
}
