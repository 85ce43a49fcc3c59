//! The `IncidentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-api`, `tally-web`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::{
  catalog::{CatalogEntry, CatalogKind, SeedEntry},
  incident::{IncidentRecord, NewIncident},
  report::{DataRow, Report, ReportFilter},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors must expose the domain failure they carry, if any, so
/// transport layers can tell a rejected action from an internal fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tally store backend.
///
/// Incidents are append-only. Catalog entries can be added, renamed and
/// removed; removal is refused while any incident references the entry.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IncidentStore: Send + Sync {
  type Error: StoreError;

  // ── Catalogs ──────────────────────────────────────────────────────────

  /// All entries of one catalog, ordered by name.
  fn list_catalog(
    &self,
    kind: CatalogKind,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_;

  /// Retrieve one entry by id. Returns `None` if not found.
  fn get_catalog_entry(
    &self,
    kind: CatalogKind,
    id: i64,
  ) -> impl Future<Output = Result<Option<CatalogEntry>, Self::Error>> + Send + '_;

  /// Add an entry. The name is normalised first; fails with
  /// [`crate::Error::DuplicateName`] if the normalised name exists.
  fn add_catalog_entry(
    &self,
    kind: CatalogKind,
    name: String,
  ) -> impl Future<Output = Result<CatalogEntry, Self::Error>> + Send + '_;

  /// Rename an entry in place; its id (and every reference to it) is kept.
  fn rename_catalog_entry(
    &self,
    kind: CatalogKind,
    id: i64,
    name: String,
  ) -> impl Future<Output = Result<CatalogEntry, Self::Error>> + Send + '_;

  /// Remove an unreferenced entry. Fails with [`crate::Error::Referenced`]
  /// if any incident points at it; nothing is cascaded.
  fn remove_catalog_entry(
    &self,
    kind: CatalogKind,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Populate an empty catalog. Does nothing (and returns 0) if the catalog
  /// already has entries; otherwise returns the number inserted.
  fn seed_catalog(
    &self,
    kind: CatalogKind,
    entries: Vec<SeedEntry>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Incidents ─────────────────────────────────────────────────────────

  /// Persist a validated submission. Fails with
  /// [`crate::Error::UnknownCatalogEntry`] if the plant or type is missing.
  fn submit_incident(
    &self,
    input: NewIncident,
  ) -> impl Future<Output = Result<IncidentRecord, Self::Error>> + Send + '_;

  /// The latest `limit` submissions, newest first.
  fn recent_incidents(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<DataRow>, Self::Error>> + Send + '_;

  // ── Consolidation ─────────────────────────────────────────────────────

  /// Denormalised rows matching `filter`, ordered by date then insertion.
  fn report_rows<'a>(
    &'a self,
    filter: &'a ReportFilter,
  ) -> impl Future<Output = Result<Vec<DataRow>, Self::Error>> + Send + 'a;

  /// Data rows plus their summary for `filter`. An empty store yields an
  /// empty report, not an error.
  fn build_report<'a>(
    &'a self,
    filter: &'a ReportFilter,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + 'a {
    async move {
      let rows = self.report_rows(filter).await?;
      Ok(Report::from_rows(rows, filter.aggregate))
    }
  }

  // ── Named catalog shorthands ──────────────────────────────────────────

  fn list_plants(
    &self,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_ {
    self.list_catalog(CatalogKind::Plant)
  }

  fn add_plant(
    &self,
    name: String,
  ) -> impl Future<Output = Result<CatalogEntry, Self::Error>> + Send + '_ {
    self.add_catalog_entry(CatalogKind::Plant, name)
  }

  fn remove_plant(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    self.remove_catalog_entry(CatalogKind::Plant, id)
  }

  fn list_incident_types(
    &self,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_ {
    self.list_catalog(CatalogKind::IncidentType)
  }

  fn add_incident_type(
    &self,
    name: String,
  ) -> impl Future<Output = Result<CatalogEntry, Self::Error>> + Send + '_ {
    self.add_catalog_entry(CatalogKind::IncidentType, name)
  }

  fn remove_incident_type(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    self.remove_catalog_entry(CatalogKind::IncidentType, id)
  }
}
