//! Error types for `tally-core`.

use thiserror::Error;

use crate::catalog::CatalogKind;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was missing or blank.
  #[error("{field} is required")]
  Validation { field: &'static str },

  #[error("{kind} {name:?} already exists")]
  DuplicateName { kind: CatalogKind, name: String },

  #[error("{kind} {id} is referenced by {incidents} incident(s)")]
  Referenced { kind: CatalogKind, id: i64, incidents: u64 },

  #[error("{kind} {id} not found")]
  NotFound { kind: CatalogKind, id: i64 },

  /// An incident named a catalog entry that does not exist at write time.
  #[error("unknown {kind} {id}")]
  UnknownCatalogEntry { kind: CatalogKind, id: i64 },

  #[error("malformed seed file: {0}")]
  Seed(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
