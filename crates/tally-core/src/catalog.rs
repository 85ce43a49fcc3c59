//! Catalogs: the two lookup lists that constrain incident input.
//!
//! Plants and incident types share one shape and one lifecycle, so they are
//! modelled as a single [`CatalogEntry`] qualified by a [`CatalogKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The recognised catalog sources. There are exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind {
  #[serde(rename = "plants")]
  Plant,
  #[serde(rename = "incident_types")]
  IncidentType,
}

impl CatalogKind {
  pub const ALL: [CatalogKind; 2] = [CatalogKind::Plant, CatalogKind::IncidentType];

  /// Path segment used by the HTML and JSON routes.
  /// Must match the serde renames above.
  pub fn slug(self) -> &'static str {
    match self {
      Self::Plant => "plants",
      Self::IncidentType => "incident_types",
    }
  }

  /// Plural heading shown in the UI.
  pub fn label(self) -> &'static str {
    match self {
      Self::Plant => "Plants",
      Self::IncidentType => "Incident types",
    }
  }

  pub fn from_slug(slug: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.slug() == slug)
  }
}

impl fmt::Display for CatalogKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Plant => "plant",
      Self::IncidentType => "incident type",
    })
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A plant or an incident type. The id is stable for the entry's lifetime;
/// only the name can change (rename).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  pub id:   i64,
  pub name: String,
}

/// Canonical form of a catalog name: trimmed, inner whitespace collapsed,
/// upper-cased. Uniqueness is checked on this form.
pub fn normalize_name(raw: &str) -> Result<String> {
  let name = raw
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_uppercase();
  if name.is_empty() {
    return Err(Error::Validation { field: "name" });
  }
  Ok(name)
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

/// One element of a seed file: either a bare name or an `{id, name}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeedEntry {
  Name(String),
  Entry { id: i64, name: String },
}

impl SeedEntry {
  pub fn name(&self) -> &str {
    match self {
      Self::Name(name) | Self::Entry { name, .. } => name,
    }
  }

  pub fn id(&self) -> Option<i64> {
    match self {
      Self::Name(_) => None,
      Self::Entry { id, .. } => Some(*id),
    }
  }
}

impl From<&str> for SeedEntry {
  fn from(name: &str) -> Self { Self::Name(name.to_owned()) }
}

/// Parse a seed file: a JSON array of names or `{id, name}` objects.
pub fn parse_seed(json: &str) -> Result<Vec<SeedEntry>> {
  Ok(serde_json::from_str(json)?)
}
