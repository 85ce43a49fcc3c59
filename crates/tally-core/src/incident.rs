//! Incident records, the weekly submissions.
//!
//! A record is immutable once written. Input arrives as an [`IncidentForm`]
//! (everything optional, exactly as a browser or API client sent it) and is
//! turned into a [`NewIncident`] by [`IncidentForm::validate`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  input::{blank_as_none, lenient_id},
};

// ─── Form input ──────────────────────────────────────────────────────────────

/// Unvalidated submission. Field names match the HTML form inputs.
///
/// Blank strings are treated as absent, so the same type deserialises from
/// `application/x-www-form-urlencoded` and from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentForm {
  #[serde(default, deserialize_with = "blank_as_none")]
  pub date:        Option<String>,
  #[serde(default, deserialize_with = "lenient_id")]
  pub plant_id:    Option<i64>,
  #[serde(default, deserialize_with = "lenient_id")]
  pub type_id:     Option<i64>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub description: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub reporter:    Option<String>,
}

impl IncidentForm {
  /// Check required fields and build a [`NewIncident`].
  ///
  /// A missing date falls back to `today`. Plant, type and description are
  /// required; the reporter is optional.
  pub fn validate(self, today: NaiveDate) -> Result<NewIncident> {
    let plant_id = self.plant_id.ok_or(Error::Validation { field: "plant" })?;
    let type_id = self.type_id.ok_or(Error::Validation { field: "type" })?;
    let description = self
      .description
      .map(|d| d.trim().to_owned())
      .filter(|d| !d.is_empty())
      .ok_or(Error::Validation { field: "description" })?;

    let occurred_on = match self.date {
      Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation { field: "date" })?,
      None => today,
    };

    Ok(NewIncident {
      occurred_on,
      plant_id,
      type_id,
      description,
      reporter: self
        .reporter
        .map(|r| r.trim().to_owned())
        .filter(|r| !r.is_empty()),
    })
  }
}

// ─── Validated input ─────────────────────────────────────────────────────────

/// Input to [`crate::store::IncidentStore::submit_incident`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
  pub occurred_on: NaiveDate,
  pub plant_id:    i64,
  pub type_id:     i64,
  pub description: String,
  pub reporter:    Option<String>,
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// A persisted incident. Foreign keys are kept as ids; the denormalised view
/// lives in [`crate::report::DataRow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
  pub id:          i64,
  pub occurred_on: NaiveDate,
  pub plant_id:    i64,
  pub type_id:     i64,
  pub description: String,
  pub reporter:    Option<String>,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:  DateTime<Utc>,
}
