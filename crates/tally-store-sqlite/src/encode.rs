//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`, so lexical order equals chronological order.

use chrono::{DateTime, NaiveDate, Utc};
use tally_core::{catalog::CatalogKind, report::DataRow};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── CatalogKind ─────────────────────────────────────────────────────────────

/// The table holding one catalog. Both tables have `(id, name)` columns.
pub fn catalog_table(kind: CatalogKind) -> &'static str {
  match kind {
    CatalogKind::Plant => "plants",
    CatalogKind::IncidentType => "incident_types",
  }
}

/// The `incidents` column referencing one catalog.
pub fn incident_fk(kind: CatalogKind) -> &'static str {
  match kind {
    CatalogKind::Plant => "plant_id",
    CatalogKind::IncidentType => "type_id",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected by [`DATA_ROW_SELECT`], in order.
pub const DATA_ROW_SELECT: &str = "
  SELECT i.id, i.occurred_on,
         COALESCE(p.name, ''), COALESCE(t.name, ''),
         i.description, i.reporter, i.created_at
  FROM incidents i
  LEFT JOIN plants         p ON p.id = i.plant_id
  LEFT JOIN incident_types t ON t.id = i.type_id";

/// Raw values read directly from an `incidents` row joined with both catalogs.
pub struct RawDataRow {
  pub id:            i64,
  pub occurred_on:   String,
  pub plant:         String,
  pub incident_type: String,
  pub description:   String,
  pub reporter:      Option<String>,
  pub created_at:    String,
}

impl RawDataRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      occurred_on:   row.get(1)?,
      plant:         row.get(2)?,
      incident_type: row.get(3)?,
      description:   row.get(4)?,
      reporter:      row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_row(self) -> Result<DataRow> {
    Ok(DataRow {
      id:            self.id,
      date:          decode_date(&self.occurred_on)?,
      plant:         self.plant,
      incident_type: self.incident_type,
      description:   self.description,
      reporter:      self.reporter,
      recorded_at:   decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn dates_roundtrip() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
    assert_eq!(encode_date(d), "2024-02-09");
    assert_eq!(decode_date("2024-02-09").unwrap(), d);
    assert!(matches!(decode_date("09/02/2024"), Err(Error::DateParse(_))));
  }

  #[test]
  fn timestamps_roundtrip() {
    let t = Utc.with_ymd_and_hms(2024, 2, 9, 13, 30, 5).unwrap();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }
}
