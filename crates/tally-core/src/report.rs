//! Consolidation, the read-and-aggregate step behind the admin view and the
//! spreadsheet export.
//!
//! The backend produces [`DataRow`]s already filtered and ordered; everything
//! else here is a pure transform over them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::input::{lenient_id, optional_date};

// ─── Headers ─────────────────────────────────────────────────────────────────

/// Column order of the data table, on screen and in the `Data` sheet.
pub const DATA_HEADERS: [&str; 7] =
  ["ID", "Date", "Plant", "Type", "Description", "Reporter", "Recorded at"];

/// Column order of the summary table, on screen and in the `Summary` sheet.
/// The record count is always present; any other aggregate follows it.
pub fn summary_headers(aggregate: Aggregate) -> Vec<&'static str> {
  match aggregate {
    Aggregate::Count => vec!["Plant", "Type", "Incidents"],
    other => vec!["Plant", "Type", "Incidents", other.column()],
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// How each `(plant, type)` group is reduced to one number.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
  /// Number of records in the group.
  #[default]
  Count,
  /// Number of distinct non-empty reporters in the group.
  DistinctReporters,
}

impl Aggregate {
  pub const ALL: [Aggregate; 2] = [Aggregate::Count, Aggregate::DistinctReporters];

  pub fn column(self) -> &'static str {
    match self {
      Self::Count => "Incidents",
      Self::DistinctReporters => "Reporters",
    }
  }

  /// Query-string value; matches the serde rename.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Count => "count",
      Self::DistinctReporters => "distinct_reporters",
    }
  }
}

/// Parameters for [`crate::store::IncidentStore::build_report`]. Every
/// criterion is optional; both date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
  #[serde(default, deserialize_with = "optional_date")]
  pub from:      Option<NaiveDate>,
  #[serde(default, deserialize_with = "optional_date")]
  pub to:        Option<NaiveDate>,
  #[serde(default, deserialize_with = "lenient_id")]
  pub plant_id:  Option<i64>,
  #[serde(default, deserialize_with = "lenient_id")]
  pub type_id:   Option<i64>,
  #[serde(default)]
  pub aggregate: Aggregate,
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One incident with plant and type names substituted for their ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
  pub id:            i64,
  pub date:          NaiveDate,
  pub plant:         String,
  pub incident_type: String,
  pub description:   String,
  pub reporter:      Option<String>,
  pub recorded_at:   DateTime<Utc>,
}

impl DataRow {
  /// Cell text in [`DATA_HEADERS`] order.
  pub fn cells(&self) -> [String; 7] {
    [
      self.id.to_string(),
      self.date.to_string(),
      self.plant.clone(),
      self.incident_type.clone(),
      self.description.clone(),
      self.reporter.clone().unwrap_or_default(),
      self.recorded_at.to_rfc3339(),
    ]
  }
}

/// One `(plant, type)` group present in the filtered data.
///
/// `count` is the number of records in the group whatever the aggregate;
/// `value` is the selected [`Aggregate`] (equal to `count` for
/// [`Aggregate::Count`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
  pub plant:         String,
  pub incident_type: String,
  pub count:         u64,
  pub value:         u64,
}

impl SummaryRow {
  /// Cell text in [`summary_headers`] order.
  pub fn cells(&self, aggregate: Aggregate) -> Vec<String> {
    let mut cells =
      vec![self.plant.clone(), self.incident_type.clone(), self.count.to_string()];
    if aggregate != Aggregate::Count {
      cells.push(self.value.to_string());
    }
    cells
  }
}

/// The consolidated report: the flat view and its pivot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub aggregate: Aggregate,
  pub data:      Vec<DataRow>,
  pub summary:   Vec<SummaryRow>,
}

impl Report {
  pub fn from_rows(data: Vec<DataRow>, aggregate: Aggregate) -> Self {
    let summary = summarize(&data, aggregate);
    Self { aggregate, data, summary }
  }

  pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

/// Group `rows` by `(plant, type)`, sorted by plant name then type name.
///
/// Sparse: only pairs that occur in `rows` are returned, so no group has a
/// zero `count`, and the counts sum to `rows.len()` for every aggregate.
pub fn summarize(rows: &[DataRow], aggregate: Aggregate) -> Vec<SummaryRow> {
  let mut groups: BTreeMap<(&str, &str), (u64, BTreeSet<&str>)> = BTreeMap::new();

  for row in rows {
    let (count, reporters) = groups
      .entry((row.plant.as_str(), row.incident_type.as_str()))
      .or_default();
    *count += 1;
    if let Some(r) = row.reporter.as_deref().filter(|r| !r.is_empty()) {
      reporters.insert(r);
    }
  }

  groups
    .into_iter()
    .map(|((plant, incident_type), (count, reporters))| SummaryRow {
      plant:         plant.to_owned(),
      incident_type: incident_type.to_owned(),
      count,
      value:         match aggregate {
        Aggregate::Count => count,
        Aggregate::DistinctReporters => reporters.len() as u64,
      },
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn row(id: i64, plant: &str, ty: &str, reporter: Option<&str>) -> DataRow {
    DataRow {
      id,
      date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
      plant: plant.into(),
      incident_type: ty.into(),
      description: format!("incident {id}"),
      reporter: reporter.map(Into::into),
      recorded_at: Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(),
    }
  }

  #[test]
  fn empty_input_gives_empty_summary() {
    let report = Report::from_rows(Vec::new(), Aggregate::Count);
    assert!(report.is_empty());
    assert!(report.summary.is_empty());
  }

  #[test]
  fn groups_are_sparse_and_sorted() {
    let rows = vec![
      row(1, "PLANTA B", "QUALITY", None),
      row(2, "PLANTA A", "SAFETY", None),
      row(3, "PLANTA A", "QUALITY", None),
      row(4, "PLANTA A", "SAFETY", None),
    ];
    let summary = summarize(&rows, Aggregate::Count);
    let keys: Vec<_> = summary
      .iter()
      .map(|s| (s.plant.as_str(), s.incident_type.as_str(), s.value))
      .collect();
    assert_eq!(keys, vec![
      ("PLANTA A", "QUALITY", 1),
      ("PLANTA A", "SAFETY", 2),
      ("PLANTA B", "QUALITY", 1),
    ]);
    assert!(summary.iter().all(|s| s.count == s.value));
  }

  #[test]
  fn distinct_reporters_ignores_missing_and_repeats() {
    let rows = vec![
      row(1, "A", "SAFETY", Some("ana")),
      row(2, "A", "SAFETY", Some("ana")),
      row(3, "A", "SAFETY", Some("luis")),
      row(4, "A", "SAFETY", None),
      row(5, "B", "SAFETY", None),
    ];
    let summary = summarize(&rows, Aggregate::DistinctReporters);
    assert_eq!(summary[0].value, 2);
    assert_eq!(summary[0].count, 4);
    assert_eq!(summary[1].value, 0);
    assert_eq!(summary[1].count, 1);
  }

  #[test]
  fn counts_cover_every_row_for_every_aggregate() {
    let rows = vec![
      row(1, "A", "T", None),
      row(2, "A", "T", None),
      row(3, "B", "T", Some("ana")),
    ];
    for aggregate in Aggregate::ALL {
      let summary = summarize(&rows, aggregate);
      assert!(summary.iter().all(|s| s.count > 0), "{aggregate:?}");
      assert_eq!(summary.iter().map(|s| s.count).sum::<u64>(), rows.len() as u64);
    }
  }

  #[test]
  fn summary_cells_follow_headers() {
    let rows = vec![row(1, "A", "T", Some("ana")), row(2, "A", "T", Some("luis"))];
    for aggregate in Aggregate::ALL {
      let summary = summarize(&rows, aggregate);
      assert_eq!(summary[0].cells(aggregate).len(), summary_headers(aggregate).len());
    }
    let summary = summarize(&rows, Aggregate::DistinctReporters);
    assert_eq!(summary[0].cells(Aggregate::DistinctReporters), ["A", "T", "2", "2"]);
  }

  #[test]
  fn cells_follow_header_order() {
    let cells = row(9, "A", "SAFETY", Some("ana")).cells();
    assert_eq!(cells.len(), DATA_HEADERS.len());
    assert_eq!(cells[0], "9");
    assert_eq!(cells[1], "2024-01-08");
    assert_eq!(cells[5], "ana");
  }

  #[test]
  fn filter_parses_blank_query_values() {
    let f: ReportFilter = serde_json::from_str(
      r#"{"from": "", "to": "2024-01-31", "plant_id": "", "type_id": "2"}"#,
    )
    .unwrap();
    assert_eq!(f.from, None);
    assert_eq!(f.to, NaiveDate::from_ymd_opt(2024, 1, 31));
    assert_eq!(f.plant_id, None);
    assert_eq!(f.type_id, Some(2));
    assert_eq!(f.aggregate, Aggregate::Count);
  }

  #[test]
  fn summary_headers_follow_aggregate() {
    assert_eq!(summary_headers(Aggregate::Count), ["Plant", "Type", "Incidents"]);
    assert_eq!(summary_headers(Aggregate::DistinctReporters), [
      "Plant",
      "Type",
      "Incidents",
      "Reporters"
    ]);
  }
}
