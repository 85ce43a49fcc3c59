//! Spreadsheet export for Tally.
//!
//! Writes a [`Report`] as an XLSX workbook with exactly two sheets: `Data`
//! (one row per incident) and `Summary` (the plant × type pivot). Column
//! order comes from [`DATA_HEADERS`] and [`summary_headers`], the same
//! constants the on-screen tables use. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use tally_core::report::{Aggregate, Report};
//!
//! let report = Report::from_rows(Vec::new(), Aggregate::Count);
//! let bytes = tally_xlsx::to_bytes(&report).unwrap();
//! assert!(!bytes.is_empty());
//! ```

pub mod error;

use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tally_core::report::{Aggregate, DATA_HEADERS, DataRow, Report, SummaryRow, summary_headers};

pub use error::{Error, Result};

pub const DATA_SHEET: &str = "Data";
pub const SUMMARY_SHEET: &str = "Summary";

/// Longest text a worksheet cell holds, in characters. Longer text is cut to
/// this length, so such cells do not read back verbatim.
pub const MAX_CELL_CHARS: usize = 32_767;

/// MIME type for the download response.
pub const CONTENT_TYPE: &str =
  "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Suggested download name, e.g. `incidents_consolidated_2024-03-01.xlsx`.
pub fn file_name(on: NaiveDate) -> String {
  format!("incidents_consolidated_{}.xlsx", on.format("%Y-%m-%d"))
}

/// Serialise `report` into an in-memory workbook.
pub fn to_bytes(report: &Report) -> Result<Vec<u8>> {
  Ok(build(report)?.save_to_buffer()?)
}

/// Write `report` to `path`. An unwritable target is returned as an error.
pub fn save(report: &Report, path: impl AsRef<Path>) -> Result<()> {
  build(report)?.save(path.as_ref())?;
  Ok(())
}

// ─── Sheets ──────────────────────────────────────────────────────────────────

fn build(report: &Report) -> Result<Workbook> {
  let mut workbook = Workbook::new();
  let header = Format::new().set_bold();

  let data = workbook.add_worksheet();
  data.set_name(DATA_SHEET)?;
  write_headers(data, &DATA_HEADERS, &header)?;
  for (i, row) in report.data.iter().enumerate() {
    write_data_row(data, i as u32 + 1, row)?;
  }
  data.autofit();

  let summary = workbook.add_worksheet();
  summary.set_name(SUMMARY_SHEET)?;
  write_headers(summary, &summary_headers(report.aggregate), &header)?;
  for (i, row) in report.summary.iter().enumerate() {
    write_summary_row(summary, i as u32 + 1, row, report.aggregate)?;
  }
  summary.autofit();

  Ok(workbook)
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<()> {
  for (col, title) in headers.iter().enumerate() {
    sheet.write_string_with_format(0, col as u16, *title, format)?;
  }
  sheet.set_freeze_panes(1, 0)?;
  Ok(())
}

/// `text` cut to at most [`MAX_CELL_CHARS`] characters.
fn clamp(text: &str) -> &str {
  match text.char_indices().nth(MAX_CELL_CHARS) {
    Some((end, _)) => &text[..end],
    None => text,
  }
}

/// Dates and timestamps go in as ISO text so the sheet reads back exactly.
fn write_data_row(sheet: &mut Worksheet, row: u32, r: &DataRow) -> Result<()> {
  sheet.write_number(row, 0, r.id as f64)?;
  sheet.write_string(row, 1, r.date.format("%Y-%m-%d").to_string())?;
  sheet.write_string(row, 2, clamp(&r.plant))?;
  sheet.write_string(row, 3, clamp(&r.incident_type))?;
  sheet.write_string(row, 4, clamp(&r.description))?;
  if let Some(reporter) = r.reporter.as_deref().filter(|s| !s.is_empty()) {
    sheet.write_string(row, 5, clamp(reporter))?;
  }
  sheet.write_string(row, 6, r.recorded_at.to_rfc3339())?;
  Ok(())
}

fn write_summary_row(
  sheet: &mut Worksheet,
  row: u32,
  r: &SummaryRow,
  aggregate: Aggregate,
) -> Result<()> {
  sheet.write_string(row, 0, clamp(&r.plant))?;
  sheet.write_string(row, 1, clamp(&r.incident_type))?;
  sheet.write_number(row, 2, r.count as f64)?;
  if aggregate != Aggregate::Count {
    sheet.write_number(row, 3, r.value as f64)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
  use chrono::{TimeZone, Utc};
  use tally_core::report::Aggregate;

  use super::*;

  fn row(id: i64, plant: &str, ty: &str, reporter: Option<&str>) -> DataRow {
    DataRow {
      id,
      date: NaiveDate::from_ymd_opt(2024, 1, id as u32).unwrap(),
      plant: plant.into(),
      incident_type: ty.into(),
      description: format!("description {id}"),
      reporter: reporter.map(Into::into),
      recorded_at: Utc.with_ymd_and_hms(2024, 1, 9, 8, 15, 0).unwrap(),
    }
  }

  fn sample() -> Report {
    Report::from_rows(
      vec![
        row(1, "PLANTA A", "SAFETY", Some("ana")),
        row(2, "PLANTA A", "SAFETY", None),
        row(3, "PLANTA B", "QUALITY", Some("luis")),
      ],
      Aggregate::Count,
    )
  }

  fn text(cell: &Data) -> String {
    match cell {
      Data::String(s) => s.clone(),
      Data::Float(f) => f.to_string(),
      Data::Int(i) => i.to_string(),
      Data::Empty => String::new(),
      other => other.to_string(),
    }
  }

  fn read_sheet(bytes: Vec<u8>, name: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range(name).unwrap();
    range.rows().map(|r| r.iter().map(text).collect()).collect()
  }

  #[test]
  fn workbook_has_exactly_two_named_sheets() {
    let bytes = to_bytes(&sample()).unwrap();
    let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), [DATA_SHEET, SUMMARY_SHEET]);
  }

  #[test]
  fn data_sheet_reads_back_as_the_rows() {
    let report = sample();
    let rows = read_sheet(to_bytes(&report).unwrap(), DATA_SHEET);

    assert_eq!(rows[0], DATA_HEADERS);
    let expected: Vec<Vec<String>> = report.data.iter().map(|r| r.cells().to_vec()).collect();
    assert_eq!(rows[1..], expected[..]);
  }

  #[test]
  fn summary_sheet_reads_back_as_the_pivot() {
    let rows = read_sheet(to_bytes(&sample()).unwrap(), SUMMARY_SHEET);
    assert_eq!(rows, [
      vec!["Plant", "Type", "Incidents"],
      vec!["PLANTA A", "SAFETY", "2"],
      vec!["PLANTA B", "QUALITY", "1"],
    ]);
  }

  #[test]
  fn reporter_summary_keeps_counts() {
    let report = Report::from_rows(sample().data, Aggregate::DistinctReporters);
    let rows = read_sheet(to_bytes(&report).unwrap(), SUMMARY_SHEET);
    assert_eq!(rows, [
      vec!["Plant", "Type", "Incidents", "Reporters"],
      vec!["PLANTA A", "SAFETY", "2", "1"],
      vec!["PLANTA B", "QUALITY", "1", "1"],
    ]);
  }

  #[test]
  fn overlong_text_is_cut_to_the_cell_limit() {
    let mut long = row(1, "PLANTA A", "SAFETY", Some("ana"));
    long.description = "x".repeat(40_000);
    long.reporter = Some("é".repeat(40_000));
    let report = Report::from_rows(vec![long], Aggregate::Count);

    let rows = read_sheet(to_bytes(&report).unwrap(), DATA_SHEET);
    assert_eq!(rows[1][4].chars().count(), MAX_CELL_CHARS);
    assert_eq!(rows[1][5].chars().count(), MAX_CELL_CHARS);
    assert_eq!(rows[1][2], "PLANTA A");
  }

  #[test]
  fn clamp_keeps_short_text() {
    assert_eq!(clamp("ana"), "ana");
    assert_eq!(clamp(&"y".repeat(MAX_CELL_CHARS)).len(), MAX_CELL_CHARS);
  }

  #[test]
  fn empty_report_still_has_headers() {
    let report = Report::from_rows(Vec::new(), Aggregate::DistinctReporters);
    let bytes = to_bytes(&report).unwrap();
    assert_eq!(read_sheet(bytes.clone(), DATA_SHEET), [DATA_HEADERS]);
    assert_eq!(read_sheet(bytes, SUMMARY_SHEET), [["Plant", "Type", "Incidents", "Reporters"]]);
  }

  #[test]
  fn save_to_missing_directory_is_an_error() {
    let path = std::env::temp_dir()
      .join("tally-xlsx-does-not-exist")
      .join("nested")
      .join("report.xlsx");
    assert!(matches!(save(&sample(), &path), Err(Error::Xlsx(_))));
  }

  #[test]
  fn save_writes_a_readable_file() {
    let path = std::env::temp_dir().join(format!("tally-xlsx-{}.xlsx", std::process::id()));
    save(&sample(), &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(read_sheet(bytes, DATA_SHEET).len(), 4);
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn download_name_carries_the_date() {
    let on = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert_eq!(file_name(on), "incidents_consolidated_2024-03-01.xlsx");
  }
}
