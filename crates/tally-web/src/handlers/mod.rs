pub mod catalogs;
pub mod incidents;
pub mod report;
pub mod settings;

use tally_core::report::DataRow;

/// Table cells for a list of rows, in [`tally_core::report::DATA_HEADERS`]
/// order.
pub(crate) fn table(rows: &[DataRow]) -> Vec<[String; 7]> {
  rows.iter().map(DataRow::cells).collect()
}
