//! Error types for the tally-xlsx writer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Workbook assembly or serialisation failed; file-system failures while
  /// saving surface here too.
  #[error("xlsx error: {0}")]
  Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
