pub mod account;
mod error;
pub mod reconcile;
mod sorting;
pub mod source;
pub mod target;
pub mod writer;

pub use account::{AccountKind, AccountRecord, Status};
pub use error::{Error, Result};

use source::{CsvSource, SourceReader};
use std::path::Path;

/// Read all account records from the given CSV export.
pub fn read_accounts(file: impl AsRef<Path>) -> Result<Vec<AccountRecord>> {
    CsvSource::new(file.as_ref()).read_all()
}
