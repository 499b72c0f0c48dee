//! Reading the authoritative chart of accounts.

use crate::account::AccountRecord;
use crate::{Error, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

pub trait SourceReader {
    fn read_all(&self) -> Result<Vec<AccountRecord>>;
}

impl SourceReader for [AccountRecord] {
    fn read_all(&self) -> Result<Vec<AccountRecord>> {
        Ok(self.to_vec())
    }
}

impl SourceReader for Vec<AccountRecord> {
    fn read_all(&self) -> Result<Vec<AccountRecord>> {
        self.as_slice().read_all()
    }
}

/// A CSV export of the company spreadsheet, one account per row.
///
/// Expected headers: `category`, `number`, `name`, `external_id`. `number` and
/// `external_id` may be left out.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

#[derive(Deserialize)]
struct CsvRow {
    #[serde(alias = "type", alias = "account_type")]
    category: String,
    #[serde(default, alias = "account_number")]
    number: String,
    #[serde(alias = "account_name")]
    name: String,
    #[serde(default, alias = "company_id", alias = "description")]
    external_id: Option<String>,
}

impl From<CsvRow> for AccountRecord {
    fn from(row: CsvRow) -> Self {
        AccountRecord {
            category: row.category,
            number: row.number,
            name: row.name,
            external_id: row.external_id.filter(|id| !id.is_empty()),
            ..Default::default()
        }
    }
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceReader for CsvSource {
    fn read_all(&self) -> Result<Vec<AccountRecord>> {
        let file = File::open(&self.path).map_err(|source| Error::SourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        let malformed = |source| Error::MalformedSource {
            path: self.path.clone(),
            source,
        };

        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            records.push(row.map_err(malformed)?.into());
        }

        info!("Read {} account(s) from {}", records.len(), self.path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_source(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("coa-sync-source-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn read_rows() {
        let path = write_source(
            "accounts.csv",
            "category,number,name,external_id
Bank,1000,Checking,COMP001
Expense, 6000 , Office Rent ,
",
        );
        let records = CsvSource::new(path).read_all().unwrap();

        assert_eq!(
            records,
            [
                AccountRecord::new("Bank", "1000", "Checking").with_external_id("COMP001"),
                AccountRecord::new("Expense", "6000", "Office Rent"),
            ]
        );
    }

    #[test]
    fn read_aliased_headers() {
        let path = write_source(
            "aliased.csv",
            "account_type,account_number,account_name,company_id
Income,4000,Sales,COMP002
",
        );
        let records = CsvSource::new(path).read_all().unwrap();

        assert_eq!(
            records,
            [AccountRecord::new("Income", "4000", "Sales").with_external_id("COMP002")]
        );
    }

    #[test]
    fn optional_columns_may_be_missing() {
        let path = write_source("minimal.csv", "category,name\nBank,Petty Cash\n");
        let records = CsvSource::new(path).read_all().unwrap();

        assert_eq!(records, [AccountRecord::new("Bank", "", "Petty Cash")]);
    }

    #[test]
    fn empty_names_are_kept_for_the_reconciler() {
        let path = write_source("blank.csv", "category,number,name\nBank,1000,\n");
        let records = CsvSource::new(path).read_all().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), None);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let path = std::env::temp_dir().join("coa-sync-does-not-exist.csv");
        let error = CsvSource::new(path).read_all().unwrap_err();

        assert!(matches!(error, Error::SourceUnavailable { .. }), "{error}");
    }

    #[test]
    fn missing_name_column_is_malformed() {
        let path = write_source("no-name.csv", "category,number\nBank,1000\n");
        let error = CsvSource::new(path).read_all().unwrap_err();

        assert!(matches!(error, Error::MalformedSource { .. }), "{error}");
    }
}
