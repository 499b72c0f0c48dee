//! Adding accounts to the target system.

use crate::account::{AccountKind, AccountRecord, Status};
use crate::target::{CreateAccount, TargetSession, TargetSystem};
use crate::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// What to do when the target refuses one account of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Mark the account `FailedToAdd` and continue with the rest of the batch.
    #[default]
    Isolate,
    /// Stop at the first failure and return it.
    Abort,
}

#[derive(Debug, Clone, Default)]
pub struct WriteConfig {
    pub on_error: FailurePolicy,
    /// Refuse categories that have no matching [`AccountKind`] instead of
    /// falling back to [`AccountKind::OtherAsset`].
    pub strict_categories: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub name: String,
    pub reason: String,
}

/// Updated copies of the records handed to [`Writer::add_all`], in the same order.
#[derive(Debug, Default)]
pub struct WriteBack {
    pub records: Vec<AccountRecord>,
    pub failures: Vec<WriteFailure>,
}

impl WriteBack {
    pub fn added(&self) -> impl Iterator<Item = &AccountRecord> {
        self.records
            .iter()
            .filter(|record| record.status == Status::Added)
    }
}

pub struct Writer<'a> {
    config: &'a WriteConfig,
}

impl<'a> Writer<'a> {
    pub fn new(config: &'a WriteConfig) -> Self {
        Writer { config }
    }

    /// Adds `records` within a session of its own, closed once the batch is done.
    pub fn add_accounts(
        &self,
        target: &mut dyn TargetSystem,
        records: &[AccountRecord],
    ) -> Result<WriteBack> {
        let mut session = target.open_session()?;
        self.add_all(session.as_mut(), records)
    }

    /// Creates every record in the target, one request per record, in order.
    pub fn add_all(
        &self,
        session: &mut dyn TargetSession,
        records: &[AccountRecord],
    ) -> Result<WriteBack> {
        info!("Adding {} account(s) to the target.", records.len());

        let mut write_back = WriteBack::default();
        for record in records {
            match self.add_one(session, record) {
                Ok(target_id) => {
                    info!("Account {} is {}.", record.name, Status::Added);
                    let mut added = record.with_status(Status::Added);
                    added.target_id = Some(target_id);
                    write_back.records.push(added);
                }
                Err(error)
                    if error.is_record_level() && self.config.on_error == FailurePolicy::Isolate =>
                {
                    warn!("Account {} is {}: {}", record.name, Status::FailedToAdd, error);
                    write_back.failures.push(WriteFailure {
                        name: record.name.clone(),
                        reason: error.to_string(),
                    });
                    write_back.records.push(record.with_status(Status::FailedToAdd));
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            "Added {} of {} account(s).",
            write_back.added().count(),
            records.len()
        );
        Ok(write_back)
    }

    fn add_one(&self, session: &mut dyn TargetSession, record: &AccountRecord) -> Result<String> {
        let kind = match AccountKind::parse(&record.category) {
            Some(kind) => kind,
            None if self.config.strict_categories => {
                return Err(Error::UnknownCategory {
                    name: record.name.clone(),
                    category: record.category.clone(),
                });
            }
            None => {
                debug!(
                    "Category '{}' of {} maps to {}",
                    record.category,
                    record.name,
                    AccountKind::OtherAsset
                );
                AccountKind::OtherAsset
            }
        };

        let target_id = session.create(&CreateAccount {
            name: &record.name,
            kind,
            number: &record.number,
            description: record.external_id.as_deref(),
        })?;
        if target_id.trim().is_empty() {
            return Err(Error::AmbiguousResponse {
                name: record.name.clone(),
                reason: "the target returned no identifier".to_string(),
            });
        }
        Ok(target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::MemoryTarget;

    fn expense(number: &str, name: &str) -> AccountRecord {
        AccountRecord::new("Expense", number, name).with_status(Status::Added)
    }

    fn statuses(write_back: &WriteBack) -> Vec<(&str, Status)> {
        write_back
            .records
            .iter()
            .map(|record| (record.name.as_str(), record.status))
            .collect()
    }

    /// Accepts every request but never reports an identifier.
    struct SilentSession;

    impl TargetSession for SilentSession {
        fn read_all(&mut self) -> Result<Vec<AccountRecord>> {
            Ok(Vec::new())
        }

        fn create(&mut self, _request: &CreateAccount<'_>) -> Result<String> {
            Ok(String::new())
        }

        fn delete(&mut self, _target_id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn add_assigns_target_ids_in_order() {
        let mut target = MemoryTarget::new();
        let records = [expense("100", "Rent"), expense("200", "Travel")];

        let write_back = Writer::new(&WriteConfig::default())
            .add_accounts(&mut target, &records)
            .unwrap();

        let ids: Vec<_> = write_back
            .records
            .iter()
            .map(|record| record.target_id.as_deref())
            .collect();
        assert_eq!(ids, [Some("80000001"), Some("80000002")]);
        assert_eq!(
            statuses(&write_back),
            [("Rent", Status::Added), ("Travel", Status::Added)]
        );
        assert!(write_back.failures.is_empty());
        assert_eq!(target.sessions_opened(), 1);

        let created: Vec<_> = target
            .ledger()
            .accounts()
            .iter()
            .map(|account| account.name.as_str())
            .collect();
        assert_eq!(created, ["Rent", "Travel"]);
    }

    #[test]
    fn add_does_not_touch_its_input() {
        let mut target = MemoryTarget::new();
        let records = vec![expense("100", "Rent")];

        Writer::new(&WriteConfig::default())
            .add_accounts(&mut target, &records)
            .unwrap();

        assert_eq!(records[0].target_id, None);
    }

    #[test]
    fn add_passes_mapped_kind_and_description() {
        let mut target = MemoryTarget::new();
        let records = [
            AccountRecord::new("bank", "1000", "Checking").with_external_id("COMP001"),
            AccountRecord::new("Equity", "3000", "Owner Draw"),
        ];

        Writer::new(&WriteConfig::default())
            .add_accounts(&mut target, &records)
            .unwrap();

        let accounts = target.ledger().accounts();
        assert_eq!(accounts[0].kind, AccountKind::Bank);
        assert_eq!(accounts[0].description.as_deref(), Some("COMP001"));
        assert_eq!(accounts[1].kind, AccountKind::OtherAsset);
    }

    #[test]
    fn isolate_marks_rejected_records() {
        let mut target = MemoryTarget::new();
        let records = [
            expense("100", "Rent"),
            expense("100", "Travel"),
            expense("300", "Meals"),
        ];

        let write_back = Writer::new(&WriteConfig::default())
            .add_accounts(&mut target, &records)
            .unwrap();

        assert_eq!(
            statuses(&write_back),
            [
                ("Rent", Status::Added),
                ("Travel", Status::FailedToAdd),
                ("Meals", Status::Added),
            ]
        );
        assert_eq!(write_back.records[1].target_id, None);
        assert_eq!(
            write_back.failures,
            [WriteFailure {
                name: "Travel".to_string(),
                reason: "target rejected account 'Travel': the account number '100' is already in use"
                    .to_string(),
            }]
        );
    }

    #[test]
    fn abort_stops_at_the_first_rejection() {
        let mut target = MemoryTarget::new();
        let records = [
            expense("100", "Rent"),
            expense("100", "Travel"),
            expense("300", "Meals"),
        ];
        let config = WriteConfig {
            on_error: FailurePolicy::Abort,
            ..Default::default()
        };

        let error = Writer::new(&config)
            .add_accounts(&mut target, &records)
            .unwrap_err();

        assert!(matches!(error, Error::WriteRejected { ref name, .. } if name == "Travel"));
        assert_eq!(target.ledger().accounts().len(), 1);
    }

    #[test]
    fn strict_categories_refuse_unknown_categories() {
        let mut target = MemoryTarget::new();
        let records = [AccountRecord::new("Equity", "3000", "Owner Draw")];
        let config = WriteConfig {
            strict_categories: true,
            ..Default::default()
        };

        let write_back = Writer::new(&config)
            .add_accounts(&mut target, &records)
            .unwrap();

        assert_eq!(
            statuses(&write_back),
            [("Owner Draw", Status::FailedToAdd)]
        );
        assert!(target.ledger().accounts().is_empty());
    }

    #[test]
    fn missing_identifier_is_ambiguous() {
        let records = [expense("100", "Rent")];
        let config = WriteConfig {
            on_error: FailurePolicy::Abort,
            ..Default::default()
        };

        let error = Writer::new(&config)
            .add_all(&mut SilentSession, &records)
            .unwrap_err();

        assert!(matches!(error, Error::AmbiguousResponse { .. }), "{error}");
    }
}
