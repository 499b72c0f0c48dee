//! Reconciling the external chart of accounts against the accounts in the target system.

mod matching;

use crate::Result;
use crate::account::{AccountRecord, Status, name_key};
use crate::source::SourceReader;
use crate::target::TargetSystem;
use crate::writer::{WriteBack, WriteConfig, WriteFailure, Writer};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    External,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The name is empty, so the record cannot be matched.
    EmptyName,
    /// Unmatched by name, but its number is already taken in the target.
    DuplicateNumber,
}

/// A record the classifier did not act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub side: Side,
    pub reason: SkipReason,
    pub record: AccountRecord,
}

/// Classified copies of both inputs, plus the records waiting to be added.
#[derive(Debug, Default)]
pub struct Classification {
    pub external: Vec<AccountRecord>,
    pub target: Vec<AccountRecord>,
    /// External records with a pending `Added` status, in external order.
    pub to_add: Vec<AccountRecord>,
    pub skipped: Vec<Skipped>,
}

/// Assigns a status to every record of both sides.
///
/// Names are the only key. When a side contains the same name twice, the
/// later record wins the lookup.
pub fn classify(external: &[AccountRecord], target: &[AccountRecord]) -> Classification {
    let target_by_name: HashMap<String, &AccountRecord> = target
        .iter()
        .filter_map(|record| Some((record.key()?, record)))
        .collect();
    let external_names: HashSet<String> = external.iter().filter_map(AccountRecord::key).collect();
    let target_numbers: HashSet<&str> = target.iter().map(|record| record.number.as_str()).collect();

    let mut classification = Classification::default();

    for record in external {
        let Some(key) = record.key() else {
            warn!(
                "Name missing for external account with number {}, skipping.",
                record.number
            );
            classification.skip(Side::External, SkipReason::EmptyName, record);
            continue;
        };

        let matched = target_by_name
            .get(&key)
            .filter(|target_record| matching::same_account(record, target_record));
        if let Some(target_record) = matched {
            let status = matching::matched_status(record, target_record);
            info!("Account {} is {}.", record.name, status);
            classification.external.push(record.with_status(status));
        } else if !target_numbers.contains(record.number.as_str()) {
            info!("Account {} is New and will be added.", record.name);
            let pending = record.with_status(Status::Added);
            classification.to_add.push(pending.clone());
            classification.external.push(pending);
        } else {
            warn!(
                "Account number {} for {} already exists in the target, skipping addition.",
                record.number, record.name
            );
            classification.skip(Side::External, SkipReason::DuplicateNumber, record);
            classification.external.push(record.clone());
        }
    }

    for record in target {
        let Some(key) = record.key() else {
            warn!(
                "Name missing for target account with number {}, skipping.",
                record.number
            );
            classification.skip(Side::Target, SkipReason::EmptyName, record);
            continue;
        };

        if external_names.contains(&key) {
            classification.target.push(record.clone());
        } else {
            info!("Account {} is {}.", record.name, Status::Missing);
            classification.target.push(record.with_status(Status::Missing));
        }
    }

    classification
}

impl Classification {
    fn skip(&mut self, side: Side, reason: SkipReason, record: &AccountRecord) {
        self.skipped.push(Skipped {
            side,
            reason,
            record: record.clone(),
        });
    }

    /// Merges both sides by name. External records win over target records,
    /// and written records win over both.
    pub fn merge(self, written: Vec<AccountRecord>) -> Vec<AccountRecord> {
        let mut merged = BTreeMap::new();
        for record in self.target.into_iter().chain(self.external) {
            if let Some(key) = name_key(&record.name) {
                merged.insert(key, record);
            }
        }
        for record in written {
            let Some(key) = name_key(&record.name) else {
                continue;
            };
            if let Some(previous) = merged.get(&key)
                && previous.status == Status::Added
                && let Some(target_id) = &previous.target_id
                && record.status != Status::Added
            {
                warn!(
                    "Account {} was added as {}, but the later row {} with the same name is {}.",
                    previous.name, target_id, record.name, record.status
                );
            }
            merged.insert(key, record);
        }
        merged.into_values().collect()
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Create the accounts classified as new. Without it, a run only reports.
    pub write_back: bool,
    pub write: WriteConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            write_back: true,
            write: WriteConfig::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Every named account of both sides, one per name.
    pub accounts: Vec<AccountRecord>,
    pub skipped: Vec<Skipped>,
    pub failures: Vec<WriteFailure>,
}

impl SyncConfig {
    pub fn new(write: WriteConfig) -> Self {
        SyncConfig {
            write_back: true,
            write,
        }
    }

    pub fn dry_run() -> Self {
        SyncConfig {
            write_back: false,
            ..Default::default()
        }
    }

    /// Reads the source, then reconciles it against the target.
    pub fn run(
        &self,
        source: &dyn SourceReader,
        target: &mut dyn TargetSystem,
    ) -> Result<SyncReport> {
        info!("Reconciliation started.");
        let external = source.read_all()?;
        let report = self.reconcile(&external, target)?;
        info!("Reconciliation completed.");
        Ok(report)
    }

    /// Reads, classifies and writes back within a single target session.
    pub fn reconcile(
        &self,
        external: &[AccountRecord],
        target: &mut dyn TargetSystem,
    ) -> Result<SyncReport> {
        let mut session = target.open_session()?;
        let current = session.read_all()?;

        let mut classification = classify(external, &current);
        let write_back = if self.write_back && !classification.to_add.is_empty() {
            Writer::new(&self.write).add_all(session.as_mut(), &classification.to_add)?
        } else {
            WriteBack::default()
        };
        drop(session);

        let skipped = std::mem::take(&mut classification.skipped);
        Ok(SyncReport {
            accounts: classification.merge(write_back.records),
            skipped,
            failures: write_back.failures,
        })
    }
}

impl SyncReport {
    pub fn get(&self, name: &str) -> Option<&AccountRecord> {
        let key = name_key(name)?;
        self.accounts
            .iter()
            .find(|record| record.key().as_ref() == Some(&key))
    }

    pub fn count(&self, status: Status) -> usize {
        self.accounts
            .iter()
            .filter(|record| record.status == status)
            .count()
    }

    /// Accounts needing attention first, unchanged ones last.
    pub fn accounts_by_status(&self) -> Vec<&AccountRecord> {
        let mut accounts: Vec<_> = self.accounts.iter().collect();
        crate::sorting::sort_for_report(&mut accounts);
        accounts
    }
}
