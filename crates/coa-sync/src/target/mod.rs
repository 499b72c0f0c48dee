//! Accounting systems that accounts are synchronized into.
//!
//! A target is only reachable through a [`TargetSession`], and a target hands
//! out at most one session at a time.

mod file;
mod memory;

pub use file::LedgerFile;
pub use memory::MemoryTarget;

use crate::account::{AccountKind, AccountRecord, name_key};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

const ID_BASE: u32 = 0x8000_0000;

/// A request to create one account in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateAccount<'a> {
    pub name: &'a str,
    pub kind: AccountKind,
    pub number: &'a str,
    /// Stored verbatim. Carries the external id of the source record.
    pub description: Option<&'a str>,
}

pub trait TargetSession {
    /// All accounts currently in the target, with `target_id` set.
    fn read_all(&mut self) -> Result<Vec<AccountRecord>>;

    /// Creates an account and returns the identifier the target assigned to it.
    fn create(&mut self, request: &CreateAccount<'_>) -> Result<String>;

    fn delete(&mut self, target_id: &str) -> Result<()>;
}

pub trait TargetSystem {
    /// Opens the session. It stays open until the returned value is dropped.
    fn open_session(&mut self) -> Result<Box<dyn TargetSession + '_>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAccount {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&StoredAccount> for AccountRecord {
    fn from(account: &StoredAccount) -> Self {
        AccountRecord {
            category: account.kind.to_string(),
            number: account.number.clone(),
            name: account.name.clone(),
            external_id: account.description.clone(),
            target_id: Some(account.id.clone()),
            ..Default::default()
        }
    }
}

/// Account storage behind the bundled targets.
///
/// Enforces the rules a real accounting system applies on create: names are
/// unique ignoring case, and non-empty account numbers are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    next_id: u32,
    #[serde(default, rename = "account")]
    accounts: Vec<StoredAccount>,
}

impl Ledger {
    pub fn accounts(&self) -> &[StoredAccount] {
        &self.accounts
    }

    pub fn find(&self, target_id: &str) -> Option<&StoredAccount> {
        self.accounts.iter().find(|account| account.id == target_id)
    }

    pub fn records(&self) -> Vec<AccountRecord> {
        self.accounts.iter().map(AccountRecord::from).collect()
    }

    /// Next free list id, past both the counter and every id already stored.
    /// `None` once the `80000001..=FFFFFFFF` range is used up.
    fn allocate_id(&mut self) -> Option<String> {
        let highest = self
            .accounts
            .iter()
            .filter(|account| account.id.len() == 8)
            .filter_map(|account| u32::from_str_radix(&account.id, 16).ok())
            .filter_map(|id| id.checked_sub(ID_BASE))
            .max()
            .unwrap_or(0);
        let next = self
            .next_id
            .max(highest)
            .checked_add(1)
            .filter(|next| *next < ID_BASE)?;
        self.next_id = next;
        Some(format!("{:08X}", ID_BASE + next))
    }

    pub fn create(&mut self, request: &CreateAccount<'_>) -> Result<String> {
        let rejected = |reason: String| Error::WriteRejected {
            name: request.name.to_string(),
            reason,
        };

        let Some(key) = name_key(request.name) else {
            return Err(rejected("account name is empty".to_string()));
        };
        let name = request.name.trim();
        if self
            .accounts
            .iter()
            .any(|account| name_key(&account.name).as_ref() == Some(&key))
        {
            return Err(rejected(format!("the name '{name}' is already in use")));
        }
        if !request.number.is_empty()
            && self
                .accounts
                .iter()
                .any(|account| account.number == request.number)
        {
            return Err(rejected(format!(
                "the account number '{}' is already in use",
                request.number
            )));
        }

        let Some(id) = self.allocate_id() else {
            return Err(rejected("no account ids left".to_string()));
        };
        self.accounts.push(StoredAccount {
            id: id.clone(),
            name: name.to_string(),
            kind: request.kind,
            number: request.number.to_string(),
            description: request.description.map(ToOwned::to_owned),
        });
        Ok(id)
    }

    pub fn delete(&mut self, target_id: &str) -> Result<StoredAccount> {
        let position = self
            .accounts
            .iter()
            .position(|account| account.id == target_id)
            .ok_or_else(|| Error::AmbiguousResponse {
                name: target_id.to_string(),
                reason: "no account has this id".to_string(),
            })?;
        Ok(self.accounts.remove(position))
    }
}

/// Seeds a ledger as-is. Records keep their `target_id` when they have one,
/// the rest get ids that none of them uses.
impl FromIterator<AccountRecord> for Ledger {
    fn from_iter<T: IntoIterator<Item = AccountRecord>>(iter: T) -> Self {
        let records: Vec<AccountRecord> = iter.into_iter().collect();

        // explicit ids first, so allocation starts past them
        let mut ledger = Ledger {
            accounts: records
                .iter()
                .filter_map(|record| Some(stored(record.target_id.clone()?, record.clone())))
                .collect(),
            ..Default::default()
        };

        let mut accounts = Vec::with_capacity(records.len());
        for record in records {
            let id = match record.target_id.clone().or_else(|| ledger.allocate_id()) {
                Some(id) => id,
                None => {
                    warn!("No account id left for {}, not seeding it.", record.name);
                    continue;
                }
            };
            accounts.push(stored(id, record));
        }
        ledger.accounts = accounts;
        ledger
    }
}

fn stored(id: String, record: AccountRecord) -> StoredAccount {
    StoredAccount {
        id,
        name: record.name,
        kind: AccountKind::from_category(&record.category),
        number: record.number,
        description: record.external_id,
    }
}
