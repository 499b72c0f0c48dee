//! The account record shared by every source and target, and its status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of comparing one account between the external source and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Not compared yet.
    #[default]
    Unknown,
    /// Present on both sides with the same category.
    Unchanged,
    /// Present on both sides, but the category differs.
    Different,
    /// Created in the target during this run (pending while `target_id` is empty).
    Added,
    /// Creation was attempted and the target refused it.
    FailedToAdd,
    /// Present in the target but absent from the external source.
    Missing,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Unknown => "Unknown",
            Status::Unchanged => "Unchanged",
            Status::Different => "Different",
            Status::Added => "Added",
            Status::FailedToAdd => "FailedToAdd",
            Status::Missing => "Missing",
        };
        f.pad(name)
    }
}

/// One entry of a chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountRecord {
    /// Free-form classification such as `Bank`, `Expense` or `Income`.
    pub category: String,
    /// User-assigned account number, unique within the target. May be empty.
    pub number: String,
    /// Business key. Compared trimmed and case-insensitively.
    pub name: String,
    /// Opaque tag carried over from the external source.
    pub external_id: Option<String>,
    /// Identifier assigned by the target system.
    pub target_id: Option<String>,
    pub status: Status,
}

impl AccountRecord {
    pub fn new(
        category: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        AccountRecord {
            category: category.into(),
            number: number.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// The normalized business key, or `None` if the name is blank.
    pub fn key(&self) -> Option<String> {
        name_key(&self.name)
    }

    pub(crate) fn with_status(&self, status: Status) -> Self {
        AccountRecord {
            status,
            ..self.clone()
        }
    }
}

/// Normalizes an account name for matching: trimmed and lowercased.
pub fn name_key(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// The closed set of account types the target system understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    Bank,
    Expense,
    Income,
    OtherAsset,
}

impl AccountKind {
    /// Maps a free-form category onto a target account type, case-insensitively.
    pub fn parse(category: &str) -> Option<AccountKind> {
        match category.trim().to_lowercase().as_str() {
            "bank" => Some(AccountKind::Bank),
            "expense" => Some(AccountKind::Expense),
            "income" => Some(AccountKind::Income),
            "otherasset" | "other asset" => Some(AccountKind::OtherAsset),
            _ => None,
        }
    }

    /// Like [`AccountKind::parse`], falling back to [`AccountKind::OtherAsset`].
    pub fn from_category(category: &str) -> AccountKind {
        Self::parse(category).unwrap_or(AccountKind::OtherAsset)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Bank => "Bank",
            AccountKind::Expense => "Expense",
            AccountKind::Income => "Income",
            AccountKind::OtherAsset => "OtherAsset",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_trims_and_lowercases() {
        assert_eq!(name_key("  Office Rent "), Some("office rent".to_string()));
        assert_eq!(name_key("RENT"), name_key("rent"));
    }

    #[test]
    fn name_key_rejects_blank_names() {
        assert_eq!(name_key(""), None);
        assert_eq!(name_key("   \t"), None);
    }

    #[test]
    fn kind_is_case_insensitive() {
        assert_eq!(AccountKind::parse("BANK"), Some(AccountKind::Bank));
        assert_eq!(AccountKind::parse("expense"), Some(AccountKind::Expense));
        assert_eq!(AccountKind::parse(" Income "), Some(AccountKind::Income));
    }

    #[test]
    fn unknown_kind_falls_back_to_other_asset() {
        assert_eq!(AccountKind::parse("Equity"), None);
        assert_eq!(AccountKind::from_category("Equity"), AccountKind::OtherAsset);
        assert_eq!(AccountKind::from_category(""), AccountKind::OtherAsset);
    }

    #[test]
    fn kind_names_parse_back() {
        for kind in [
            AccountKind::Bank,
            AccountKind::Expense,
            AccountKind::Income,
            AccountKind::OtherAsset,
        ] {
            assert_eq!(AccountKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn new_records_start_unknown() {
        let record = AccountRecord::new("Expense", "100", "Rent").with_external_id("C1");
        assert_eq!(record.status, Status::Unknown);
        assert_eq!(record.external_id.as_deref(), Some("C1"));
        assert_eq!(record.target_id, None);
        assert_eq!(record.key().as_deref(), Some("rent"));
    }
}
