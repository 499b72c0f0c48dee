use crate::account::{AccountRecord, Status};

/// Whether two records describe the same account.
pub fn same_account(external: &AccountRecord, target: &AccountRecord) -> bool {
    // number can be anything
    // external id can be anything
    match (external.key(), target.key()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Classifies an external record against the target record it matched with [`same_account`].
pub fn matched_status(external: &AccountRecord, target: &AccountRecord) -> Status {
    // category is the only field compared, case-sensitively
    if external.category == target.category {
        Status::Unchanged
    } else {
        Status::Different
    }
}

#[cfg(test)]
mod tests {
    use crate::account::{AccountRecord, Status};
    use crate::reconcile::matching::{matched_status, same_account};

    #[test]
    fn match_simple() {
        let external = AccountRecord::new("Expense", "100", "Rent");
        let target = AccountRecord::new("Expense", "100", "Rent").with_target_id("80000001");

        assert!(same_account(&external, &target));
        assert_eq!(matched_status(&external, &target), Status::Unchanged);
    }

    #[test]
    fn match_ignores_case_and_whitespace() {
        let external = AccountRecord::new("Expense", "100", "  office RENT ");
        let target = AccountRecord::new("Expense", "100", "Office Rent");

        assert!(same_account(&external, &target));
        assert_eq!(matched_status(&external, &target), Status::Unchanged);
    }

    #[test]
    fn match_ignores_numbers() {
        let external = AccountRecord::new("Expense", "100", "Rent");
        let target = AccountRecord::new("Expense", "999", "Rent");

        assert!(same_account(&external, &target));
        assert_eq!(matched_status(&external, &target), Status::Unchanged);
    }

    #[test]
    fn match_ignores_external_ids() {
        let external = AccountRecord::new("Bank", "1000", "Checking").with_external_id("COMP001");
        let target = AccountRecord::new("Bank", "1000", "Checking").with_external_id("COMP002");

        assert!(same_account(&external, &target));
        assert_eq!(matched_status(&external, &target), Status::Unchanged);
    }

    #[test]
    fn different_category() {
        let external = AccountRecord::new("Income", "100", "Rent");
        let target = AccountRecord::new("Expense", "100", "Rent");

        assert!(same_account(&external, &target));
        assert_eq!(matched_status(&external, &target), Status::Different);
    }

    #[test]
    fn category_comparison_is_case_sensitive() {
        let external = AccountRecord::new("expense", "100", "Rent");
        let target = AccountRecord::new("Expense", "100", "Rent");

        assert_eq!(matched_status(&external, &target), Status::Different);
    }

    #[test]
    fn dont_match_different_name() {
        let external = AccountRecord::new("Expense", "100", "Rent");
        let target = AccountRecord::new("Expense", "100", "Rent Deposit");

        assert!(!same_account(&external, &target));
    }

    #[test]
    fn dont_match_empty_name() {
        let external = AccountRecord::new("Expense", "100", "");
        let target = AccountRecord::new("Expense", "100", "");

        assert!(!same_account(&external, &target));
    }

    #[test]
    fn dont_match_blank_name() {
        let external = AccountRecord::new("Expense", "100", "   ");
        let target = AccountRecord::new("Expense", "100", "");

        assert!(!same_account(&external, &target));
    }
}
