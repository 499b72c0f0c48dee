use crate::account::{AccountRecord, Status};

/// Orders records for reporting: the ones that need attention first, then by name.
pub fn sort_for_report(records: &mut [&AccountRecord]) {
    records.sort_by_cached_key(|record| (status_order(record.status), record.key()));
}

fn status_order(status: Status) -> u8 {
    match status {
        Status::FailedToAdd => 0,
        Status::Different => 1,
        Status::Missing => 2,
        Status::Added => 3,
        Status::Unknown => 4,
        Status::Unchanged => 5,
    }
}
