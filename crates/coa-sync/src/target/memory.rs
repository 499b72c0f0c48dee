use super::{CreateAccount, Ledger, TargetSession, TargetSystem};
use crate::Result;
use crate::account::AccountRecord;

/// A target that lives entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    ledger: Ledger,
    sessions_opened: usize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        MemoryTarget {
            ledger: records.into_iter().collect(),
            sessions_opened: 0,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened
    }
}

impl TargetSystem for MemoryTarget {
    fn open_session(&mut self) -> Result<Box<dyn TargetSession + '_>> {
        self.sessions_opened += 1;
        Ok(Box::new(MemorySession {
            ledger: &mut self.ledger,
        }))
    }
}

struct MemorySession<'a> {
    ledger: &'a mut Ledger,
}

impl TargetSession for MemorySession<'_> {
    fn read_all(&mut self) -> Result<Vec<AccountRecord>> {
        Ok(self.ledger.records())
    }

    fn create(&mut self, request: &CreateAccount<'_>) -> Result<String> {
        self.ledger.create(request)
    }

    fn delete(&mut self, target_id: &str) -> Result<()> {
        self.ledger.delete(target_id).map(drop)
    }
}
