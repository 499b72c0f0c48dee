use super::{CreateAccount, Ledger, TargetSession, TargetSystem};
use crate::account::AccountRecord;
use crate::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A target backed by a TOML ledger file.
///
/// Opening a session takes `<ledger>.lock`, so only one session can be open
/// on the same ledger, across processes too. Every create and delete rewrites
/// the file.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Reads the ledger without opening a session. A missing file is an empty ledger.
    pub fn load(&self) -> Result<Ledger> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Ledger::default()),
            Err(error) => {
                return Err(Error::TargetUnavailable {
                    reason: format!("cannot read {}: {error}", self.path.display()),
                });
            }
        };
        toml::from_str(&contents).map_err(|source| Error::MalformedTarget {
            path: self.path.clone(),
            source,
        })
    }
}

impl TargetSystem for LedgerFile {
    fn open_session(&mut self) -> Result<Box<dyn TargetSession + '_>> {
        let lock = SessionLock::acquire(self.lock_path())?;
        let ledger = self.load()?;
        info!("Opened session on {}", self.path.display());

        Ok(Box::new(FileSession {
            path: &self.path,
            ledger,
            _lock: lock,
        }))
    }
}

struct SessionLock {
    path: PathBuf,
}

impl SessionLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // read back when the lock is contended
                let _ = writeln!(file, "{}", std::process::id());
                Ok(SessionLock { path })
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .ok()
                    .map(|pid| pid.trim().to_string())
                    .filter(|pid| !pid.is_empty())
                    .map_or_else(|| "another process".to_string(), |pid| format!("process {pid}"));
                Err(Error::TargetUnavailable {
                    reason: format!(
                        "{} is held by {holder}; if that process is no longer running, remove the stale lock file",
                        path.display()
                    ),
                })
            }
            Err(error) => Err(Error::TargetUnavailable {
                reason: format!("cannot create {}: {error}", path.display()),
            }),
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            warn!("Failed to release {}: {}", self.path.display(), error);
        }
    }
}

struct FileSession<'a> {
    path: &'a Path,
    ledger: Ledger,
    _lock: SessionLock,
}

impl FileSession<'_> {
    fn persist(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.ledger)?;
        let staged = self.path.with_extension("tmp");
        fs::write(&staged, contents)?;
        fs::rename(&staged, self.path)?;
        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

impl TargetSession for FileSession<'_> {
    fn read_all(&mut self) -> Result<Vec<AccountRecord>> {
        let records = self.ledger.records();
        for record in &records {
            debug!("Retrieved {} from the target", record.name);
        }
        info!("Read {} account(s) from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn create(&mut self, request: &CreateAccount<'_>) -> Result<String> {
        let id = self.ledger.create(request)?;
        self.persist()?;
        Ok(id)
    }

    fn delete(&mut self, target_id: &str) -> Result<()> {
        let removed = self.ledger.delete(target_id)?;
        self.persist()?;
        info!("Deleted account {} ({})", removed.name, removed.id);
        Ok(())
    }
}
