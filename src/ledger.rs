use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection};

use crate::error::SyncError;

#[cfg(test)]
use mockall::automock;

/// Durable record of which entry ids have already produced a worklog.
///
/// The ledger is the single source of truth for idempotency; JIRA is never
/// queried to detect duplicates.
#[cfg_attr(test, automock)]
pub trait SyncLedger {
    /// Ensures the store and its schema exist. Safe to call on every run.
    fn initialize(&self) -> Result<(), SyncError>;

    fn is_synced(&self, entry_id: i64) -> Result<bool, SyncError>;

    /// Upsert: re-marking an already-synced id refreshes its timestamp.
    fn mark_synced(&self, entry_id: i64) -> Result<(), SyncError>;
}

/// SQLite-backed ledger at a fixed well-known path.
pub struct SqliteLedger {
    conn: Connection,
}

/// Where the ledger lives: `<data dir>/timetrap-jira-sync/ledger.db`.
pub fn default_ledger_path() -> Result<PathBuf, SyncError> {
    let base = dirs::data_dir().or_else(dirs::home_dir).ok_or_else(|| {
        SyncError::LedgerUnavailable("no data or home directory for this user".to_string())
    })?;

    Ok(base.join("timetrap-jira-sync").join("ledger.db"))
}

impl SqliteLedger {
    pub fn open_default() -> Result<Self, SyncError> {
        Self::open(&default_ledger_path()?)
    }

    pub fn open(path: &Path) -> Result<Self, SyncError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|err| SyncError::LedgerUnavailable(err.to_string()))?;
        }
        debug!("Opening sync ledger at {}", path.display());
        let conn = Connection::open(path)
            .map_err(|err| SyncError::LedgerUnavailable(err.to_string()))?;

        Ok(Self { conn })
    }
}

impl SyncLedger for SqliteLedger {
    fn initialize(&self) -> Result<(), SyncError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS synced_entries (
                    entry_id INTEGER PRIMARY KEY,
                    synced_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )
            .map_err(|err| SyncError::LedgerUnavailable(err.to_string()))?;

        Ok(())
    }

    fn is_synced(&self, entry_id: i64) -> Result<bool, SyncError> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM synced_entries WHERE entry_id = ?1)",
                params![entry_id],
                |row| row.get(0),
            )
            .map_err(|err| SyncError::LedgerUnavailable(err.to_string()))
    }

    fn mark_synced(&self, entry_id: i64) -> Result<(), SyncError> {
        self.conn
            .execute(
                "INSERT INTO synced_entries (entry_id, synced_at) VALUES (?1, ?2)
                 ON CONFLICT(entry_id) DO UPDATE SET synced_at = excluded.synced_at",
                params![entry_id, Utc::now().to_rfc3339()],
            )
            .map_err(|err| SyncError::LedgerUnavailable(err.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteLedger;
    use super::SyncLedger;

    fn open_ledger(dir: &tempfile::TempDir) -> SqliteLedger {
        let ledger = SqliteLedger::open(&dir.path().join("ledger.db")).unwrap();
        ledger.initialize().unwrap();
        ledger
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open_ledger(&dir);

        assert!(ledger.initialize().is_ok());
    }

    #[test]
    fn test_mark_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open_ledger(&dir);

        assert!(!ledger.is_synced(42).unwrap());
        ledger.mark_synced(42).unwrap();
        assert!(ledger.is_synced(42).unwrap());
        assert!(!ledger.is_synced(43).unwrap());
    }

    /// Re-marking after a force resync must not hit a uniqueness violation.
    #[test]
    fn test_mark_synced_twice_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open_ledger(&dir);

        ledger.mark_synced(42).unwrap();
        ledger.mark_synced(42).unwrap();

        assert!(ledger.is_synced(42).unwrap());
    }

    /// State persists across a reopen of the same path.
    #[test]
    fn test_ledger_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        {
            let ledger = open_ledger(&dir);
            ledger.mark_synced(7).unwrap();
        }

        let reopened = SqliteLedger::open(&dir.path().join("ledger.db")).unwrap();
        reopened.initialize().unwrap();

        assert!(reopened.is_synced(7).unwrap());
    }
}
