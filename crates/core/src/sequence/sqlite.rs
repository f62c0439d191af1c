//! SQLite-backed daily counter store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode};

use super::{ClaimResult, CounterError, CounterStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed counter store.
pub struct SqliteCounterStore {
    conn: Mutex<Connection>,
}

impl SqliteCounterStore {
    /// Create a new SQLite counter store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, CounterError> {
        let conn = Connection::open(path).map_err(|e| CounterError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| CounterError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite counter store (useful for testing).
    pub fn in_memory() -> Result<Self, CounterError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CounterError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CounterError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS daily_counters (
                office_id TEXT NOT NULL,
                date TEXT NOT NULL,
                last_number INTEGER NOT NULL,
                PRIMARY KEY (office_id, date)
            );
            "#,
        )
        .map_err(|e| CounterError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CounterError> {
        self.conn
            .lock()
            .map_err(|_| CounterError::Database("connection lock poisoned".to_string()))
    }
}

impl CounterStore for SqliteCounterStore {
    fn get(&self, office_id: &str, date: NaiveDate) -> Result<Option<u32>, CounterError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT last_number FROM daily_counters WHERE office_id = ? AND date = ?",
            params![office_id, date.format(DATE_FORMAT).to_string()],
            |row| row.get::<_, u32>(0),
        );

        match result {
            Ok(last) => Ok(Some(last)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CounterError::Database(e.to_string())),
        }
    }

    fn try_create(
        &self,
        office_id: &str,
        date: NaiveDate,
        first: u32,
    ) -> Result<ClaimResult, CounterError> {
        let conn = self.lock()?;

        let result = conn.execute(
            "INSERT INTO daily_counters (office_id, date, last_number) VALUES (?, ?, ?)",
            params![office_id, date.format(DATE_FORMAT).to_string(), first],
        );

        match result {
            Ok(_) => Ok(ClaimResult::Committed),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(ClaimResult::Conflict)
            }
            Err(e) => Err(CounterError::Database(e.to_string())),
        }
    }

    fn compare_and_set(
        &self,
        office_id: &str,
        date: NaiveDate,
        expected: u32,
        next: u32,
    ) -> Result<ClaimResult, CounterError> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE daily_counters SET last_number = ? WHERE office_id = ? AND date = ? AND last_number = ?",
                params![next, office_id, date.format(DATE_FORMAT).to_string(), expected],
            )
            .map_err(|e| CounterError::Database(e.to_string()))?;

        Ok(if updated == 1 {
            ClaimResult::Committed
        } else {
            ClaimResult::Conflict
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store() -> SqliteCounterStore {
        SqliteCounterStore::in_memory().unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_missing_row_reads_none() {
        let store = create_test_store();
        assert_eq!(store.get("office-1", day()).unwrap(), None);
    }

    #[test]
    fn test_create_then_conflict_on_duplicate() {
        let store = create_test_store();
        assert_eq!(
            store.try_create("office-1", day(), 1).unwrap(),
            ClaimResult::Committed
        );
        assert_eq!(
            store.try_create("office-1", day(), 1).unwrap(),
            ClaimResult::Conflict
        );
        assert_eq!(store.get("office-1", day()).unwrap(), Some(1));
    }

    #[test]
    fn test_compare_and_set_rejects_stale_expected() {
        let store = create_test_store();
        store.try_create("office-1", day(), 1).unwrap();

        assert_eq!(
            store.compare_and_set("office-1", day(), 1, 2).unwrap(),
            ClaimResult::Committed
        );
        // Stale read: someone else already moved it to 2.
        assert_eq!(
            store.compare_and_set("office-1", day(), 1, 2).unwrap(),
            ClaimResult::Conflict
        );
        assert_eq!(store.get("office-1", day()).unwrap(), Some(2));
    }

    #[test]
    fn test_keys_are_independent() {
        let store = create_test_store();
        let next_day = day().succ_opt().unwrap();

        store.try_create("office-1", day(), 1).unwrap();
        assert_eq!(
            store.try_create("office-2", day(), 1).unwrap(),
            ClaimResult::Committed
        );
        assert_eq!(
            store.try_create("office-1", next_day, 1).unwrap(),
            ClaimResult::Committed
        );
    }

    #[test]
    fn test_counter_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.db");

        {
            let store = SqliteCounterStore::new(&path).unwrap();
            store.try_create("office-1", day(), 1).unwrap();
            store.compare_and_set("office-1", day(), 1, 2).unwrap();
        }

        let store = SqliteCounterStore::new(&path).unwrap();
        assert_eq!(store.get("office-1", day()).unwrap(), Some(2));
    }
}
