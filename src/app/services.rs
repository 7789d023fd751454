use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::query::Predicate;
use crate::domain::state::{HistoryEntry, StateEntry, WriteSet};

// Simple keys never start with U+0000.
const SIMPLE_KEY_SPACE_START: &[u8] = &[0x01];
// 0xFF never occurs in UTF-8.
const KEY_SPACE_END: &[u8] = &[0xFF];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error("database operation failed: {0}")]
    Database(#[from] DbError),
}

/// Scans hold one cursor open while visiting and release it before returning.
pub trait LedgerStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Simple keys in `[start, end)`; an empty bound is open-ended. Composite
    /// keys are never visited.
    fn scan_range(
        &self,
        start: &str,
        end: &str,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), StoreError>;

    fn scan_composite_range(
        &self,
        start: &str,
        end: &str,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), StoreError>;

    /// Oldest first.
    fn scan_history(
        &self,
        key: &str,
        visit: &mut dyn FnMut(HistoryEntry),
    ) -> Result<(), StoreError>;

    fn query(
        &self,
        predicate: &Predicate,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), StoreError>;

    fn commit(&self, write_set: &WriteSet) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDiagnostics {
    pub schema_version: u32,
    pub states_count: i64,
    pub history_count: i64,
}

#[derive(Clone)]
pub struct SqliteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    pub fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
        self.with_connection(|connection| {
            Ok(StoreDiagnostics {
                schema_version: db::schema_version(connection)?,
                states_count: db::count_states(connection)?,
                history_count: db::count_history_entries(connection)?,
            })
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, StoreError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::DbLockPoisoned)?;
        op(&connection).map_err(StoreError::from)
    }

    fn with_connection_mut<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, DbError>,
    ) -> Result<T, StoreError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::DbLockPoisoned)?;
        op(&mut connection).map_err(StoreError::from)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_connection(|connection| db::get_state(connection, key))
    }

    fn scan_range(
        &self,
        start: &str,
        end: &str,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), StoreError> {
        let start = if start.is_empty() {
            SIMPLE_KEY_SPACE_START
        } else {
            start.as_bytes()
        };
        let end = if end.is_empty() {
            KEY_SPACE_END
        } else {
            end.as_bytes()
        };

        self.with_connection(|connection| db::for_each_state_in_range(connection, start, end, visit))
    }

    fn scan_composite_range(
        &self,
        start: &str,
        end: &str,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            db::for_each_state_in_range(connection, start.as_bytes(), end.as_bytes(), visit)
        })
    }

    fn scan_history(
        &self,
        key: &str,
        visit: &mut dyn FnMut(HistoryEntry),
    ) -> Result<(), StoreError> {
        self.with_connection(|connection| db::for_each_history_entry(connection, key, visit))
    }

    fn query(
        &self,
        predicate: &Predicate,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), StoreError> {
        self.with_connection(|connection| db::for_each_query_match(connection, predicate, visit))
    }

    fn commit(&self, write_set: &WriteSet) -> Result<(), StoreError> {
        self.with_connection_mut(|connection| db::commit_write_set(connection, write_set))
    }
}
