use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use thiserror::Error;

use crate::domain::query::Predicate;
use crate::domain::state::{HistoryEntry, StateEntry, WriteSet};
use crate::domain::timestamp::TxTimestamp;

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS world_state (
    key BLOB PRIMARY KEY,
    value BLOB NOT NULL,
    tx_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS key_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    key BLOB NOT NULL,
    tx_id TEXT NOT NULL,
    value BLOB NOT NULL,
    committed_seconds INTEGER NOT NULL,
    committed_nanos INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_key_history_key_seq
ON key_history (key, seq);
"#,
)];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("stored key is not valid UTF-8: {0}")]
    CorruptKey(#[from] std::string::FromUtf8Error),
    #[error("stored record is not valid JSON: {0}")]
    CorruptRecord(#[from] serde_json::Error),
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::from)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

pub fn get_state(connection: &Connection, key: &str) -> Result<Option<Vec<u8>>, DbError> {
    let value = connection
        .query_row(
            "SELECT value FROM world_state WHERE key = ?1",
            params![key.as_bytes()],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value)
}

/// Applies every write of the set to the world state and appends it to the
/// key history, inside one SQLite transaction.
pub fn commit_write_set(connection: &mut Connection, write_set: &WriteSet) -> Result<(), DbError> {
    let transaction = connection.transaction()?;

    {
        let mut upsert = transaction.prepare(
            "INSERT INTO world_state (key, value, tx_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, tx_id = excluded.tx_id",
        )?;
        let mut append_history = transaction.prepare(
            "INSERT INTO key_history (key, tx_id, value, committed_seconds, committed_nanos)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for write in &write_set.writes {
            upsert.execute(params![write.key.as_bytes(), write.value, write_set.tx_id])?;
            append_history.execute(params![
                write.key.as_bytes(),
                write_set.tx_id,
                write.value,
                write_set.timestamp.seconds,
                write_set.timestamp.nanos,
            ])?;
        }
    }

    transaction.commit()?;

    Ok(())
}

/// Visits every state whose raw key lies in `[start, end)`, in key order.
pub fn for_each_state_in_range(
    connection: &Connection,
    start: &[u8],
    end: &[u8],
    visit: &mut dyn FnMut(StateEntry),
) -> Result<(), DbError> {
    let mut statement = connection.prepare(
        "SELECT key, value FROM world_state
         WHERE key >= ?1 AND key < ?2
         ORDER BY key",
    )?;

    let mut rows = statement.query(params![start, end])?;
    while let Some(row) = rows.next()? {
        let key: Vec<u8> = row.get(0)?;
        visit(StateEntry {
            key: String::from_utf8(key)?,
            value: row.get(1)?,
        });
    }

    Ok(())
}

/// Visits the committed modifications of one key, oldest first.
pub fn for_each_history_entry(
    connection: &Connection,
    key: &str,
    visit: &mut dyn FnMut(HistoryEntry),
) -> Result<(), DbError> {
    let mut statement = connection.prepare(
        "SELECT tx_id, value, committed_seconds, committed_nanos
         FROM key_history
         WHERE key = ?1
         ORDER BY seq ASC",
    )?;

    let mut rows = statement.query(params![key.as_bytes()])?;
    while let Some(row) = rows.next()? {
        visit(HistoryEntry {
            tx_id: row.get(0)?,
            value: row.get(1)?,
            timestamp: TxTimestamp::new(row.get(2)?, row.get(3)?),
        });
    }

    Ok(())
}

/// Visits every state record matching the predicate's selector, projected
/// to its field list, in key order.
pub fn for_each_query_match(
    connection: &Connection,
    predicate: &Predicate,
    visit: &mut dyn FnMut(StateEntry),
) -> Result<(), DbError> {
    let selector = predicate.selector();
    let mut conditions = Vec::with_capacity(selector.len());
    let mut bindings = Vec::with_capacity(selector.len() * 2);

    for (field, value) in selector {
        let path_index = bindings.len() + 1;
        conditions.push(format!(
            "CASE WHEN json_valid(CAST(value AS TEXT)) \
             THEN json_extract(CAST(value AS TEXT), ?{path_index}) END = ?{}",
            path_index + 1
        ));
        bindings.push(format!("$.{field}"));
        bindings.push(value.to_string());
    }

    let sql = format!(
        "SELECT key, value FROM world_state WHERE {} ORDER BY key",
        conditions.join(" AND ")
    );
    let mut statement = connection.prepare(&sql)?;

    let mut rows = statement.query(params_from_iter(bindings.iter()))?;
    while let Some(row) = rows.next()? {
        let key: Vec<u8> = row.get(0)?;
        let value: Vec<u8> = row.get(1)?;

        let value = if predicate.projection.is_empty() {
            value
        } else {
            let record: serde_json::Value = serde_json::from_slice(&value)?;
            serde_json::to_vec(&predicate.project(record))?
        };

        visit(StateEntry {
            key: String::from_utf8(key)?,
            value,
        });
    }

    Ok(())
}

pub fn count_states(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM world_state", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_history_entries(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM key_history", [], |row| row.get(0))?;
    Ok(count)
}
