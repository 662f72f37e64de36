//! Database operations for card imports
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Card writes are transactional so a page is either fully stored or not at all.

use crate::client::CardRecord;
use crate::error::{ImportError, Result};
use crate::source::SourceType;
use crate::store::{Checkpoint, EntityStore, ProgressStore};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `cards`: Imported cards, one row per (source, upstream id)
/// - `import_progress`: One checkpoint row per source
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cards (
            source_type TEXT NOT NULL,
            external_id TEXT NOT NULL,
            name TEXT NOT NULL,
            set_name TEXT,
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (source_type, external_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cards_name ON cards(name);

        CREATE TABLE IF NOT EXISTS import_progress (
            source_type TEXT PRIMARY KEY,
            last_processed_page INTEGER NOT NULL,
            total_pages_known INTEGER,
            updated_at TEXT NOT NULL
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Upsert cards for one source
///
/// Uses INSERT OR REPLACE so re-imports refresh existing rows.
/// All rows are written in one transaction.
pub fn upsert_cards(
    conn: &mut Connection,
    source: SourceType,
    records: &[CardRecord],
) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let count = upsert_cards_tx(&tx, source, records)?;
    tx.commit()?;
    Ok(count)
}

fn upsert_cards_tx(
    tx: &Transaction<'_>,
    source: SourceType,
    records: &[CardRecord],
) -> DbResult<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO cards
         (source_type, external_id, name, set_name, payload, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
    )?;

    let mut count = 0;
    for record in records {
        stmt.execute(params![
            source.as_str(),
            &record.external_id,
            &record.name,
            &record.set_name,
            record.payload.to_string(),
        ])?;
        count += 1;
    }

    log::debug!("Upserted {} {} cards into database", count, source);
    Ok(count)
}

/// Read the checkpoint for a source, if one was ever written
pub fn read_checkpoint(conn: &Connection, source: SourceType) -> DbResult<Option<Checkpoint>> {
    conn.query_row(
        "SELECT last_processed_page, total_pages_known, updated_at
         FROM import_progress
         WHERE source_type = ?1",
        params![source.as_str()],
        |row| {
            let updated_at: String = row.get(2)?;
            Ok(Checkpoint {
                source_type: source,
                last_processed_page: row.get(0)?,
                total_pages_known: row.get(1)?,
                updated_at: parse_timestamp(&updated_at, 2)?,
            })
        },
    )
    .optional()
}

/// Insert or overwrite the checkpoint for a source
pub fn write_checkpoint(conn: &Connection, checkpoint: &Checkpoint) -> DbResult<()> {
    conn.execute(
        "INSERT INTO import_progress (source_type, last_processed_page, total_pages_known, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(source_type) DO UPDATE SET
             last_processed_page = excluded.last_processed_page,
             total_pages_known = excluded.total_pages_known,
             updated_at = excluded.updated_at",
        params![
            checkpoint.source_type.as_str(),
            checkpoint.last_processed_page,
            checkpoint.total_pages_known,
            checkpoint.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn parse_timestamp(value: &str, column: usize) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Get count of stored cards for a source
pub fn get_card_count(conn: &Connection, source: SourceType) -> DbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE source_type = ?1",
        params![source.as_str()],
        |row| row.get(0),
    )
}

/// SQLite-backed entity and progress store sharing one connection
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    /// Open an in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| ImportError::LockPoisoned)
    }

    pub fn card_count(&self, source: SourceType) -> Result<i64> {
        Ok(get_card_count(&*self.conn()?, source)?)
    }
}

impl EntityStore for SqliteStore {
    fn save_all(&self, source: SourceType, records: &[CardRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        Ok(upsert_cards(&mut conn, source, records)?)
    }
}

impl ProgressStore for SqliteStore {
    fn read(&self, source: SourceType) -> Result<Option<Checkpoint>> {
        Ok(read_checkpoint(&*self.conn()?, source)?)
    }

    fn write(&self, checkpoint: &Checkpoint) -> Result<()> {
        Ok(write_checkpoint(&*self.conn()?, checkpoint)?)
    }
}
