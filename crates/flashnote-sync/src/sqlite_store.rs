//! SQLite-backed canonical note store.
//!
//! One `notes.db` file in WAL mode. Timestamps are stored as fixed-width
//! RFC 3339 text so lexical and chronological order agree.

use chrono::{DateTime, SecondsFormat, Utc};
use flashnote_core::{
    CanonicalRecord, CanonicalStore, RecordFilter, RecordStatus, SourceTag, StoreError,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS notes (
    rowid INTEGER PRIMARY KEY,
    id TEXT UNIQUE NOT NULL,
    text TEXT NOT NULL,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    resurface_count INTEGER NOT NULL DEFAULT 0,
    is_triaged BOOLEAN NOT NULL DEFAULT FALSE,
    audio_ref TEXT
);

CREATE INDEX IF NOT EXISTS idx_notes_created ON notes(created_at);
CREATE INDEX IF NOT EXISTS idx_notes_status ON notes(status, is_triaged);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const SCHEMA_VERSION: &str = "1";

const SELECT_COLUMNS: &str = "SELECT id, text, source, created_at, updated_at, status,
        resurface_count, is_triaged, audio_ref FROM notes";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create notes.db with full schema.
    pub fn open_or_create(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.apply_pragmas()?;
        store.apply_schema()?;
        Ok(store)
    }

    /// Private in-memory database, for tests and dry runs.
    pub fn in_memory() -> anyhow::Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.apply_schema()?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn apply_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .map_err(StoreError::backend)?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // Merge WAL back into main DB so users see a single file when idle.
        let _ = self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
    }
}

impl CanonicalStore for SqliteStore {
    fn commit_batch(&self, records: &[CanonicalRecord]) -> Result<usize, StoreError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(StoreError::backend)?;
        let mut created = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO notes (
                        id, text, source, created_at, updated_at, status,
                        resurface_count, is_triaged, audio_ref
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(StoreError::backend)?;
            for r in records {
                created += stmt
                    .execute(params![
                        r.id.to_string(),
                        r.text,
                        r.source.as_str(),
                        ts_to_sql(&r.created_at),
                        ts_to_sql(&r.updated_at),
                        r.status.as_str(),
                        r.resurface_count,
                        r.is_triaged,
                        r.audio_ref,
                    ])
                    .map_err(StoreError::backend)?;
            }
        }
        // Dropping an uncommitted transaction rolls it back.
        tx.commit().map_err(StoreError::backend)?;
        tracing::debug!(batch = records.len(), created, "committed notes");
        Ok(created)
    }

    fn query(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = filter
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE (?1 IS NULL OR status = ?1) AND (?2 = FALSE OR is_triaged = FALSE)
                 ORDER BY created_at, rowid LIMIT ?3"
            ))
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map(
                params![filter.status.map(|s| s.as_str()), filter.untriaged_only, limit],
                map_row,
            )
            .map_err(StoreError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::backend)?;
        Ok(rows)
    }

    fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>, StoreError> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                map_row,
            )
            .optional()
            .map_err(StoreError::backend)
    }

    fn update(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE notes SET text = ?2, updated_at = ?3, status = ?4,
                    resurface_count = ?5, is_triaged = ?6, audio_ref = ?7
                 WHERE id = ?1",
                params![
                    record.id.to_string(),
                    record.text,
                    ts_to_sql(&record.updated_at),
                    record.status.as_str(),
                    record.resurface_count,
                    record.is_triaged,
                    record.audio_ref,
                ],
            )
            .map_err(StoreError::backend)?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }
}

fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CanonicalRecord> {
    let id: String = row.get(0)?;
    let source: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(CanonicalRecord {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        text: row.get(1)?,
        source: SourceTag::parse_lossy(&source),
        created_at: parse_ts(3, &created_at)?,
        updated_at: parse_ts(4, &updated_at)?,
        status: RecordStatus::parse_lossy(&status),
        resurface_count: row.get(6)?,
        is_triaged: row.get(7)?,
        audio_ref: row.get(8)?,
    })
}
