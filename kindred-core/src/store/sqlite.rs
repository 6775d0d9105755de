//! SQLite-backed memory store.
//!
//! One row per memory. The record itself is JSON inside a BLOB so the schema
//! stays stable as variants evolve; the columns next to it exist only for
//! filtering:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS memories (
//!     id              TEXT PRIMARY KEY,
//!     memory_type     TEXT NOT NULL,
//!     location        TEXT,
//!     primary_emotion TEXT,
//!     significance    REAL NOT NULL,
//!     data            BLOB NOT NULL,
//!     embedding       BLOB NOT NULL,
//!     updated_at      TEXT NOT NULL,
//!     checksum        TEXT
//! );
//! ```
//!
//! - WAL mode for concurrent readers.
//! - Optional CRC-32 of the JSON detects corruption (logged, not fatal).
//! - Metadata updates run in one transaction under the connection mutex.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::embedding::{EmbeddingProvider, cosine_similarity};
use crate::error::Result;
use crate::memory::{MemoryRecord, MemoryType};
use crate::store::{MemoryHit, MemoryStore, MemoryUpdate, rank_hits};
use crate::types::{Embedding, Emotion, MemoryId};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS memories (
        id              TEXT PRIMARY KEY,
        memory_type     TEXT NOT NULL,
        location        TEXT,
        primary_emotion TEXT,
        significance    REAL NOT NULL,
        data            BLOB NOT NULL,
        embedding       BLOB NOT NULL,
        updated_at      TEXT NOT NULL,
        checksum        TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);
    CREATE INDEX IF NOT EXISTS idx_memories_location ON memories(location);
    CREATE INDEX IF NOT EXISTS idx_memories_emotion ON memories(primary_emotion);";

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

fn embedding_to_bytes(e: &Embedding) -> Vec<u8> {
    e.0.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn embedding_from_bytes(bytes: &[u8]) -> Embedding {
    Embedding(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// SqliteMemoryStore
// ---------------------------------------------------------------------------

/// A [`MemoryStore`] persisted in an SQLite database.
pub struct SqliteMemoryStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMemoryStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

type RawRow = (Vec<u8>, Vec<u8>, Option<String>);

impl SqliteMemoryStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: &PersistenceConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Memory store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::Database`] on SQLite failures.
    pub fn open_in_memory(
        config: &PersistenceConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;
        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Memory store backup completed"
        );
        Ok(())
    }

    /// Run `PRAGMA integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    fn checksum(&self, json: &[u8]) -> Option<String> {
        self.config.checksum_enabled.then(|| crc32_hex(json))
    }

    fn decode(&self, data: &[u8], stored_checksum: Option<&str>) -> Result<MemoryRecord> {
        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(data);
                if expected != actual {
                    warn!(
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, memory row may be corrupt"
                    );
                }
            }
        }
        Ok(serde_json::from_slice(data)?)
    }

    /// Decode a row read in bulk; an unreadable row is logged and dropped so
    /// the rest of the result survives.
    fn decode_or_skip(&self, data: &[u8], stored_checksum: Option<&str>) -> Option<MemoryRecord> {
        match self.decode(data, stored_checksum) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable memory row");
                None
            }
        }
    }

    fn write_row(conn: &Connection, record: &MemoryRecord, json: &[u8], embedding: &[u8], checksum: Option<String>) -> Result<()> {
        conn.execute(
            "INSERT INTO memories
                (id, memory_type, location, primary_emotion, significance, data, embedding, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                memory_type = excluded.memory_type,
                location = excluded.location,
                primary_emotion = excluded.primary_emotion,
                significance = excluded.significance,
                data = excluded.data,
                embedding = excluded.embedding,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![
                record.id.to_string(),
                record.memory_type().as_str(),
                record.location,
                record.primary_emotion.map(Emotion::as_str),
                f64::from(record.significance()),
                json,
                embedding,
                Utc::now().to_rfc3339(),
                checksum,
            ],
        )?;
        Ok(())
    }

    /// Rank the rows matched by `sql` (which must select data, embedding,
    /// checksum) against `text`.
    fn query_rows(
        &self,
        text: &str,
        k: usize,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<MemoryHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let query = self.embedder.embed(text)?;
        let rows: Vec<RawRow> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare_cached(sql)?;
            let mapped = stmt.query_map(args, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
            mapped.collect::<std::result::Result<_, _>>()?
        };

        let mut hits = Vec::with_capacity(rows.len());
        for (data, embedding, checksum) in rows {
            let Some(record) = self.decode_or_skip(&data, checksum.as_deref()) else {
                continue;
            };
            let similarity = cosine_similarity(&query, &embedding_from_bytes(&embedding));
            hits.push(MemoryHit { record, similarity });
        }
        let candidates = hits.len();
        let ranked = rank_hits(hits, k);
        debug!(
            candidates,
            returned = ranked.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Ranked memory rows"
        );
        Ok(ranked)
    }
}

impl MemoryStore for SqliteMemoryStore {
    fn store(&self, record: &MemoryRecord) -> Result<()> {
        let start = Instant::now();
        let json = serde_json::to_vec(record)?;
        let embedding = embedding_to_bytes(&self.embedder.embed(&record.content)?);
        let checksum = self.checksum(&json);
        Self::write_row(&self.conn.lock(), record, &json, &embedding, checksum)?;
        debug!(
            memory = %record.id,
            memory_type = %record.memory_type(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Stored memory"
        );
        Ok(())
    }

    fn get(&self, id: MemoryId, memory_type: MemoryType) -> Result<Option<MemoryRecord>> {
        let row: Option<(Vec<u8>, Option<String>)> = self
            .conn
            .lock()
            .query_row(
                "SELECT data, checksum FROM memories WHERE id = ?1 AND memory_type = ?2",
                params![id.to_string(), memory_type.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(data, checksum)| self.decode(&data, checksum.as_deref()))
            .transpose()
    }

    fn query_similar(
        &self,
        text: &str,
        memory_type: Option<MemoryType>,
        k: usize,
        min_significance: f32,
    ) -> Result<Vec<MemoryHit>> {
        let type_filter = memory_type.map(MemoryType::as_str);
        let min = f64::from(min_significance);
        self.query_rows(
            text,
            k,
            "SELECT data, embedding, checksum FROM memories
             WHERE (?1 IS NULL OR memory_type = ?1) AND significance >= ?2",
            &[&type_filter, &min],
        )
    }

    fn query_by_location(&self, location: &str, k: usize) -> Result<Vec<MemoryHit>> {
        self.query_rows(
            location,
            k,
            "SELECT data, embedding, checksum FROM memories WHERE location = ?1",
            &[&location],
        )
    }

    fn query_by_emotion(&self, emotion: Emotion, k: usize) -> Result<Vec<MemoryHit>> {
        let name = emotion.as_str();
        self.query_rows(
            name,
            k,
            "SELECT data, embedding, checksum FROM memories WHERE primary_emotion = ?1",
            &[&name],
        )
    }

    fn update_metadata(
        &self,
        id: MemoryId,
        memory_type: MemoryType,
        updates: &[MemoryUpdate],
    ) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let row: Option<(Vec<u8>, Option<String>)> = tx
            .query_row(
                "SELECT data, checksum FROM memories WHERE id = ?1 AND memory_type = ?2",
                params![id.to_string(), memory_type.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((data, checksum)) = row else {
            return Ok(false);
        };

        let mut record = self.decode(&data, checksum.as_deref())?;
        for update in updates {
            update.apply(&mut record);
        }
        let json = serde_json::to_vec(&record)?;
        tx.execute(
            "UPDATE memories SET data = ?1, updated_at = ?2, checksum = ?3 WHERE id = ?4",
            params![json, Utc::now().to_rfc3339(), self.checksum(&json), id.to_string()],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn delete(&self, id: MemoryId, memory_type: MemoryType) -> Result<bool> {
        let deleted = self.conn.lock().execute(
            "DELETE FROM memories WHERE id = ?1 AND memory_type = ?2",
            params![id.to_string(), memory_type.as_str()],
        )?;
        Ok(deleted > 0)
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn count(&self, memory_type: Option<MemoryType>) -> Result<usize> {
        let type_filter = memory_type.map(MemoryType::as_str);
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM memories WHERE (?1 IS NULL OR memory_type = ?1)",
            params![type_filter],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    fn all(&self, memory_type: Option<MemoryType>) -> Result<Vec<MemoryRecord>> {
        let type_filter = memory_type.map(MemoryType::as_str);
        let rows: Vec<(Vec<u8>, Option<String>)> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare_cached(
                "SELECT data, checksum FROM memories WHERE (?1 IS NULL OR memory_type = ?1)",
            )?;
            let mapped = stmt.query_map(params![type_filter], |row| Ok((row.get(0)?, row.get(1)?)))?;
            mapped.collect::<std::result::Result<_, _>>()?
        };
        let mut records: Vec<MemoryRecord> = rows
            .iter()
            .filter_map(|(data, checksum)| self.decode_or_skip(data, checksum.as_deref()))
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn clear(&self) -> Result<()> {
        self.conn.lock().execute("DELETE FROM memories", [])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
