//! Note and trash persistence over the board key/value table.
//!
//! # Responsibility
//! - Store the active note list and the trash list as JSON documents.
//! - Move notes to trash with a deletion timestamp and purge expired trash.
//!
//! # Invariants
//! - Malformed stored documents load as empty collections and are logged,
//!   never surfaced as errors.
//! - A malformed trash entry is dropped on load without discarding its
//!   neighbours.
//! - Transport failures (SQLite) are surfaced as `StoreError`.

use crate::db::DbError;
use crate::model::note::{Note, TrashedNote};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key of the active note list.
pub const NOTES_KEY: &str = "foss_kulli_notes";
/// Storage key of the trash list.
pub const TRASH_KEY: &str = "foss_kulli_trash";

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence error for board documents.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Encode(serde_json::Error),
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode board document: {err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "board database is missing table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Persistence collaborator used by the board controller.
pub trait NoteStore {
    /// Loads active notes in insertion order.
    fn load_notes(&self) -> StoreResult<Vec<Note>>;
    /// Replaces the persisted active note list.
    fn save_notes(&self, notes: &[Note]) -> StoreResult<()>;
    /// Loads trash entries in deletion order.
    fn load_trash(&self) -> StoreResult<Vec<TrashedNote>>;
    /// Replaces the persisted trash list.
    fn save_trash(&self, items: &[TrashedNote]) -> StoreResult<()>;

    /// Appends a snapshot of `note` to trash, stamped with `deleted_at`.
    fn move_to_trash(&self, note: &Note, deleted_at: DateTime<Utc>) -> StoreResult<TrashedNote> {
        let mut trash = self.load_trash()?;
        let item = TrashedNote::new(note.clone(), deleted_at);
        trash.push(item.clone());
        self.save_trash(&trash)?;
        Ok(item)
    }

    /// Replaces the note list with `remaining` and appends `note` to trash.
    ///
    /// The note list is written first so a failed trash write never leaves
    /// the same id in both documents. Transactional stores override this.
    fn trash_note(
        &self,
        remaining: &[Note],
        note: &Note,
        deleted_at: DateTime<Utc>,
    ) -> StoreResult<TrashedNote> {
        self.save_notes(remaining)?;
        self.move_to_trash(note, deleted_at)
    }

    /// Removes trash entries older than `retention_days` relative to `now`.
    ///
    /// Entries without a deletion timestamp are removed as invalid.
    /// Returns the number of removed entries.
    fn cleanup_trash(&self, retention_days: i64, now: DateTime<Utc>) -> StoreResult<usize> {
        let trash = self.load_trash()?;
        if trash.is_empty() {
            return Ok(0);
        }

        let before = trash.len();
        let kept: Vec<TrashedNote> = trash
            .into_iter()
            .filter(|item| item.is_retained(retention_days, now))
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.save_trash(&kept)?;
            info!(
                "event=trash_cleanup module=repo status=ok removed={removed} kept={}",
                kept.len()
            );
        }
        Ok(removed)
    }
}

/// SQLite-backed note store over the `kv_store` table.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'kv_store'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingRequiredTable("kv_store"));
        }
        Ok(Self { conn })
    }

    /// Reads one raw document; `None` when the key was never written.
    pub fn read_document(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Writes one raw document, replacing any previous value.
    pub fn write_document(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn load_notes(&self) -> StoreResult<Vec<Note>> {
        let Some(raw) = self.read_document(NOTES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => Ok(notes),
            Err(err) => {
                error!(
                    "event=notes_load module=repo status=error error_code=corrupt_document error={err}"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save_notes(&self, notes: &[Note]) -> StoreResult<()> {
        let raw = serde_json::to_string(notes)?;
        self.write_document(NOTES_KEY, &raw)
    }

    fn load_trash(&self) -> StoreResult<Vec<TrashedNote>> {
        let Some(raw) = self.read_document(TRASH_KEY)? else {
            return Ok(Vec::new());
        };
        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                error!(
                    "event=trash_load module=repo status=error error_code=corrupt_document error={err}"
                );
                return Ok(Vec::new());
            }
        };

        let mut trash = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<TrashedNote>(entry) {
                Ok(item) => trash.push(item),
                Err(err) => warn!(
                    "event=trash_load module=repo status=skip error_code=corrupt_entry index={index} error={err}"
                ),
            }
        }
        Ok(trash)
    }

    fn save_trash(&self, items: &[TrashedNote]) -> StoreResult<()> {
        let raw = serde_json::to_string(items)?;
        self.write_document(TRASH_KEY, &raw)
    }

    /// Both documents change in one transaction or not at all.
    fn trash_note(
        &self,
        remaining: &[Note],
        note: &Note,
        deleted_at: DateTime<Utc>,
    ) -> StoreResult<TrashedNote> {
        let tx = self.conn.unchecked_transaction()?;
        self.save_notes(remaining)?;
        let item = self.move_to_trash(note, deleted_at)?;
        tx.commit()?;
        Ok(item)
    }
}
