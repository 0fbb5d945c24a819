//! Note and trash records.
//!
//! # Responsibility
//! - Define the canonical note shape persisted as `{id, text, x, y, createdAt}`.
//! - Provide trash snapshots with deletion timestamps and retention checks.
//!
//! # Invariants
//! - `created_at` never changes after construction.
//! - A trashed note without `deleted_at` is treated as expired.

use crate::model::note_id::NoteId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Top-left corner of a note cell in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One sticky note on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Older records without a timestamp load as the Unix epoch.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(id: NoteId, text: impl Into<String>, position: Position) -> Self {
        Self::with_created_at(id, text, position, Utc::now())
    }

    /// Creates a note with an explicit creation time.
    ///
    /// Used by import paths and tests that need deterministic ordering.
    pub fn with_created_at(
        id: NoteId,
        text: impl Into<String>,
        position: Position,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            x: position.x,
            y: position.y,
            created_at,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Position) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Returns whether the note text holds anything besides whitespace.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Case-insensitive substring match used by board search.
    pub fn matches_query(&self, query: &str) -> bool {
        self.text.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Note snapshot kept in trash until the retention window passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedNote {
    #[serde(flatten)]
    pub note: Note,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TrashedNote {
    pub fn new(note: Note, deleted_at: DateTime<Utc>) -> Self {
        Self {
            note,
            deleted_at: Some(deleted_at),
        }
    }

    /// Returns whether this entry should survive a cleanup at `now`.
    ///
    /// Entries deleted strictly after `now - retention_days` are kept.
    pub fn is_retained(&self, retention_days: i64, now: DateTime<Utc>) -> bool {
        let Some(deleted_at) = self.deleted_at else {
            return false;
        };
        deleted_at > now - Duration::days(retention_days)
    }
}
