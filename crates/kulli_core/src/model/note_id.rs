//! Note identifiers and the session-scoped id allocator.
//!
//! # Responsibility
//! - Format ids as `note-<n>` and parse the numeric suffix back.
//! - Reseed the counter from persisted records so restarts never collide.
//!
//! # Invariants
//! - Allocated ids are strictly increasing within one allocator.
//! - After `reseed`, the next id is one past the largest known suffix.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const NOTE_ID_PREFIX: &str = "note-";

static NOTE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^note-(\d+)$").expect("valid note id regex"));

/// Opaque note identifier, serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn from_sequence(value: u64) -> Self {
        Self(format!("{NOTE_ID_PREFIX}{value}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the numeric suffix, or `None` for foreign id formats.
    pub fn sequence(&self) -> Option<u64> {
        NOTE_ID_RE
            .captures(self.0.as_str())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Monotonic id source owned by the board context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteIdAllocator {
    last: u64,
}

impl NoteIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an allocator that continues after every id in `existing`.
    pub fn seeded_from<'a>(existing: impl IntoIterator<Item = &'a NoteId>) -> Self {
        let mut allocator = Self::new();
        allocator.reseed(existing);
        allocator
    }

    /// Raises the counter to the largest numeric suffix found.
    ///
    /// Ids without a numeric suffix are ignored. The counter never moves
    /// backwards.
    pub fn reseed<'a>(&mut self, existing: impl IntoIterator<Item = &'a NoteId>) {
        let max_seen = existing
            .into_iter()
            .filter_map(NoteId::sequence)
            .max()
            .unwrap_or(0);
        self.last = self.last.max(max_seen);
    }

    /// Allocates the next id.
    pub fn next_id(&mut self) -> NoteId {
        self.last += 1;
        NoteId::from_sequence(self.last)
    }

    /// Returns the id that `next_id` would hand out, without consuming it.
    pub fn peek(&self) -> NoteId {
        NoteId::from_sequence(self.last + 1)
    }
}
