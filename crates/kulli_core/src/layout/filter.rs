//! Search filtering with exact position restore.
//!
//! # Invariants
//! - The snapshot is taken on the first non-empty query and kept until the
//!   query becomes empty again; later queries never overwrite it.
//! - Only matching notes move while a filter is active.
//! - Clearing restores every snapshotted note bit-for-bit.

use crate::config::LayoutConfig;
use crate::layout::packing::{pack_positions, reflow_subset};
use crate::model::note::{Note, Position};
use crate::model::note_id::NoteId;
use log::debug;
use std::collections::HashMap;

/// Stateful search filter owned by the board controller.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    snapshot: Option<HashMap<NoteId, Position>>,
    matches: Vec<NoteId>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a non-empty query is currently applied.
    pub fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Ids of the current matches, newest first. Empty when inactive.
    pub fn matches(&self) -> &[NoteId] {
        &self.matches
    }

    /// Returns the pre-filter position of `id` while a filter is active.
    pub fn original_position(&self, id: &NoteId) -> Option<Position> {
        self.snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.get(id).copied())
    }

    /// Applies `query`, re-packing matches or restoring on an empty query.
    pub fn filter_and_reflow(
        &mut self,
        config: &LayoutConfig,
        notes: &mut [Note],
        query: &str,
        viewport_width: f64,
    ) {
        let query = query.trim();
        if query.is_empty() {
            self.clear(notes);
            return;
        }

        if self.snapshot.is_none() {
            self.snapshot = Some(
                notes
                    .iter()
                    .map(|note| (note.id.clone(), note.position()))
                    .collect(),
            );
        }

        let mut indices: Vec<usize> = notes
            .iter()
            .enumerate()
            .filter(|(_, note)| note.matches_query(query))
            .map(|(index, _)| index)
            .collect();
        // Stable sort: equal timestamps keep insertion order.
        indices.sort_by(|&a, &b| notes[b].created_at.cmp(&notes[a].created_at));

        reflow_subset(config, notes, &indices, viewport_width);
        self.matches = indices.iter().map(|&index| notes[index].id.clone()).collect();
        debug!(
            "event=search_filter module=layout status=ok matches={} total={}",
            self.matches.len(),
            notes.len()
        );
    }

    /// Restores pre-filter positions and drops the snapshot.
    ///
    /// Notes created after the snapshot keep their current position.
    pub fn clear(&mut self, notes: &mut [Note]) {
        self.matches.clear();
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };

        for note in notes.iter_mut() {
            if let Some(position) = snapshot.get(&note.id) {
                note.set_position(*position);
            }
        }
        debug!(
            "event=search_clear module=layout status=ok restored={}",
            snapshot.len()
        );
    }

    /// Re-packs the stored pre-filter positions for a new viewport width.
    ///
    /// Keeps the snapshot consistent with what a reflow would have produced
    /// had no filter been active. No-op when inactive.
    pub fn reflow_snapshot(&mut self, config: &LayoutConfig, notes: &[Note], viewport_width: f64) {
        let Some(snapshot) = self.snapshot.as_mut() else {
            return;
        };

        let cells = pack_positions(config, notes.len(), viewport_width);
        for (note, cell) in notes.iter().zip(cells) {
            snapshot.insert(note.id.clone(), cell);
        }
    }

    /// Remembers the unfiltered position of a note added while filtering.
    ///
    /// No-op when inactive.
    pub fn record(&mut self, id: &NoteId, position: Position) {
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.insert(id.clone(), position);
        }
    }

    /// Forgets a note that left the board while the filter was active.
    pub fn forget(&mut self, id: &NoteId) {
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.remove(id);
        }
        self.matches.retain(|current| current != id);
    }
}
