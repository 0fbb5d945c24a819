//! Row-packing rule shared by incremental placement and batch reflow.

use crate::config::LayoutConfig;
use crate::model::note::{Note, Position};

/// Returns the left edge for a row that starts at `row_y`.
///
/// Row 0 starts at `initial_x`. The first overflow row is indented to
/// `initial_x` only while it still sits inside the header band; every other
/// row starts at the `gap` margin.
pub fn row_start_x(config: &LayoutConfig, row_index: usize, row_y: f64) -> f64 {
    match row_index {
        0 => config.initial_x,
        1 if row_y < config.header_band_bottom => config.initial_x,
        _ => config.gap,
    }
}

fn overflows(config: &LayoutConfig, x: f64, viewport_width: f64) -> bool {
    x + config.note_width > viewport_width - config.gap
}

/// Computes where the next note goes, given the notes already on the board.
///
/// The last note in insertion order is the anchor. Zero notes yield the
/// initial anchor `(initial_x, initial_y)`.
pub fn next_position(config: &LayoutConfig, existing: &[Note], viewport_width: f64) -> Position {
    let Some(anchor) = existing.last() else {
        return Position::new(config.initial_x, config.initial_y);
    };

    let candidate_x = anchor.x + config.column_step();
    if !overflows(config, candidate_x, viewport_width) {
        return Position::new(candidate_x, anchor.y);
    }

    let lowest_y = existing
        .iter()
        .map(|note| note.y)
        .fold(f64::NEG_INFINITY, f64::max);
    let row_y = lowest_y + config.row_step();
    // All notes still on the initial row means this wrap opens row 1.
    let row_index = if lowest_y <= config.initial_y { 1 } else { 2 };
    Position::new(row_start_x(config, row_index, row_y), row_y)
}

/// Row packer cursor; yields one cell per call in reading order.
struct RowPacker<'a> {
    config: &'a LayoutConfig,
    viewport_width: f64,
    cursor: Position,
    row_index: usize,
    row_occupied: bool,
}

impl<'a> RowPacker<'a> {
    fn new(config: &'a LayoutConfig, viewport_width: f64) -> Self {
        Self {
            config,
            viewport_width,
            cursor: Position::new(config.initial_x, config.initial_y),
            row_index: 0,
            row_occupied: false,
        }
    }

    fn place(&mut self) -> Position {
        if self.row_occupied && overflows(self.config, self.cursor.x, self.viewport_width) {
            self.row_index += 1;
            self.cursor.y += self.config.row_step();
            self.cursor.x = row_start_x(self.config, self.row_index, self.cursor.y);
        }

        let placed = self.cursor;
        self.cursor.x += self.config.column_step();
        self.row_occupied = true;
        placed
    }
}

/// Returns `count` packed cells starting from the initial anchor.
pub fn pack_positions(config: &LayoutConfig, count: usize, viewport_width: f64) -> Vec<Position> {
    let mut packer = RowPacker::new(config, viewport_width);
    (0..count).map(|_| packer.place()).collect()
}

/// Repositions every note in its current order with one packing pass.
pub fn reflow(config: &LayoutConfig, notes: &mut [Note], viewport_width: f64) {
    let mut packer = RowPacker::new(config, viewport_width);
    for note in notes.iter_mut() {
        note.set_position(packer.place());
    }
}

/// Repositions only the notes at `indices`, in the given order.
pub(crate) fn reflow_subset(
    config: &LayoutConfig,
    notes: &mut [Note],
    indices: &[usize],
    viewport_width: f64,
) {
    let mut packer = RowPacker::new(config, viewport_width);
    for &index in indices {
        if let Some(note) = notes.get_mut(index) {
            note.set_position(packer.place());
        }
    }
}
