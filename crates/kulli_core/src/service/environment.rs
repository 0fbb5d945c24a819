//! Host environment seam for viewport measurement and caret placement.
//!
//! The board never touches a windowing system directly; hosts implement
//! `Environment` and the controller calls through it.

use crate::model::note_id::NoteId;
use log::debug;
use std::cell::Cell;

/// Visible canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Host services the board controller depends on.
pub trait Environment {
    /// Returns the current viewport size.
    fn measure_viewport(&self) -> Viewport;
    /// Focuses the editor of `note` and moves the caret to the end.
    fn focus_and_place_cursor(&self, note: &NoteId);
}

/// Headless environment with a settable viewport.
///
/// Used by the CLI and by hosts without a focusable editor.
#[derive(Debug)]
pub struct HeadlessEnvironment {
    viewport: Cell<Viewport>,
}

impl HeadlessEnvironment {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Cell::new(viewport),
        }
    }

    /// Changes the reported viewport; callers then notify the board.
    pub fn resize(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }
}

impl Environment for HeadlessEnvironment {
    fn measure_viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn focus_and_place_cursor(&self, note: &NoteId) {
        debug!("event=editor_focus module=env status=skip note_id={note}");
    }
}
