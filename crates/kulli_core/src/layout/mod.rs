//! Deterministic note placement on the board canvas.
//!
//! # Responsibility
//! - Place a new note next to the last one, wrapping rows at the viewport edge.
//! - Reflow every note in one packing pass after viewport changes.
//! - Re-pack search matches and restore pre-search positions on clear.
//!
//! # Invariants
//! - Placement, reflow and filtering share one row-packing rule.
//! - Every pass terminates: a row always accepts at least one note.
//! - Layout has no error path for finite, non-negative inputs.

pub mod filter;
pub mod packing;

pub use filter::SearchFilter;
pub use packing::{next_position, pack_positions, reflow, row_start_x};
