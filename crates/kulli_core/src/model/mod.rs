//! Sticky-note domain model.
//!
//! # Responsibility
//! - Define the note, position and trash records shared by layout,
//!   persistence and the board controller.
//! - Own id allocation so no ambient counter exists.
//!
//! # Invariants
//! - A note id is unique across active notes and trash combined.
//! - Deletion moves a note to trash; trash is purged by age only.

pub mod note;
pub mod note_id;
