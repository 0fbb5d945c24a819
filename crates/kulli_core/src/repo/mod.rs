//! Persistence contracts for board state.
//!
//! # Responsibility
//! - Define the `NoteStore` collaborator the board controller talks to.
//! - Keep SQLite and JSON encoding details out of the controller.

pub mod note_store;
