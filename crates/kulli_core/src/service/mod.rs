//! Board use-case orchestration.
//!
//! # Responsibility
//! - Drive note create/edit/delete, layout and persistence from one owner.
//! - Keep host concerns (viewport, caret) behind the `Environment` seam.

pub mod board;
pub mod environment;
