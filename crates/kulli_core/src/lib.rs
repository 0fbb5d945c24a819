//! Core of the Foss Kulli sticky-note board.
//!
//! Two independent parts live here: the deterministic layout engine that
//! places and reflows notes, and the offline cache worker that serves the
//! application shell without a network. The board controller, persistence
//! and logging support them.

pub mod cache;
pub mod config;
pub mod db;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::{
    CacheStorage, CacheWorker, ClientId, ControlMessage, FetchError, FetchOutcome, HttpNetwork,
    InstallReport, Network, Registration, Request, RequestMode, Response, Strategy, WorkerState,
};
pub use config::{CacheConfig, ConfigError, LayoutConfig, TRASH_RETENTION_DAYS};
pub use layout::{next_position, pack_positions, reflow, SearchFilter};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, Position, TrashedNote};
pub use model::note_id::{NoteId, NoteIdAllocator};
pub use repo::note_store::{NoteStore, SqliteNoteStore, StoreError, StoreResult};
pub use service::board::{Board, BoardError, BoardResult};
pub use service::environment::{Environment, HeadlessEnvironment, Viewport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
