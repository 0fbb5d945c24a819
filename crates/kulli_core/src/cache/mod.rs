//! Offline asset cache worker.
//!
//! # Responsibility
//! - Prefetch the application shell into versioned partitions on install.
//! - Prune older partition generations on activation.
//! - Answer intercepted GET requests from cache or network per request class,
//!   always resolving with some response.
//!
//! # Invariants
//! - At most one static and one dynamic partition are current.
//! - Individual fetch failures are logged and swallowed, never fatal.
//! - Background revalidation never delays the response it was spawned for.

pub mod http;
pub mod message;
pub mod network;
pub mod registration;
pub mod storage;
pub mod strategy;
pub mod worker;

pub use http::{Request, RequestMode, Response};
pub use message::ControlMessage;
pub use network::{FetchError, HttpNetwork, Network};
pub use registration::{ClientId, Registration};
pub use storage::{CacheStorage, Partition};
pub use strategy::{classify, Strategy};
pub use worker::{CacheWorker, FetchOutcome, InstallReport, WorkerState};
