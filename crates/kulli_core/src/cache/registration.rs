//! Worker registration: the runtime side of the worker lifecycle.
//!
//! # Responsibility
//! - Install new generations and decide between activating and waiting.
//! - Track client contexts and which generation controls each of them.
//! - Route client requests through the controlling generation.
//!
//! # Invariants
//! - At most one active and one waiting generation exist.
//! - Activation claims every open client immediately.
//! - A replaced generation is retired and never routed to again.

use crate::cache::http::{Request, Response};
use crate::cache::message::ControlMessage;
use crate::cache::network::{FetchError, Network};
use crate::cache::storage::CacheStorage;
use crate::cache::worker::{CacheWorker, FetchOutcome, InstallReport};
use crate::config::{CacheConfig, ConfigError};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Opaque handle of one client context (an open page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(u64);

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

struct Generation {
    id: u64,
    worker: Arc<CacheWorker>,
}

/// Registration scope hosting successive worker generations.
pub struct Registration {
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    active: Option<Generation>,
    waiting: Option<Generation>,
    clients: BTreeMap<ClientId, Option<u64>>,
    next_client: u64,
    next_generation: u64,
}

impl Registration {
    pub fn new(storage: Arc<CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            storage,
            network,
            active: None,
            waiting: None,
            clients: BTreeMap::new(),
            next_client: 0,
            next_generation: 0,
        }
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    pub fn active_worker(&self) -> Option<&Arc<CacheWorker>> {
        self.active.as_ref().map(|generation| &generation.worker)
    }

    pub fn waiting_worker(&self) -> Option<&Arc<CacheWorker>> {
        self.waiting.as_ref().map(|generation| &generation.worker)
    }

    /// Whether a newer generation is installed and waiting.
    pub fn update_available(&self) -> bool {
        self.waiting.is_some()
    }

    /// Installs a generation for `config` and activates it when allowed.
    ///
    /// The generation activates right away when nothing is active or it
    /// asked to skip waiting; otherwise it replaces any previous waiting
    /// generation.
    pub async fn register(&mut self, config: CacheConfig) -> Result<InstallReport, ConfigError> {
        let worker = Arc::new(CacheWorker::new(
            config,
            Arc::clone(&self.storage),
            Arc::clone(&self.network),
        )?);
        self.next_generation += 1;
        let generation = Generation {
            id: self.next_generation,
            worker,
        };

        let report = generation.worker.install().await;
        if self.active.is_none() || generation.worker.skip_waiting_requested() {
            self.activate(generation).await;
        } else {
            info!(
                "event=registration_wait module=cache release={}",
                generation.worker.release()
            );
            if let Some(previous) = self.waiting.replace(generation) {
                previous.worker.retire();
            }
        }
        Ok(report)
    }

    async fn activate(&mut self, generation: Generation) {
        if let Some(previous) = self.active.take() {
            previous.worker.retire();
        }
        generation.worker.activate().await;

        let claimed = self.clients.len();
        for controller in self.clients.values_mut() {
            *controller = Some(generation.id);
        }
        info!(
            "event=registration_activate module=cache status=ok release={} claimed_clients={claimed}",
            generation.worker.release()
        );
        self.active = Some(generation);
    }

    /// Opens a client; it is controlled by the active generation, if any.
    pub fn open_client(&mut self) -> ClientId {
        self.next_client += 1;
        let id = ClientId(self.next_client);
        let controller = self.active.as_ref().map(|generation| generation.id);
        self.clients.insert(id, controller);
        id
    }

    /// Closes a client; a waiting generation takes over once none remain.
    pub async fn close_client(&mut self, client: ClientId) {
        self.clients.remove(&client);
        if self.clients.is_empty() {
            if let Some(waiting) = self.waiting.take() {
                self.activate(waiting).await;
            }
        }
    }

    /// Returns the release controlling `client`, if any.
    pub fn controller_of(&self, client: ClientId) -> Option<&str> {
        let controller = (*self.clients.get(&client)?)?;
        self.active
            .as_ref()
            .filter(|generation| generation.id == controller)
            .map(|generation| generation.worker.release())
    }

    /// Delivers a control message posted by a client.
    ///
    /// `SKIP_WAITING` goes to the waiting generation and activates it;
    /// `CLEAR_CACHE` goes to the active generation (or the waiting one when
    /// nothing is active yet).
    pub async fn post_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                let Some(waiting) = self.waiting.take() else {
                    debug!("event=registration_message module=cache status=skip reason=no_waiting_worker");
                    return;
                };
                waiting.worker.handle_message(message);
                self.activate(waiting).await;
            }
            ControlMessage::ClearCache => {
                let target = self.active.as_ref().or(self.waiting.as_ref());
                match target {
                    Some(generation) => generation.worker.handle_message(message),
                    None => warn!(
                        "event=registration_message module=cache status=skip reason=no_worker"
                    ),
                }
            }
        }
    }

    /// Delivers a raw JSON control payload; unknown payloads are ignored.
    pub async fn post_raw_message(&mut self, raw: &str) {
        match ControlMessage::from_json(raw) {
            Some(message) => self.post_message(message).await,
            None => warn!("event=registration_message module=cache status=ignored reason=unknown_payload"),
        }
    }

    /// Sends a request from `client` through its controlling generation.
    ///
    /// Uncontrolled clients and pass-through requests hit the network
    /// directly, so only those can fail.
    pub async fn fetch(&self, client: ClientId, request: &Request) -> Result<Response, FetchError> {
        let controller = self.clients.get(&client).copied().flatten();
        let worker = self
            .active
            .as_ref()
            .filter(|generation| Some(generation.id) == controller)
            .map(|generation| &generation.worker);

        if let Some(worker) = worker {
            if let FetchOutcome::Respond(response) = worker.handle_fetch(request).await {
                return Ok(response);
            }
        }
        self.network.fetch(request).await
    }
}
