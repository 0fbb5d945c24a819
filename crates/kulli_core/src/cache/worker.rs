//! One generation of the offline cache worker.
//!
//! # Responsibility
//! - Install: best-effort prefetch of the static and external manifests.
//! - Activate: prune partitions of older generations.
//! - Serve: answer intercepted requests using the per-host strategy.
//!
//! # Invariants
//! - `handle_fetch` always yields a response for intercepted requests.
//! - Only 2xx responses are written to partitions.
//! - A background revalidation writes at most one entry and reports nothing
//!   back to the request that spawned it.

use crate::cache::http::{Request, RequestMode, Response};
use crate::cache::message::ControlMessage;
use crate::cache::network::{FetchError, Network};
use crate::cache::storage::{CacheStorage, Partition};
use crate::cache::strategy::{classify, Strategy};
use crate::config::{CacheConfig, ConfigError};
use futures_util::future::join_all;
use log::{debug, info, warn};
use parking_lot::Mutex;
use reqwest::Method;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use url::Url;

/// Lifecycle state of a worker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Installed and waiting to take over from the active generation.
    Installed,
    Activating,
    Active,
    /// Replaced by a newer generation; receives no new requests.
    Redundant,
}

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Respond(Response),
    /// Not intercepted; the host sends it to the network untouched.
    Passthrough,
}

/// Summary of an install pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached_static: usize,
    pub failed_static: Vec<String>,
    pub cached_external: usize,
    pub failed_external: Vec<String>,
}

/// Cache worker for one configured release.
pub struct CacheWorker {
    config: Arc<CacheConfig>,
    origin: Url,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
    revalidations: TaskTracker,
}

impl CacheWorker {
    pub fn new(
        config: CacheConfig,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let origin = Url::parse(config.origin.as_str())
            .map_err(|err| ConfigError::Invalid(format!("invalid origin: {err}")))?;
        Ok(Self {
            config: Arc::new(config),
            origin,
            storage,
            network,
            state: Mutex::new(WorkerState::Installing),
            skip_waiting: AtomicBool::new(false),
            revalidations: TaskTracker::new(),
        })
    }

    pub fn release(&self) -> &str {
        self.config.release.as_str()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    fn set_state(&self, next: WorkerState) {
        let mut state = self.state.lock();
        debug!(
            "event=worker_state module=cache release={} from={:?} to={:?}",
            self.config.release, *state, next
        );
        *state = next;
    }

    /// Asks to replace the active generation without waiting for clients.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Prefetches both manifests; individual failures are logged and skipped.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing);
        info!(
            "event=worker_install module=cache status=start release={}",
            self.config.release
        );

        let static_partition = self.storage.open(&self.config.static_partition);
        let static_requests = self
            .config
            .static_assets
            .iter()
            .map(|path| (path.clone(), self.origin.join(path)));
        let static_results = join_all(static_requests.map(|(label, url)| {
            let partition = Arc::clone(&static_partition);
            async move {
                let outcome = match url {
                    Ok(url) => {
                        let request = Request::new(Method::GET, url, RequestMode::SameOrigin);
                        self.prefetch_into(&partition, &request).await
                    }
                    Err(err) => Err(FetchError::Transport(format!("invalid asset path: {err}"))),
                };
                (label, outcome)
            }
        }))
        .await;

        let dynamic_partition = self.storage.open(&self.config.dynamic_partition);
        let external_results = join_all(self.config.external_assets.iter().map(|raw| {
            let partition = Arc::clone(&dynamic_partition);
            async move {
                let outcome = match Url::parse(raw) {
                    Ok(url) => {
                        let request = Request::new(Method::GET, url, RequestMode::Cors);
                        self.prefetch_into(&partition, &request).await
                    }
                    Err(err) => Err(FetchError::Transport(format!("invalid asset url: {err}"))),
                };
                (raw.clone(), outcome)
            }
        }))
        .await;

        let mut report = InstallReport::default();
        for (label, outcome) in static_results {
            match outcome {
                Ok(()) => report.cached_static += 1,
                Err(err) => {
                    warn!("event=worker_install module=cache status=skip kind=static url={label} error={err}");
                    report.failed_static.push(label);
                }
            }
        }
        for (label, outcome) in external_results {
            match outcome {
                Ok(()) => report.cached_external += 1,
                Err(err) => {
                    warn!("event=worker_install module=cache status=skip kind=external url={label} error={err}");
                    report.failed_external.push(label);
                }
            }
        }

        if self.config.skip_waiting_on_install {
            self.skip_waiting();
        }
        self.set_state(WorkerState::Installed);
        info!(
            "event=worker_install module=cache status=ok release={} cached_static={} failed_static={} cached_external={} failed_external={}",
            self.config.release,
            report.cached_static,
            report.failed_static.len(),
            report.cached_external,
            report.failed_external.len()
        );
        report
    }

    async fn prefetch_into(
        &self,
        partition: &Partition,
        request: &Request,
    ) -> Result<(), FetchError> {
        let response = self.network.fetch(request).await?;
        if !response.is_ok() {
            return Err(FetchError::BadStatus(response.status));
        }
        partition.put(request, response);
        Ok(())
    }

    /// Deletes every owned partition that is not current.
    ///
    /// Returns the names of the pruned partitions. Claiming clients is the
    /// caller's job once this returns.
    pub async fn activate(&self) -> Vec<String> {
        self.set_state(WorkerState::Activating);

        let current = self.config.current_partitions();
        let stale: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| {
                name.starts_with(self.config.partition_prefix.as_str())
                    && !current.contains(&name.as_str())
            })
            .collect();
        for name in &stale {
            info!("event=worker_activate module=cache status=prune partition={name}");
            self.storage.delete(name);
        }

        self.set_state(WorkerState::Active);
        info!(
            "event=worker_activate module=cache status=ok release={} pruned={}",
            self.config.release,
            stale.len()
        );
        stale
    }

    pub(crate) fn retire(&self) {
        self.set_state(WorkerState::Redundant);
    }

    /// Handles a control message addressed to this generation.
    pub fn handle_message(&self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                info!(
                    "event=worker_message module=cache type=skip_waiting release={}",
                    self.config.release
                );
                self.skip_waiting();
            }
            ControlMessage::ClearCache => {
                info!(
                    "event=worker_message module=cache type=clear_cache release={}",
                    self.config.release
                );
                self.storage.clear();
            }
        }
    }

    /// Answers one intercepted request.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if request.method != Method::GET || !request.is_http() {
            return FetchOutcome::Passthrough;
        }

        let response = match classify(&self.config, request) {
            Strategy::CachePreferred => self.cache_preferred(request).await,
            Strategy::NetworkPreferred => self.network_preferred(request).await,
            Strategy::CacheFirstRevalidate => self.cache_first(request).await,
        };
        FetchOutcome::Respond(response)
    }

    async fn cache_preferred(&self, request: &Request) -> Response {
        if let Some(cached) = self.storage.match_request(request) {
            return cached;
        }
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_dynamic(request, &response);
                response
            }
            Err(err) => {
                debug!(
                    "event=worker_fetch module=cache strategy=cache_preferred status=offline url={} error={err}",
                    request.url
                );
                Response::offline_placeholder()
            }
        }
    }

    async fn network_preferred(&self, request: &Request) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_dynamic(request, &response);
                response
            }
            Err(err) => {
                debug!(
                    "event=worker_fetch module=cache strategy=network_preferred status=fallback url={} error={err}",
                    request.url
                );
                self.storage
                    .match_request(request)
                    .unwrap_or_else(Response::service_unavailable)
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Response {
        if let Some(cached) = self.storage.match_request(request) {
            self.spawn_revalidation(request.clone());
            return cached;
        }

        let fetched = fetch_and_cache(
            &self.storage,
            self.network.as_ref(),
            &self.config.dynamic_partition,
            request,
        )
        .await;
        match fetched {
            Ok(response) => response,
            Err(err) => {
                debug!(
                    "event=worker_fetch module=cache strategy=cache_first status=offline url={} error={err}",
                    request.url
                );
                self.offline_fallback(request)
            }
        }
    }

    fn offline_fallback(&self, request: &Request) -> Response {
        if request.mode == RequestMode::Navigate {
            let document = self.origin.join(self.config.offline_document.as_str());
            if let Some(cached) = document.ok().and_then(|url| self.storage.match_url(&url)) {
                return cached;
            }
        }
        Response::service_unavailable()
    }

    fn store_dynamic(&self, request: &Request, response: &Response) {
        if response.is_ok() {
            self.storage
                .open(&self.config.dynamic_partition)
                .put(request, response.clone());
        }
    }

    fn spawn_revalidation(&self, request: Request) {
        let storage = Arc::clone(&self.storage);
        let network = Arc::clone(&self.network);
        let dynamic = self.config.dynamic_partition.clone();
        self.revalidations.spawn(async move {
            if let Err(err) = fetch_and_cache(&storage, network.as_ref(), &dynamic, &request).await {
                debug!(
                    "event=worker_revalidate module=cache status=error url={} error={err}",
                    request.url
                );
            }
        });
    }

    /// Waits for background revalidations spawned so far.
    pub async fn settle(&self) {
        self.revalidations.close();
        self.revalidations.wait().await;
        self.revalidations.reopen();
    }
}

/// Fetches `request` and stores 2xx results in the dynamic partition.
///
/// On network failure a cached entry is returned when one exists.
async fn fetch_and_cache(
    storage: &CacheStorage,
    network: &dyn Network,
    dynamic_partition: &str,
    request: &Request,
) -> Result<Response, FetchError> {
    match network.fetch(request).await {
        Ok(response) => {
            if response.is_ok() {
                storage.open(dynamic_partition).put(request, response.clone());
            }
            Ok(response)
        }
        Err(err) => storage.match_request(request).ok_or(err),
    }
}
