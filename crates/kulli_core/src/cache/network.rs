//! Network seam used by the cache worker.
//!
//! `HttpNetwork` talks to real origins through `reqwest`; tests plug in
//! scripted implementations of `Network`.

use crate::cache::http::{Request, Response};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Failure to obtain any response from the network.
#[derive(Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read).
    Transport(String),
    /// The network answered, but not with a cacheable success status.
    BadStatus(u16),
    /// No connection could be established to the host.
    Offline,
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "network transport failure: {message}"),
            Self::BadStatus(status) => write!(f, "unexpected response status {status}"),
            Self::Offline => write!(f, "network is offline"),
        }
    }
}

impl Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_connect() {
            Self::Offline
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// Issues requests on behalf of the worker.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// `reqwest`-backed network.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let reply = self
            .client
            .request(request.method.clone(), request.url.clone())
            .send()
            .await?;

        let status = reply.status();
        let headers = reply
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = reply.bytes().await?.to_vec();

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
