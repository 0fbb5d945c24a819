#![allow(dead_code)]

use async_trait::async_trait;
use kulli_core::{CacheConfig, FetchError, Network, Request, Response};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const ORIGIN: &str = "http://localhost:8080";
pub const FONT_CSS: &str = "https://fonts.googleapis.com/css2?family=Roboto";
pub const CDN_SCRIPT: &str = "https://cdn.tailwindcss.com/3.4.1";

/// In-memory network answering from a route table.
///
/// Unknown URLs answer 404; offline mode fails every call.
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn route(&self, url: &str, response: Response) {
        let key = Url::parse(url).unwrap().to_string();
        self.routes.lock().unwrap().insert(key, response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        let key = Url::parse(url).unwrap().to_string();
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == key)
            .count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push(key.clone());
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Offline);
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

pub fn local(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Small manifest: three shell assets and one font stylesheet.
pub fn test_config() -> CacheConfig {
    CacheConfig {
        origin: ORIGIN.to_string(),
        static_assets: vec![
            "/".to_string(),
            "/index.html".to_string(),
            "/js/app.js".to_string(),
        ],
        external_assets: vec![FONT_CSS.to_string()],
        ..CacheConfig::default()
    }
}

/// Same manifest under the next partition generation.
pub fn next_release_config() -> CacheConfig {
    CacheConfig {
        release: "foss-kulli-v2".to_string(),
        static_partition: "foss-kulli-static-v2".to_string(),
        dynamic_partition: "foss-kulli-dynamic-v2".to_string(),
        ..test_config()
    }
}

/// Network serving every asset of `test_config` with `v1` bodies.
pub fn shell_network() -> Arc<ScriptedNetwork> {
    let network = ScriptedNetwork::new();
    network.route(&local("/"), Response::new(200, "<html>root</html>"));
    network.route(&local("/index.html"), Response::new(200, "<html>shell</html>"));
    network.route(&local("/js/app.js"), Response::new(200, "app v1"));
    network.route(FONT_CSS, Response::new(200, "@font-face{}"));
    network
}
