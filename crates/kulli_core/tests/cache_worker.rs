mod common;

use common::{local, shell_network, test_config, ScriptedNetwork, CDN_SCRIPT, FONT_CSS};
use kulli_core::{
    CacheStorage, CacheWorker, ControlMessage, FetchOutcome, Request, Response, WorkerState,
};
use reqwest::Method;
use std::sync::Arc;

fn worker_with(network: &Arc<ScriptedNetwork>) -> (CacheWorker, Arc<CacheStorage>) {
    let storage = Arc::new(CacheStorage::new());
    let worker = CacheWorker::new(test_config(), Arc::clone(&storage), network.clone()).unwrap();
    (worker, storage)
}

async fn active_worker(network: &Arc<ScriptedNetwork>) -> (CacheWorker, Arc<CacheStorage>) {
    let (worker, storage) = worker_with(network);
    worker.install().await;
    worker.activate().await;
    (worker, storage)
}

async fn respond(worker: &CacheWorker, request: Request) -> Response {
    match worker.handle_fetch(&request).await {
        FetchOutcome::Respond(response) => response,
        FetchOutcome::Passthrough => panic!("request was not intercepted: {}", request.url),
    }
}

#[tokio::test]
async fn install_caches_manifests_and_skips_failures() {
    let network = ScriptedNetwork::new();
    network.route(&local("/"), Response::new(200, "<html>root</html>"));
    network.route(&local("/index.html"), Response::new(200, "<html>shell</html>"));
    network.route(FONT_CSS, Response::new(200, "@font-face{}"));
    let (worker, storage) = worker_with(&network);

    let report = worker.install().await;

    assert_eq!(report.cached_static, 2);
    assert_eq!(report.failed_static, vec!["/js/app.js".to_string()]);
    assert_eq!(report.cached_external, 1);
    assert!(report.failed_external.is_empty());
    assert_eq!(worker.state(), WorkerState::Installed);
    assert!(worker.skip_waiting_requested());

    let shell = storage.get("foss-kulli-static-v1").unwrap();
    assert_eq!(shell.len(), 2);
    let fonts = storage.get("foss-kulli-dynamic-v1").unwrap();
    assert!(fonts.contains(&Request::get(FONT_CSS).unwrap()));
}

#[tokio::test]
async fn install_survives_a_fully_offline_network() {
    let network = shell_network();
    network.set_online(false);
    let (worker, _storage) = worker_with(&network);

    let report = worker.install().await;

    assert_eq!(report.cached_static, 0);
    assert_eq!(report.failed_static.len(), 3);
    assert_eq!(report.failed_external, vec![FONT_CSS.to_string()]);
    assert_eq!(worker.state(), WorkerState::Installed);
}

#[tokio::test]
async fn manifest_assets_are_served_offline() {
    let network = shell_network();
    let (worker, _storage) = active_worker(&network).await;
    network.set_online(false);

    let response = respond(&worker, Request::get(&local("/index.html")).unwrap()).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"<html>shell</html>".to_vec());

    let with_fragment = Request::get(&local("/index.html#board")).unwrap();
    assert_eq!(respond(&worker, with_fragment).await.status, 200);
}

#[tokio::test]
async fn activation_prunes_older_generations_only() {
    let network = shell_network();
    let (worker, storage) = worker_with(&network);
    storage.open("foss-kulli-static-v0");
    storage.open("foss-kulli-dynamic-v0");
    storage.open("someone-elses-cache");

    worker.install().await;
    let mut pruned = worker.activate().await;
    pruned.sort();

    assert_eq!(worker.state(), WorkerState::Active);
    assert_eq!(
        pruned,
        vec![
            "foss-kulli-dynamic-v0".to_string(),
            "foss-kulli-static-v0".to_string()
        ]
    );
    let owned: Vec<String> = storage
        .keys()
        .into_iter()
        .filter(|name| name.starts_with("foss-kulli-"))
        .collect();
    assert_eq!(
        owned,
        vec![
            "foss-kulli-static-v1".to_string(),
            "foss-kulli-dynamic-v1".to_string()
        ]
    );
    assert!(storage.has("someone-elses-cache"));
}

#[tokio::test]
async fn cached_hits_revalidate_in_background() {
    let network = shell_network();
    let (worker, storage) = active_worker(&network).await;
    network.route(&local("/js/app.js"), Response::new(200, "app v2"));

    let request = Request::get(&local("/js/app.js")).unwrap();
    let response = respond(&worker, request.clone()).await;
    assert_eq!(response.body, b"app v1".to_vec());

    worker.settle().await;
    assert_eq!(network.calls_to(&local("/js/app.js")), 2);
    let refreshed = storage
        .get("foss-kulli-dynamic-v1")
        .unwrap()
        .get(&request)
        .unwrap();
    assert_eq!(refreshed.body, b"app v2".to_vec());
}

#[tokio::test]
async fn misses_fetch_inline_and_cache_only_success() {
    let network = shell_network();
    network.route(&local("/data/seed.json"), Response::new(200, "[]"));
    network.route(&local("/broken"), Response::new(500, "boom"));
    let (worker, storage) = active_worker(&network).await;

    let seed = Request::get(&local("/data/seed.json")).unwrap();
    assert_eq!(respond(&worker, seed.clone()).await.status, 200);
    let broken = Request::get(&local("/broken")).unwrap();
    assert_eq!(respond(&worker, broken.clone()).await.status, 500);

    let dynamic = storage.get("foss-kulli-dynamic-v1").unwrap();
    assert!(dynamic.contains(&seed));
    assert!(!dynamic.contains(&broken));

    network.set_online(false);
    assert_eq!(respond(&worker, seed).await.body, b"[]".to_vec());
}

#[tokio::test]
async fn offline_navigation_falls_back_to_root_document() {
    let network = shell_network();
    let (worker, _storage) = active_worker(&network).await;
    network.set_online(false);

    let response = respond(&worker, Request::navigate(&local("/board/42")).unwrap()).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"<html>shell</html>".to_vec());
}

#[tokio::test]
async fn offline_uncached_subresource_gets_service_unavailable() {
    let network = shell_network();
    let (worker, _storage) = active_worker(&network).await;
    network.set_online(false);

    let response = respond(&worker, Request::get(&local("/img/logo.png")).unwrap()).await;
    assert_eq!(response.status, 503);
    assert_eq!(response.status_text, "Service Unavailable");
    assert_eq!(response.body, b"Offline".to_vec());
}

#[tokio::test]
async fn fonts_prefer_cache_and_degrade_to_placeholder() {
    let network = shell_network();
    let font_file = "https://fonts.gstatic.com/s/roboto/v30/regular.woff2";
    network.route(font_file, Response::new(200, "woff2"));
    let (worker, storage) = active_worker(&network).await;

    respond(&worker, Request::get(FONT_CSS).unwrap()).await;
    assert_eq!(network.calls_to(FONT_CSS), 1);

    let file = Request::get(font_file).unwrap();
    assert_eq!(respond(&worker, file.clone()).await.status, 200);
    assert!(storage.get("foss-kulli-dynamic-v1").unwrap().contains(&file));

    network.set_online(false);
    let missing = Request::get("https://fonts.gstatic.com/s/other.woff2").unwrap();
    let placeholder = respond(&worker, missing).await;
    assert_eq!(placeholder.status, 408);
    assert_eq!(placeholder.status_text, "Offline");
    assert!(placeholder.body.is_empty());
}

#[tokio::test]
async fn cdn_prefers_network_and_falls_back_to_cache() {
    let network = shell_network();
    network.route(CDN_SCRIPT, Response::new(200, "tailwind v1"));
    let (worker, _storage) = active_worker(&network).await;
    let script = Request::get(CDN_SCRIPT).unwrap();

    assert_eq!(respond(&worker, script.clone()).await.body, b"tailwind v1".to_vec());
    network.route(CDN_SCRIPT, Response::new(200, "tailwind v2"));
    assert_eq!(respond(&worker, script.clone()).await.body, b"tailwind v2".to_vec());

    network.set_online(false);
    assert_eq!(respond(&worker, script).await.body, b"tailwind v2".to_vec());

    let unknown = Request::get("https://cdn.tailwindcss.com/plugins.js").unwrap();
    assert_eq!(respond(&worker, unknown).await.status, 503);
}

#[tokio::test]
async fn non_get_and_non_http_requests_pass_through() {
    let network = shell_network();
    let (worker, _storage) = active_worker(&network).await;

    let post = Request::get(&local("/api/notes"))
        .unwrap()
        .with_method(Method::POST);
    assert_eq!(worker.handle_fetch(&post).await, FetchOutcome::Passthrough);

    let extension = Request::get("chrome-extension://abcdef/script.js").unwrap();
    assert_eq!(worker.handle_fetch(&extension).await, FetchOutcome::Passthrough);
}

#[tokio::test]
async fn clear_cache_message_drops_every_partition() {
    let network = shell_network();
    let (worker, storage) = active_worker(&network).await;
    storage.open("someone-elses-cache");

    worker.handle_message(ControlMessage::ClearCache);

    assert!(storage.keys().is_empty());
    network.set_online(false);
    let response = respond(&worker, Request::get(&local("/js/app.js")).unwrap()).await;
    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn skip_waiting_message_sets_flag() {
    let network = shell_network();
    let storage = Arc::new(CacheStorage::new());
    let config = kulli_core::CacheConfig {
        skip_waiting_on_install: false,
        ..test_config()
    };
    let worker = CacheWorker::new(config, storage, network.clone()).unwrap();

    worker.install().await;
    assert!(!worker.skip_waiting_requested());
    worker.handle_message(ControlMessage::SkipWaiting);
    assert!(worker.skip_waiting_requested());
}
