//! End-to-end worker behaviour against the simulated host
//!
//! Install, activate, then drive fetch/push/sync events the way a browser
//! would.

use hx_net::{Cache, CacheStorage, Method, Request, Response};
use hx_worker::sim::{SimHost, SimWorker};
use hx_worker::*;

const ORIGIN: &str = "http://localhost:8501";

fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Host with a worker that has been installed and activated
async fn running() -> (SimHost, SimWorker) {
    let host = SimHost::new();
    let config = WorkerConfig::default();
    host.serve_precache(&config).unwrap();

    let mut worker = host.worker(config).unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    host.log.clear();

    (host, worker)
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_upgrade_replaces_previous_generation() {
    smol::block_on(async {
        let host = SimHost::new();
        let old = WorkerConfig {
            cache_name: "hyperionx-v0.9.0".into(),
            ..WorkerConfig::default()
        };
        host.serve_precache(&old).unwrap();

        let mut previous = host.worker(old).unwrap();
        previous.install().await.unwrap();
        previous.activate().await.unwrap();

        let mut current = host.worker(WorkerConfig::default()).unwrap();
        current.install().await.unwrap();
        assert_eq!(host.caches.keys().await.unwrap().len(), 2);

        let deleted = current.activate().await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(host.caches.keys().await.unwrap(), vec![CACHE_NAME.to_string()]);
        assert!(host.log.snapshot().contains(&Effect::CacheDelete {
            cache: "hyperionx-v0.9.0".into()
        }));
    });
}

#[test]
fn test_activation_keeps_only_exact_name() {
    smol::block_on(async {
        let host = SimHost::new();
        for name in ["HYPERIONX-V1.0.0", "hyperionx-v1.0.0 ", "hyperionx-v1.0"] {
            host.caches.open(name).await.unwrap();
        }
        let mut worker = host.worker(WorkerConfig::default()).unwrap();
        host.serve_precache(worker.config()).unwrap();

        worker.install().await.unwrap();
        assert_eq!(worker.activate().await.unwrap(), 3);
        assert_eq!(host.caches.keys().await.unwrap(), vec![CACHE_NAME.to_string()]);
    });
}

#[test]
fn test_repeated_install_same_generation() {
    smol::block_on(async {
        let (host, mut worker) = running().await;

        worker.install().await.unwrap();

        assert_eq!(worker.state(), ServiceWorkerState::Installed);
        let cache = host.caches.open(CACHE_NAME).await.unwrap();
        assert_eq!(cache.keys().await.unwrap().len(), PRECACHE.len());
    });
}

#[test]
fn test_failed_install_keeps_previous_cache() {
    smol::block_on(async {
        let (host, _) = running().await;
        let next = WorkerConfig {
            cache_name: "hyperionx-v1.1.0".into(),
            ..WorkerConfig::default()
        };
        host.network.fail(&url("/app/static/manifest.json"));

        let mut worker = host.worker(next).unwrap();
        assert!(worker.install().await.is_err());
        assert_eq!(worker.state(), ServiceWorkerState::Redundant);

        let previous = host.caches.open(CACHE_NAME).await.unwrap();
        assert_eq!(previous.keys().await.unwrap().len(), PRECACHE.len());
    });
}

// ============================================================================
// INTERCEPTION
// ============================================================================

#[test]
fn test_non_get_never_observed() {
    smol::block_on(async {
        let (host, worker) = running().await;

        for method in [Method::Post, Method::Put, Method::Delete, Method::Patch, Method::Head] {
            let mut req = Request::get(&url("/app/static/app.js")).unwrap();
            req.method = method;
            assert!(worker.handle_fetch(FetchEvent::new(req)).await.is_none());
        }
        assert!(host.log.is_empty());
    });
}

#[test]
fn test_websocket_never_observed() {
    smol::block_on(async {
        let (host, worker) = running().await;

        for ws in ["ws://localhost:8501/", "wss://example.com/app.css"] {
            let outcome = host.dispatch_fetch(&worker, Request::get(ws).unwrap()).await;
            assert!(outcome.is_none());
        }
        assert!(host.log.is_empty());
    });
}

#[test]
fn test_static_hit_returns_cached_and_refreshes_same_url() {
    smol::block_on(async {
        let (host, worker) = running().await;
        let icon = url("/app/static/icon-192.png");
        host.network.route(&icon, Response::new(200, "new icon"));

        let served = host
            .dispatch_fetch(&worker, Request::get(&icon).unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, b"/app/static/icon-192.png");
        assert_eq!(host.log.fetches(), vec![icon.clone()]);

        let respond = host.log.position(&Effect::Respond { status: 200 }).unwrap();
        let refetch = host.log.position(&Effect::Fetch { url: icon }).unwrap();
        assert!(respond < refetch);
    });
}

#[test]
fn test_api_failure_is_json_503() {
    smol::block_on(async {
        let (host, worker) = running().await;
        host.network.set_online(false);

        let outcome = worker
            .handle_fetch(FetchEvent::new(Request::get(&url("/api/search?q=x")).unwrap()))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::NetworkOnly);
        assert!(outcome.wait_until.is_empty());
        let served = outcome.result.unwrap();
        assert_eq!(served.response.status, 503);
        let body: serde_json::Value = served.response.json().unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Offline" }));
    });
}

#[test]
fn test_partner_failure_is_json_503() {
    smol::block_on(async {
        let (host, worker) = running().await;
        host.network.fail("https://api.groq.com/openai/v1/chat/completions");

        let served = host
            .dispatch_fetch(
                &worker,
                Request::get("https://api.groq.com/openai/v1/chat/completions").unwrap(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.response.status, 503);
    });
}

#[test]
fn test_offline_navigation_without_cache_gets_offline_page() {
    smol::block_on(async {
        let (host, worker) = running().await;
        host.network.set_online(false);

        let served = host
            .dispatch_fetch(&worker, Request::navigate(&url("/settings")).unwrap())
            .await
            .unwrap()
            .unwrap();

        let cache = host.caches.open(CACHE_NAME).await.unwrap();
        let offline = cache
            .match_request(&Request::get(&url(OFFLINE_PAGE)).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.source, ResponseSource::OfflinePage);
        assert_eq!(served.response, offline);
    });
}

#[test]
fn test_offline_navigation_with_cache_uses_entry() {
    smol::block_on(async {
        let (host, worker) = running().await;
        host.network.set_online(false);

        let served = host
            .dispatch_fetch(&worker, Request::navigate(&url("/")).unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, b"/");
    });
}

#[test]
fn test_online_navigation_refreshes_entry() {
    smol::block_on(async {
        let (host, worker) = running().await;
        host.network.route(&url("/"), Response::new(200, "<html>v2</html>"));

        let served = host
            .dispatch_fetch(&worker, Request::navigate(&url("/")).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.source, ResponseSource::Network);

        host.network.set_online(false);
        let cached = host
            .dispatch_fetch(&worker, Request::navigate(&url("/")).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.response.body, b"<html>v2</html>");
    });
}

// ============================================================================
// NOTIFICATIONS & SYNC
// ============================================================================

#[test]
fn test_push_round_trip_to_window() {
    smol::block_on(async {
        let (host, worker) = running().await;

        let shown = worker
            .handle_push(PushEvent::new(r#"{"title":"T","body":"B","url":"/x"}"#))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(shown.title, "T");
        assert_eq!(shown.options.body.as_deref(), Some("B"));
        assert_eq!(shown.target_url(), Some("/x"));

        worker
            .handle_notification_click(NotificationClickEvent::new(shown))
            .await
            .unwrap();
        assert_eq!(
            host.scope.windows().iter().map(|u| u.as_str()).collect::<Vec<_>>(),
            vec!["http://localhost:8501/x"]
        );
    });
}

#[test]
fn test_push_without_payload_displays_nothing() {
    smol::block_on(async {
        let (host, worker) = running().await;

        assert!(worker.handle_push(PushEvent::default()).await.unwrap().is_none());
        assert!(host.log.is_empty());
    });
}

#[test]
fn test_push_denied_by_host() {
    smol::block_on(async {
        let (host, worker) = running().await;
        host.scope.deny_notifications();

        let err = worker
            .handle_push(PushEvent::new(r#"{"title":"T"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Host(_)));
        assert!(host.scope.notifications().is_empty());
    });
}

#[test]
fn test_sync_stub_touches_nothing() {
    smol::block_on(async {
        let (host, worker) = running().await;

        assert!(worker.handle_sync(SyncEvent::new(SYNC_MESSAGES)).await.unwrap());
        assert!(host.log.is_empty());
    });
}
