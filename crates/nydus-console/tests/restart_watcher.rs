/// Restart watcher integration tests
///
/// These tests run a dashboard stand-in serving canned event streams and verify:
/// - Progress updates in arrival order
/// - The bridge-closed state for every way a stream can end early
/// - Malformed frames are skipped and oversized ones end the watch
/// - The watcher stops at the first final event
use std::convert::Infallible;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use gotcha::axum::body::{Body, Bytes};
use gotcha::axum::http::header;
use gotcha::axum::response::IntoResponse;
use gotcha::axum::routing::get;
use gotcha::axum::Router;
use tokio::net::TcpListener;
use tokio::time::timeout;

use nydus_console::watcher::{RestartProgress, RestartWatcher};
use nydus_protocol::{RelayStatus, BRIDGE_CLOSED_MESSAGE, CONNECTING_MESSAGE, MAX_PENDING_FRAME};

const PROGRESS: &str = "data: {\"status\":\"progress\",\"message\":\"Pulling image\",\"done\":false}\n\n";
const SUCCESS: &str = "data: {\"status\":\"success\",\"message\":\"Service restarted\",\"done\":true}\n\n";

fn event_stream(body: Body) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/event-stream")], body)
}

/// Test helper: Serve canned restart streams and return the base URL
async fn serve_dashboard() -> String {
    let router = Router::new()
        .route(
            "/api/maintenance/restart/ok",
            get(|| async { event_stream(Body::from(format!("{}{}", PROGRESS, SUCCESS))) }),
        )
        .route(
            "/api/maintenance/restart/dropped",
            get(|| async { event_stream(Body::from(PROGRESS)) }),
        )
        .route(
            "/api/maintenance/restart/garbled",
            get(|| async {
                event_stream(Body::from(format!("data: {{not json\n\n{}", SUCCESS)))
            }),
        )
        .route(
            "/api/maintenance/restart/runaway",
            get(|| async {
                let line = format!("data: {}", "x".repeat(MAX_PENDING_FRAME + 1));
                let chunks = stream::iter(vec![Ok::<_, Infallible>(Bytes::from(line))])
                    .chain(stream::pending());
                event_stream(Body::from_stream(chunks))
            }),
        )
        .route(
            "/api/maintenance/restart/lingering",
            get(|| async {
                let chunks = stream::iter(vec![Ok::<_, Infallible>(Bytes::from(SUCCESS))])
                    .chain(stream::pending());
                event_stream(Body::from_stream(chunks))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        gotcha::axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Test helper: Run a watch and collect every update it reported
async fn watch(base_url: &str, service: &str) -> (RestartProgress, Vec<RestartProgress>) {
    let watcher = RestartWatcher::new(base_url);
    let mut updates = Vec::new();
    let last = timeout(
        Duration::from_secs(5),
        watcher.watch(service, |p| updates.push(p.clone())),
    )
    .await
    .expect("watch did not finish");
    (last, updates)
}

#[tokio::test]
async fn test_updates_follow_stream_until_done() {
    let base = serve_dashboard().await;
    let (last, updates) = watch(&base, "ok").await;

    let messages: Vec<&str> = updates.iter().map(|p| p.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![CONNECTING_MESSAGE, "Pulling image", "Service restarted"]
    );
    assert!(last.is_success());
}

#[tokio::test]
async fn test_stream_closed_without_done_is_bridge_closed() {
    let base = serve_dashboard().await;
    let (last, updates) = watch(&base, "dropped").await;

    assert_eq!(last, RestartProgress::bridge_closed());
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[1].message, "Pulling image");
    assert_eq!(updates[2].message, BRIDGE_CLOSED_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_dashboard_is_bridge_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let (last, updates) = watch(&base, "ok").await;
    assert_eq!(last.status, RelayStatus::Error);
    assert_eq!(last.message, BRIDGE_CLOSED_MESSAGE);
    assert_eq!(updates.len(), 2);
}

#[tokio::test]
async fn test_unknown_route_is_bridge_closed() {
    let base = serve_dashboard().await;
    let (last, _) = watch(&base, "missing").await;
    assert_eq!(last, RestartProgress::bridge_closed());
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let base = serve_dashboard().await;
    let (last, updates) = watch(&base, "garbled").await;

    assert!(last.is_success());
    assert_eq!(updates.len(), 2);
}

#[tokio::test]
async fn test_watch_returns_at_done_while_stream_stays_open() {
    let base = serve_dashboard().await;
    let (last, updates) = watch(&base, "lingering").await;

    assert!(last.is_success());
    assert_eq!(updates.last(), Some(&last));
}

#[tokio::test]
async fn test_oversized_frame_is_bridge_closed() {
    let base = serve_dashboard().await;
    let (last, updates) = watch(&base, "runaway").await;

    assert_eq!(last, RestartProgress::bridge_closed());
    assert_eq!(updates.len(), 2);
}
