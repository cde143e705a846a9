//! HTTP routes served over a real socket.

mod common;

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use matchday::server::serve_until;
use matchday::test_utils::TestDir;

use common::fixtures::{MockUpstream, live_nfl, upcoming_nba};

struct Running {
    base: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<matchday::Result<()>>,
}

impl Running {
    async fn start(app: matchday::App) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_until(Arc::new(app), listener, async {
            let _ = rx.await;
        }));
        Self {
            base: format!("http://{addr}"),
            shutdown: Some(tx),
            handle,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, reqwest::header::HeaderMap, Value) {
        let response = reqwest::get(format!("{}{path}", self.base)).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn games_route_returns_envelope_with_headers() {
    let upstream = MockUpstream::start().await;
    upstream
        .mount_directory(&[live_nfl()], &[live_nfl(), upcoming_nba()])
        .await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;

    let (status, headers, body) = server.get("/games?league=nba&filter=upcoming").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers["cache-control"].to_str().unwrap().contains("no-store"));
    assert_eq!(body["meta"]["league"], "nba");
    assert_eq!(body["meta"]["filter"], "upcoming");
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["games"][0]["league"], "nba");
    assert_eq!(body["games"][0]["isUpcoming"], true);
    assert!(body["meta"]["cacheAgeSec"].is_u64());

    server.stop().await;
}

#[tokio::test]
async fn game_route_decodes_slug() {
    let upstream = MockUpstream::start().await;
    upstream.mount_directory(&[live_nfl()], &[]).await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;

    let (status, _, body) = server.get("/games/chiefs%2Dbills").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game"]["matchId"], "chiefs-bills");

    let (status, _, body) = server.get("/games/unknown-slug").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    server.stop().await;
}

#[tokio::test]
async fn health_reports_last_fetch() {
    let upstream = MockUpstream::start().await;
    upstream.mount_directory(&[live_nfl()], &[]).await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;

    let (_, _, before) = server.get("/health").await;
    assert_eq!(before["status"], "ok");
    assert!(before["cacheAgeSec"].is_null());

    server.get("/games").await;
    let (_, _, after) = server.get("/health").await;
    assert!(after["cacheAgeSec"].is_u64());
    assert_eq!(after["upstreamBase"], upstream.base());

    server.stop().await;
}

#[tokio::test]
async fn bad_input_and_upstream_errors_map_to_status() {
    let upstream = MockUpstream::start().await;
    upstream.mount_status("/matches/live", 500).await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;

    let (status, _, body) = server.get("/games?league=cricket").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_league");

    let (status, _, body) = server.get("/games").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_unavailable");

    let (status, _, _) = server.get("/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn non_get_methods() {
    let upstream = MockUpstream::start().await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;
    let client = reqwest::Client::new();

    let options = client
        .request(reqwest::Method::OPTIONS, format!("{}/games", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(options.status(), StatusCode::NO_CONTENT);
    assert_eq!(options.headers()["access-control-allow-origin"], "*");

    let post = client
        .post(format!("{}/games", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

#[tokio::test]
async fn stream_check_probes_embed() {
    let upstream = MockUpstream::start().await;
    upstream.mount_embed("admin", "chiefs-bills", 200).await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;

    let (status, _, body) = server
        .get("/streams/check?source=admin&slug=chiefs-bills&stream=1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health"]["status"], "up");
    assert_eq!(body["health"]["httpStatus"], 200);

    let (_, _, body) = server.get("/streams/check?source=admin&slug=%21%21").await;
    assert_eq!(body["health"]["status"], "unknown");
    assert_eq!(body["health"]["error"], "invalid_source_or_slug");

    server.stop().await;
}

#[tokio::test]
async fn players_route_rejects_unknown_league() {
    let upstream = MockUpstream::start().await;
    let dir = TestDir::new();
    let server = Running::start(upstream.app(dir.path())).await;

    let (status, _, body) = server.get("/players?league=wnba").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_league");

    server.stop().await;
}
