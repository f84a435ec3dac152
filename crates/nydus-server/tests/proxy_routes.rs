/// Proxy route integration tests
///
/// A mock Bot API and a mock GitHub API record what the dashboard sends them:
/// - DNS record listing query (page, page size, name filter)
/// - Analytics day range
/// - GitHub token resolution and attached-repository filtering
use std::sync::{Arc, Mutex};

use gotcha::axum::extract::RawQuery;
use gotcha::axum::http::{header, HeaderMap};
use gotcha::axum::routing::get;
use gotcha::axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use nydus_server::api::{dns, github, stats};
use nydus_server::config::Settings;
use nydus_server::github::GithubClient;
use nydus_server::AppState;

type Seen = Arc<Mutex<Vec<String>>>;

/// Test helper: Serve a router on an ephemeral port and return its base URL
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        gotcha::axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Test helper: Mock Bot API recording the query string of every listing call
async fn mock_bot(queries: Seen) -> String {
    let records = queries.clone();
    let router = Router::new()
        .route(
            "/api/cloudflare/records",
            get(move |RawQuery(query): RawQuery| {
                let records = records.clone();
                async move {
                    records.lock().unwrap().push(query.unwrap_or_default());
                    Json(json!({"result": [], "result_info": {"page": 1}}))
                }
            }),
        )
        .route(
            "/api/cloudflare/analytics",
            get(move |RawQuery(query): RawQuery| {
                let queries = queries.clone();
                async move {
                    queries.lock().unwrap().push(query.unwrap_or_default());
                    Json(json!({"requests": 1200}))
                }
            }),
        )
        .route(
            "/api/github-projects",
            get(|| async {
                Json(json!([
                    {"uuid": "p-1", "url_path": "https://github.com/arvo/Bot"}
                ]))
            }),
        );

    format!("{}/api", serve(router).await)
}

fn repo(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "owner": {"login": "arvo", "type": "Organization"},
        "description": null,
        "html_url": format!("https://github.com/arvo/{}", name),
        "clone_url": format!("https://github.com/arvo/{}.git", name),
        "ssh_url": format!("git@github.com:arvo/{}.git", name),
        "private": false,
        "default_branch": "main",
    })
}

/// Test helper: Mock GitHub API recording the Authorization header it receives
async fn mock_github(auth: Seen) -> String {
    let router = Router::new().route(
        "/user/repos",
        get(move |headers: HeaderMap| {
            let auth = auth.clone();
            async move {
                let value = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                auth.lock().unwrap().push(value);
                Json(json!([repo(1, "web"), repo(2, "bot"), repo(3, "api")]))
            }
        }),
    );

    serve(router).await
}

/// Test helper: Dashboard proxy routes pointed at the mocks
async fn dashboard(bot_api_url: String, github_url: &str, github_pat: Option<&str>) -> String {
    let settings = Settings {
        bot_api_url,
        github_pat: github_pat.map(str::to_string),
        ..Settings::default()
    };
    let mut state = AppState::new(settings);
    state.github = GithubClient::with_api_url(github_url);

    let router = Router::new()
        .route("/api/cloudflare/records", get(dns::list_records))
        .route("/api/analytics", get(stats::analytics))
        .route("/api/github/repos", get(github::list_repos))
        .with_state(state);

    serve(router).await
}

struct Harness {
    base: String,
    queries: Seen,
    auth: Seen,
}

/// Test helper: Start both mocks and the dashboard
async fn harness(github_pat: Option<&str>) -> Harness {
    let queries = Seen::default();
    let auth = Seen::default();
    let bot = mock_bot(queries.clone()).await;
    let github = mock_github(auth.clone()).await;
    let base = dashboard(bot, &github, github_pat).await;
    Harness { base, queries, auth }
}

#[tokio::test]
async fn test_dns_listing_defaults_to_first_page() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(None).await;

    let resp = reqwest::get(format!("{}/api/cloudflare/records", h.base)).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(*h.queries.lock().unwrap(), vec!["page=1&per_page=20"]);

    Ok(())
}

#[tokio::test]
async fn test_dns_listing_clamps_page_and_trims_search() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(None).await;
    let client = reqwest::Client::new();

    client
        .get(format!("{}/api/cloudflare/records", h.base))
        .query(&[("page", "0"), ("search", " api ")])
        .send()
        .await?
        .error_for_status()?;
    client
        .get(format!("{}/api/cloudflare/records", h.base))
        .query(&[("page", "3"), ("search", "")])
        .send()
        .await?
        .error_for_status()?;

    assert_eq!(
        *h.queries.lock().unwrap(),
        vec!["page=1&per_page=20&name=api", "page=3&per_page=20"]
    );

    Ok(())
}

#[tokio::test]
async fn test_analytics_days_default_to_one() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(None).await;

    let body: Value = reqwest::get(format!("{}/api/analytics", h.base))
        .await?
        .json()
        .await?;
    assert_eq!(body["requests"], 1200);

    reqwest::get(format!("{}/api/analytics?days=7", h.base))
        .await?
        .error_for_status()?;

    assert_eq!(*h.queries.lock().unwrap(), vec!["days=1", "days=7"]);

    Ok(())
}

#[tokio::test]
async fn test_repos_use_cookie_token_over_configured() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(Some("ghp_config")).await;

    let repos: Vec<Value> = reqwest::Client::new()
        .get(format!("{}/api/github/repos", h.base))
        .header(header::COOKIE.as_str(), "theme=dark; nydus_pat=ghp_cookie")
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(repos.len(), 3);
    assert_eq!(*h.auth.lock().unwrap(), vec!["Bearer ghp_cookie"]);

    Ok(())
}

#[tokio::test]
async fn test_repos_empty_cookie_falls_back_to_configured() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(Some("ghp_config")).await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/github/repos", h.base))
        .header(header::COOKIE.as_str(), "nydus_pat=")
        .send()
        .await?;

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(*h.auth.lock().unwrap(), vec!["Bearer ghp_config"]);

    Ok(())
}

#[tokio::test]
async fn test_repos_without_any_token_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(None).await;

    let resp = reqwest::get(format!("{}/api/github/repos", h.base)).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "Missing GitHub PAT");
    assert!(h.auth.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_available_repos_exclude_attached() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(Some("ghp_config")).await;

    let repos: Vec<Value> = reqwest::get(format!("{}/api/github/repos?available=true", h.base))
        .await?
        .json()
        .await?;

    let names: Vec<&str> = repos.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(names, vec!["api", "web"]);

    Ok(())
}
