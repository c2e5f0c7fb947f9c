use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::loader::{LoadError, LoadOutcome, ScrollLoader};
use crate::runner::{Options, Runner, RunnerError};
use crate::source::HttpSource;
use crate::view::{PageView, LOADING_TEXT};

#[derive(Deserialize)]
struct LoadQuery {
    counter: Option<usize>,
}

struct Feed {
    users: Vec<(String, String)>,
    bound: usize,
    counters: Mutex<Vec<usize>>,
    tokens: Mutex<Vec<String>>,
}

impl Feed {
    fn new(count: usize, bound: usize) -> Arc<Self> {
        Self::with_users(
            (1..=count)
                .map(|n| (n.to_string(), format!("user number {n}")))
                .collect(),
            bound,
        )
    }

    fn with_users(users: Vec<(String, String)>, bound: usize) -> Arc<Self> {
        Arc::new(Self {
            users,
            bound,
            counters: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        })
    }

    fn counters(&self) -> Vec<usize> {
        self.counters.lock().unwrap().clone()
    }
}

async fn load(
    State(feed): State<Arc<Feed>>,
    headers: HeaderMap,
    Query(q): Query<LoadQuery>,
) -> Json<Vec<(String, String)>> {
    let counter = q.counter.unwrap_or(0);
    feed.counters.lock().unwrap().push(counter);
    if let Some(token) = headers.get("x-feed-token").and_then(|v| v.to_str().ok()) {
        feed.tokens.lock().unwrap().push(token.to_string());
    }
    let start = counter.min(feed.users.len());
    let end = (counter + feed.bound).min(feed.users.len());
    Json(feed.users[start..end].to_vec())
}

async fn broken() -> (StatusCode, &'static str) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "Something is wrong with the database",
    )
}

async fn not_pairs() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "users": [["1", "A"]] }))
}

async fn bad_tail() -> Json<serde_json::Value> {
    Json(serde_json::json!([["1", "A"], ["2", "B"], ["3"]]))
}

async fn numeric() -> Json<serde_json::Value> {
    Json(serde_json::json!([[42, "hello"]]))
}

async fn serve(feed: Arc<Feed>) -> SocketAddr {
    let app = Router::new()
        .route("/load", get(load))
        .route("/broken", get(broken))
        .route("/not-pairs", get(not_pairs))
        .route("/bad-tail", get(bad_tail))
        .route("/numeric", get(numeric))
        .with_state(feed);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn http_source(addr: SocketAddr, path: &str) -> HttpSource {
    let endpoint = crate::utils::endpoint_url(&format!("http://{addr}/"), path).unwrap();
    HttpSource::new(reqwest::Client::new(), endpoint)
}

fn options(addr: SocketAddr) -> Options {
    Options {
        base_url: format!("http://{addr}/users"),
        timeout_seconds: 5,
        ..Options::default()
    }
}

#[tokio::test]
async fn two_users_then_no_more_users() {
    let feed = Feed::with_users(
        vec![
            ("1".to_string(), "A".to_string()),
            ("2".to_string(), "B".to_string()),
        ],
        30,
    );
    let addr = serve(feed.clone()).await;
    let mut loader = ScrollLoader::new(http_source(addr, "/load"), PageView::new());

    let first = loader.load_more().await.unwrap();
    assert_eq!(
        first,
        LoadOutcome::Loaded {
            rendered: 2,
            offset: 2
        }
    );
    let view = loader.view();
    assert_eq!(view.container[0].title, "User - 1");
    assert_eq!(view.container[0].content, "A");
    assert_eq!(view.container[1].title, "User - 2");
    assert_eq!(view.container[1].content, "B");
    assert_eq!(view.sentinel, LOADING_TEXT);

    assert_eq!(loader.load_more().await.unwrap(), LoadOutcome::Exhausted);
    assert_eq!(loader.view().len(), 2);
    assert_eq!(loader.view().sentinel, "No more users");
    assert_eq!(feed.counters(), vec![0, 2]);
}

#[tokio::test]
async fn numeric_identifiers_render_as_text() {
    let addr = serve(Feed::new(0, 1)).await;
    let mut loader = ScrollLoader::new(http_source(addr, "/numeric"), PageView::new());
    loader.load_more().await.unwrap();
    assert_eq!(loader.view().container[0].title, "User - 42");
    assert_eq!(loader.view().container[0].content, "hello");
    assert_eq!(loader.offset(), 1);
}

#[tokio::test]
async fn runner_pages_until_exhausted() {
    let feed = Feed::new(5, 2);
    let addr = serve(feed.clone()).await;
    let runner = Runner::new(options(addr)).unwrap();

    let mut triggers = Vec::new();
    let result = runner
        .run_with(|p| triggers.push((p.trigger, p.offset)))
        .await
        .unwrap();

    assert!(result.exhausted);
    assert_eq!(result.offset, 5);
    assert_eq!(result.pages, 3);
    assert_eq!(result.view.len(), 5);
    assert_eq!(result.view.sentinel, "No more users");
    let titles: Vec<_> = result.view.container.iter().map(|f| f.title.clone()).collect();
    assert_eq!(
        titles,
        (1..=5).map(|n| format!("User - {n}")).collect::<Vec<_>>()
    );
    assert_eq!(feed.counters(), vec![0, 2, 4, 5]);
    assert_eq!(triggers, vec![(1, 2), (2, 4), (3, 5), (4, 5)]);
}

#[tokio::test]
async fn runner_respects_page_limit() {
    let feed = Feed::new(10, 3);
    let addr = serve(feed.clone()).await;
    let runner = Runner::new(Options {
        max_pages: 2,
        ..options(addr)
    })
    .unwrap();

    let result = runner.run().await.unwrap();
    assert!(!result.exhausted);
    assert_eq!(result.offset, 6);
    assert_eq!(result.view.sentinel, LOADING_TEXT);
    assert_eq!(feed.counters(), vec![0, 3]);
}

#[tokio::test]
async fn runner_uses_custom_param_header_and_message() {
    let feed = Feed::new(1, 5);
    let addr = serve(feed.clone()).await;
    let runner = Runner::new(Options {
        header: Some("X-Feed-Token: s3cret".to_string()),
        exhausted_message: "That's everyone".to_string(),
        title_template: "{id}: {content}".to_string(),
        ..options(addr)
    })
    .unwrap();

    let result = runner.run().await.unwrap();
    assert_eq!(result.view.container[0].title, "1: user number 1");
    assert_eq!(result.view.sentinel, "That's everyone");
    assert_eq!(
        *feed.tokens.lock().unwrap(),
        vec!["s3cret".to_string(), "s3cret".to_string()]
    );
}

#[tokio::test]
async fn unknown_counter_param_is_ignored_by_server() {
    // the server only understands `counter`, so every request starts at 0
    let feed = Feed::new(2, 2);
    let addr = serve(feed.clone()).await;
    let runner = Runner::new(Options {
        counter_param: "offset".to_string(),
        max_pages: 2,
        ..options(addr)
    })
    .unwrap();
    let result = runner.run().await.unwrap();
    assert_eq!(result.offset, 4);
    assert_eq!(feed.counters(), vec![0, 0]);
}

#[tokio::test]
async fn server_error_stops_the_run() {
    let addr = serve(Feed::new(3, 3)).await;
    let err = Runner::new(Options {
        path: "/broken".to_string(),
        ..options(addr)
    })
    .unwrap()
    .run()
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Load {
            source: LoadError::Status {
                offset: 0,
                status: 503
            }
        }
    ));
}

#[tokio::test]
async fn server_error_can_end_the_run_quietly() {
    let addr = serve(Feed::new(3, 3)).await;
    let result = Runner::new(Options {
        path: "/broken".to_string(),
        stop_on_error: false,
        ..options(addr)
    })
    .unwrap()
    .run()
    .await
    .unwrap();
    assert!(!result.exhausted);
    assert_eq!(result.offset, 0);
    assert!(result.view.is_empty());
    assert_eq!(result.view.sentinel, LOADING_TEXT);
    assert!(result.view.error.as_deref().unwrap().contains("503"));
}

#[tokio::test]
async fn malformed_body_renders_nothing() {
    let addr = serve(Feed::new(0, 1)).await;
    let mut loader = ScrollLoader::new(http_source(addr, "/not-pairs"), PageView::new());
    let err = loader.load_more().await.unwrap_err();
    assert!(matches!(err, LoadError::MalformedBody { .. }));
    assert!(loader.view().is_empty());
    assert_eq!(loader.offset(), 0);
    assert!(!loader.is_exhausted());
}

#[tokio::test]
async fn bad_record_after_good_ones_renders_nothing() {
    let addr = serve(Feed::new(0, 1)).await;
    let mut loader = ScrollLoader::new(http_source(addr, "/bad-tail"), PageView::new());
    let err = loader.load_more().await.unwrap_err();
    assert!(matches!(err, LoadError::MalformedBody { .. }));
    assert!(loader.view().is_empty());
    assert_eq!(loader.offset(), 0);
    assert_eq!(loader.view().sentinel, LOADING_TEXT);
    assert!(loader.view().error.is_some());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut loader = ScrollLoader::new(http_source(addr, "/load"), PageView::new());
    let err = loader.load_more().await.unwrap_err();
    assert!(matches!(err, LoadError::Transport { offset: 0, .. }));
    assert_eq!(loader.offset(), 0);
    assert_eq!(loader.view().sentinel, LOADING_TEXT);
}

#[test]
fn rendered_page_round_trips_through_every_format() {
    use crate::output::{self, FeedSnapshot, OutputFormat};
    use crate::view::View;

    let mut view = PageView::new();
    view.append(crate::fragment::render(
        &crate::fragment::Template::default(),
        &crate::record::UserRecord::new("7", "seven"),
    ));
    view.set_sentinel_text("No more users");
    let feed = FeedSnapshot::new(&view, 1, true);

    for format in [
        OutputFormat::Text,
        OutputFormat::Json,
        OutputFormat::Xml,
        OutputFormat::Html,
    ] {
        let out = String::from_utf8(output::render(format, &feed)).unwrap();
        assert!(out.contains("User - 7"), "{format:?}");
        assert!(out.contains("seven"), "{format:?}");
        assert!(out.contains("No more users"), "{format:?}");
    }
}
