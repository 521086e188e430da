//! Integration test: HTTP insight source, token verification and page boot
//! against a mock portal backend on a local port.

use std::sync::Mutex;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use dura_portal_core::render::{CARD_ID, ITEM_CLASS};
use dura_portal_core::session::{TOKEN_KEY, USER_KEY};
use dura_portal_core::{
    boot, ApiContext, Boot, HttpInsightSource, InsightSource, MemoryDocument, MemorySessionStorage, Navigator, PageId,
    PollOutcome, PortalConfig, PortalError, RenderReport, SessionGuard, SessionStorage, SessionUser, SkipReason,
    VerifyOutcome,
};
use serde_json::{json, Value};

const TOKEN: &str = "test-token";

const PAGE: &str = r#"<html><body>
<nav><div class="nav-left"><span id="userAvatar"></span><span id="userName"></span>
<ul class="nav-links"><li><a href="voorraad.html">Voorraad</a></li></ul></div>
<button class="hamburger" aria-expanded="false"></button></nav>
<main class="main"><div class="header"><h1>Voorraad</h1></div></main>
</body></html>"#;

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl Navigator for Recorder {
    fn redirect(&self, location: &str) {
        self.0.lock().unwrap().push(location.to_string());
    }
}

impl Recorder {
    fn locations(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn insights(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "data": {
            "status": "ok",
            "generated_at": "2024-01-01T09:30:00Z",
            "insights": {
                "title": "Daily Briefing",
                "page_insights": {
                    "voorraad": [{"type": "warning", "text": "Low stock on SKU-12"}, "Reorder pallets"]
                }
            }
        }
    })))
}

async fn verify(headers: HeaderMap) -> StatusCode {
    if authorized(&headers) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

/// Starts the mock backend and returns its base URL.
async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/ai-insights", get(insights))
        .route("/api/auth/verify", get(verify))
        .route("/broken/api/ai-insights", get(|| async { (StatusCode::OK, "not json") }))
        .route("/down/api/ai-insights", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base: &str) -> PortalConfig {
    PortalConfig {
        api_base: base.to_string(),
        request_timeout_secs: 2,
        ..PortalConfig::default()
    }
}

fn source(base: &str, token: &str) -> HttpInsightSource {
    let context = ApiContext::new(base, token).unwrap();
    HttpInsightSource::new(&context, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn fetch_unwraps_data_envelope_with_bearer_token() {
    let base = spawn_backend().await;
    let source = source(&base, TOKEN);
    assert_eq!(source.url(), format!("{base}/api/ai-insights"));
    let envelope = source.fetch().await.unwrap();
    assert_eq!(envelope.status.as_deref(), Some("ok"));
    let insights = envelope.insights.as_ref().unwrap();
    assert!(insights.page_entry("voorraad").is_some());
}

#[tokio::test]
async fn fetch_reports_non_success_status() {
    let base = spawn_backend().await;
    let err = source(&base, "wrong").fetch().await.unwrap_err();
    assert!(matches!(err, PortalError::Status(401)), "{err:?}");
    assert!(err.is_transport());

    let err = source(&format!("{base}/down"), TOKEN).fetch().await.unwrap_err();
    assert!(matches!(err, PortalError::Status(503)), "{err:?}");
}

#[tokio::test]
async fn fetch_reports_undecodable_body() {
    let base = spawn_backend().await;
    let err = source(&format!("{base}/broken"), TOKEN).fetch().await.unwrap_err();
    assert!(matches!(err, PortalError::Json(_)), "{err:?}");
    assert!(!err.is_transport());
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = source(&format!("http://{addr}"), TOKEN).fetch().await.unwrap_err();
    assert!(matches!(err, PortalError::Http(_)), "{err:?}");
    assert!(err.is_transport());
}

fn seeded_storage() -> MemorySessionStorage {
    MemorySessionStorage::with_session(
        TOKEN,
        &SessionUser {
            name: Some("sanne".to_string()),
            email: Some("sanne@dura.nl".to_string()),
        },
    )
}

#[tokio::test]
async fn verify_accepts_valid_token() {
    let base = spawn_backend().await;
    let cfg = config(&base);
    let storage = seeded_storage();
    let navigator = Recorder::default();
    let context = ApiContext::new(&base, TOKEN).unwrap();

    let outcome = SessionGuard::new(&storage, &navigator, &cfg)
        .verify(&reqwest::Client::new(), &context)
        .await;
    assert_eq!(outcome, VerifyOutcome::Valid);
    assert!(storage.get(TOKEN_KEY).is_some());
    assert!(navigator.locations().is_empty());
}

#[tokio::test]
async fn verify_rejection_clears_session_and_redirects() {
    let base = spawn_backend().await;
    let cfg = config(&base);
    let storage = seeded_storage();
    let navigator = Recorder::default();
    let context = ApiContext::new(&base, "expired").unwrap();

    let outcome = SessionGuard::new(&storage, &navigator, &cfg)
        .verify(&reqwest::Client::new(), &context)
        .await;
    assert_eq!(outcome, VerifyOutcome::Rejected);
    assert!(storage.get(TOKEN_KEY).is_none());
    assert!(storage.get(USER_KEY).is_none());
    assert_eq!(navigator.locations(), vec![cfg.login_page.clone()]);
}

#[tokio::test]
async fn verify_network_failure_stays_on_page() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let cfg = config(&base);
    let storage = seeded_storage();
    let navigator = Recorder::default();
    let context = ApiContext::new(&base, TOKEN).unwrap();

    let outcome = SessionGuard::new(&storage, &navigator, &cfg)
        .verify(&reqwest::Client::new(), &context)
        .await;
    assert_eq!(outcome, VerifyOutcome::Unreachable);
    assert!(storage.get(TOKEN_KEY).is_some());
    assert!(navigator.locations().is_empty());
}

#[tokio::test]
async fn boot_without_session_redirects() {
    let cfg = config("http://127.0.0.1:9");
    let navigator = Recorder::default();
    let booted = boot(
        &cfg,
        "/dura/voorraad.html",
        &MemorySessionStorage::new(),
        &navigator,
        MemoryDocument::parse_document(PAGE),
    )
    .unwrap();
    assert!(matches!(booted, Boot::Redirected));
    assert_eq!(navigator.locations(), vec![cfg.login_page.clone()]);
}

#[tokio::test]
async fn booted_page_polls_backend_and_renders_card() {
    let base = spawn_backend().await;
    let cfg = config(&base);
    let navigator = Recorder::default();
    let booted = boot(
        &cfg,
        "/dura/voorraad.html",
        &seeded_storage(),
        &navigator,
        MemoryDocument::parse_document(PAGE),
    )
    .unwrap();
    let Boot::Running(page) = booted else {
        panic!("expected a running page");
    };
    assert_eq!(page.poller.page(), PageId::Voorraad);
    assert!(page.nav.is_some());

    assert_eq!(page.poller.poll_once().await, PollOutcome::Rendered(RenderReport::Updated));

    let html = page.poller.with_tree(|doc| doc.to_html());
    let parsed = scraper::Html::parse_document(&html);
    let select = |css: &str| scraper::Selector::parse(css).unwrap();

    let avatar: String = parsed.select(&select("#userAvatar")).next().unwrap().text().collect();
    assert_eq!(avatar, "S");
    let name: String = parsed.select(&select("#userName")).next().unwrap().text().collect();
    assert_eq!(name, "sanne");

    // Card sits right after the header inside main.
    let card = parsed.select(&select(&format!("main > #{CARD_ID}"))).next().unwrap();
    let previous = card
        .prev_siblings()
        .filter_map(scraper::ElementRef::wrap)
        .next()
        .unwrap();
    assert!(previous.value().classes().any(|c| c == "header"));

    let rows: Vec<(String, String)> = parsed
        .select(&select(&format!(".{ITEM_CLASS}")))
        .map(|row| {
            (
                row.value().attr("data-type").unwrap_or_default().to_string(),
                row.text().collect::<String>(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("warning".to_string(), "Low stock on SKU-12".to_string()),
            ("info".to_string(), "Reorder pallets".to_string()),
        ]
    );
    let time: String = parsed
        .select(&select("#ai-insight-time"))
        .next()
        .unwrap()
        .text()
        .collect();
    assert_eq!(time, "09:30");
}

#[tokio::test]
async fn unauthorized_poll_skips_without_touching_card() {
    let base = spawn_backend().await;
    let cfg = config(&base);
    let storage = MemorySessionStorage::with_session("stale", &SessionUser::default());
    let booted = boot(
        &cfg,
        "/dura/voorraad.html",
        &storage,
        &Recorder::default(),
        MemoryDocument::parse_document(PAGE),
    )
    .unwrap();
    let Boot::Running(page) = booted else {
        panic!("expected a running page");
    };
    let before = page.poller.with_tree(|doc| doc.to_html());
    assert_eq!(page.poller.poll_once().await, PollOutcome::Skipped(SkipReason::Transport));
    assert_eq!(page.poller.with_tree(|doc| doc.to_html()), before);
}

#[tokio::test]
async fn unreachable_backend_skips_poll_and_keeps_page() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let booted = boot(
        &config(&base),
        "/dura/orders.html",
        &seeded_storage(),
        &Recorder::default(),
        MemoryDocument::parse_document(PAGE),
    )
    .unwrap();
    let Boot::Running(page) = booted else {
        panic!("expected a running page");
    };
    assert_eq!(page.poller.page(), PageId::Orders);

    let before = page.poller.with_tree(|doc| doc.to_html());
    assert!(before.contains(CARD_ID));
    for _ in 0..2 {
        assert_eq!(page.poller.poll_once().await, PollOutcome::Skipped(SkipReason::Transport));
    }
    assert_eq!(page.poller.with_tree(|doc| doc.to_html()), before);
    assert_eq!(page.poller.stats().skipped, 2);
}
