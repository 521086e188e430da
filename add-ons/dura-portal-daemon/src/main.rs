//! Dura portal host.
//!
//! Loads one portal page shell into an in-memory document, runs the session guard
//! against it and then keeps the AI insight poller going until CTRL-C or until the
//! session guard sends the page to login. With `snapshot_path` configured, the
//! rendered page is written out after every applied poll.
//!
//! Usage: `dura-portal [page-path]`, e.g. `dura-portal /dura/orders.html`.
//! The session comes from `DURA_TOKEN` and `DURA_USER_NAME`.

use std::sync::Arc;

use dura_portal_core::{
    boot_observed, Boot, MemoryDocument, MemorySessionStorage, Navigator, PageId, PollOutcome, PortalConfig,
    RenderObserver, SessionGuard, SessionStorage, SessionUser, VerifyOutcome,
};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PAGE: &str = "/dura/index.html";
const DASHBOARD_SHELL: &str = include_str!("../static/dashboard.html");
const PAGE_SHELL: &str = include_str!("../static/page.html");

/// Turns a redirect into a shutdown signal for the host loop.
struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, location: &str) {
        tracing::info!(target: "dura::host", location, "page redirected");
        let _ = self.tx.send(location.to_string());
    }
}

fn session_from_env() -> MemorySessionStorage {
    let Ok(token) = std::env::var("DURA_TOKEN") else {
        return MemorySessionStorage::new();
    };
    let user = SessionUser {
        name: std::env::var("DURA_USER_NAME").ok(),
        email: std::env::var("DURA_USER_EMAIL").ok(),
    };
    MemorySessionStorage::with_session(&token, &user)
}

fn snapshot_observer(path: String) -> RenderObserver<MemoryDocument> {
    Box::new(move |doc: &MemoryDocument, outcome: PollOutcome| {
        match std::fs::write(&path, doc.to_html()) {
            Ok(()) => tracing::debug!(target: "dura::host", path = %path, ?outcome, "snapshot written"),
            Err(e) => tracing::warn!(target: "dura::host", path = %path, error = %e, "snapshot write failed"),
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[dura-portal] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match PortalConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("[dura-portal] config: {}", e);
            std::process::exit(1);
        }
    };

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_PAGE.to_string());
    let shell = if PageId::classify(&path).is_dashboard() {
        DASHBOARD_SHELL
    } else {
        PAGE_SHELL
    };
    let document = MemoryDocument::parse_document(shell);

    let (redirect_tx, mut redirect_rx) = mpsc::unbounded_channel();
    let navigator = Arc::new(ChannelNavigator { tx: redirect_tx });
    let storage = Arc::new(session_from_env());
    let observer = config.snapshot_path.clone().map(snapshot_observer);

    let page = match boot_observed(&config, &path, storage.as_ref(), navigator.as_ref(), document, observer) {
        Ok(Boot::Running(page)) => page,
        Ok(Boot::Redirected) => {
            tracing::info!(target: "dura::host", login = %config.login_page, "no session; page left for login");
            return;
        }
        Err(e) => {
            eprintln!("[dura-portal] boot: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        target: "dura::host",
        version = dura_portal_core::version(),
        page = %page.poller.page(),
        api_base = %config.api_base,
        poll_interval_secs = config.poll_interval().as_secs(),
        nav_toggle = page.nav.is_some(),
        "Dura portal host started"
    );

    {
        let config = Arc::clone(&config);
        let storage = Arc::clone(&storage);
        let navigator = Arc::clone(&navigator);
        let context = page.session.context.clone();
        tokio::spawn(async move {
            let client = match reqwest::Client::builder().timeout(config.request_timeout()).build() {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(target: "dura::host", error = %e, "verify client unavailable; skipping token check");
                    return;
                }
            };
            let storage: &dyn SessionStorage = storage.as_ref();
            let outcome = SessionGuard::new(storage, navigator.as_ref(), &config)
                .verify(&client, &context)
                .await;
            if outcome == VerifyOutcome::Valid {
                tracing::debug!(target: "dura::host", "token verified");
            }
        });
    }

    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "dura::host", "CTRL-C received; shutting down");
            }
            Some(location) = redirect_rx.recv() => {
                tracing::info!(target: "dura::host", location = %location, "session ended; stopping poller");
            }
        }
    };

    Arc::clone(&page.poller).run(config.poll_interval(), shutdown).await;
}
