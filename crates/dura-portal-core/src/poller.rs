//! Insight poller.
//!
//! Fetches `GET {base}/api/ai-insights` on load and then on a fixed interval, reads
//! the envelope status and hands `ok`/`pending` payloads to the page's renderer.
//! Every failure ends in a logged `Skipped` outcome; the next tick is unaffected.
//!
//! Polls may overlap. Each poll takes a sequence number when it starts and a
//! response older than the last applied one is dropped, so a slow early response
//! can no longer overwrite a newer render. The tree lock is only taken after the
//! network call returns and is released before the next await point.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tokio::time::MissedTickBehavior;

use crate::config::PortalConfig;
use crate::dom::UiTree;
use crate::envelope::{EnvelopeState, InsightEnvelope, Insights};
use crate::error::{PortalError, PortalResult};
use crate::page::PageId;
use crate::render::{renderer_for, InsightRenderer, RenderReport, TimeDisplay};
use crate::session::ApiContext;

pub const INSIGHTS_PATH: &str = "/api/ai-insights";

/// Where insight envelopes come from.
#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn fetch(&self) -> PortalResult<InsightEnvelope>;
}

/// `InsightSource` backed by the portal backend.
#[derive(Debug, Clone)]
pub struct HttpInsightSource {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpInsightSource {
    pub fn new(context: &ApiContext, timeout: Duration) -> PortalResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, context)
    }

    /// Refuses to build without a base URL or auth headers: the poller must not
    /// run when the session guard did not provide them.
    pub fn with_client(client: reqwest::Client, context: &ApiContext) -> PortalResult<Self> {
        if context.base_url().is_empty() {
            return Err(PortalError::MissingContext("base url"));
        }
        if context.headers().is_empty() {
            return Err(PortalError::MissingContext("auth headers"));
        }
        Ok(Self {
            client,
            url: context.endpoint(INSIGHTS_PATH),
            headers: context.headers().clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl InsightSource for HttpInsightSource {
    async fn fetch(&self) -> PortalResult<InsightEnvelope> {
        let res = self
            .client
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(PortalError::Status(status.as_u16()));
        }
        let body = res.text().await?;
        InsightEnvelope::from_body(&body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Network failure or non-2xx response.
    Transport,
    /// Body was not a readable envelope.
    Decode,
    /// A newer poll was already applied.
    Stale,
    /// `status = ok` without insights.
    Malformed,
    UnrecognizedStatus,
}

/// Terminal state of one poll; the poller is idle again afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Rendered(RenderReport),
    PendingShown,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Fetching,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollerStats {
    pub issued: u64,
    pub rendered: u64,
    pub pending: u64,
    pub skipped: u64,
    pub in_flight: u64,
}

#[derive(Debug, Default)]
struct Counters {
    issued: AtomicU64,
    rendered: AtomicU64,
    pending: AtomicU64,
    skipped: AtomicU64,
    in_flight: AtomicU64,
}

/// Decrements the in-flight counter even when a poll future is dropped mid-fetch.
struct InFlight<'a>(&'a AtomicU64);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct View<D> {
    tree: D,
    last_applied: u64,
}

/// Called with the tree after every applied render, while the tree is locked.
pub type RenderObserver<D> = Box<dyn Fn(&D, PollOutcome) + Send + Sync>;

pub struct Poller<S, D> {
    source: S,
    page: PageId,
    renderer: Box<dyn InsightRenderer>,
    view: Mutex<View<D>>,
    next_seq: AtomicU64,
    counters: Counters,
    observer: Option<RenderObserver<D>>,
}

impl<D> Poller<HttpInsightSource, D>
where
    D: UiTree + Send,
{
    /// Poller against the real backend, using the context the session guard established.
    pub fn connect(context: &ApiContext, config: &PortalConfig, page: PageId, tree: D) -> PortalResult<Self> {
        let source = HttpInsightSource::new(context, config.request_timeout())?;
        tracing::debug!(target: "dura::poller", page = %page, url = source.url(), "insight source ready");
        Ok(Self::new(source, page, config.time_display(), tree))
    }
}

impl<S, D> Poller<S, D>
where
    S: InsightSource,
    D: UiTree + Send,
{
    /// Selects the renderer for `page` and performs its one-time scaffolding.
    pub fn new(source: S, page: PageId, time: TimeDisplay, mut tree: D) -> Self {
        let renderer = renderer_for(page, time);
        renderer.scaffold(&mut tree);
        Self {
            source,
            page,
            renderer,
            view: Mutex::new(View { tree, last_applied: 0 }),
            next_seq: AtomicU64::new(0),
            counters: Counters::default(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: RenderObserver<D>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn phase(&self) -> PollPhase {
        if self.counters.in_flight.load(Ordering::SeqCst) > 0 {
            PollPhase::Fetching
        } else {
            PollPhase::Idle
        }
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            issued: self.counters.issued.load(Ordering::SeqCst),
            rendered: self.counters.rendered.load(Ordering::SeqCst),
            pending: self.counters.pending.load(Ordering::SeqCst),
            skipped: self.counters.skipped.load(Ordering::SeqCst),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Runs `f` against the page tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        let mut view = self.view.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut view.tree)
    }

    /// One trigger of the state machine. Never fails and never panics on bad input.
    pub async fn poll_once(&self) -> PollOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.issued.fetch_add(1, Ordering::SeqCst);

        let fetched = {
            let _in_flight = InFlight::enter(&self.counters.in_flight);
            self.source.fetch().await
        };

        let outcome = match fetched {
            Ok(envelope) => self.apply(seq, &envelope),
            Err(e) if e.is_transport() => {
                tracing::warn!(target: "dura::poller", page = %self.page, seq, error = %e, "AI insights not available");
                PollOutcome::Skipped(SkipReason::Transport)
            }
            Err(e) => {
                tracing::warn!(target: "dura::poller", page = %self.page, seq, error = %e, "unreadable insights response");
                PollOutcome::Skipped(SkipReason::Decode)
            }
        };

        let counter = match outcome {
            PollOutcome::Rendered(_) => &self.counters.rendered,
            PollOutcome::PendingShown => &self.counters.pending,
            PollOutcome::Skipped(_) => &self.counters.skipped,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    fn apply(&self, seq: u64, envelope: &InsightEnvelope) -> PollOutcome {
        let action = match envelope.state() {
            EnvelopeState::Ready(insights) => Apply::Render(insights),
            EnvelopeState::Pending { next_generation_at } => Apply::Pending(next_generation_at),
            EnvelopeState::Unrecognized(status) => {
                tracing::debug!(target: "dura::poller", seq, status = ?status, "envelope status not renderable; keeping display");
                return PollOutcome::Skipped(SkipReason::UnrecognizedStatus);
            }
            EnvelopeState::Malformed => {
                tracing::info!(target: "dura::poller", seq, "ok envelope without insights; keeping display");
                return PollOutcome::Skipped(SkipReason::Malformed);
            }
        };

        let mut view = self.view.lock().unwrap_or_else(|p| p.into_inner());
        if seq < view.last_applied {
            tracing::debug!(
                target: "dura::poller",
                seq,
                last_applied = view.last_applied,
                "discarding response older than the applied one"
            );
            return PollOutcome::Skipped(SkipReason::Stale);
        }
        view.last_applied = seq;

        let outcome = match action {
            Apply::Render(insights) => PollOutcome::Rendered(self.renderer.render(&mut view.tree, envelope, insights)),
            Apply::Pending(next_generation_at) => {
                self.renderer.render_pending(&mut view.tree, next_generation_at);
                PollOutcome::PendingShown
            }
        };
        tracing::debug!(target: "dura::poller", page = %self.page, seq, outcome = ?outcome, "insights applied");
        if let Some(observer) = &self.observer {
            observer(&view.tree, outcome);
        }
        outcome
    }
}

enum Apply<'a> {
    Render(&'a Insights),
    Pending(Option<&'a str>),
}

impl<S, D> Poller<S, D>
where
    S: InsightSource + 'static,
    D: UiTree + Send + 'static,
{
    /// Polls immediately, then every `interval`, until `shutdown` resolves. Each
    /// tick runs as its own task so a slow request never delays the timer.
    pub async fn run<F>(self: Arc<Self>, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        tracing::info!(
            target: "dura::poller",
            page = %self.page,
            interval_secs = interval.as_secs_f64(),
            "insight polling started"
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let poller = Arc::clone(&self);
                    tokio::spawn(async move {
                        poller.poll_once().await;
                    });
                }
                _ = &mut shutdown => break,
            }
        }
        tracing::info!(target: "dura::poller", page = %self.page, stats = ?self.stats(), "insight polling stopped");
    }
}
