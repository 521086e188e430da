//! Dura portal core.
//! Fetches AI-generated operational insights and renders them into the portal:
//! a briefing block on the dashboard, an insight card on every other page.

pub mod config;
pub mod dom;
pub mod envelope;
pub mod error;
pub mod nav;
pub mod normalize;
pub mod page;
pub mod poller;
pub mod portal;
pub mod render;
pub mod session;

pub use config::PortalConfig;
pub use dom::{MemoryDocument, NodeId, Selector, UiTree};
pub use envelope::{BriefingAction, EntryElement, EnvelopeState, InsightEnvelope, Insights, PageInsightEntry};
pub use error::{PortalError, PortalResult};
pub use nav::{NavEvent, NavToggle};
pub use normalize::{normalize, CanonicalInsightItem, InsightKind};
pub use page::PageId;
pub use poller::{
    HttpInsightSource, InsightSource, PollOutcome, PollPhase, Poller, PollerStats, RenderObserver, SkipReason,
    INSIGHTS_PATH,
};
pub use portal::{boot, boot_observed, Boot, PortalPage};
pub use render::{renderer_for, BriefingRenderer, CardRenderer, InsightRenderer, RenderReport, TimeDisplay};
pub use session::{
    decorate_nav, ApiContext, GuardOutcome, MemorySessionStorage, Navigator, Session, SessionGuard, SessionStorage,
    SessionUser, VerifyOutcome,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
