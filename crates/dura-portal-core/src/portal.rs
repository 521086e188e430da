//! Page boot sequence: session guard, then page classification, then the poller
//! with its renderer scaffolded into the page.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::dom::UiTree;
use crate::error::PortalResult;
use crate::nav::NavToggle;
use crate::page::PageId;
use crate::poller::{HttpInsightSource, Poller, RenderObserver};
use crate::session::{decorate_nav, GuardOutcome, Navigator, Session, SessionGuard, SessionStorage};

/// A booted portal page.
pub struct PortalPage<D> {
    pub session: Session,
    pub poller: Arc<Poller<HttpInsightSource, D>>,
    pub nav: Option<NavToggle>,
}

pub enum Boot<D> {
    Running(PortalPage<D>),
    /// The session guard sent the page to login; nothing was started.
    Redirected,
}

/// Boots the page at `path`. Errors only when the session context cannot back an
/// HTTP client; a missing session is a redirect, not an error.
pub fn boot<D>(
    config: &PortalConfig,
    path: &str,
    storage: &dyn SessionStorage,
    navigator: &dyn Navigator,
    tree: D,
) -> PortalResult<Boot<D>>
where
    D: UiTree + Send,
{
    boot_observed(config, path, storage, navigator, tree, None)
}

/// Same as [`boot`], with `observer` called after every applied render.
pub fn boot_observed<D>(
    config: &PortalConfig,
    path: &str,
    storage: &dyn SessionStorage,
    navigator: &dyn Navigator,
    mut tree: D,
    observer: Option<RenderObserver<D>>,
) -> PortalResult<Boot<D>>
where
    D: UiTree + Send,
{
    let session = match SessionGuard::new(storage, navigator, config).establish() {
        GuardOutcome::Ready(session) => session,
        GuardOutcome::Redirected => return Ok(Boot::Redirected),
    };

    decorate_nav(&mut tree, &session.user);
    let nav = NavToggle::attach(&tree);
    let page = PageId::classify(path);
    tracing::info!(target: "dura::portal", page = %page, path, user = session.user.label(), "portal page booted");

    let mut poller = Poller::connect(&session.context, config, page, tree)?;
    if let Some(observer) = observer {
        poller = poller.with_observer(observer);
    }
    Ok(Boot::Running(PortalPage {
        session,
        poller: Arc::new(poller),
        nav,
    }))
}
