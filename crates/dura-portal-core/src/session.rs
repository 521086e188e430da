//! Session guard.
//!
//! Runs before anything else on a portal page: reads the token and user record
//! from session storage, redirects to the login page when either is missing, and
//! otherwise hands out the `ApiContext` (base URL + bearer headers) the insight
//! poller is constructed with. Token verification runs asynchronously afterwards:
//! an explicit rejection clears the session and redirects, a network failure
//! leaves the user on the page.

use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::config::PortalConfig;
use crate::dom::UiTree;
use crate::error::{PortalError, PortalResult};

pub const TOKEN_KEY: &str = "dura_token";
pub const USER_KEY: &str = "dura_user";
pub const VERIFY_PATH: &str = "/api/auth/verify";

const AVATAR_ID: &str = "userAvatar";
const USER_NAME_ID: &str = "userName";

/// Page-session scoped key/value storage.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Leaves the current page.
pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with a token and a serialized user record.
    pub fn with_session(token: &str, user: &SessionUser) -> Self {
        let storage = Self::new();
        storage.set(TOKEN_KEY, token);
        if let Ok(json) = serde_json::to_string(user) {
            storage.set(USER_KEY, &json);
        }
        storage
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }
}

/// User record stored next to the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionUser {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Avatar initial: first character of the name, uppercased; "D" without a name.
    pub fn initial(&self) -> String {
        self.display_name()
            .and_then(|n| n.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "D".to_string())
    }

    pub fn label(&self) -> &str {
        self.display_name().unwrap_or("Gebruiker")
    }
}

/// Base URL plus ready-to-use headers for authenticated backend calls.
#[derive(Debug, Clone)]
pub struct ApiContext {
    base_url: String,
    headers: HeaderMap,
}

impl ApiContext {
    pub fn new(base_url: &str, token: &str) -> PortalResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PortalError::MissingContext("base url"));
        }
        if token.trim().is_empty() {
            return Err(PortalError::MissingContext("bearer token"));
        }
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(Self { base_url, headers })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Established session.
#[derive(Debug, Clone)]
pub struct Session {
    pub context: ApiContext,
    pub user: SessionUser,
}

#[derive(Debug)]
pub enum GuardOutcome {
    Ready(Session),
    /// The page is being left; nothing else may run.
    Redirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid,
    /// The backend refused the token; the session was cleared and the page redirected.
    Rejected,
    /// Verification could not reach the backend; the page stays.
    Unreachable,
}

pub struct SessionGuard<'a> {
    storage: &'a dyn SessionStorage,
    navigator: &'a dyn Navigator,
    config: &'a PortalConfig,
}

impl<'a> SessionGuard<'a> {
    pub fn new(storage: &'a dyn SessionStorage, navigator: &'a dyn Navigator, config: &'a PortalConfig) -> Self {
        Self {
            storage,
            navigator,
            config,
        }
    }

    /// Synchronous part of the guard: session present, or redirect now.
    pub fn establish(&self) -> GuardOutcome {
        let token = self.storage.get(TOKEN_KEY).filter(|t| !t.trim().is_empty());
        let user = self
            .storage
            .get(USER_KEY)
            .and_then(|raw| match serde_json::from_str::<Option<SessionUser>>(&raw) {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!(target: "dura::session", error = %e, "stored user record unreadable");
                    None
                }
            });

        let (Some(token), Some(user)) = (token, user) else {
            tracing::info!(target: "dura::session", login = %self.config.login_page, "no session; redirecting to login");
            self.navigator.redirect(&self.config.login_page);
            return GuardOutcome::Redirected;
        };

        match ApiContext::new(&self.config.api_base, &token) {
            Ok(context) => {
                tracing::debug!(target: "dura::session", user = user.label(), "session established");
                GuardOutcome::Ready(Session { context, user })
            }
            Err(e) => {
                tracing::warn!(target: "dura::session", error = %e, "session unusable; redirecting to login");
                self.navigator.redirect(&self.config.login_page);
                GuardOutcome::Redirected
            }
        }
    }

    /// Asynchronous token check against `GET {base}/api/auth/verify`.
    /// Fail-closed on an explicit rejection, fail-open on network errors.
    pub async fn verify(&self, client: &reqwest::Client, context: &ApiContext) -> VerifyOutcome {
        let url = context.endpoint(VERIFY_PATH);
        match client.get(&url).headers(context.headers().clone()).send().await {
            Ok(res) if res.status().is_success() => VerifyOutcome::Valid,
            Ok(res) => {
                tracing::warn!(
                    target: "dura::session",
                    status = res.status().as_u16(),
                    "token rejected; clearing session"
                );
                self.storage.remove(TOKEN_KEY);
                self.storage.remove(USER_KEY);
                self.navigator.redirect(&self.config.login_page);
                VerifyOutcome::Rejected
            }
            Err(e) => {
                tracing::info!(target: "dura::session", error = %e, "token verification unreachable; staying on page");
                VerifyOutcome::Unreachable
            }
        }
    }
}

/// Fills the nav's avatar initial and user name, when those anchors exist.
pub fn decorate_nav(tree: &mut dyn UiTree, user: &SessionUser) {
    if let Some(avatar) = tree.element_by_id(AVATAR_ID) {
        tree.set_text_content(avatar, &user.initial());
    }
    if let Some(name) = tree.element_by_id(USER_NAME_ID) {
        tree.set_text_content(name, user.label());
    }
}
