//! Error types for the Dura portal core.

use thiserror::Error;

/// Result type alias for portal operations.
pub type PortalResult<T> = Result<T, PortalError>;

/// Errors raised by the portal's outer edges (HTTP, payload decoding, configuration).
///
/// The insight pipeline itself never surfaces these to the page: the poller logs
/// them and skips the tick.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered {0}")]
    Status(u16),

    #[error("response parse: {0}")]
    Json(#[from] serde_json::Error),

    #[error("auth context not available: {0}")]
    MissingContext(&'static str),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PortalError {
    /// True for failures of the network call itself (unreachable host, non-2xx).
    pub fn is_transport(&self) -> bool {
        matches!(self, PortalError::Http(_) | PortalError::Status(_))
    }
}
