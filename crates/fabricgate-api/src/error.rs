use thiserror::Error;

/// Top-level error type for the `fabricgate-api` crate.
///
/// Covers every failure mode of the controller clients: login handshakes,
/// transport, upstream status codes and payload shape. `fabricgate-core`
/// maps these into the inventory error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login handshake failed (bad credentials, missing token, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The controller answered the login POST with its HTML login page.
    /// vManage reports bad credentials this way, with HTTP 200.
    #[error("Login rejected -- controller returned its login page")]
    LoginRejected,

    /// The controller rejected a previously valid session (HTTP 401).
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Request input ───────────────────────────────────────────────
    /// A resource id that cannot be used as a single URL path segment.
    #[error("Invalid resource id: {id:?}")]
    InvalidIdentifier { id: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Upstream ────────────────────────────────────────────────────
    /// Any non-success status from a vendor endpoint.
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Valid JSON that does not have the envelope the endpoint promises
    /// (e.g. a vManage response without `data`).
    #[error("Unexpected response shape: {message}")]
    UnexpectedShape { message: String },

    // ── Concurrency ─────────────────────────────────────────────────
    /// The per-client request limiter was closed.
    #[error("Request limiter closed")]
    LimiterClosed,
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::LoginRejected | Self::SessionExpired
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the upstream reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Upstream { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The upstream HTTP status, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Truncated preview of a response body for error messages.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
