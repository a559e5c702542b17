// ── Core error types ──
//
// Errors surfaced to the route layer. Client-input problems (unknown
// fabric, bad parameters, missing entity) are kept apart from upstream
// failures so callers can map them to 4xx vs "no data" responses.
// The `From<fabricgate_api::Error>` impl folds transport-layer errors in.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Client-input errors ──────────────────────────────────────────
    #[error("Unknown fabric: {name}")]
    UnknownFabric { name: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Operation not supported: {operation} on fabric {fabric} ({backend})")]
    Unsupported {
        operation: String,
        fabric: String,
        backend: String,
    },

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The upstream call failed or returned something unusable.
    #[error("No data: {message}")]
    NoData { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Errors caused by the caller's request rather than by an upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownFabric { .. }
                | Self::InvalidInput { .. }
                | Self::NotFound { .. }
                | Self::Unsupported { .. }
        )
    }

    pub(crate) fn no_data(message: impl Into<String>) -> Self {
        Self::NoData {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fabricgate_api::Error> for CoreError {
    fn from(err: fabricgate_api::Error) -> Self {
        if err.is_auth_expired() {
            return CoreError::AuthenticationFailed {
                message: err.to_string(),
            };
        }
        if matches!(err, fabricgate_api::Error::InvalidIdentifier { .. }) {
            return CoreError::InvalidInput {
                message: err.to_string(),
            };
        }
        CoreError::NoData {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fabric_is_client_error() {
        let err = CoreError::UnknownFabric {
            name: "nowhere".into(),
        };
        assert!(err.is_client_error());
        assert!(!CoreError::no_data("empty").is_client_error());
    }

    #[test]
    fn login_page_maps_to_auth_failure() {
        let err: CoreError = fabricgate_api::Error::LoginRejected.into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn upstream_status_maps_to_no_data() {
        let err: CoreError = fabricgate_api::Error::Upstream {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NoData { .. }));
        assert!(!err.is_client_error());
    }

    #[test]
    fn bad_resource_id_is_client_error() {
        let err: CoreError = fabricgate_api::Error::InvalidIdentifier { id: "..".into() }.into();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
        assert!(err.is_client_error());
    }
}
