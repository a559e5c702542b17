// Shared transport configuration for building reqwest::Client instances.
//
// Every controller client shares TLS, timeout, and user-agent settings
// through this module. Clients that authenticate with a static key pass
// their auth headers in as default headers.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

use crate::error::{Error, preview};

const USER_AGENT: &str = concat!("fabricgate/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (controllers commonly run self-signed).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Bound applied to every individual HTTP call.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by static-key clients to inject their `Authorization` header.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build a controller base URL ending in `/`.
///
/// A bare host (`vmanage.example.com`, `10.0.0.1:8443`) is served over
/// HTTPS; a value that already carries a scheme is used as-is, which lets
/// tests point clients at a local mock server.
pub(crate) fn base_url(host: &str, path: &str) -> Result<Url, Error> {
    let host = host.trim().trim_end_matches('/');
    let root = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    };
    let path = path.trim_matches('/');
    let full = if path.is_empty() {
        format!("{root}/")
    } else {
        format!("{root}/{path}/")
    };
    Ok(Url::parse(&full)?)
}

/// `collection` under `base`, with `id` appended as one path segment.
///
/// `/`, `?`, `#` and `%` in the id are percent-encoded. Empty ids and the
/// dot segments `.` and `..` are refused.
pub(crate) fn resource_url(base: &Url, collection: &str, id: &str) -> Result<Url, Error> {
    let invalid = || Error::InvalidIdentifier { id: id.to_owned() };
    if id.is_empty() || id == "." || id == ".." {
        return Err(invalid());
    }
    let mut url = base.join(collection)?;
    url.path_segments_mut()
        .map_err(|()| invalid())?
        .pop_if_empty()
        .push(id);
    Ok(url)
}

// ── Response capture ─────────────────────────────────────────────────

/// A fully read HTTP response.
///
/// Reading the body inside the limiter keeps the permit held for the
/// whole exchange, not just until headers arrive.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub(crate) async fn read(resp: reqwest::Response) -> Result<Self, Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Parse the body as JSON, or map a non-200 status to `Upstream`.
    pub(crate) fn json(&self) -> Result<Value, Error> {
        if self.status != StatusCode::OK {
            return Err(Error::Upstream {
                status: self.status.as_u16(),
                message: if self.body.trim().is_empty() {
                    self.status.to_string()
                } else {
                    preview(&self.body).to_owned()
                },
            });
        }
        serde_json::from_str(&self.body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&self.body)),
            body: self.body.clone(),
        })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_file_is_a_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/ca.pem")),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(config.build_client(), Err(Error::Tls(_))));
    }

    #[test]
    fn bare_host_gets_https_and_trailing_slash() {
        let url = base_url("vmanage.example.com:8443", "").unwrap();
        assert_eq!(url.as_str(), "https://vmanage.example.com:8443/");

        let url = base_url("ib.example.com", "wapi/v2.10").unwrap();
        assert_eq!(url.as_str(), "https://ib.example.com/wapi/v2.10/");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = base_url("http://127.0.0.1:4000/", "api/v1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/api/v1/");
    }

    #[test]
    fn resource_id_is_one_escaped_segment() {
        let base = base_url("dnac.example.com", "").unwrap();
        let url = resource_url(&base, "dna/intent/api/v1/network-device", "a/b?c#d").unwrap();
        assert_eq!(
            url.as_str(),
            "https://dnac.example.com/dna/intent/api/v1/network-device/a%2Fb%3Fc%23d"
        );

        let url = resource_url(&base, "devices/", "Q2XX-1234").unwrap();
        assert_eq!(url.path(), "/devices/Q2XX-1234");
    }

    #[test]
    fn dot_segment_ids_are_refused() {
        let base = base_url("api.meraki.com", "api/v1").unwrap();
        for id in ["", ".", ".."] {
            let result = resource_url(&base, "networks", id);
            assert!(matches!(result, Err(Error::InvalidIdentifier { .. })), "{id:?}");
        }
    }

    #[test]
    fn non_200_is_upstream_error() {
        let raw = RawResponse {
            status: StatusCode::BAD_GATEWAY,
            headers: HeaderMap::new(),
            body: String::new(),
        };
        assert!(matches!(raw.json(), Err(Error::Upstream { status: 502, .. })));
    }

    #[test]
    fn malformed_body_is_deserialization_error() {
        let raw = RawResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: "{not json".into(),
        };
        assert!(matches!(raw.json(), Err(Error::Deserialization { .. })));
    }

    #[test]
    fn default_accepts_self_signed() {
        let config = TransportConfig::default();
        assert_eq!(config.tls, TlsMode::DangerAcceptInvalid);
        assert!(config.build_client().is_ok());
    }
}
