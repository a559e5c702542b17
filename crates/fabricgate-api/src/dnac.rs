// DNAC (Catalyst Center) intent API client.
//
// Auth: basic-auth token exchange, then `X-Auth-Token` on every call.
// Payloads are wrapped as `{"response": ...}`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::clock::Clock;
use crate::error::Error;
use crate::fanout::Limiter;
use crate::session::{AuthFlow, SessionManager};
use crate::transport::{RawResponse, TransportConfig, base_url, resource_url};
use crate::{QueryParams, RawObject, expect_list, expect_object, unwrap_envelope};

const LOGIN_PATH: &str = "dna/system/api/v1/auth/token";
const DEVICES_PATH: &str = "dna/intent/api/v1/network-device";
const SITES_PATH: &str = "dna/intent/api/v1/site";

/// Async client for one DNAC cluster.
pub struct DnacClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionManager,
    limiter: Limiter,
}

impl DnacClient {
    /// Tokens are valid for an hour.
    pub const SESSION_TTL: Duration = Duration::from_secs(3600);
    pub const DEFAULT_CONCURRENCY: usize = 10;

    pub fn new(
        host: &str,
        username: &str,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = base_url(host, "")?;
        let flow = AuthFlow::Token {
            login_url: base_url.join(LOGIN_PATH)?,
            username: username.to_owned(),
            password,
        };
        Ok(Self {
            session: SessionManager::new(http.clone(), flow, Self::SESSION_TTL),
            http,
            base_url,
            limiter: Limiter::new(Self::DEFAULT_CONCURRENCY),
        })
    }

    /// Replace the request limiter.
    pub fn with_limiter(mut self, limiter: Limiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replace the clock used for token TTL checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Log in unless the cached token is still fresh.
    pub async fn ensure_valid(&self) -> bool {
        self.session.ensure_valid().await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET `url` and strip the `response` envelope.
    async fn get(&self, url: Url, params: &QueryParams) -> Result<Value, Error> {
        let session = self.session.session().await?;
        debug!("GET {url}");

        let raw = self
            .limiter
            .run(async {
                let resp = self
                    .http
                    .get(url)
                    .headers(session.headers().clone())
                    .query(params)
                    .send()
                    .await?;
                RawResponse::read(resp).await
            })
            .await?;

        if raw.status == StatusCode::UNAUTHORIZED {
            self.session.expire(&session).await;
            return Err(Error::SessionExpired);
        }

        unwrap_envelope(raw.json()?, "response")
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Network devices, filtered by the caller's query parameters.
    pub async fn list_devices(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        expect_list(self.get(self.base_url.join(DEVICES_PATH)?, params).await?)
    }

    pub async fn get_device(&self, id: &str) -> Result<RawObject, Error> {
        let url = resource_url(&self.base_url, DEVICES_PATH, id)?;
        expect_object(self.get(url, &[]).await?)
    }

    // ── Sites ────────────────────────────────────────────────────────

    pub async fn list_sites(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        expect_list(self.get(self.base_url.join(SITES_PATH)?, params).await?)
    }
}
