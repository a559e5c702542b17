// Meraki Dashboard API v1 client.
//
// Auth: static bearer key sent as a default header; there is no session.
// Listings page through RFC 8288 `Link` headers.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::fanout::{Limiter, fan_out, merge_by_key, string_key};
use crate::paginate::{LinkedPage, Listing, collect_linked, next_link};
use crate::transport::{RawResponse, TransportConfig, base_url, resource_url};
use crate::{QueryParams, RawObject, into_objects};

/// Public Dashboard API host.
pub const DEFAULT_HOST: &str = "api.meraki.com";

/// Async client for one Meraki organization.
pub struct MerakiClient {
    http: reqwest::Client,
    base_url: Url,
    org_id: String,
    limiter: Limiter,
}

impl MerakiClient {
    pub const PAGE_SIZE: u32 = 500;
    pub const DEFAULT_CONCURRENCY: usize = 10;

    /// Build a client for `org_id`.
    ///
    /// `host` defaults to [`DEFAULT_HOST`]; regional dashboards
    /// (`api.meraki.cn`, ...) and test servers can be passed instead.
    pub fn new(
        api_key: &SecretString,
        org_id: &str,
        host: Option<&str>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = base_url(host.unwrap_or(DEFAULT_HOST), "api/v1")?;

        Ok(Self {
            http,
            base_url,
            org_id: org_id.to_owned(),
            limiter: Limiter::new(Self::DEFAULT_CONCURRENCY),
        })
    }

    pub fn with_limiter(mut self, limiter: Limiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Key-based auth has no session to refresh.
    #[allow(clippy::unused_async)]
    pub async fn ensure_valid(&self) -> bool {
        true
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn fetch_page(&self, url: Url, params: Option<&[(String, String)]>) -> Result<LinkedPage, Error> {
        debug!("GET {url}");

        let raw = self
            .limiter
            .run(async {
                let mut request = self.http.get(url);
                if let Some(params) = params {
                    request = request
                        .query(params)
                        .query(&[("perPage", Self::PAGE_SIZE.to_string())]);
                }
                RawResponse::read(request.send().await?).await
            })
            .await?;

        if raw.status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "Dashboard API key rejected".into(),
            });
        }

        let next = raw
            .headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        Ok(LinkedPage {
            body: raw.json()?,
            next,
        })
    }

    /// GET `first`, following `Link` pages.
    async fn get(&self, first: Url, params: &QueryParams) -> Result<Listing, Error> {
        collect_linked(first, move |url, is_first| {
            self.fetch_page(url, is_first.then_some(params))
        })
        .await
    }

    async fn get_list(&self, path: &str, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        match self.get(self.base_url.join(path)?, params).await? {
            Listing::Items(items) => Ok(into_objects(items)),
            Listing::Single(_) => Err(Error::UnexpectedShape {
                message: format!("expected a list from {path}"),
            }),
        }
    }

    /// GET one `id` from `collection`.
    async fn get_one(&self, collection: &str, id: &str) -> Result<RawObject, Error> {
        let url = resource_url(&self.base_url, collection, id)?;
        match self.get(url, &[]).await? {
            Listing::Single(serde_json::Value::Object(object)) => Ok(object),
            _ => Err(Error::UnexpectedShape {
                message: format!("expected a single object from {collection}/{id}"),
            }),
        }
    }

    // ── Organizations ────────────────────────────────────────────────

    /// Organizations visible to the API key.
    pub async fn list_organizations(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        self.get_list("organizations", params).await
    }

    pub async fn list_templates(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        let path = format!("organizations/{}/configTemplates", self.org_id);
        self.get_list(&path, params).await
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub async fn list_networks(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        let path = format!("organizations/{}/networks", self.org_id);
        self.get_list(&path, params).await
    }

    pub async fn get_network(&self, id: &str) -> Result<RawObject, Error> {
        self.get_one("networks", id).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Organization device inventory (no reachability).
    pub async fn list_inventory(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        let path = format!("organizations/{}/devices", self.org_id);
        self.get_list(&path, params).await
    }

    /// Organization device statuses (`online`, `offline`, `alerting`, ...).
    pub async fn list_device_statuses(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        let path = format!("organizations/{}/devices/statuses", self.org_id);
        self.get_list(&path, params).await
    }

    /// Inventory and statuses fetched concurrently and merged per `serial`.
    /// Fails if either listing fails.
    pub async fn list_devices(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        let inventory_path = format!("organizations/{}/devices", self.org_id);
        let status_path = format!("organizations/{}/devices/statuses", self.org_id);
        let sources = fan_out([
            self.get_list(&inventory_path, params),
            self.get_list(&status_path, params),
        ])
        .await?;

        let merged = merge_by_key(sources, string_key("serial"));
        debug!(devices = merged.len(), org = %self.org_id, "merged Meraki inventory");
        Ok(merged.into_values().collect())
    }

    pub async fn get_device(&self, serial: &str) -> Result<RawObject, Error> {
        self.get_one("devices", serial).await
    }
}
