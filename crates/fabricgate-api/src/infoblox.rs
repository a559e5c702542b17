// Infoblox WAPI client.
//
// Auth: HTTP basic credentials on every request. Listings use WAPI paging
// (`_paging=1`, `_return_as_object=1`) and follow `next_page_id`.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::fanout::Limiter;
use crate::paginate::{CursorPage, collect_cursor};
use crate::transport::{RawResponse, TransportConfig, base_url};
use crate::{QueryParams, RawObject, into_objects};

/// Async client for one Infoblox grid master.
pub struct InfobloxClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    page_size: u32,
    limiter: Limiter,
}

impl InfobloxClient {
    pub const DEFAULT_WAPI_VERSION: &'static str = "v2.10";
    pub const DEFAULT_PAGE_SIZE: u32 = 1000;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_CONCURRENCY: usize = 10;

    pub fn new(
        host: &str,
        username: &str,
        password: SecretString,
        wapi_version: Option<&str>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let version = wapi_version.unwrap_or(Self::DEFAULT_WAPI_VERSION);
        Ok(Self {
            http: transport.build_client()?,
            base_url: base_url(host, &format!("wapi/{version}"))?,
            username: username.to_owned(),
            password,
            page_size: Self::DEFAULT_PAGE_SIZE,
            limiter: Limiter::new(Self::DEFAULT_CONCURRENCY),
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_limiter(mut self, limiter: Limiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Credentials travel with every request; nothing to refresh.
    #[allow(clippy::unused_async)]
    pub async fn ensure_valid(&self) -> bool {
        true
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn fetch_page(
        &self,
        url: Url,
        params: &QueryParams,
        cursor: Option<String>,
    ) -> Result<CursorPage, Error> {
        let query: Vec<(String, String)> = match cursor {
            None => params
                .iter()
                .cloned()
                .chain([
                    ("_paging".to_owned(), "1".to_owned()),
                    ("_max_results".to_owned(), self.page_size.to_string()),
                    ("_return_as_object".to_owned(), "1".to_owned()),
                ])
                .collect(),
            Some(page_id) => vec![("_page_id".to_owned(), page_id)],
        };
        debug!("GET {url} params={query:?}");

        let raw = self
            .limiter
            .run(async {
                let resp = self
                    .http
                    .get(url)
                    .basic_auth(&self.username, Some(self.password.expose_secret()))
                    .query(&query)
                    .send()
                    .await?;
                RawResponse::read(resp).await
            })
            .await?;

        if raw.status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "WAPI credentials rejected".into(),
            });
        }

        serde_json::from_value(raw.json()?).map_err(|e| Error::UnexpectedShape {
            message: format!("malformed WAPI page: {e}"),
        })
    }

    /// All objects of WAPI type `object` matching `params`.
    pub async fn list(&self, object: &str, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        let url = self.base_url.join(object)?;
        let items = collect_cursor(move |cursor| self.fetch_page(url.clone(), params, cursor)).await?;
        Ok(into_objects(items))
    }

    // ── Object types ─────────────────────────────────────────────────

    pub async fn list_networks(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        self.list("network", params).await
    }

    pub async fn list_fixed_addresses(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        self.list("fixedaddress", params).await
    }

    pub async fn list_filter_macs(&self, params: &QueryParams) -> Result<Vec<RawObject>, Error> {
        self.list("filtermac", params).await
    }

    pub async fn list_mac_filter_addresses(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<RawObject>, Error> {
        self.list("macfilteraddress", params).await
    }

    pub async fn list_extensible_attribute_defs(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<RawObject>, Error> {
        self.list("extensibleattributedef", params).await
    }
}
