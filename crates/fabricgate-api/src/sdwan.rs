// vManage (Catalyst SD-WAN Manager) client.
//
// Auth: form login on `/j_security_check` yields a session cookie, then
// `/dataservice/client/token` yields the CSRF token. Data endpoints live
// under `/dataservice/` and wrap their payload as `{"data": [...]}`.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::clock::Clock;
use crate::error::Error;
use crate::fanout::{Limiter, fan_out, merge_by_key, string_key};
use crate::session::{AuthFlow, Session, SessionManager};
use crate::transport::{RawResponse, TransportConfig, base_url};
use crate::{RawObject, expect_list, expect_object, unwrap_envelope};

const LOGIN_PATH: &str = "j_security_check";
const TOKEN_PATH: &str = "dataservice/client/token";

const CONTROLLERS_PATH: &str = "system/device/controllers";
const EDGES_PATH: &str = "system/device/vedges";
const STATUS_PATH: &str = "device";
const INTERFACES_PATH: &str = "device/interface/synced";
const TLOCS_PATH: &str = "device/omp/tlocs/advertised";
const VRRP_PATH: &str = "device/vrrp";
const ROUTES_PATH: &str = "device/ip/routetable";
const TEMPLATE_INPUT_PATH: &str = "template/device/config/input";
const TEMPLATE_ATTACH_PATH: &str = "template/device/config/attachfeature";

/// Async client for one vManage instance.
pub struct VmanageClient {
    http: reqwest::Client,
    base_url: Url,
    data_url: Url,
    session: SessionManager,
    limiter: Limiter,
}

/// `host` with `port` appended unless it already names one.
///
/// Bare IPv6 literals are bracketed; `[::1]:8443` and URLs with a scheme
/// pass through untouched.
fn authority(host: &str, port: u16) -> String {
    let host = host.trim();
    if host.contains("://") {
        return host.to_owned();
    }
    if let Some(rest) = host.strip_prefix('[') {
        return if rest.contains("]:") {
            host.to_owned()
        } else {
            format!("{host}:{port}")
        };
    }
    if host.parse::<Ipv6Addr>().is_ok() {
        return format!("[{host}]:{port}");
    }
    match host.rsplit_once(':') {
        Some((_, p)) if p.parse::<u16>().is_ok() => host.to_owned(),
        _ => format!("{host}:{port}"),
    }
}

impl VmanageClient {
    pub const DEFAULT_PORT: u16 = 443;
    pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1800);
    pub const DEFAULT_CONCURRENCY: usize = 40;

    /// `host` may carry its own port or scheme; otherwise `port` is used.
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: SecretString,
        session_ttl: Duration,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = base_url(&authority(host, port), "")?;
        let data_url = base_url.join("dataservice/")?;
        let flow = AuthFlow::FormCookie {
            login_url: base_url.join(LOGIN_PATH)?,
            csrf_url: base_url.join(TOKEN_PATH)?,
            username: username.to_owned(),
            password,
        };
        Ok(Self {
            session: SessionManager::new(http.clone(), flow, session_ttl),
            http,
            base_url,
            data_url,
            limiter: Limiter::new(Self::DEFAULT_CONCURRENCY),
        })
    }

    pub fn with_limiter(mut self, limiter: Limiter) -> Self {
        self.limiter = limiter;
        self
    }

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

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Log in unless the cached cookie is still fresh.
    pub async fn ensure_valid(&self) -> bool {
        self.session.ensure_valid().await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn send(
        &self,
        session: &Session,
        request: reqwest::RequestBuilder,
    ) -> Result<RawResponse, Error> {
        let raw = self
            .limiter
            .run(async {
                let resp = request.headers(session.headers().clone()).send().await?;
                RawResponse::read(resp).await
            })
            .await?;

        if raw.status == StatusCode::UNAUTHORIZED || raw.status == StatusCode::FORBIDDEN {
            self.session.expire(session).await;
            return Err(Error::SessionExpired);
        }
        // An expired cookie gets the login page back, with HTTP 200.
        if crate::session::looks_like_login_page(&raw.body) {
            self.session.expire(session).await;
            return Err(Error::SessionExpired);
        }
        Ok(raw)
    }

    /// GET a data endpoint and return its `data` array.
    async fn get_data(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<RawObject>, Error> {
        let session = self.session.session().await?;
        let url = self.data_url.join(path)?;
        debug!("GET {url} params={params:?}");

        let raw = self
            .send(&session, self.http.get(url).query(params))
            .await?;
        expect_list(unwrap_envelope(raw.json()?, "data")?)
    }

    /// POST a JSON body to a data endpoint and return the whole response.
    async fn post_data<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, Error> {
        let session = self.session.session().await?;
        let url = self.data_url.join(path)?;
        debug!("POST {url}");

        let raw = self.send(&session, self.http.post(url).json(body)).await?;
        raw.json()
    }

    fn device_param(system_ip: Ipv4Addr) -> [(&'static str, String); 1] {
        [("deviceId", system_ip.to_string())]
    }

    // ── Inventory ────────────────────────────────────────────────────

    /// Controller roster (vManage, vSmart, vBond).
    pub async fn list_controllers(&self) -> Result<Vec<RawObject>, Error> {
        self.get_data(CONTROLLERS_PATH, &[]).await
    }

    /// Edge roster (vEdge and cEdge routers).
    pub async fn list_edges(&self) -> Result<Vec<RawObject>, Error> {
        self.get_data(EDGES_PATH, &[]).await
    }

    /// Live device status: reachability, uptime, software version.
    pub async fn list_device_status(&self) -> Result<Vec<RawObject>, Error> {
        self.get_data(STATUS_PATH, &[]).await
    }

    /// Controllers, edges and live status merged into one object per
    /// `uuid`. Status fields override roster fields.
    ///
    /// The three listings run concurrently; if any of them fails the whole
    /// call fails.
    pub async fn list_devices(&self) -> Result<Vec<RawObject>, Error> {
        let sources = fan_out([
            self.get_data(CONTROLLERS_PATH, &[]),
            self.get_data(EDGES_PATH, &[]),
            self.get_data(STATUS_PATH, &[]),
        ])
        .await?;

        let merged = merge_by_key(sources, string_key("uuid"));
        debug!(devices = merged.len(), "merged vManage inventory");
        Ok(merged.into_values().collect())
    }

    // ── Per-device state ─────────────────────────────────────────────

    pub async fn list_interfaces(&self, system_ip: Ipv4Addr) -> Result<Vec<RawObject>, Error> {
        self.get_data(INTERFACES_PATH, &Self::device_param(system_ip))
            .await
    }

    pub async fn list_tlocs(&self, system_ip: Ipv4Addr) -> Result<Vec<RawObject>, Error> {
        self.get_data(TLOCS_PATH, &Self::device_param(system_ip))
            .await
    }

    pub async fn list_vrrp(&self, system_ip: Ipv4Addr) -> Result<Vec<RawObject>, Error> {
        self.get_data(VRRP_PATH, &Self::device_param(system_ip))
            .await
    }

    pub async fn list_routes(&self, system_ip: Ipv4Addr) -> Result<Vec<RawObject>, Error> {
        self.get_data(ROUTES_PATH, &Self::device_param(system_ip))
            .await
    }

    // ── Templates ────────────────────────────────────────────────────

    /// Current input values of the device template attached to `device_uuid`.
    pub async fn get_template_values(
        &self,
        device_uuid: &str,
        template_id: &str,
    ) -> Result<RawObject, Error> {
        let body = json!({
            "templateId": template_id,
            "deviceIds": [device_uuid],
            "isEdited": false,
            "isMasterEdited": false,
        });
        let data = unwrap_envelope(self.post_data(TEMPLATE_INPUT_PATH, &body).await?, "data")?;
        expect_list(data)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedShape {
                message: format!("no template values returned for device {device_uuid}"),
            })
    }

    /// Push new input values for a device and re-attach its template.
    ///
    /// `values` is the device's full variable map as returned by
    /// [`get_template_values`](Self::get_template_values), edited. The
    /// response (normally `{"id": "<action id>"}`) is returned as-is.
    pub async fn set_template_values(
        &self,
        device_uuid: &str,
        template_id: &str,
        values: RawObject,
    ) -> Result<RawObject, Error> {
        let mut device = values;
        device
            .entry("csv-deviceId")
            .or_insert_with(|| Value::String(device_uuid.to_owned()));

        let body = json!({
            "deviceTemplateList": [{
                "templateId": template_id,
                "device": [device],
                "isEdited": true,
                "isMasterEdited": false,
            }]
        });
        expect_object(self.post_data(TEMPLATE_ATTACH_PATH, &body).await?)
    }
}
