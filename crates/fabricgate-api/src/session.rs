// Session lifecycle for token- and cookie-authenticated controllers.
//
// A `SessionManager` owns the credentials of one backend instance and the
// headers obtained from its last successful login. Logins run under an
// async mutex, so concurrent callers hitting an expired session wait for
// the single in-flight handshake instead of racing their own.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, preview};

/// Header carrying the DNAC auth token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Header carrying the vManage CSRF token.
pub const XSRF_TOKEN_HEADER: &str = "X-XSRF-TOKEN";

/// Login handshake used to obtain a session.
#[derive(Debug, Clone)]
pub enum AuthFlow {
    /// Basic-auth POST; the token comes back as `{"Token": "..."}` and is
    /// sent as `X-Auth-Token` afterwards (DNAC).
    Token {
        login_url: Url,
        username: String,
        password: SecretString,
    },
    /// Form POST of `j_username`/`j_password`, session cookie from
    /// `Set-Cookie`, then a CSRF token fetched with that cookie (vManage).
    FormCookie {
        login_url: Url,
        csrf_url: Url,
        username: String,
        password: SecretString,
    },
}

/// Headers obtained from one successful login, stamped with the login time.
#[derive(Debug, Clone)]
pub struct Session {
    headers: HeaderMap,
    issued_at: DateTime<Utc>,
}

impl Session {
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// A session is valid iff `now - issued_at < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.issued_at)
            .to_std()
            .is_ok_and(|age| age < ttl)
    }
}

/// Per-backend-instance session holder.
pub struct SessionManager {
    http: reqwest::Client,
    flow: AuthFlow,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(http: reqwest::Client, flow: AuthFlow, ttl: Duration) -> Self {
        Self {
            http,
            flow,
            ttl,
            clock: Arc::new(SystemClock),
            current: Mutex::new(None),
        }
    }

    /// Replace the clock used for TTL checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Make sure a fresh session exists, logging in if needed.
    ///
    /// Returns `false` when the login handshake fails; the session is left
    /// unset and the next call tries again.
    pub async fn ensure_valid(&self) -> bool {
        match self.session().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "controller login failed");
                false
            }
        }
    }

    /// Return the current session, re-authenticating if it has expired.
    ///
    /// The lock is held across the handshake: exactly one login happens
    /// per expiry no matter how many callers arrive at once.
    pub async fn session(&self) -> Result<Session, Error> {
        let mut guard = self.current.lock().await;
        let now = self.clock.now();

        if let Some(session) = guard.as_ref() {
            if session.is_fresh(now, self.ttl) {
                return Ok(session.clone());
            }
            debug!(issued_at = %session.issued_at, "session expired");
        }

        *guard = None;
        let headers = self.login().await?;
        let session = Session {
            headers,
            issued_at: self.clock.now(),
        };
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Drop the session so the next call logs in again.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    /// Drop `stale` if it is still the current session.
    ///
    /// Used after a 401: a request that carried an older session must not
    /// throw away a newer one another caller just obtained.
    pub async fn expire(&self, stale: &Session) {
        let mut guard = self.current.lock().await;
        if guard
            .as_ref()
            .is_some_and(|s| s.issued_at == stale.issued_at)
        {
            debug!("session rejected by controller, clearing");
            *guard = None;
        }
    }

    async fn login(&self) -> Result<HeaderMap, Error> {
        match &self.flow {
            AuthFlow::Token {
                login_url,
                username,
                password,
            } => token_login(&self.http, login_url, username, password).await,
            AuthFlow::FormCookie {
                login_url,
                csrf_url,
                username,
                password,
            } => form_cookie_login(&self.http, login_url, csrf_url, username, password).await,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "Token")]
    token: String,
}

async fn token_login(
    http: &reqwest::Client,
    login_url: &Url,
    username: &str,
    password: &SecretString,
) -> Result<HeaderMap, Error> {
    debug!("requesting token at {}", login_url);

    let resp = http
        .post(login_url.clone())
        .basic_auth(username, Some(password.expose_secret()))
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if status != StatusCode::OK {
        return Err(Error::Authentication {
            message: format!("login failed (HTTP {status}): {}", preview(&body)),
        });
    }

    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| Error::Authentication {
            message: format!("malformed token response: {e}"),
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-auth-token"),
        sensitive_value(&token.token)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    info!(username, "token login successful");
    Ok(headers)
}

async fn form_cookie_login(
    http: &reqwest::Client,
    login_url: &Url,
    csrf_url: &Url,
    username: &str,
    password: &SecretString,
) -> Result<HeaderMap, Error> {
    debug!("logging in at {}", login_url);

    let resp = http
        .post(login_url.clone())
        .form(&[
            ("j_username", username),
            ("j_password", password.expose_secret()),
        ])
        .send()
        .await?;

    let status = resp.status();
    let cookie = session_cookie(resp.headers());
    let body = resp.text().await?;

    if status != StatusCode::OK {
        return Err(Error::Authentication {
            message: format!("login failed (HTTP {status})"),
        });
    }
    if looks_like_login_page(&body) {
        return Err(Error::LoginRejected);
    }
    let cookie = cookie.ok_or_else(|| Error::Authentication {
        message: "login response carried no session cookie".into(),
    })?;

    let cookie_value = sensitive_value(&cookie)?;
    let token_resp = http
        .get(csrf_url.clone())
        .header(COOKIE, cookie_value.clone())
        .send()
        .await?;
    let token_status = token_resp.status();
    let token = token_resp.text().await?;
    if token_status != StatusCode::OK {
        return Err(Error::Authentication {
            message: format!("CSRF token request failed (HTTP {token_status})"),
        });
    }
    // The token endpoint answers with the login page too when the cookie is bad.
    if looks_like_login_page(&token) {
        return Err(Error::LoginRejected);
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(COOKIE, cookie_value);
    headers.insert(
        HeaderName::from_static("x-xsrf-token"),
        sensitive_value(token.trim())?,
    );

    info!(username, "cookie login successful");
    Ok(headers)
}

/// First `name=value` pair of the `Set-Cookie` header, if any.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
}

/// vManage signals a failed login with HTTP 200 and its HTML login page.
pub(crate) fn looks_like_login_page(body: &str) -> bool {
    let head = body.trim_start();
    ["<html", "<!doctype html"].iter().any(|marker| {
        head.get(..marker.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(marker))
    })
}

fn sensitive_value(raw: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(raw).map_err(|e| Error::Authentication {
        message: format!("credential is not a valid header value: {e}"),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn session_at(issued_at: DateTime<Utc>) -> Session {
        Session {
            headers: HeaderMap::new(),
            issued_at,
        }
    }

    #[test]
    fn session_fresh_until_ttl() {
        let t0 = Utc::now();
        let session = session_at(t0);
        let ttl = Duration::from_secs(3600);

        assert!(session.is_fresh(t0, ttl));
        assert!(session.is_fresh(t0 + TimeDelta::seconds(3599), ttl));
        assert!(!session.is_fresh(t0 + TimeDelta::seconds(3600), ttl));
    }

    #[test]
    fn session_from_the_future_is_stale() {
        let t0 = Utc::now();
        let session = session_at(t0 + TimeDelta::seconds(10));
        assert!(!session.is_fresh(t0, Duration::from_secs(3600)));
    }

    #[test]
    fn detects_html_login_page() {
        assert!(looks_like_login_page("<html><body>login</body></html>"));
        assert!(looks_like_login_page("\n  <HTML>"));
        assert!(looks_like_login_page("<!DOCTYPE html><html>"));
        assert!(!looks_like_login_page(""));
        assert!(!looks_like_login_page("{\"data\": []}"));
    }

    #[test]
    fn extracts_first_cookie_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            SET_COOKIE,
            HeaderValue::from_static("JSESSIONID=abc123; Path=/; Secure; HttpOnly"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("JSESSIONID=abc123"));
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }
}
