//! Fabric configuration for fabricgate.
//!
//! TOML file plus `FABRICGATE_` environment overlay, credential resolution
//! (named env var, then plaintext), and translation to
//! `fabricgate_core::FabricConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use fabricgate_core::{BackendConfig, BackendKind, Credentials, FabricConfig, TlsVerification};

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "FABRICGATE_CONFIG";

const DEFAULT_SDWAN_PORT: u16 = 443;
const DEFAULT_SESSION_TTL_SECS: u64 = 1800;
const DEFAULT_WAPI_VERSION: &str = "v2.10";
const DEFAULT_PAGE_SIZE: u32 = 1000;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fabric '{fabric}': invalid {field}: {reason}")]
    Validation {
        fabric: String,
        field: String,
        reason: String,
    },

    #[error("no credentials configured for fabric '{fabric}'")]
    NoCredentials { fabric: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Settings applied to every fabric that does not override them.
    #[serde(default)]
    pub defaults: Defaults,

    /// Configured fabrics, in order.
    #[serde(default)]
    pub fabrics: Vec<FabricEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Defaults {
    /// Verify controller certificates against the system store.
    #[serde(default)]
    pub verify_tls: bool,

    /// Per-call timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// In-flight request cap per fabric.
    pub max_concurrency: Option<usize>,
}

/// One `[[fabrics]]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FabricEntry {
    /// Name callers use to address the fabric.
    pub name: String,

    /// Backend family: "dnac", "sdwan", "meraki" or "infoblox".
    pub kind: BackendKind,

    /// Controller host, optionally with scheme and port.
    pub host: Option<String>,

    /// vManage port.
    pub port: Option<u16>,

    pub username: Option<String>,

    /// Password (plaintext; prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Meraki API key (plaintext; prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable holding the Meraki API key.
    pub api_key_env: Option<String>,

    /// Meraki organization.
    pub org_id: Option<String>,

    /// Infoblox WAPI version, e.g. "v2.10".
    pub wapi_version: Option<String>,

    /// Infoblox results per page.
    pub page_size: Option<u32>,

    /// vManage session lifetime in seconds.
    pub session_ttl_secs: Option<u64>,

    pub timeout_secs: Option<u64>,
    pub max_concurrency: Option<usize>,

    /// Override `defaults.verify_tls`.
    pub verify_tls: Option<bool>,

    /// Path to a custom CA certificate; implies verification.
    pub ca_cert: Option<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `FABRICGATE_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "fabricgate", "fabricgate").map_or_else(
        || PathBuf::from("fabricgate.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `FABRICGATE_DEFAULTS__TIMEOUT_SECS=20`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading configuration");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FABRICGATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Resolve credentials and build the runtime configuration of every
    /// fabric, in file order.
    pub fn to_fabric_configs(&self) -> Result<Vec<FabricConfig>, ConfigError> {
        self.fabrics
            .iter()
            .map(|entry| entry.to_fabric_config(&self.defaults))
            .collect()
    }
}

impl FabricEntry {
    pub fn to_fabric_config(&self, defaults: &Defaults) -> Result<FabricConfig, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name", "must not be empty"));
        }

        let backend = match self.kind {
            BackendKind::Dnac => BackendConfig::Dnac {
                host: self.required_host()?,
                credentials: self.credentials()?,
            },
            BackendKind::Sdwan => BackendConfig::Sdwan {
                host: self.required_host()?,
                port: self.port.unwrap_or(DEFAULT_SDWAN_PORT),
                credentials: self.credentials()?,
                session_ttl: Duration::from_secs(
                    self.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS),
                ),
            },
            BackendKind::Meraki => BackendConfig::Meraki {
                api_key: resolve_secret(self.api_key_env.as_deref(), self.api_key.as_deref())
                    .ok_or_else(|| self.no_credentials())?,
                org_id: self
                    .org_id
                    .clone()
                    .filter(|org| !org.trim().is_empty())
                    .ok_or_else(|| self.invalid("org_id", "required for meraki fabrics"))?,
                host: self.host.clone(),
            },
            BackendKind::Infoblox => BackendConfig::Infoblox {
                host: self.required_host()?,
                credentials: self.credentials()?,
                wapi_version: self
                    .wapi_version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_WAPI_VERSION.into()),
                page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            },
        };

        let tls = if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else if self.verify_tls.unwrap_or(defaults.verify_tls) {
            TlsVerification::SystemDefaults
        } else {
            TlsVerification::DangerAcceptInvalid
        };

        let timeout = self
            .timeout_secs
            .or(defaults.timeout_secs)
            .map(Duration::from_secs);
        if timeout == Some(Duration::ZERO) {
            return Err(self.invalid("timeout_secs", "must be positive"));
        }

        let max_concurrency = self.max_concurrency.or(defaults.max_concurrency);
        if max_concurrency == Some(0) {
            return Err(self.invalid("max_concurrency", "must be positive"));
        }

        Ok(FabricConfig {
            name: self.name.clone(),
            backend,
            tls,
            timeout,
            max_concurrency,
        })
    }

    fn required_host(&self) -> Result<String, ConfigError> {
        self.host
            .clone()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| self.invalid("host", &format!("required for {} fabrics", self.kind)))
    }

    fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = self.username.clone().ok_or_else(|| self.no_credentials())?;
        let password = resolve_secret(self.password_env.as_deref(), self.password.as_deref())
            .ok_or_else(|| self.no_credentials())?;
        Ok(Credentials { username, password })
    }

    fn invalid(&self, field: &str, reason: &str) -> ConfigError {
        ConfigError::Validation {
            fabric: self.name.clone(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn no_credentials(&self) -> ConfigError {
        ConfigError::NoCredentials {
            fabric: self.name.clone(),
        }
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Named env var first, then the plaintext value from the file.
fn resolve_secret(env_name: Option<&str>, plaintext: Option<&str>) -> Option<SecretString> {
    resolve_secret_with(|name| std::env::var(name).ok(), env_name, plaintext)
}

fn resolve_secret_with(
    lookup: impl Fn(&str) -> Option<String>,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    if let Some(env_name) = env_name {
        if let Some(value) = lookup(env_name) {
            return Some(SecretString::from(value));
        }
        debug!(env_name, "credential variable not set, trying plaintext");
    }
    plaintext.map(|value| SecretString::from(value.to_owned()))
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"
        [defaults]
        timeout_secs = 20

        [[fabrics]]
        name = "campus"
        kind = "dnac"
        host = "dnac.example.com"
        username = "svc"
        password = "plain"

        [[fabrics]]
        name = "ww"
        kind = "sdwan"
        host = "vmanage.example.com"
        port = 8443
        username = "svc"
        password = "plain"
        session_ttl_secs = 600
        verify_tls = true

        [[fabrics]]
        name = "emea"
        kind = "meraki"
        api_key = "k-123"
        org_id = "123"

        [[fabrics]]
        name = "ipam"
        kind = "infoblox"
        host = "gm.example.com"
        username = "svc"
        password = "plain"
        ca_cert = "/etc/ssl/corp-ca.pem"
    "#;

    #[test]
    fn sample_file_translates_in_order() {
        let file = write_config(SAMPLE);
        let configs = load_config_from(file.path())
            .unwrap()
            .to_fabric_configs()
            .unwrap();

        let names: Vec<_> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["campus", "ww", "emea", "ipam"]);

        assert_eq!(configs[0].timeout, Some(Duration::from_secs(20)));
        assert_eq!(configs[0].tls, TlsVerification::DangerAcceptInvalid);

        let BackendConfig::Sdwan {
            port, session_ttl, ..
        } = &configs[1].backend
        else {
            panic!("expected sdwan");
        };
        assert_eq!(*port, 8443);
        assert_eq!(*session_ttl, Duration::from_secs(600));
        assert_eq!(configs[1].tls, TlsVerification::SystemDefaults);

        let BackendConfig::Meraki { api_key, host, .. } = &configs[2].backend else {
            panic!("expected meraki");
        };
        assert_eq!(api_key.expose_secret(), "k-123");
        assert_eq!(*host, None);

        let BackendConfig::Infoblox {
            wapi_version,
            page_size,
            ..
        } = &configs[3].backend
        else {
            panic!("expected infoblox");
        };
        assert_eq!(wapi_version, "v2.10");
        assert_eq!(*page_size, 1000);
        assert_eq!(
            configs[3].tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/corp-ca.pem"))
        );
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.fabrics.is_empty());
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        let env = |name: &str| (name == "VMANAGE_PASSWORD").then(|| "from-env".to_string());

        let secret = resolve_secret_with(env, Some("VMANAGE_PASSWORD"), Some("plain")).unwrap();
        assert_eq!(secret.expose_secret(), "from-env");

        let fallback = resolve_secret_with(env, Some("UNSET_PASSWORD"), Some("plain")).unwrap();
        assert_eq!(fallback.expose_secret(), "plain");

        assert!(resolve_secret_with(env, Some("UNSET_PASSWORD"), None).is_none());
    }

    #[test]
    fn meraki_without_key_has_no_credentials() {
        let file = write_config(
            r#"
            [[fabrics]]
            name = "emea"
            kind = "meraki"
            org_id = "123"
            "#,
        );
        let err = load_config_from(file.path())
            .unwrap()
            .to_fabric_configs()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref fabric } if fabric == "emea"));
    }

    #[test]
    fn dnac_without_host_is_invalid() {
        let file = write_config(
            r#"
            [[fabrics]]
            name = "campus"
            kind = "dnac"
            username = "svc"
            password = "pw"
            "#,
        );
        let err = load_config_from(file.path())
            .unwrap()
            .to_fabric_configs()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "host"));
    }

    #[test]
    fn unknown_kind_fails_to_load() {
        let file = write_config(
            r#"
            [[fabrics]]
            name = "x"
            kind = "aci"
            "#,
        );
        assert!(matches!(
            load_config_from(file.path()),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let file = write_config(
            r#"
            [defaults]
            max_concurrency = 0

            [[fabrics]]
            name = "emea"
            kind = "meraki"
            api_key = "k"
            org_id = "1"
            "#,
        );
        let err = load_config_from(file.path())
            .unwrap()
            .to_fabric_configs()
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "max_concurrency")
        );
    }
}
