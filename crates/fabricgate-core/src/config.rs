// ── Runtime fabric configuration ──
//
// These types describe *how* to reach each fabric's controller. They carry
// credentials and tuning but never touch disk; `fabricgate-config` builds
// them from the config file and environment and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::model::BackendKind;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Controllers are routinely deployed self-signed.
    #[default]
    DangerAcceptInvalid,
}

/// Username/password pair for session-based backends.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Backend-specific connection settings.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Dnac {
        host: String,
        credentials: Credentials,
    },
    Sdwan {
        host: String,
        port: u16,
        credentials: Credentials,
        session_ttl: Duration,
    },
    Meraki {
        api_key: SecretString,
        org_id: String,
        /// Dashboard host; `None` uses the public API host.
        host: Option<String>,
    },
    Infoblox {
        host: String,
        credentials: Credentials,
        wapi_version: String,
        page_size: u32,
    },
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Dnac { .. } => BackendKind::Dnac,
            Self::Sdwan { .. } => BackendKind::Sdwan,
            Self::Meraki { .. } => BackendKind::Meraki,
            Self::Infoblox { .. } => BackendKind::Infoblox,
        }
    }

    /// Per-call timeout used when the fabric does not set one.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Dnac { .. } | Self::Meraki { .. } => Duration::from_secs(5),
            Self::Sdwan { .. } => Duration::from_secs(10),
            Self::Infoblox { .. } => Duration::from_secs(15),
        }
    }

    /// In-flight request cap used when the fabric does not set one.
    pub fn default_concurrency(&self) -> usize {
        match self {
            Self::Sdwan { .. } => 40,
            _ => 10,
        }
    }
}

/// One configured fabric.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    /// Logical name callers use to address the fabric.
    pub name: String,
    pub backend: BackendConfig,
    pub tls: TlsVerification,
    /// Per-call timeout; `None` uses [`BackendConfig::default_timeout`].
    pub timeout: Option<Duration>,
    /// In-flight request cap; `None` uses [`BackendConfig::default_concurrency`].
    pub max_concurrency: Option<usize>,
}

impl FabricConfig {
    pub fn new(name: impl Into<String>, backend: BackendConfig) -> Self {
        Self {
            name: name.into(),
            backend,
            tls: TlsVerification::default(),
            timeout: None,
            max_concurrency: None,
        }
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout
            .unwrap_or_else(|| self.backend.default_timeout())
    }

    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or_else(|| self.backend.default_concurrency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            username: "admin".into(),
            password: SecretString::from("pw".to_string()),
        }
    }

    #[test]
    fn sdwan_defaults() {
        let fabric = FabricConfig::new(
            "ww",
            BackendConfig::Sdwan {
                host: "vmanage".into(),
                port: 443,
                credentials: creds(),
                session_ttl: Duration::from_secs(1800),
            },
        );
        assert_eq!(fabric.backend.kind(), BackendKind::Sdwan);
        assert_eq!(fabric.effective_concurrency(), 40);
        assert_eq!(fabric.effective_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides_win() {
        let mut fabric = FabricConfig::new(
            "ipam",
            BackendConfig::Infoblox {
                host: "ib".into(),
                credentials: creds(),
                wapi_version: "v2.10".into(),
                page_size: 1000,
            },
        );
        assert_eq!(fabric.effective_timeout(), Duration::from_secs(15));

        fabric.timeout = Some(Duration::from_secs(3));
        fabric.max_concurrency = Some(4);
        assert_eq!(fabric.effective_timeout(), Duration::from_secs(3));
        assert_eq!(fabric.effective_concurrency(), 4);
    }
}
