// ── Fabric registry ──
//
// Maps fabric names to their controller clients. Built once at startup
// from configuration, then shared read-only.

use std::sync::Arc;

use fabricgate_api::{
    Clock, DnacClient, InfobloxClient, Limiter, MerakiClient, SystemClock, TlsMode,
    TransportConfig, VmanageClient,
};
use indexmap::IndexMap;
use tracing::info;

use crate::config::{BackendConfig, FabricConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::BackendKind;

/// A configured controller client.
#[derive(Clone)]
pub enum Backend {
    Dnac(Arc<DnacClient>),
    Sdwan(Arc<VmanageClient>),
    Meraki(Arc<MerakiClient>),
    Infoblox(Arc<InfobloxClient>),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Dnac(_) => BackendKind::Dnac,
            Self::Sdwan(_) => BackendKind::Sdwan,
            Self::Meraki(_) => BackendKind::Meraki,
            Self::Infoblox(_) => BackendKind::Infoblox,
        }
    }

    /// Make sure the backend holds a usable session.
    pub async fn ensure_valid(&self) -> bool {
        match self {
            Self::Dnac(c) => c.ensure_valid().await,
            Self::Sdwan(c) => c.ensure_valid().await,
            Self::Meraki(c) => c.ensure_valid().await,
            Self::Infoblox(c) => c.ensure_valid().await,
        }
    }

    /// Build the client described by `config`.
    pub fn from_config(config: &FabricConfig, clock: &Arc<dyn Clock>) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.effective_timeout(),
        };
        let limiter = Limiter::new(config.effective_concurrency());
        let build_err = |e: fabricgate_api::Error| CoreError::Config {
            message: format!("fabric {:?}: {e}", config.name),
        };

        let backend = match &config.backend {
            BackendConfig::Dnac { host, credentials } => Self::Dnac(Arc::new(
                DnacClient::new(
                    host,
                    &credentials.username,
                    credentials.password.clone(),
                    &transport,
                )
                .map_err(build_err)?
                .with_limiter(limiter)
                .with_clock(Arc::clone(clock)),
            )),
            BackendConfig::Sdwan {
                host,
                port,
                credentials,
                session_ttl,
            } => Self::Sdwan(Arc::new(
                VmanageClient::new(
                    host,
                    *port,
                    &credentials.username,
                    credentials.password.clone(),
                    *session_ttl,
                    &transport,
                )
                .map_err(build_err)?
                .with_limiter(limiter)
                .with_clock(Arc::clone(clock)),
            )),
            BackendConfig::Meraki {
                api_key,
                org_id,
                host,
            } => Self::Meraki(Arc::new(
                MerakiClient::new(api_key, org_id, host.as_deref(), &transport)
                    .map_err(build_err)?
                    .with_limiter(limiter),
            )),
            BackendConfig::Infoblox {
                host,
                credentials,
                wapi_version,
                page_size,
            } => Self::Infoblox(Arc::new(
                InfobloxClient::new(
                    host,
                    &credentials.username,
                    credentials.password.clone(),
                    Some(wapi_version.as_str()),
                    &transport,
                )
                .map_err(build_err)?
                .with_page_size(*page_size)
                .with_limiter(limiter),
            )),
        };
        Ok(backend)
    }
}

/// Name → backend lookup, in configuration order.
pub struct FabricRegistry {
    fabrics: IndexMap<String, Backend>,
}

impl FabricRegistry {
    /// Build every configured fabric. Duplicate names are rejected.
    pub fn from_configs(configs: &[FabricConfig]) -> Result<Self, CoreError> {
        Self::from_configs_with_clock(configs, Arc::new(SystemClock))
    }

    pub fn from_configs_with_clock(
        configs: &[FabricConfig],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        let backends = configs
            .iter()
            .map(|config| Ok((config.name.clone(), Backend::from_config(config, &clock)?)))
            .collect::<Result<Vec<_>, CoreError>>()?;
        let registry = Self::from_backends(backends)?;
        info!(fabrics = registry.len(), "fabric registry ready");
        Ok(registry)
    }

    /// Register pre-built clients.
    pub fn from_backends(
        backends: impl IntoIterator<Item = (String, Backend)>,
    ) -> Result<Self, CoreError> {
        let mut fabrics = IndexMap::new();
        for (name, backend) in backends {
            if name.trim().is_empty() {
                return Err(CoreError::Config {
                    message: "fabric name must not be empty".into(),
                });
            }
            if fabrics.contains_key(&name) {
                return Err(CoreError::Config {
                    message: format!("duplicate fabric name {name:?}"),
                });
            }
            fabrics.insert(name, backend);
        }
        Ok(Self { fabrics })
    }

    /// The backend serving `name`.
    pub fn lookup(&self, name: &str) -> Result<&Backend, CoreError> {
        self.fabrics
            .get(name)
            .ok_or_else(|| CoreError::UnknownFabric {
                name: name.to_owned(),
            })
    }

    /// Names of every fabric backed by `kind`, in configuration order.
    pub fn names_of(&self, kind: BackendKind) -> Vec<&str> {
        self.fabrics
            .iter()
            .filter(|(_, backend)| backend.kind() == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fabrics.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fabrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fabrics.is_empty()
    }
}
