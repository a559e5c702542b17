// ── Inventory facade ──
//
// Every read and write goes through here: the fabric is looked up first
// (an unknown name never reaches an upstream), the backend client is
// called, and its raw objects are normalized into records.

use std::net::Ipv4Addr;
use std::sync::Arc;

use fabricgate_api::{Clock, QueryParams, RawObject, SystemClock};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::convert::{dnac, infoblox, meraki, sdwan};
use crate::error::CoreError;
use crate::model::{
    BackendKind, DeviceRecord, FilterMac, FixedAddress, InterfaceRecord, IpamNetwork,
    MacFilterAddress, NetworkRecord, OrgRecord, RouteRecord, SiteRecord, TemplateRecord,
    TlocRecord, VrrpRecord,
};
use crate::registry::{Backend, FabricRegistry};

/// Normalized, multi-fabric view over the configured controllers.
#[derive(Clone)]
pub struct Inventory {
    registry: Arc<FabricRegistry>,
    clock: Arc<dyn Clock>,
}

impl Inventory {
    pub fn new(registry: Arc<FabricRegistry>) -> Self {
        Self {
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for epoch-based uptime.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &FabricRegistry {
        &self.registry
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Every device of `fabric`.
    ///
    /// `params` are forwarded to DNAC and Meraki. vManage listings take
    /// none, and vManage entries without a hostname are left out.
    pub async fn list_devices(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<DeviceRecord>, CoreError> {
        let backend = self.registry.lookup(fabric)?;
        debug!(fabric, kind = %backend.kind(), "listing devices");

        let devices = match backend {
            Backend::Dnac(client) => client
                .list_devices(params)
                .await?
                .iter()
                .filter_map(|raw| dnac::device_from_dnac(raw, fabric))
                .collect(),
            Backend::Sdwan(client) => {
                let now = self.clock.now();
                client
                    .list_devices()
                    .await?
                    .iter()
                    .filter_map(|raw| sdwan::device_from_sdwan(raw, fabric, now))
                    .filter(|device| device.hostname.is_some())
                    .collect()
            }
            Backend::Meraki(client) => client
                .list_devices(params)
                .await?
                .iter()
                .filter_map(|raw| meraki::device_from_meraki(raw, fabric))
                .collect(),
            Backend::Infoblox(_) => return Err(unsupported("list_devices", fabric, backend)),
        };
        Ok(devices)
    }

    /// One device by its backend identifier.
    pub async fn get_device(&self, fabric: &str, id: &str) -> Result<DeviceRecord, CoreError> {
        let backend = self.registry.lookup(fabric)?;
        let not_found = || CoreError::NotFound {
            entity_type: "device".into(),
            identifier: id.to_owned(),
        };

        match backend {
            Backend::Dnac(client) => {
                let raw = client.get_device(id).await.map_err(|e| {
                    if e.is_not_found() { not_found() } else { e.into() }
                })?;
                dnac::device_from_dnac(&raw, fabric).ok_or_else(not_found)
            }
            // vManage has no single-device endpoint that returns the
            // merged roster and status view.
            Backend::Sdwan(_) => self
                .list_devices(fabric, &[])
                .await?
                .into_iter()
                .find(|device| device.id == id)
                .ok_or_else(not_found),
            Backend::Meraki(client) => {
                let raw = client.get_device(id).await.map_err(|e| {
                    if e.is_not_found() { not_found() } else { e.into() }
                })?;
                meraki::device_from_meraki(&raw, fabric).ok_or_else(not_found)
            }
            Backend::Infoblox(_) => Err(unsupported("get_device", fabric, backend)),
        }
    }

    /// Devices of every fabric backed by `kind`, concatenated in
    /// configuration order. Fails if any fabric fails.
    pub async fn list_fleet_devices(
        &self,
        kind: BackendKind,
    ) -> Result<Vec<DeviceRecord>, CoreError> {
        let names = self.registry.names_of(kind);
        debug!(%kind, fabrics = names.len(), "listing fleet devices");
        let per_fabric = futures_util::future::try_join_all(
            names.iter().map(|name| self.list_devices(name, &[])),
        )
        .await?;
        Ok(per_fabric.into_iter().flatten().collect())
    }

    // ── Sites ────────────────────────────────────────────────────────

    pub async fn list_sites(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<SiteRecord>, CoreError> {
        let backend = self.registry.lookup(fabric)?;
        let Backend::Dnac(client) = backend else {
            return Err(unsupported("list_sites", fabric, backend));
        };
        Ok(client
            .list_sites(params)
            .await?
            .iter()
            .filter_map(|raw| dnac::site_from_dnac(raw, fabric))
            .collect())
    }

    // ── SD-WAN device state ──────────────────────────────────────────

    pub async fn get_device_interfaces(
        &self,
        device: &DeviceRecord,
    ) -> Result<Vec<InterfaceRecord>, CoreError> {
        let (client, system_ip) = self.sdwan_device(device, "get_device_interfaces")?;
        Ok(client
            .list_interfaces(system_ip)
            .await?
            .iter()
            .filter_map(|raw| sdwan::interface_from_sdwan(raw, system_ip))
            .collect())
    }

    pub async fn get_device_tlocs(
        &self,
        device: &DeviceRecord,
    ) -> Result<Vec<TlocRecord>, CoreError> {
        let (client, system_ip) = self.sdwan_device(device, "get_device_tlocs")?;
        Ok(client
            .list_tlocs(system_ip)
            .await?
            .iter()
            .filter_map(|raw| sdwan::tloc_from_sdwan(raw, system_ip))
            .collect())
    }

    pub async fn get_device_vrrp(
        &self,
        device: &DeviceRecord,
    ) -> Result<Vec<VrrpRecord>, CoreError> {
        let (client, system_ip) = self.sdwan_device(device, "get_device_vrrp")?;
        Ok(client
            .list_vrrp(system_ip)
            .await?
            .iter()
            .filter_map(|raw| sdwan::vrrp_from_sdwan(raw, system_ip))
            .collect())
    }

    /// IPv4 routing table of the device whose system IP is `device_id`.
    pub async fn get_device_route_table(
        &self,
        fabric: &str,
        device_id: &str,
    ) -> Result<Vec<RouteRecord>, CoreError> {
        let backend = self.registry.lookup(fabric)?;
        let Backend::Sdwan(client) = backend else {
            return Err(unsupported("get_device_route_table", fabric, backend));
        };
        let system_ip: Ipv4Addr = device_id.parse().map_err(|_| CoreError::InvalidInput {
            message: format!("device id {device_id:?} is not a system IP"),
        })?;
        Ok(client
            .list_routes(system_ip)
            .await?
            .iter()
            .filter_map(|raw| sdwan::route_from_sdwan(raw, system_ip))
            .collect())
    }

    pub async fn get_device_template_values(
        &self,
        fabric: &str,
        device_id: &str,
        template_id: &str,
    ) -> Result<RawObject, CoreError> {
        let backend = self.registry.lookup(fabric)?;
        let Backend::Sdwan(client) = backend else {
            return Err(unsupported("get_device_template_values", fabric, backend));
        };
        Ok(client.get_template_values(device_id, template_id).await?)
    }

    pub async fn set_device_template_values(
        &self,
        fabric: &str,
        device_id: &str,
        template_id: &str,
        payload: RawObject,
    ) -> Result<RawObject, CoreError> {
        let backend = self.registry.lookup(fabric)?;
        let Backend::Sdwan(client) = backend else {
            return Err(unsupported("set_device_template_values", fabric, backend));
        };
        Ok(client
            .set_template_values(device_id, template_id, payload)
            .await?)
    }

    fn sdwan_device(
        &self,
        device: &DeviceRecord,
        operation: &str,
    ) -> Result<(&fabricgate_api::VmanageClient, Ipv4Addr), CoreError> {
        let backend = self.registry.lookup(&device.fabric)?;
        let Backend::Sdwan(client) = backend else {
            return Err(unsupported(operation, &device.fabric, backend));
        };
        let system_ip = device.system_ip.ok_or_else(|| {
            CoreError::no_data(format!("device {} has no system IP", device.id))
        })?;
        Ok((client.as_ref(), system_ip))
    }

    // ── Wireless ─────────────────────────────────────────────────────

    pub async fn list_organizations(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<OrgRecord>, CoreError> {
        let client = self.meraki(fabric, "list_organizations")?;
        Ok(client
            .list_organizations(params)
            .await?
            .iter()
            .filter_map(|raw| meraki::org_from_meraki(raw, fabric))
            .collect())
    }

    pub async fn list_networks(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<NetworkRecord>, CoreError> {
        let client = self.meraki(fabric, "list_networks")?;
        Ok(client
            .list_networks(params)
            .await?
            .iter()
            .filter_map(|raw| meraki::network_from_meraki(raw, fabric))
            .collect())
    }

    pub async fn get_network(&self, fabric: &str, id: &str) -> Result<NetworkRecord, CoreError> {
        let client = self.meraki(fabric, "get_network")?;
        let not_found = || CoreError::NotFound {
            entity_type: "network".into(),
            identifier: id.to_owned(),
        };
        let raw = client
            .get_network(id)
            .await
            .map_err(|e| if e.is_not_found() { not_found() } else { e.into() })?;
        meraki::network_from_meraki(&raw, fabric).ok_or_else(not_found)
    }

    pub async fn list_templates(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<TemplateRecord>, CoreError> {
        let client = self.meraki(fabric, "list_templates")?;
        Ok(client
            .list_templates(params)
            .await?
            .iter()
            .filter_map(|raw| meraki::template_from_meraki(raw, fabric))
            .collect())
    }

    fn meraki(
        &self,
        fabric: &str,
        operation: &str,
    ) -> Result<&fabricgate_api::MerakiClient, CoreError> {
        match self.registry.lookup(fabric)? {
            Backend::Meraki(client) => Ok(client.as_ref()),
            other => Err(unsupported(operation, fabric, other)),
        }
    }

    // ── IPAM ─────────────────────────────────────────────────────────

    pub async fn list_ipam_networks(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<IpamNetwork>, CoreError> {
        let client = self.infoblox(fabric, "list_ipam_networks")?;
        Ok(decode_all(client.list_networks(params).await?))
    }

    pub async fn list_fixed_addresses(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<FixedAddress>, CoreError> {
        let client = self.infoblox(fabric, "list_fixed_addresses")?;
        Ok(decode_all(client.list_fixed_addresses(params).await?))
    }

    pub async fn list_filter_macs(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<FilterMac>, CoreError> {
        let client = self.infoblox(fabric, "list_filter_macs")?;
        Ok(decode_all(client.list_filter_macs(params).await?))
    }

    pub async fn list_mac_filter_addresses(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<MacFilterAddress>, CoreError> {
        let client = self.infoblox(fabric, "list_mac_filter_addresses")?;
        Ok(decode_all(client.list_mac_filter_addresses(params).await?))
    }

    /// Extensible attribute definitions, passed through unmodeled.
    pub async fn list_extensible_attribute_defs(
        &self,
        fabric: &str,
        params: &QueryParams,
    ) -> Result<Vec<RawObject>, CoreError> {
        let client = self.infoblox(fabric, "list_extensible_attribute_defs")?;
        Ok(client.list_extensible_attribute_defs(params).await?)
    }

    fn infoblox(
        &self,
        fabric: &str,
        operation: &str,
    ) -> Result<&fabricgate_api::InfobloxClient, CoreError> {
        match self.registry.lookup(fabric)? {
            Backend::Infoblox(client) => Ok(client.as_ref()),
            other => Err(unsupported(operation, fabric, other)),
        }
    }

    // ── Health ───────────────────────────────────────────────────────

    /// Session check for every configured fabric, in configuration order.
    pub async fn check_sessions(&self) -> Vec<(String, bool)> {
        let checks = self.registry.names().map(|name| async move {
            let ok = match self.registry.lookup(name) {
                Ok(backend) => backend.ensure_valid().await,
                Err(_) => false,
            };
            (name.to_owned(), ok)
        });
        futures_util::future::join_all(checks).await
    }
}

fn decode_all<T: DeserializeOwned>(objects: Vec<RawObject>) -> Vec<T> {
    objects.into_iter().filter_map(infoblox::ipam_from_wapi).collect()
}

fn unsupported(operation: &str, fabric: &str, backend: &Backend) -> CoreError {
    CoreError::Unsupported {
        operation: operation.to_owned(),
        fabric: fabric.to_owned(),
        backend: backend.kind().to_string(),
    }
}
