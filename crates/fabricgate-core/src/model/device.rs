// ── Device domain types ──

use std::net::{IpAddr, Ipv4Addr};

use fabricgate_api::RawObject;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which controller family a fabric is backed by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    /// Wired campus controller (DNAC / Catalyst Center).
    Dnac,
    /// SD-WAN manager (vManage).
    Sdwan,
    /// Wireless dashboard (Meraki).
    Meraki,
    /// IP address management (Infoblox).
    Infoblox,
}

/// A normalized network device, whatever backend reported it.
///
/// Derived fields (hostname casing, stack size, uptime) are computed once
/// when the record is built and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DeviceRecord {
    /// Backend identifier: DNAC id, vManage uuid or Meraki serial.
    pub id: String,
    pub fabric: String,
    pub backend: BackendKind,

    /// Upper-cased, without domain suffix.
    pub hostname: Option<String>,
    pub management_ip: Option<IpAddr>,
    /// SD-WAN system IP; keys the per-device sub-resources.
    pub system_ip: Option<Ipv4Addr>,

    // Hardware
    pub platforms: Vec<String>,
    pub serials: Vec<String>,
    /// Number of stack members: serial count when a platform is known.
    pub stack_size: usize,
    pub model: Option<String>,
    pub software_version: Option<String>,
    pub uptime_days: Option<u64>,

    // Placement
    /// Role (DNAC) or persona (vManage) or product type (Meraki).
    pub role: Option<String>,
    pub site_id: Option<String>,
    pub network_id: Option<String>,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,

    // State
    pub is_reachable: bool,
    pub is_valid: bool,
    pub is_sync: bool,
    pub is_managed: bool,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Upstream payload minus certificate and history blobs.
    pub raw: RawObject,
}

impl DeviceRecord {
    /// Empty record for `id`; the `convert` constructors fill the rest.
    pub(crate) fn new(id: String, fabric: &str, backend: BackendKind, raw: RawObject) -> Self {
        Self {
            id,
            fabric: fabric.to_owned(),
            backend,
            hostname: None,
            management_ip: None,
            system_ip: None,
            platforms: Vec::new(),
            serials: Vec::new(),
            stack_size: 0,
            model: None,
            software_version: None,
            uptime_days: None,
            role: None,
            site_id: None,
            network_id: None,
            template_id: None,
            template_name: None,
            tags: Vec::new(),
            url: None,
            is_reachable: false,
            is_valid: false,
            is_sync: false,
            is_managed: false,
            latitude: None,
            longitude: None,
            raw,
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("SDWAN".parse::<BackendKind>().unwrap(), BackendKind::Sdwan);
        assert_eq!("meraki".parse::<BackendKind>().unwrap(), BackendKind::Meraki);
        assert!("aci".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Infoblox.to_string(), "infoblox");
    }
}
