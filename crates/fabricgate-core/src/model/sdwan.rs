// ── SD-WAN per-device sub-resources ──

use std::net::Ipv4Addr;

use fabricgate_api::RawObject;
use serde::{Deserialize, Serialize};

use super::net::Ipv4Net;

/// A synced interface of an SD-WAN router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// System IP of the owning device.
    pub device: Ipv4Addr,
    pub name: String,
    pub description: String,
    pub if_type: String,
    pub mac: String,
    pub vpn_id: String,
    pub ip: Ipv4Addr,
    pub network: Ipv4Net,
    pub raw: RawObject,
}

/// One VRRP group on an interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VrrpRecord {
    pub device: Ipv4Addr,
    pub if_name: String,
    pub group: u32,
    pub priority: u32,
    pub preempt: bool,
    /// This router currently holds the virtual IP.
    pub master: bool,
    pub virtual_ip: Ipv4Addr,
    pub raw: RawObject,
}

/// An advertised transport locator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlocRecord {
    pub device: Ipv4Addr,
    pub site_id: Option<u64>,
    pub system_ip: Ipv4Addr,
    pub private_ip: Ipv4Addr,
    pub public_ip: Ipv4Addr,
    pub preference: u64,
    pub weight: u64,
    pub encapsulation: String,
    /// Lower-cased transport color (`biz-internet`, `mpls`, ...).
    pub color: String,
    pub raw: RawObject,
}

/// A route-table entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    pub device: Ipv4Addr,
    pub vpn_id: String,
    pub prefix: Ipv4Net,
    pub next_hop: Option<Ipv4Addr>,
    pub interface: Option<String>,
    pub protocol: Option<String>,
    pub metric: Option<u64>,
    pub raw: RawObject,
}
