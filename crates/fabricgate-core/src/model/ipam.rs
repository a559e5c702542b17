// ── IPAM object types ──
//
// Deserialized straight from WAPI objects; `_ref` is the WAPI object
// reference used for follow-up calls.

use std::net::Ipv4Addr;

use fabricgate_api::RawObject;
use serde::{Deserialize, Serialize};

use super::net::Ipv4Net;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpamNetwork {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub network: Ipv4Net,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub extattrs: Option<RawObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAddress {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub ipv4addr: Ipv4Addr,
    pub mac: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub extattrs: Option<RawObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMac {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacFilterAddress {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub filter: String,
    pub mac: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub extattrs: Option<RawObject>,
}
