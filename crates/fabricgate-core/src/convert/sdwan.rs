// ── vManage conversions ──

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use fabricgate_api::RawObject;
use tracing::debug;

use super::{
    bool_field, clean_model, f64_field, ip_field, ipv4_field, normalize_hostname, parsed_field,
    stack_size, str_field, strip_raw, u64_field,
};
use crate::model::{
    BackendKind, DeviceRecord, InterfaceRecord, Ipv4Net, RouteRecord, TlocRecord, VrrpRecord,
};
use crate::uptime::days_since_epoch_millis;

/// Build a device from a merged roster + status object. Objects without a
/// `uuid` are dropped.
pub fn device_from_sdwan(raw: &RawObject, fabric: &str, now: DateTime<Utc>) -> Option<DeviceRecord> {
    let Some(uuid) = str_field(raw, "uuid") else {
        debug!(fabric, "vManage device without uuid");
        return None;
    };
    let mut device = DeviceRecord::new(uuid, fabric, BackendKind::Sdwan, strip_raw(raw));

    device.hostname = str_field(raw, "host-name").map(|h| normalize_hostname(&h));
    device.system_ip = ipv4_field(raw, "system-ip");
    device.management_ip = ip_field(raw, "managementSystemIP")
        .filter(|ip| !ip.is_unspecified())
        .or_else(|| device.system_ip.map(Into::into));

    let raw_model = str_field(raw, "deviceModel");
    device.platforms = raw_model.iter().cloned().collect();
    device.serials = ["chasisNumber", "serialNumber", "board-serial"]
        .iter()
        .find_map(|key| str_field(raw, key))
        .into_iter()
        .collect();
    device.stack_size = stack_size(&device.platforms, &device.serials);
    device.model = raw_model.as_deref().map(clean_model);
    device.software_version = str_field(raw, "version");
    device.uptime_days = raw
        .get("uptime-date")
        .and_then(|since| days_since_epoch_millis(since, now));

    device.role = str_field(raw, "personality");
    device.site_id = str_field(raw, "site-id");
    device.template_id = str_field(raw, "templateId");
    device.template_name = str_field(raw, "template");

    device.is_managed = str_field(raw, "managed-by").is_some_and(|by| by != "Unmanaged");
    device.is_valid = str_field(raw, "validity").as_deref() == Some("valid");
    device.is_sync = str_field(raw, "configStatusMessage").as_deref() == Some("In Sync");
    device.is_reachable = str_field(raw, "reachability").as_deref() == Some("reachable");

    device.latitude = f64_field(raw, "latitude");
    device.longitude = f64_field(raw, "longitude");

    Some(device)
}

/// Interface entry; requires name, type, MAC, VPN and an IPv4 address
/// with its netmask.
pub fn interface_from_sdwan(raw: &RawObject, device: Ipv4Addr) -> Option<InterfaceRecord> {
    let ip: Ipv4Addr = ipv4_field(raw, "ip-address")?;
    let mask: Ipv4Addr = ipv4_field(raw, "ipv4-subnet-mask")?;
    Some(InterfaceRecord {
        device,
        name: str_field(raw, "ifname")?,
        description: str_field(raw, "description").unwrap_or_else(|| "N/A".to_owned()),
        if_type: str_field(raw, "interface-type")?,
        mac: str_field(raw, "hwaddr")?,
        vpn_id: str_field(raw, "vpn-id")?,
        ip,
        network: Ipv4Net::from_addr_mask(ip, mask).ok()?,
        raw: raw.clone(),
    })
}

pub fn tloc_from_sdwan(raw: &RawObject, device: Ipv4Addr) -> Option<TlocRecord> {
    raw.get("site-id")?;
    Some(TlocRecord {
        device,
        site_id: u64_field(raw, "site-id"),
        system_ip: ipv4_field(raw, "ip")?,
        private_ip: ipv4_field(raw, "tloc-private-ip")?,
        public_ip: ipv4_field(raw, "tloc-public-ip")?,
        preference: u64_field(raw, "preference")?,
        weight: u64_field(raw, "weight")?,
        encapsulation: str_field(raw, "encap")?,
        color: str_field(raw, "color")?.to_lowercase(),
        raw: raw.clone(),
    })
}

pub fn vrrp_from_sdwan(raw: &RawObject, device: Ipv4Addr) -> Option<VrrpRecord> {
    let state = str_field(raw, "vrrp-state")?;
    Some(VrrpRecord {
        device,
        if_name: str_field(raw, "if-name")?,
        group: parsed_field(raw, "group-id")?,
        priority: parsed_field(raw, "priority")?,
        preempt: bool_field(raw, "preempt")?,
        master: state == "proto-state-master",
        virtual_ip: ipv4_field(raw, "virtual-ip")?,
        raw: raw.clone(),
    })
}

/// IPv4 route entry; IPv6 and malformed prefixes are dropped.
pub fn route_from_sdwan(raw: &RawObject, device: Ipv4Addr) -> Option<RouteRecord> {
    let prefix: Ipv4Net = parsed_field(raw, "prefix")?;
    Some(RouteRecord {
        device,
        vpn_id: str_field(raw, "vpn-id")?,
        prefix,
        next_hop: ipv4_field(raw, "nexthop-addr"),
        interface: str_field(raw, "nexthop-ifname"),
        protocol: str_field(raw, "protocol"),
        metric: u64_field(raw, "metric"),
        raw: raw.clone(),
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::{Value, json};

    fn obj(value: Value) -> RawObject {
        serde_json::from_value(value).unwrap()
    }

    const DEVICE: Ipv4Addr = Ipv4Addr::new(10, 255, 0, 1);

    #[test]
    fn merged_edge_device() {
        let now = Utc::now();
        let up_since = (now - TimeDelta::days(12) - TimeDelta::hours(5)).timestamp_millis();
        let raw = obj(json!({
            "uuid": "C8K-1234",
            "host-name": "br-paris-01.sdwan.example.com",
            "system-ip": "10.255.0.1",
            "personality": "vedge",
            "deviceModel": "vedge-C8000V",
            "chasisNumber": "C8K-1234",
            "site-id": "1001",
            "version": "17.9.3a",
            "templateId": "tmpl-1",
            "template": "BR-C8K",
            "managed-by": "vmanage",
            "validity": "valid",
            "configStatusMessage": "In Sync",
            "reachability": "reachable",
            "uptime-date": up_since,
            "latitude": "48.85",
            "longitude": 2.35,
            "vedgeCertificate": "-----BEGIN-----",
        }));

        let device = device_from_sdwan(&raw, "ww", now).unwrap();

        assert_eq!(device.id, "C8K-1234");
        assert_eq!(device.hostname.as_deref(), Some("BR-PARIS-01"));
        assert_eq!(device.system_ip, Some(DEVICE));
        assert_eq!(device.model.as_deref(), Some("C8000V"));
        assert_eq!(device.role.as_deref(), Some("vedge"));
        assert_eq!(device.stack_size, 1);
        assert_eq!(device.uptime_days, Some(12));
        assert_eq!(device.site_id.as_deref(), Some("1001"));
        assert!(device.is_managed && device.is_valid && device.is_sync && device.is_reachable);
        assert_eq!(device.latitude, Some(48.85));
        assert!(!device.raw.contains_key("vedgeCertificate"));
    }

    #[test]
    fn vbond_placeholder_model() {
        let raw = obj(json!({
            "uuid": "vb-1",
            "deviceModel": "vedge-cloud",
            "managed-by": "Unmanaged",
            "uptime-date": "garbage",
        }));

        let device = device_from_sdwan(&raw, "ww", Utc::now()).unwrap();

        assert_eq!(device.model.as_deref(), Some("vbond"));
        assert!(!device.is_managed);
        assert_eq!(device.uptime_days, None);
        assert_eq!(device.hostname, None);
    }

    #[test]
    fn interface_requires_addressing() {
        let good = obj(json!({
            "ifname": "GigabitEthernet1",
            "interface-type": "iana-iftype-ethernet-csmacd",
            "hwaddr": "52:54:00:aa:bb:cc",
            "vpn-id": 0,
            "ip-address": "192.0.2.10",
            "ipv4-subnet-mask": "255.255.255.0",
        }));
        let iface = interface_from_sdwan(&good, DEVICE).unwrap();
        assert_eq!(iface.description, "N/A");
        assert_eq!(iface.vpn_id, "0");
        assert_eq!(iface.network.to_string(), "192.0.2.0/24");

        let mut missing_mac = good.clone();
        missing_mac.remove("hwaddr");
        assert!(interface_from_sdwan(&missing_mac, DEVICE).is_none());

        let mut unnumbered = good;
        unnumbered.insert("ip-address".into(), json!("-"));
        assert!(interface_from_sdwan(&unnumbered, DEVICE).is_none());
    }

    #[test]
    fn tloc_color_is_lowercased() {
        let raw = obj(json!({
            "site-id": 1001,
            "ip": "10.255.0.1",
            "tloc-private-ip": "192.0.2.10",
            "tloc-public-ip": "198.51.100.10",
            "preference": "0",
            "weight": 1,
            "encap": "ipsec",
            "color": "BIZ-INTERNET",
        }));
        let tloc = tloc_from_sdwan(&raw, DEVICE).unwrap();
        assert_eq!(tloc.color, "biz-internet");
        assert_eq!(tloc.site_id, Some(1001));
        assert_eq!(tloc.preference, 0);
    }

    #[test]
    fn vrrp_accepts_string_preempt() {
        let raw = obj(json!({
            "if-name": "GigabitEthernet2.100",
            "group-id": "1",
            "priority": 110,
            "preempt": "true",
            "vrrp-state": "proto-state-master",
            "virtual-ip": "10.1.100.1",
        }));
        let vrrp = vrrp_from_sdwan(&raw, DEVICE).unwrap();
        assert!(vrrp.master && vrrp.preempt);
        assert_eq!(vrrp.group, 1);

        let mut backup = raw;
        backup.insert("vrrp-state".into(), json!("proto-state-backup"));
        backup.insert("preempt".into(), json!(false));
        let vrrp = vrrp_from_sdwan(&backup, DEVICE).unwrap();
        assert!(!vrrp.master && !vrrp.preempt);
    }

    #[test]
    fn ipv6_routes_are_dropped() {
        let v4 = obj(json!({"vpn-id": "10", "prefix": "10.20.0.0/16", "nexthop-addr": "10.1.1.1", "protocol": "omp"}));
        let v6 = obj(json!({"vpn-id": "10", "prefix": "2001:db8::/32"}));

        let route = route_from_sdwan(&v4, DEVICE).unwrap();
        assert_eq!(route.prefix.to_string(), "10.20.0.0/16");
        assert_eq!(route.protocol.as_deref(), Some("omp"));
        assert!(route_from_sdwan(&v6, DEVICE).is_none());
    }
}
