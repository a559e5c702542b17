// ── DNAC conversions ──

use fabricgate_api::RawObject;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    f64_field, ip_field, normalize_hostname, split_list, stack_size, str_field, strip_raw,
};
use crate::model::{BackendKind, DeviceRecord, SiteRecord};
use crate::uptime::days_from_uptime;

/// Build a device from a `network-device` object. Objects without an `id`
/// are dropped.
pub fn device_from_dnac(raw: &RawObject, fabric: &str) -> Option<DeviceRecord> {
    let Some(id) = str_field(raw, "id") else {
        debug!(fabric, "DNAC device without id");
        return None;
    };
    let mut device = DeviceRecord::new(id, fabric, BackendKind::Dnac, strip_raw(raw));

    device.hostname = str_field(raw, "hostname").map(|h| normalize_hostname(&h));
    device.management_ip = ip_field(raw, "managementIpAddress");

    device.platforms = str_field(raw, "platformId")
        .map(|p| split_list(&p))
        .unwrap_or_default();
    device.serials = str_field(raw, "serialNumber")
        .map(|s| split_list(&s))
        .unwrap_or_default();
    device.stack_size = stack_size(&device.platforms, &device.serials);
    device.model = device
        .platforms
        .first()
        .cloned()
        .or_else(|| str_field(raw, "type"));
    device.software_version = str_field(raw, "softwareVersion");

    device.uptime_days = str_field(raw, "upTime").and_then(|uptime| {
        days_from_uptime(&uptime)
            .inspect_err(|e| warn!(fabric, device = %device.id, error = %e, "uptime not parsed"))
            .ok()
    });

    device.role = str_field(raw, "role");
    device.site_id = str_field(raw, "siteId").or_else(|| str_field(raw, "location"));

    device.is_reachable = str_field(raw, "reachabilityStatus").as_deref() == Some("Reachable");
    device.is_sync = str_field(raw, "collectionStatus").as_deref() == Some("Managed");
    device.is_managed = str_field(raw, "managementState").as_deref() == Some("Managed");
    device.is_valid = raw.get("errorCode").is_none_or(Value::is_null);

    Some(device)
}

/// Build a site from a `site` object, reading its location from the
/// `additionalInfo` entry whose `nameSpace` is `"Location"`.
pub fn site_from_dnac(raw: &RawObject, fabric: &str) -> Option<SiteRecord> {
    let id = str_field(raw, "id")?;
    let location = location_attributes(raw);
    let attr = |key: &str| location.and_then(|loc| str_field(loc, key));

    Some(SiteRecord {
        id,
        fabric: fabric.to_owned(),
        name: str_field(raw, "name"),
        hierarchy: str_field(raw, "siteNameHierarchy"),
        site_type: attr("type"),
        country: attr("country"),
        address: attr("address"),
        latitude: location.and_then(|loc| f64_field(loc, "latitude")),
        longitude: location.and_then(|loc| f64_field(loc, "longitude")),
    })
}

fn location_attributes(raw: &RawObject) -> Option<&RawObject> {
    raw.get("additionalInfo")?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .find(|info| info.get("nameSpace").and_then(Value::as_str) == Some("Location"))?
        .get("attributes")?
        .as_object()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> RawObject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn stacked_switch() {
        let raw = obj(json!({
            "id": "d-1",
            "hostname": "access-01.campus.example.com",
            "managementIpAddress": "10.10.0.5",
            "platformId": "C9300-48P, C9300-48P",
            "serialNumber": "FOC1111, FOC2222",
            "softwareVersion": "17.9.4a",
            "upTime": "152 days, 7:03:11.54",
            "role": "ACCESS",
            "reachabilityStatus": "Reachable",
            "collectionStatus": "Managed",
            "managementState": "Managed",
            "errorCode": null,
        }));

        let device = device_from_dnac(&raw, "campus").unwrap();

        assert_eq!(device.hostname.as_deref(), Some("ACCESS-01"));
        assert_eq!(device.management_ip.unwrap().to_string(), "10.10.0.5");
        assert_eq!(device.stack_size, 2);
        assert_eq!(device.model.as_deref(), Some("C9300-48P"));
        assert_eq!(device.uptime_days, Some(152));
        assert!(device.is_reachable && device.is_sync && device.is_managed && device.is_valid);
        assert_eq!(device.fabric, "campus");
    }

    #[test]
    fn bad_uptime_only_drops_uptime() {
        let raw = obj(json!({
            "id": "d-2",
            "hostname": "ap-1",
            "upTime": "forever",
            "errorCode": "DEV-UNREACHED",
            "reachabilityStatus": "Unreachable",
        }));

        let device = device_from_dnac(&raw, "campus").unwrap();

        assert_eq!(device.uptime_days, None);
        assert_eq!(device.hostname.as_deref(), Some("AP-1"));
        assert!(!device.is_valid);
        assert!(!device.is_reachable);
        assert_eq!(device.stack_size, 0);
    }

    #[test]
    fn device_without_id_is_dropped() {
        assert!(device_from_dnac(&obj(json!({"hostname": "x"})), "campus").is_none());
    }

    #[test]
    fn site_location_from_additional_info() {
        let raw = obj(json!({
            "id": "s-1",
            "name": "Paris-HQ",
            "siteNameHierarchy": "Global/EMEA/Paris-HQ",
            "additionalInfo": [
                {"nameSpace": "System", "attributes": {"country": "wrong"}},
                {"nameSpace": "Location", "attributes": {
                    "type": "building",
                    "country": "France",
                    "address": "1 Rue de Rivoli, Paris",
                    "latitude": "48.8566",
                    "longitude": "2.3522"
                }}
            ]
        }));

        let site = site_from_dnac(&raw, "campus").unwrap();

        assert_eq!(site.country.as_deref(), Some("France"));
        assert_eq!(site.site_type.as_deref(), Some("building"));
        assert_eq!(site.latitude, Some(48.8566));
        assert_eq!(site.longitude, Some(2.3522));
    }

    #[test]
    fn site_without_location_keeps_identity() {
        let site = site_from_dnac(&obj(json!({"id": "s-2", "name": "Global"})), "campus").unwrap();
        assert_eq!(site.name.as_deref(), Some("Global"));
        assert!(site.country.is_none());
    }
}
