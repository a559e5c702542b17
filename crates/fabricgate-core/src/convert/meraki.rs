// ── Meraki conversions ──

use fabricgate_api::RawObject;
use tracing::debug;

use super::{
    bool_field, f64_field, ip_field, normalize_hostname, stack_size, str_field, str_list_field,
    strip_raw,
};
use crate::model::{BackendKind, DeviceRecord, NetworkRecord, OrgRecord, TemplateRecord};

/// Build a device from an inventory object, optionally merged with its
/// status. Devices are keyed by serial; objects without one are dropped.
pub fn device_from_meraki(raw: &RawObject, fabric: &str) -> Option<DeviceRecord> {
    let Some(serial) = str_field(raw, "serial") else {
        debug!(fabric, "Meraki device without serial");
        return None;
    };
    let mut device = DeviceRecord::new(serial.clone(), fabric, BackendKind::Meraki, strip_raw(raw));

    device.hostname = str_field(raw, "name").map(|n| normalize_hostname(&n));
    device.management_ip = ip_field(raw, "lanIp");

    device.model = str_field(raw, "model");
    device.platforms = device.model.iter().cloned().collect();
    device.serials = vec![serial];
    device.stack_size = stack_size(&device.platforms, &device.serials);
    device.software_version = str_field(raw, "firmware")
        .map(|fw| fw.strip_prefix("wireless-").unwrap_or(&fw).to_owned());

    device.role = str_field(raw, "productType");
    device.network_id = str_field(raw, "networkId");
    device.tags = str_list_field(raw, "tags");
    device.url = str_field(raw, "url");

    device.is_reachable = str_field(raw, "status").as_deref() == Some("online");
    device.is_managed = device.network_id.is_some();
    device.is_valid = true;

    device.latitude = f64_field(raw, "lat");
    device.longitude = f64_field(raw, "lng");

    Some(device)
}

pub fn network_from_meraki(raw: &RawObject, fabric: &str) -> Option<NetworkRecord> {
    Some(NetworkRecord {
        id: str_field(raw, "id")?,
        fabric: fabric.to_owned(),
        name: str_field(raw, "name"),
        org_id: str_field(raw, "organizationId"),
        product_types: str_list_field(raw, "productTypes"),
        tags: str_list_field(raw, "tags"),
        from_template: bool_field(raw, "isBoundToConfigTemplate").unwrap_or(false),
        url: str_field(raw, "url"),
        time_zone: str_field(raw, "timeZone"),
        raw: raw.clone(),
    })
}

pub fn template_from_meraki(raw: &RawObject, fabric: &str) -> Option<TemplateRecord> {
    Some(TemplateRecord {
        id: str_field(raw, "id")?,
        fabric: fabric.to_owned(),
        name: str_field(raw, "name"),
        product_types: str_list_field(raw, "productTypes"),
        time_zone: str_field(raw, "timeZone"),
        raw: raw.clone(),
    })
}

pub fn org_from_meraki(raw: &RawObject, fabric: &str) -> Option<OrgRecord> {
    Some(OrgRecord {
        id: str_field(raw, "id")?,
        fabric: fabric.to_owned(),
        name: str_field(raw, "name"),
        url: str_field(raw, "url"),
        raw: raw.clone(),
    })
}
