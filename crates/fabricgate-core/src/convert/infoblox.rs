// ── Infoblox conversions ──
//
// WAPI objects map field-for-field onto the IPAM types, so conversion is
// plain deserialization. Objects that do not fit are dropped.

use fabricgate_api::RawObject;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Deserialize one WAPI object, dropping it on mismatch.
pub fn ipam_from_wapi<T: DeserializeOwned>(raw: RawObject) -> Option<T> {
    let reference = raw
        .get("_ref")
        .and_then(Value::as_str)
        .map(str::to_owned);
    match serde_json::from_value(Value::Object(raw)) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(object = ?reference, error = %e, "dropping malformed WAPI object");
            None
        }
    }
}
