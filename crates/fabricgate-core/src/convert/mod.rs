// ── Vendor-to-record conversions ──
//
// One constructor per entity type and vendor, each taking a raw vendor
// object plus the fabric name. Sub-resource constructors return `None` for
// entries missing required fields; the caller drops those entries.
//
// Vendors disagree on JSON types for the same field (vManage sends
// `"site-id": "100"` on one endpoint and `100` on another), so every
// accessor below accepts both the native JSON type and its string form.

pub mod dnac;
pub mod infoblox;
pub mod meraki;
pub mod sdwan;

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use fabricgate_api::RawObject;
use serde_json::Value;
use tracing::debug;

/// Fields dropped from the raw pass-through: certificate and CSR blobs
/// and serial-number history. They are large and some carry control
/// characters that break downstream JSON consumers.
pub const STRIPPED_RAW_FIELDS: &[&str] = &[
    "deviceEnterpriseCertificate",
    "deviceCSR",
    "deviceCSRCommonName",
    "vedgeCertificate",
    "vedgeCSR",
    "rootCertHash",
    "certificate",
    "csr",
    "serialNumberHistory",
];

// ── Derived fields ─────────────────────────────────────────────────

/// Host part of a possibly fully-qualified name, upper-cased.
///
/// Idempotent: a normalized hostname maps to itself.
pub fn normalize_hostname(raw: &str) -> String {
    raw.split('.').next().unwrap_or(raw).trim().to_uppercase()
}

/// Comma-separated list, trimmed, empty tokens removed.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Stack members: the serial count, but only when a platform is known.
pub fn stack_size(platforms: &[String], serials: &[String]) -> usize {
    if platforms.is_empty() { 0 } else { serials.len() }
}

/// Strip the `vedge-` model prefix and map `cloud` to `vbond`.
pub fn clean_model(raw: &str) -> String {
    let model = raw.strip_prefix("vedge-").unwrap_or(raw);
    if model == "cloud" {
        "vbond".to_owned()
    } else {
        model.to_owned()
    }
}

/// Copy of `raw` without [`STRIPPED_RAW_FIELDS`].
pub fn strip_raw(raw: &RawObject) -> RawObject {
    raw.iter()
        .filter(|(key, _)| !STRIPPED_RAW_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// ── Field accessors ────────────────────────────────────────────────

/// Non-empty string field. Numbers are rendered as strings.
pub(crate) fn str_field(raw: &RawObject, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn u64_field(raw: &RawObject, key: &str) -> Option<u64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn f64_field(raw: &RawObject, key: &str) -> Option<f64> {
    let value = match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// `true`/`false`, in JSON or as the strings `"true"`/`"false"`.
pub(crate) fn bool_field(raw: &RawObject, key: &str) -> Option<bool> {
    match raw.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a string field into any `FromStr` type, dropping failures.
pub(crate) fn parsed_field<T: FromStr>(raw: &RawObject, key: &str) -> Option<T> {
    let text = str_field(raw, key)?;
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(field = key, value = %text, "unparsable field");
            None
        }
    }
}

pub(crate) fn ip_field(raw: &RawObject, key: &str) -> Option<IpAddr> {
    parsed_field(raw, key)
}

pub(crate) fn ipv4_field(raw: &RawObject, key: &str) -> Option<Ipv4Addr> {
    parsed_field(raw, key)
}

/// String array field; a single string is treated as a one-element list.
pub(crate) fn str_list_field(raw: &RawObject, key: &str) -> Vec<String> {
    match raw.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(Value::String(s)) => split_list(s),
        _ => Vec::new(),
    }
}
