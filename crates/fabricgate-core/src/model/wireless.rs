// ── Wireless fleet types ──

use fabricgate_api::RawObject;
use serde::{Deserialize, Serialize};

/// A dashboard organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgRecord {
    pub id: String,
    pub fabric: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub raw: RawObject,
}

/// A dashboard network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    pub fabric: String,
    pub name: Option<String>,
    pub org_id: Option<String>,
    pub product_types: Vec<String>,
    pub tags: Vec<String>,
    /// The network is bound to a configuration template.
    pub from_template: bool,
    pub url: Option<String>,
    pub time_zone: Option<String>,
    pub raw: RawObject,
}

/// A configuration template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub fabric: String,
    pub name: Option<String>,
    pub product_types: Vec<String>,
    pub time_zone: Option<String>,
    pub raw: RawObject,
}
