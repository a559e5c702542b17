// ── Site domain type ──

use serde::{Deserialize, Serialize};

/// A campus site with its postal location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: String,
    pub fabric: String,
    pub name: Option<String>,
    /// Slash-separated path, e.g. `Global/EMEA/Paris`.
    pub hierarchy: Option<String>,
    /// `area`, `building` or `floor`.
    pub site_type: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
