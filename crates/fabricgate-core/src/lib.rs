//! Normalized inventory over network controllers.
//!
//! Sits between `fabricgate-api` and whatever serves the data (HTTP routes,
//! exporters):
//!
//! - **[`FabricRegistry`]** maps fabric names to their controller clients.
//!   Built once from [`FabricConfig`]s, then shared read-only.
//!
//! - **[`Inventory`]** is the facade: every operation looks up the fabric,
//!   calls the backend and normalizes the raw objects into records. An
//!   unknown fabric is rejected before any upstream call.
//!
//! - **Records** ([`model`]) are immutable snapshots ([`DeviceRecord`],
//!   [`SiteRecord`], [`InterfaceRecord`], ...) built by the [`convert`]
//!   constructors. Derived fields are computed once, at construction.

pub mod config;
pub mod convert;
pub mod error;
pub mod inventory;
pub mod model;
pub mod registry;
pub mod uptime;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{BackendConfig, Credentials, FabricConfig, TlsVerification};
pub use error::CoreError;
pub use inventory::Inventory;
pub use registry::{Backend, FabricRegistry};

pub use model::{
    BackendKind, DeviceRecord, FilterMac, FixedAddress, InterfaceRecord, IpamNetwork, Ipv4Net,
    MacFilterAddress, NetworkRecord, OrgRecord, RouteRecord, SiteRecord, TemplateRecord,
    TlocRecord, VrrpRecord,
};

pub use fabricgate_api::{Clock, QueryParams, RawObject, SystemClock};
