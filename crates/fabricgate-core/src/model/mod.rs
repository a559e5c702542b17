// ── Inventory record types ──
//
// Immutable snapshots built per request by the `convert` module. Records
// keep the (sanitized) vendor payload in `raw` for pass-through fields
// that are not modeled.

pub mod device;
pub mod ipam;
pub mod net;
pub mod sdwan;
pub mod site;
pub mod wireless;

pub use device::{BackendKind, DeviceRecord};
pub use ipam::{FilterMac, FixedAddress, IpamNetwork, MacFilterAddress};
pub use net::{Ipv4Net, NetParseError};
pub use sdwan::{InterfaceRecord, RouteRecord, TlocRecord, VrrpRecord};
pub use site::SiteRecord;
pub use wireless::{NetworkRecord, OrgRecord, TemplateRecord};
