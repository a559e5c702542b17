// fabricgate-api: Async Rust clients for network controller APIs
// (DNAC, vManage SD-WAN, Meraki Dashboard, Infoblox WAPI)

pub mod clock;
pub mod dnac;
pub mod error;
pub mod fanout;
pub mod infoblox;
pub mod meraki;
pub mod paginate;
pub mod sdwan;
pub mod session;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use dnac::DnacClient;
pub use error::Error;
pub use fanout::{Limiter, fan_out, merge_by_key};
pub use infoblox::InfobloxClient;
pub use meraki::MerakiClient;
pub use sdwan::VmanageClient;
pub use session::{AuthFlow, Session, SessionManager};
pub use transport::{TlsMode, TransportConfig};

use serde_json::Value;
use tracing::debug;

/// One raw vendor JSON object, as returned by the controller.
pub type RawObject = serde_json::Map<String, Value>;

/// Caller-supplied query parameters, forwarded verbatim.
pub type QueryParams = [(String, String)];

/// Keep the JSON objects of a listing, dropping anything else.
pub(crate) fn into_objects(items: Vec<Value>) -> Vec<RawObject> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(object),
            other => {
                debug!(?other, "dropping non-object list entry");
                None
            }
        })
        .collect()
}

/// Take `field` out of a response envelope such as `{"response": ...}`.
pub(crate) fn unwrap_envelope(body: Value, field: &str) -> Result<Value, Error> {
    match body {
        Value::Object(mut object) => object.remove(field).ok_or_else(|| Error::UnexpectedShape {
            message: format!("response has no `{field}` field"),
        }),
        _ => Err(Error::UnexpectedShape {
            message: format!("expected an object with a `{field}` field"),
        }),
    }
}

/// Interpret a value as a list of objects.
pub(crate) fn expect_list(value: Value) -> Result<Vec<RawObject>, Error> {
    match value {
        Value::Array(items) => Ok(into_objects(items)),
        _ => Err(Error::UnexpectedShape {
            message: "expected a JSON array".into(),
        }),
    }
}

/// Interpret a value as a single object.
pub(crate) fn expect_object(value: Value) -> Result<RawObject, Error> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(Error::UnexpectedShape {
            message: "expected a JSON object".into(),
        }),
    }
}
