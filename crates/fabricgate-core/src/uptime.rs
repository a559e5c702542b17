// ── Uptime helpers ──
//
// Controllers report uptime two ways: a human string such as
// `"12 days, 4:05:06.78"` (DNAC) or an epoch-milliseconds "up since"
// timestamp (vManage). Both are reduced to whole days.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static UPTIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(\d+)\s+days?,\s*)?(\d+):(\d{2}):(\d{2})(?:\.\d+)?\s*$")
        .unwrap_or_else(|e| unreachable!("uptime pattern is valid: {e}"))
});

/// The uptime string does not follow `[<N> day(s), ]H:MM:SS[.fraction]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized uptime format: {input:?}")]
pub struct UptimeFormatError {
    pub input: String,
}

/// Whole days from a `"<N> days, H:MM:SS[.ff]"` string.
///
/// The days group is optional (`"0:10:00"` is zero days). Hours beyond 24
/// do not roll over into days.
pub fn days_from_uptime(input: &str) -> Result<u64, UptimeFormatError> {
    let err = || UptimeFormatError {
        input: input.to_owned(),
    };
    let caps = UPTIME_RE.captures(input).ok_or_else(err)?;
    match caps.get(1) {
        Some(days) => days.as_str().parse().map_err(|_| err()),
        None => Ok(0),
    }
}

/// Whole days elapsed since an epoch-milliseconds timestamp.
///
/// Accepts a JSON number or a numeric string. Anything unparsable yields
/// `None`; a timestamp in the future yields `Some(0)`.
pub fn days_since_epoch_millis(value: &Value, now: DateTime<Utc>) -> Option<u64> {
    let millis = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|f| float_to_i64(f.trunc()))),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    let since = DateTime::<Utc>::from_timestamp_millis(millis)?;
    let elapsed = (now - since).num_days();
    Some(u64::try_from(elapsed).unwrap_or(0))
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn float_to_i64(value: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; stay strictly inside the range.
    if value.is_finite() && value.abs() < 9.0e18 {
        Some(value as i64)
    } else {
        None
    }
}
