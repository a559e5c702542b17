use chrono::{DateTime, Utc};

/// Source of "now" for session TTL checks and uptime arithmetic.
///
/// Production code uses [`SystemClock`]; tests inject a manual clock to
/// step across TTL boundaries without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
