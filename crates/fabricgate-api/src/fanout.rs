// Bounded concurrent sub-queries and key-based merging.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures_util::future::try_join_all;
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::RawObject;
use crate::error::Error;

/// Per-client cap on in-flight HTTP calls.
///
/// Clones share the same permits, so one limiter created with a client
/// bounds every caller of that client.
#[derive(Debug, Clone)]
pub struct Limiter {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl Limiter {
    /// A limiter admitting at most `limit` concurrent calls (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Run `call` once a permit is available, holding it until `call`
    /// finishes.
    pub async fn run<T, Fut>(&self, call: Fut) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::LimiterClosed)?;
        call.await
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Run every sub-query concurrently and wait for all of them.
///
/// Strict: the first failure fails the aggregate and drops the sub-queries
/// still in flight. Results keep the input order.
pub async fn fan_out<I, T>(queries: I) -> Result<Vec<T>, Error>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, Error>>,
{
    try_join_all(queries).await
}

/// Merge several collections into one object per key.
///
/// Sources are applied in order, so on a key collision the fields of a
/// later source override the same fields of an earlier one while the rest
/// are kept. Keys seen in only one source still appear. The map preserves
/// first-seen key order. Objects without a key are skipped.
pub fn merge_by_key<K, F>(sources: Vec<Vec<RawObject>>, key_fn: F) -> IndexMap<K, RawObject>
where
    K: Hash + Eq,
    F: Fn(&RawObject) -> Option<K>,
{
    let mut merged: IndexMap<K, RawObject> = IndexMap::new();

    for (index, source) in sources.into_iter().enumerate() {
        for object in source {
            let Some(key) = key_fn(&object) else {
                debug!(source = index, "skipping object without merge key");
                continue;
            };
            match merged.get_mut(&key) {
                Some(existing) => existing.extend(object),
                None => {
                    merged.insert(key, object);
                }
            }
        }
    }

    merged
}

/// Key extractor for a string field, e.g. `"uuid"` or `"serial"`.
pub fn string_key(field: &str) -> impl Fn(&RawObject) -> Option<String> + '_ {
    move |object| {
        object
            .get(field)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;

    fn objects(value: Value) -> Vec<RawObject> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn later_sources_override_on_collision() {
        let roster = objects(json!([
            {"uuid": "a", "host-name": "edge1", "reachability": "unknown"},
            {"uuid": "b", "host-name": "edge2"},
        ]));
        let status = objects(json!([
            {"uuid": "a", "reachability": "reachable"},
        ]));

        let merged = merge_by_key(vec![roster, status], string_key("uuid"));

        assert_eq!(merged.len(), 2);
        assert_eq!(
            Value::Object(merged["a"].clone()),
            json!({"uuid": "a", "host-name": "edge1", "reachability": "reachable"})
        );
        assert_eq!(
            Value::Object(merged["b"].clone()),
            json!({"uuid": "b", "host-name": "edge2"})
        );
    }

    #[test]
    fn single_source_keys_keep_first_seen_order() {
        let first = objects(json!([{"uuid": "z"}, {"uuid": "m"}]));
        let second = objects(json!([{"uuid": "m"}, {"uuid": "a"}, {"name": "keyless"}]));

        let merged = merge_by_key(vec![first, second], string_key("uuid"));
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["z", "m", "a"]);
    }

    #[tokio::test]
    async fn fan_out_fails_if_any_query_fails() {
        let queries = (0..3).map(|i| async move {
            if i == 1 {
                Err(Error::Upstream {
                    status: 500,
                    message: "down".into(),
                })
            } else {
                Ok(i)
            }
        });

        assert!(fan_out(queries).await.is_err());
    }

    #[tokio::test]
    async fn fan_out_keeps_input_order() {
        let queries = (0..4).map(|i| async move { Ok::<_, Error>(i * 10) });
        assert_eq!(fan_out(queries).await.unwrap(), vec![0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn limiter_bounds_concurrency() {
        let limiter = Limiter::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let calls = (0..8).map(|_| {
            let limiter = limiter.clone();
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                limiter
                    .run(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }
        });

        fan_out(calls).await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(limiter.available(), 2);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        assert_eq!(Limiter::new(0).limit(), 1);
    }
}
