// Multi-page listing helpers.
//
// Both styles are all-or-nothing: the first failing page aborts the whole
// listing and the pages already collected are dropped with it.

use std::collections::HashSet;
use std::future::Future;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::Error;

// ── Cursor style ─────────────────────────────────────────────────────

/// One page of a cursor-paged listing: `{result: [...], next_page_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct CursorPage {
    #[serde(default)]
    pub result: Vec<Value>,
    #[serde(default)]
    pub next_page_id: Option<String>,
}

/// Follow `next_page_id` until it is absent, concatenating `result` arrays
/// in fetch order. A page id seen twice fails the listing.
///
/// `fetch` receives `None` for the first page and the previous page's
/// cursor afterwards.
pub async fn collect_cursor<F, Fut>(mut fetch: F) -> Result<Vec<Value>, Error>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage, Error>>,
{
    let mut all = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.take()).await?;
        trace!(received = page.result.len(), "cursor page");
        all.extend(page.result);

        match page.next_page_id {
            Some(next) if !next.is_empty() => {
                if !seen.insert(next.clone()) {
                    return Err(Error::Upstream {
                        status: 200,
                        message: format!("page id {next:?} returned twice"),
                    });
                }
                cursor = Some(next);
            }
            _ => break,
        }
    }

    Ok(all)
}

// ── Link-header style ────────────────────────────────────────────────

/// One page of a `Link`-paged listing.
#[derive(Debug)]
pub struct LinkedPage {
    pub body: Value,
    /// Target of the `rel="next"` entry of the `Link` header, if any.
    pub next: Option<Url>,
}

/// Outcome of a `Link`-paged request.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// Array pages, concatenated.
    Items(Vec<Value>),
    /// A single-object endpoint; returned without paging.
    Single(Value),
}

/// Walk `rel="next"` links starting at `first`.
///
/// `fetch` is told whether it is fetching the first page; only that
/// request carries caller parameters, since next links are self-contained.
pub async fn collect_linked<F, Fut>(first: Url, mut fetch: F) -> Result<Listing, Error>
where
    F: FnMut(Url, bool) -> Fut,
    Fut: Future<Output = Result<LinkedPage, Error>>,
{
    let mut all = Vec::new();
    let mut next = Some(first);
    let mut is_first = true;

    while let Some(url) = next.take() {
        let page = fetch(url, is_first).await?;
        match page.body {
            Value::Array(items) => {
                trace!(received = items.len(), "linked page");
                all.extend(items);
            }
            body @ Value::Object(_) if is_first => return Ok(Listing::Single(body)),
            other => {
                return Err(Error::UnexpectedShape {
                    message: format!("expected a JSON array page, got {}", kind_of(&other)),
                });
            }
        }
        next = page.next;
        is_first = false;
    }

    Ok(Listing::Items(all))
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
///
/// ```
/// use fabricgate_api::paginate::next_link;
///
/// let header = r#"<https://api.example.com/x?startingAfter=A>; rel=first, <https://api.example.com/x?startingAfter=B>; rel="next""#;
/// assert_eq!(
///     next_link(header).map(|u| u.to_string()).as_deref(),
///     Some("https://api.example.com/x?startingAfter=B"),
/// );
/// ```
pub fn next_link(header: &str) -> Option<Url> {
    // Targets may contain commas; entries are delimited by `<...>`.
    let mut rest = header;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let close = after.find('>')?;
        let target = &after[..close];
        let tail = &after[close + 1..];
        let params_end = tail.find('<').unwrap_or(tail.len());

        let is_next = tail[..params_end].split(';').any(|param| {
            let param = param.trim().trim_end_matches(',').trim_end();
            param
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
        });
        if is_next {
            return Url::parse(target).ok();
        }
        rest = &tail[params_end..];
    }
    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn cursor_pages_concatenate_in_order() {
        let pages = vec![
            (json!([1, 2]), Some("p2")),
            (json!([3, 4]), Some("p3")),
            (json!([5, 6]), None),
        ];
        let mut seen_cursors = Vec::new();

        let all = collect_cursor(|cursor| {
            seen_cursors.push(cursor.clone());
            let index = seen_cursors.len() - 1;
            let (result, next) = pages[index].clone();
            async move {
                Ok(CursorPage {
                    result: serde_json::from_value(result).unwrap(),
                    next_page_id: next.map(str::to_owned),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(all, vec![json!(1), json!(2), json!(3), json!(4), json!(5), json!(6)]);
        assert_eq!(
            seen_cursors,
            vec![None, Some("p2".to_owned()), Some("p3".to_owned())]
        );
    }

    #[tokio::test]
    async fn cursor_error_discards_partial_result() {
        let mut calls = 0;
        let result = collect_cursor(|_| {
            calls += 1;
            let call = calls;
            async move {
                if call == 2 {
                    Err(Error::Upstream {
                        status: 500,
                        message: "boom".into(),
                    })
                } else {
                    Ok(CursorPage {
                        result: vec![json!(call), json!(call)],
                        next_page_id: Some(format!("p{}", call + 1)),
                    })
                }
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Upstream { status: 500, .. })));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn linked_object_body_is_single() {
        let first = Url::parse("https://api.example.com/networks/N1").unwrap();
        let listing = collect_linked(first, |_, _| async {
            Ok(LinkedPage {
                body: json!({"id": "N1"}),
                next: Some(Url::parse("https://api.example.com/ignored").unwrap()),
            })
        })
        .await
        .unwrap();

        assert_eq!(listing, Listing::Single(json!({"id": "N1"})));
    }

    #[tokio::test]
    async fn linked_follow_up_object_is_rejected() {
        let first = Url::parse("https://api.example.com/devices").unwrap();
        let result = collect_linked(first, |_, is_first| async move {
            if is_first {
                Ok(LinkedPage {
                    body: json!([{"serial": "Q1"}]),
                    next: Some(Url::parse("https://api.example.com/devices?page=2").unwrap()),
                })
            } else {
                Ok(LinkedPage {
                    body: json!({"errors": ["nope"]}),
                    next: None,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::UnexpectedShape { .. })));
    }

    #[test]
    fn next_link_parsing() {
        let header = "<https://api.example.com/a?startingAfter=0>; rel=first, \
                      <https://api.example.com/a?startingAfter=9>; rel=next, \
                      <https://api.example.com/a?endingBefore=z>; rel=last";
        assert_eq!(
            next_link(header).unwrap().as_str(),
            "https://api.example.com/a?startingAfter=9"
        );

        assert!(next_link("<https://api.example.com/a>; rel=\"prev\"").is_none());
        assert!(next_link("").is_none());
    }

    #[test]
    fn next_link_target_may_contain_commas() {
        let header = "<https://api.example.com/a?serials=Q1,Q2&startingAfter=0>; rel=first, \
                      <https://api.example.com/a?serials=Q1,Q2&startingAfter=9>; rel=\"next\"";
        assert_eq!(
            next_link(header).unwrap().as_str(),
            "https://api.example.com/a?serials=Q1,Q2&startingAfter=9"
        );

        let header = "<https://api.example.com/a?tags=x,y>; rel=prev";
        assert!(next_link(header).is_none());
    }

    #[tokio::test]
    async fn repeated_cursor_is_an_error() {
        let mut calls = 0;
        let result = collect_cursor(|_| {
            calls += 1;
            async {
                Ok(CursorPage {
                    result: vec![json!("same")],
                    next_page_id: Some("stuck".to_owned()),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Upstream { status: 200, .. })), "{result:?}");
        assert_eq!(calls, 2);
    }
}
