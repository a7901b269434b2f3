//! RFC 5988 `Link` header parsing and page aggregation.

use reqwest::header::{HeaderMap, LINK};
use serde_json::Value;

/// The navigation links found in a `Link` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Links {
    pub next: Option<String>,
    pub prev: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Parse a `Link` header value such as
/// `<https://api.github.com/user/repos?page=2>; rel="next", <…?page=5>; rel="last"`.
///
/// Entries that cannot be parsed are skipped. The first URI seen for a
/// relation wins.
pub fn parse_link_header(value: &str) -> Links {
    let mut links = Links::default();
    let mut rest = value;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start + 1..].find('>') else {
            break;
        };
        let uri = rest[start + 1..start + 1 + len].trim();
        let after = &rest[start + 2 + len..];

        // Parameters run until the next entry.
        let params_end = after.find('<').unwrap_or(after.len());
        let params = &after[..params_end];
        rest = &after[params_end..];

        for rel in relations(params) {
            let slot = match rel.to_ascii_lowercase().as_str() {
                "next" => &mut links.next,
                "prev" | "previous" => &mut links.prev,
                "first" => &mut links.first,
                "last" => &mut links.last,
                _ => continue,
            };
            if slot.is_none() && !uri.is_empty() {
                *slot = Some(uri.to_string());
            }
        }
    }
    links
}

fn relations(params: &str) -> Vec<&str> {
    params
        .split(';')
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            if !name.trim().eq_ignore_ascii_case("rel") {
                return None;
            }
            let value = value.trim().trim_end_matches(',').trim();
            Some(value.trim_matches('"'))
        })
        .flat_map(str::split_whitespace)
        .collect()
}

/// The `rel="next"` URI of a response, if it has one.
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| parse_link_header(v).next)
}

/// Accumulates page bodies into one result.
#[derive(Debug, Default)]
pub struct PageAggregator {
    result: Option<Value>,
    pages: usize,
}

impl PageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the next page. Returns whether further pages can be merged.
    pub fn push(&mut self, page: Value) -> bool {
        self.pages += 1;
        let Some(result) = self.result.as_mut() else {
            let mergeable = is_mergeable(&page);
            self.result = Some(page);
            return mergeable;
        };

        match (result, page) {
            (Value::Array(all), Value::Array(more)) => {
                all.extend(more);
                true
            }
            (Value::Object(all), Value::Object(mut more)) => {
                let more_items = match more.get_mut("items") {
                    Some(Value::Array(items)) => std::mem::take(items),
                    _ => return false,
                };
                match all.get_mut("items") {
                    Some(Value::Array(items)) => {
                        items.extend(more_items);
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn finish(self) -> Value {
        self.result.unwrap_or(Value::Null)
    }
}

/// List bodies and search-style `{ "items": [...] }` bodies span pages.
fn is_mergeable(body: &Value) -> bool {
    match body {
        Value::Array(_) => true,
        Value::Object(map) => matches!(map.get("items"), Some(Value::Array(_))),
        _ => false,
    }
}
