//! Issue API calls: serialize parameters, send, follow pagination, decode.

use log::{debug, info, warn};
use mime::Mime;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url, Version};
use serde_json::Value;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::apply_auth;
use crate::client::build_client;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::pagination::{PageAggregator, next_link};
use crate::request::{ApiRequest, RequestTrace, resolve_url};
use crate::timing::RequestTimer;

/// Whether to follow `Link: rel="next"` after the first response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paginate {
    FirstPage,
    All { max_pages: Option<usize> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded JSON; `null` for empty bodies.
    Json(Value),
    /// A non-JSON media type (diffs, raw file contents), verbatim.
    Text(String),
}

impl ResponseBody {
    pub fn json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }
}

/// The outcome of a successful call. Status and headers come from the last
/// page fetched.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: ResponseBody,
    pub pages: usize,
}

struct Page {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: ResponseBody,
}

pub struct GitHub {
    client: Client,
    config: Config,
}

impl GitHub {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn send(&self, request: &ApiRequest, paginate: Paginate) -> Result<ApiResponse> {
        let mut url = resolve_url(&self.config.base_url, &request.path)?;
        let query = request.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        let origin = url.origin();
        let extra_headers = header_map(request)?;
        let body = request.body();

        let first = self
            .fetch(&request.method, url.clone(), body.as_ref(), &extra_headers, true)
            .await?;

        let first_body = match first.body {
            ResponseBody::Json(value) => value,
            text @ ResponseBody::Text(_) => {
                return Ok(ApiResponse {
                    status: first.status,
                    version: first.version,
                    headers: first.headers,
                    body: text,
                    pages: 1,
                });
            }
        };

        let max_pages = match paginate {
            Paginate::All { max_pages } if request.method == Method::GET => Some(max_pages),
            Paginate::All { .. } => {
                debug!("pagination only applies to GET, not {}", request.method);
                None
            }
            Paginate::FirstPage => None,
        };

        let mut next = max_pages.and_then(|_| next_link(&first.headers));
        let mut visited = HashSet::from([url.to_string()]);
        let mut status = first.status;
        let mut version = first.version;
        let mut headers = first.headers;
        let mut pages = PageAggregator::new();
        let mut mergeable = pages.push(first_body);

        loop {
            let Some(link) = next.take() else {
                break;
            };
            if !mergeable {
                debug!("response body is not a list; ignoring next page {}", link);
                break;
            }
            if let Some(Some(limit)) = max_pages
                && pages.pages() >= limit
            {
                info!("stopping after {} pages (--max-pages)", limit);
                break;
            }

            let url = Url::parse(&link).map_err(|e| ApiError::InvalidUrl {
                url: link.clone(),
                reason: e.to_string(),
            })?;
            if !visited.insert(url.to_string()) {
                warn!("next page {} was already fetched; stopping", link);
                break;
            }
            let same_origin = url.origin() == origin;
            if !same_origin {
                warn!("next page {} is on another origin; sending it without credentials", link);
            }

            let page = self
                .fetch(&Method::GET, url, None, &extra_headers, same_origin)
                .await?;
            let ResponseBody::Json(page_body) = page.body else {
                warn!("next page {} is not JSON; stopping", link);
                break;
            };

            next = next_link(&page.headers);
            status = page.status;
            version = page.version;
            headers = page.headers;
            mergeable = pages.push(page_body);
        }

        let pages_fetched = pages.pages();
        if pages_fetched > 1 {
            info!("aggregated {} pages from {}", pages_fetched, request.path);
        }

        Ok(ApiResponse {
            status,
            version,
            headers,
            body: ResponseBody::Json(pages.finish()),
            pages: pages_fetched,
        })
    }

    fn request_trace(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        extra_headers: &HeaderMap,
        authorize: bool,
    ) -> RequestTrace {
        let mut trace = RequestTrace::new(method, url);
        if authorize {
            trace.add_header("Authorization", self.config.auth.header_value());
        }
        // An Accept item replaces the configured default on the wire.
        if !extra_headers.contains_key(header::ACCEPT) {
            trace.add_header("Accept", self.config.accept.clone());
        }
        for (name, value) in extra_headers {
            trace.add_header(name.as_str(), value.to_str().unwrap_or("<binary>"));
        }
        if let Some(body) = body {
            trace.set_body(body);
        }
        trace
    }

    async fn fetch(
        &self,
        method: &Method,
        url: Url,
        body: Option<&Value>,
        extra_headers: &HeaderMap,
        authorize: bool,
    ) -> Result<Page> {
        let trace = self.request_trace(method, &url, body, extra_headers, authorize);
        debug!("request:\n{}", trace);

        let mut builder = self.client.request(method.clone(), url.clone());
        if authorize {
            builder = apply_auth(builder, &self.config.auth);
        }
        builder = builder.headers(extra_headers.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let mut timer = RequestTimer::start();
        let response = builder.send().await?;
        timer.record_first_byte();

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        log_rate_limit(&headers);

        let text = response.text().await?;
        timer.finish();
        timer.log_summary(&format!("{} {}", method, url));

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(status, &text),
            });
        }

        let body = decode_body(method, &headers, &text).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })?;

        Ok(Page {
            status,
            version,
            headers,
            body,
        })
    }
}

fn header_map(request: &ApiRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

fn is_json(content_type: Option<&Mime>) -> bool {
    match content_type {
        None => true,
        Some(m) => {
            m.type_() == mime::APPLICATION
                && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        }
    }
}

fn content_type(headers: &HeaderMap) -> Option<Mime> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Empty bodies and `HEAD` responses decode to `null`; non-JSON media types
/// are kept as text.
fn decode_body(
    method: &Method,
    headers: &HeaderMap,
    text: &str,
) -> std::result::Result<ResponseBody, serde_json::Error> {
    if *method == Method::HEAD || text.trim().is_empty() {
        return Ok(ResponseBody::Json(Value::Null));
    }
    if !is_json(content_type(headers).as_ref()) {
        return Ok(ResponseBody::Text(text.to_string()));
    }
    serde_json::from_str(text).map(ResponseBody::Json)
}

/// Build a readable message from a GitHub error body:
/// `{"message": "...", "errors": [{"resource":..,"field":..,"code":..}]}`.
pub fn error_message(status: StatusCode, text: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text)
        && let Some(message) = map.get("message").and_then(Value::as_str)
    {
        let details: Vec<String> = match map.get("errors") {
            Some(Value::Array(errors)) => errors.iter().filter_map(error_detail).collect(),
            _ => Vec::new(),
        };
        return if details.is_empty() {
            message.to_string()
        } else {
            format!("{} ({})", message, details.join("; "))
        };
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}

fn error_detail(error: &Value) -> Option<String> {
    match error {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            if let Some(message) = map.get("message").and_then(Value::as_str) {
                return Some(message.to_string());
            }
            let field = |key: &str| map.get(key).and_then(Value::as_str);
            match (field("resource"), field("field"), field("code")) {
                (Some(resource), Some(name), Some(code)) => {
                    Some(format!("{}.{}: {}", resource, name, code))
                }
                (_, _, Some(code)) => Some(code.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

#[derive(Debug, PartialEq)]
enum RateLimit {
    Remaining(u64),
    Exhausted { resets_in: Option<u64> },
}

fn rate_limit(headers: &HeaderMap, now: u64) -> Option<RateLimit> {
    match header_u64(headers, "x-ratelimit-remaining")? {
        0 => Some(RateLimit::Exhausted {
            resets_in: header_u64(headers, "x-ratelimit-reset")
                .filter(|reset| *reset > now)
                .map(|reset| reset - now),
        }),
        remaining => Some(RateLimit::Remaining(remaining)),
    }
}

fn log_rate_limit(headers: &HeaderMap) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    match rate_limit(headers, now) {
        Some(RateLimit::Exhausted { resets_in: Some(secs) }) => {
            warn!("rate limit exhausted; resets in {} seconds", secs)
        }
        Some(RateLimit::Exhausted { resets_in: None }) => warn!("rate limit exhausted"),
        Some(RateLimit::Remaining(remaining)) => debug!("rate limit remaining: {}", remaining),
        None => {}
    }
}
