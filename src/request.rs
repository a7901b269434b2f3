use reqwest::{Method, Url};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::auth::mask_authorization;
use crate::error::{ApiError, ItemError};

/// One request item from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestItem {
    //HTTP Header: "Accept:application/vnd.github.raw"
    Header(String, String),
    //Query Parameter, whatever the verb: "per_page==100"
    QueryParam(String, String),
    //String parameter: "title=Fix bug"
    Field(String, String),
    //Raw JSON parameter: "draft:=true"
    RawField(String, Value),
    //Array element: "labels[]=bug"
    ArrayField(String, String),
}

impl FromStr for RequestItem {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let colon = s.find(':');
        let equals = s.find('=');

        // Whichever separator comes first decides the item kind, so values
        // may freely contain the other one.
        if let Some(pos) = colon
            && equals.is_none_or(|e| pos < e)
        {
            let key = s[..pos].trim().to_string();
            if let Some(raw) = s[pos + 1..].strip_prefix('=') {
                if key.is_empty() {
                    return Err(empty_key("Raw field", s));
                }
                let value = serde_json::from_str(raw.trim()).map_err(|e| ItemError::InvalidJson {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
                return Ok(RequestItem::RawField(key, value));
            }
            if key.is_empty() {
                return Err(empty_key("Header", s));
            }
            return Ok(RequestItem::Header(key, s[pos + 1..].trim().to_string()));
        }

        if let Some(pos) = equals {
            let key = s[..pos].trim().to_string();

            //Longest Match First
            if let Some(value) = s[pos + 1..].strip_prefix('=') {
                if key.is_empty() {
                    return Err(empty_key("Query parameter", s));
                }
                return Ok(RequestItem::QueryParam(key, value.trim().to_string()));
            }

            let value = s[pos + 1..].trim().to_string();
            if let Some(base) = key.strip_suffix("[]") {
                let base = base.trim();
                if base.is_empty() {
                    return Err(empty_key("Array field", s));
                }
                return Ok(RequestItem::ArrayField(base.to_string(), value));
            }
            if key.is_empty() {
                return Err(empty_key("Field", s));
            }
            return Ok(RequestItem::Field(key, value));
        }

        Err(ItemError::Unrecognized(s.to_string()))
    }
}

fn empty_key(kind: &'static str, item: &str) -> ItemError {
    ItemError::EmptyKey {
        kind,
        item: item.to_string(),
    }
}

/// Where the parameters of a request travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamPlacement {
    Query,
    JsonBody,
}

pub fn param_placement(method: &Method) -> ParamPlacement {
    match *method {
        Method::POST | Method::PUT | Method::PATCH => ParamPlacement::JsonBody,
        _ => ParamPlacement::Query,
    }
}

/// A single call against the REST API, before it is turned into HTTP.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub items: Vec<RequestItem>,
    /// Raw JSON body; when set, parameters are sent in the query string.
    pub input: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            items: Vec::new(),
            input: None,
        }
    }

    pub fn item(mut self, item: RequestItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = RequestItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_input(mut self, body: Value) -> Self {
        self.input = Some(body);
        self
    }

    fn placement(&self) -> ParamPlacement {
        if self.input.is_some() {
            ParamPlacement::Query
        } else {
            param_placement(&self.method)
        }
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match item {
            RequestItem::Header(k, v) => Some((k.as_str(), v.as_str())),
            _ => None,
        })
    }

    /// Parameters folded into a JSON object. Later fields override earlier
    /// ones; array fields accumulate.
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        for item in &self.items {
            match item {
                RequestItem::Field(k, v) => {
                    params.insert(k.clone(), Value::String(v.clone()));
                }
                RequestItem::RawField(k, v) => {
                    params.insert(k.clone(), v.clone());
                }
                RequestItem::ArrayField(k, v) => {
                    let value = Value::String(v.clone());
                    match params.get_mut(k) {
                        Some(Value::Array(values)) => values.push(value),
                        Some(existing) => {
                            let previous = existing.take();
                            *existing = Value::Array(vec![previous, value]);
                        }
                        None => {
                            params.insert(k.clone(), Value::Array(vec![value]));
                        }
                    }
                }
                RequestItem::Header(..) | RequestItem::QueryParam(..) => {}
            }
        }
        params
    }

    /// The JSON body to send, if any.
    pub fn body(&self) -> Option<Value> {
        if let Some(input) = &self.input {
            return Some(input.clone());
        }
        match self.placement() {
            ParamPlacement::JsonBody => {
                let params = self.params();
                (!params.is_empty()).then_some(Value::Object(params))
            }
            ParamPlacement::Query => None,
        }
    }

    /// Query string pairs in the order they were given.
    pub fn query(&self) -> Vec<(String, String)> {
        let params_in_query = self.placement() == ParamPlacement::Query;
        let mut query = Vec::new();
        for item in &self.items {
            match item {
                RequestItem::QueryParam(k, v) => query.push((k.clone(), v.clone())),
                RequestItem::Field(k, v) if params_in_query => query.push((k.clone(), v.clone())),
                RequestItem::RawField(k, v) if params_in_query => match v {
                    Value::Array(values) => {
                        let key = format!("{}[]", k);
                        query.extend(values.iter().map(|v| (key.clone(), query_text(v))));
                    }
                    other => query.push((k.clone(), query_text(other))),
                },
                RequestItem::ArrayField(k, v) if params_in_query => {
                    query.push((format!("{}[]", k), v.clone()))
                }
                _ => {}
            }
        }
        query
    }
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turn a path (or absolute URL) into the URL to request.
pub fn resolve_url(base: &Url, path: &str) -> Result<Url, ApiError> {
    let path = path.trim();
    let raw = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
        url: raw,
        reason: e.to_string(),
    })
}

/// What is about to go on the wire, for debug logging.
#[derive(Debug, Default)]
pub struct RequestTrace {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RequestTrace {
    pub fn new(method: &Method, url: &Url) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.push((key.into(), value.into()));
    }

    pub fn set_body(&mut self, body: &Value) {
        self.body = serde_json::to_string_pretty(body).ok();
    }
}

impl fmt::Display for RequestTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (path, host) = match Url::parse(&self.url) {
            Ok(url) => {
                let path = match url.query() {
                    Some(q) => format!("{}?{}", url.path(), q),
                    None => url.path().to_string(),
                };
                (path, url.host_str().map(str::to_string))
            }
            Err(_) => (self.url.clone(), None),
        };

        writeln!(f, "> {} {} HTTP/1.1", self.method, path)?;
        if let Some(host) = host {
            writeln!(f, "> Host: {}", host)?;
        }
        for (key, value) in &self.headers {
            if key.eq_ignore_ascii_case("authorization") {
                writeln!(f, "> {}: {}", key, mask_authorization(value))?;
            } else {
                writeln!(f, "> {}: {}", key, value)?;
            }
        }
        write!(f, ">")?;
        if let Some(body) = &self.body {
            for line in body.lines() {
                write!(f, "\n> {}", line)?;
            }
        }
        Ok(())
    }
}
