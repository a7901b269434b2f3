use anyhow::{Result, anyhow};
use reqwest::StatusCode;
use reqwest::Version;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt::Write as _;

use crate::github::{ApiResponse, ResponseBody};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFilter {
    All,
    HeadersOnly,
    BodyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsonStyle {
    Pretty,
    Compact,
}

pub fn format_status(version: Version, status: StatusCode) -> String {
    format!("{:?} {}", version, status)
}

pub fn format_headers(headers: &HeaderMap) -> String {
    let mut out = String::new();
    for (name, value) in headers {
        let _ = writeln!(out, "{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    out
}

/// Render a decoded body. Non-JSON payloads are printed verbatim and `null`
/// renders as nothing.
pub fn format_body(body: &ResponseBody, style: JsonStyle) -> Result<String> {
    let text = match body {
        ResponseBody::Text(raw) => return Ok(raw.clone()),
        ResponseBody::Json(Value::Null) => return Ok(String::new()),
        ResponseBody::Json(value) => serde_json::to_string(value)?,
    };
    let formatted = match style {
        JsonStyle::Pretty => jsonxf::pretty_print(&text),
        JsonStyle::Compact => jsonxf::minimize(&text),
    };
    formatted.map_err(|e| anyhow!("failed to format JSON: {}", e))
}

pub fn render(resp: &ApiResponse, filter: OutputFilter, style: JsonStyle) -> Result<String> {
    let mut out = String::new();
    if matches!(filter, OutputFilter::All | OutputFilter::HeadersOnly) {
        out.push_str(&format_status(resp.version, resp.status));
        out.push('\n');
        out.push_str(&format_headers(&resp.headers));
    }
    if matches!(filter, OutputFilter::All | OutputFilter::BodyOnly) {
        let body = format_body(&resp.body, style)?;
        if !body.is_empty() {
            if filter == OutputFilter::All {
                out.push('\n');
            }
            out.push_str(body.trim_end_matches('\n'));
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_TYPE, HeaderValue};
    use serde_json::json;

    fn response(body: Value) -> ApiResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        ApiResponse {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers,
            body: ResponseBody::Json(body),
            pages: 1,
        }
    }

    #[test]
    fn pretty_body() {
        let text = format_body(
            &ResponseBody::Json(json!({"login": "octocat", "id": 1})),
            JsonStyle::Pretty,
        ).unwrap();
        assert!(text.lines().count() > 1);
        assert!(text.contains("\"login\": \"octocat\""));
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed, json!({"login": "octocat", "id": 1}));
    }

    #[test]
    fn compact_body() {
        let text = format_body(&ResponseBody::Json(json!([1, {"a": [2, 3]}])), JsonStyle::Compact).unwrap();
        assert_eq!(text.trim_end(), "[1,{\"a\":[2,3]}]");
    }

    #[test]
    fn raw_and_null_bodies() {
        assert_eq!(
            format_body(&ResponseBody::Json(Value::Null), JsonStyle::Pretty).unwrap(),
            ""
        );
        assert_eq!(
            format_body(&ResponseBody::Text("diff --git a/x b/x\n".into()), JsonStyle::Pretty)
                .unwrap(),
            "diff --git a/x b/x\n"
        );
    }

    #[test]
    fn json_string_keeps_quotes() {
        let text = format_body(&ResponseBody::Json(json!("hello")), JsonStyle::Compact).unwrap();
        assert_eq!(text.trim_end(), "\"hello\"");
        let text = format_body(&ResponseBody::Text("hello".into()), JsonStyle::Compact).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn body_only_is_default_shape() {
        let out = render(&response(json!({"a": 1})), OutputFilter::BodyOnly, JsonStyle::Compact).unwrap();
        assert_eq!(out, "{\"a\":1}\n");
    }

    #[test]
    fn include_status_and_headers() {
        let out = render(&response(json!({"a": 1})), OutputFilter::All, JsonStyle::Compact).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\ncontent-type: application/json\n\n"));
        assert!(out.ends_with("{\"a\":1}\n"));
    }

    #[test]
    fn headers_only_skips_body() {
        let out = render(&response(json!({"a": 1})), OutputFilter::HeadersOnly, JsonStyle::Pretty).unwrap();
        assert_eq!(out, "HTTP/1.1 200 OK\ncontent-type: application/json\n");
    }

    #[test]
    fn empty_body_prints_nothing() {
        let mut resp = response(Value::Null);
        resp.status = StatusCode::NO_CONTENT;
        assert_eq!(render(&resp, OutputFilter::BodyOnly, JsonStyle::Pretty).unwrap(), "");
    }
}
