//! Error types for the GitHub API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while resolving configuration. These are usage errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no GitHub host given: pass --host or set GITHUB_HOST")]
    MissingHost,

    #[error("no credentials given: pass --token, --auth or set GITHUB_TOKEN")]
    MissingCredentials,

    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Errors raised while parsing a request item from the command line.
#[derive(Error, Debug, PartialEq)]
pub enum ItemError {
    #[error("{kind} key cannot be empty: {item}")]
    EmptyKey { kind: &'static str, item: String },

    #[error("invalid JSON value for '{key}': {reason}")]
    InvalidJson { key: String, reason: String },

    #[error(
        "invalid format: '{0}'. Expected 'Header:Value', 'key==value', 'key=value', 'key[]=value' or 'key:=json'"
    )]
    Unrecognized(String),
}

/// Errors returned by an API call.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// The HTTP status of a failed call, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
