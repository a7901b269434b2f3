//! Connection settings for a github.com or GitHub Enterprise host.

use reqwest::Url;
use std::time::Duration;

use crate::auth::Auth;
use crate::error::ConfigError;

pub const DEFAULT_ACCEPT: &str = "application/vnd.github+json";
pub const API_VERSION: &str = "2022-11-28";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

const PUBLIC_API: &str = "https://api.github.com";

/// Resolved settings for talking to one GitHub host.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub auth: Auth,
    pub accept: String,
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

/// Raw settings as gathered from flags and environment, before validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub host: Option<String>,
    pub token: Option<String>,
    pub auth: Option<Auth>,
    pub accept: Option<String>,
    pub timeout: Option<u64>,
    pub follow_redirects: bool,
    pub max_redirects: Option<usize>,
}

impl Config {
    pub fn resolve(source: ConfigSource) -> Result<Self, ConfigError> {
        let host = non_empty(source.host).ok_or(ConfigError::MissingHost)?;
        let base_url = api_base_url(&host)?;

        let auth = match (non_empty(source.token), source.auth) {
            (Some(token), _) => Auth::Bearer(token),
            (None, Some(auth)) => auth,
            (None, None) => return Err(ConfigError::MissingCredentials),
        };

        Ok(Self {
            base_url,
            auth,
            accept: non_empty(source.accept).unwrap_or_else(|| DEFAULT_ACCEPT.to_string()),
            timeout: Duration::from_secs(source.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            follow_redirects: source.follow_redirects,
            max_redirects: source.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
        })
    }

    /// Config against an explicit base URL, used by tests and embedders.
    pub fn with_base_url(base_url: Url, auth: Auth) -> Self {
        Self {
            base_url,
            auth,
            accept: DEFAULT_ACCEPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            follow_redirects: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Map a host name to the root of its REST API.
///
/// `github.com` lives at `api.github.com`; Enterprise servers serve the API
/// under `/api/v3`. A host given with a scheme is taken as the API root itself.
pub fn api_base_url(host: &str) -> Result<Url, ConfigError> {
    let host = host.trim();
    let raw = if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        let bare = host.trim_end_matches('/');
        match bare.to_ascii_lowercase().as_str() {
            "github.com" | "api.github.com" => PUBLIC_API.to_string(),
            _ => format!("https://{}/api/v3", bare),
        }
    };

    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw,
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
