use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use reqwest::{RequestBuilder, header};
use std::str::FromStr;

/// Prefixes GitHub uses for its token types.
const GITHUB_TOKEN_PREFIXES: &[&str] = &["ghp_", "gho_", "ghs_", "ghu_", "ghr_", "github_pat_"];

#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer(String),
}

impl Auth {
    /// The exact `Authorization` header value this credential produces.
    pub fn header_value(&self) -> String {
        match self {
            Auth::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password.as_deref().unwrap_or(""));
                format!("Basic {}", general_purpose::STANDARD.encode(credentials))
            }
            Auth::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

impl FromStr for Auth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("bearer:") || s.starts_with("Bearer:") {
            let token = s.split_once(':').map(|x| x.1).unwrap_or("");
            if token.is_empty() {
                return Err(anyhow!("Bearer token cannot be empty."));
            }
            return Ok(Auth::Bearer(token.to_string()));
        }

        if GITHUB_TOKEN_PREFIXES.iter().any(|p| s.starts_with(p)) {
            return Ok(Auth::Bearer(s.to_string()));
        }

        let (username, password) = match s.split_once(':') {
            Some((user, pass)) => (user, Some(pass.to_string())),
            None => (s, None),
        };
        if username.is_empty() {
            return Err(anyhow!("Username cannot be empty"));
        }

        Ok(Auth::Basic {
            username: username.to_string(),
            password,
        })
    }
}

pub fn apply_auth(builder: RequestBuilder, auth: &Auth) -> RequestBuilder {
    match auth {
        Auth::Basic { username, password } => builder.basic_auth(username, password.as_ref()),
        Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
    }
}

/// Hide the credential part of an `Authorization` value, keeping the scheme
/// and, for long values, the last four characters.
pub fn mask_authorization(value: &str) -> String {
    let (scheme, secret) = value.split_once(' ').unwrap_or(("", value));
    let tail = if secret.chars().count() > 16 {
        let skip = secret.chars().count() - 4;
        secret.chars().skip(skip).collect::<String>()
    } else {
        String::new()
    };
    let masked = format!("****{}", tail);
    if scheme.is_empty() {
        masked
    } else {
        format!("{} {}", scheme, masked)
    }
}
