use anyhow::{Context, Result, anyhow};
use clap::Parser;
use reqwest::Method;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::auth::Auth;
use crate::config::{ConfigSource, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};
use crate::github::Paginate;
use crate::request::{ApiRequest, RequestItem};
use crate::response::{JsonStyle, OutputFilter};

/// Call the GitHub REST API (github.com or GitHub Enterprise) from the shell
///
/// Examples:
///   # Who am I?
///   github-api get /user
///
///   # Every repository of an organization, all pages
///   github-api get /orgs/rust-lang/repos per_page==100 --paginate
///
///   # Approve a pull request
///   github-api post /repos/OWNER/REPO/pulls/42/reviews event=APPROVE
///
///   # Protect a branch from a JSON file
///   github-api put /repos/OWNER/REPO/branches/main/protection --input protection.json
///
///   # Enterprise host, raw JSON parameters
///   github-api --host github.example.com post /user/repos name=demo private:=true
#[derive(Parser, Debug)]
#[clap(version)]
pub struct Cli {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug, Clone)]
pub struct ConnectionArgs {
    /// GitHub host: github.com, an Enterprise host name, or a full API URL
    #[arg(long = "host", env = "GITHUB_HOST", global = true)]
    pub host: Option<String>,

    /// Personal access token, sent as a bearer token
    #[arg(long = "token", env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Alternative credentials: username:password or a token
    #[arg(short = 'a', long = "auth", value_parser = parse_auth, global = true)]
    pub auth: Option<Auth>,

    /// Accept header sent with every request
    #[arg(long = "accept", global = true)]
    pub accept: Option<String>,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    /// Follow redirects
    #[arg(short = 'F', long = "follow", global = true)]
    pub follow_redirects: bool,

    /// Maximum number of redirects
    #[arg(long = "max-redirects", default_value_t = DEFAULT_MAX_REDIRECTS, global = true)]
    pub max_redirects: usize,

    /// Verbose mode: log requests, timings and rate limits to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

impl ConnectionArgs {
    pub fn config_source(&self) -> ConfigSource {
        ConfigSource {
            host: self.host.clone(),
            token: self.token.clone(),
            auth: self.auth.clone(),
            accept: self.accept.clone(),
            timeout: Some(self.timeout),
            follow_redirects: self.follow_redirects,
            max_redirects: Some(self.max_redirects),
        }
    }
}

#[derive(Parser, Debug)]
pub enum Command {
    /// Make a GET request
    Get(RequestArgs),

    /// Make a POST request
    Post(RequestArgs),

    /// Make a PUT request
    Put(RequestArgs),

    /// Make a PATCH request
    Patch(RequestArgs),

    /// Make a DELETE request
    Delete(RequestArgs),

    /// Make a HEAD request
    Head(RequestArgs),
}

impl Command {
    pub fn method(&self) -> Method {
        match self {
            Command::Get(_) => Method::GET,
            Command::Post(_) => Method::POST,
            Command::Put(_) => Method::PUT,
            Command::Patch(_) => Method::PATCH,
            Command::Delete(_) => Method::DELETE,
            Command::Head(_) => Method::HEAD,
        }
    }

    pub fn args(&self) -> &RequestArgs {
        match self {
            Command::Get(args) => args,
            Command::Post(args) => args,
            Command::Put(args) => args,
            Command::Patch(args) => args,
            Command::Delete(args) => args,
            Command::Head(args) => args,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RequestArgs {
    /// API path such as /repos/OWNER/REPO, or an absolute URL
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Request items: headers (Name:Value), query (key==value), fields (key=value),
    /// raw JSON (key:=json), array elements (key[]=value)
    #[arg(value_name = "REQUEST_ITEM", value_parser = parse_request_item)]
    pub items: Vec<RequestItem>,

    /// Read the JSON request body from a file ("-" for stdin)
    #[arg(long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Follow Link rel="next" headers and combine every page
    #[arg(long = "paginate")]
    pub paginate: bool,

    /// Stop after this many pages (implies --paginate)
    #[arg(long = "max-pages", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Print the status line and headers before the body
    #[arg(short = 'i', long = "include", conflicts_with = "headers_only")]
    pub include: bool,

    /// Print only the status line and headers
    #[arg(long = "headers", conflicts_with = "include")]
    pub headers_only: bool,

    /// Print JSON on a single line
    #[arg(long = "compact")]
    pub compact: bool,
}

impl RequestArgs {
    pub fn output_filter(&self) -> OutputFilter {
        if self.headers_only {
            OutputFilter::HeadersOnly
        } else if self.include {
            OutputFilter::All
        } else {
            OutputFilter::BodyOnly
        }
    }

    pub fn json_style(&self) -> JsonStyle {
        if self.compact {
            JsonStyle::Compact
        } else {
            JsonStyle::Pretty
        }
    }

    pub fn paginate(&self) -> Paginate {
        if self.paginate || self.max_pages.is_some() {
            Paginate::All {
                max_pages: self.max_pages.map(|n| n as usize),
            }
        } else {
            Paginate::FirstPage
        }
    }
}

/// Build the API request for a command, reading `--input` if given.
pub async fn build_request(command: &Command) -> Result<ApiRequest> {
    let args = command.args();
    let mut request =
        ApiRequest::new(command.method(), args.path.clone()).items(args.items.iter().cloned());
    if let Some(input) = &args.input {
        request = request.with_input(read_input(input).await?);
    }
    Ok(request)
}

async fn read_input(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
            .await
            .context("failed to read stdin")??
    } else {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read file '{}': {}", path.display(), e))?
    };
    serde_json::from_str(&text).with_context(|| format!("'{}' is not valid JSON", path.display()))
}

// ============================================================================
// Parse Function
// ============================================================================

fn parse_request_item(s: &str) -> Result<RequestItem> {
    Ok(s.parse()?)
}

fn parse_auth(s: &str) -> Result<Auth> {
    s.parse()
}

// ============================================================================
// Tests
// ============================================================================
