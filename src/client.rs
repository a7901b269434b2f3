use anyhow::Result;
use reqwest::{Client, header};

use crate::config::{API_VERSION, Config};

pub fn build_client(config: &Config) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let user_agent = format!("github-api/{}", env!("CARGO_PKG_VERSION"));
    headers.insert(header::USER_AGENT, header::HeaderValue::from_str(&user_agent)?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_str(&config.accept)?);
    headers.insert("X-GitHub-Api-Version", header::HeaderValue::from_static(API_VERSION));

    let mut client_builder = Client::builder()
        .default_headers(headers)
        .timeout(config.timeout);

    if config.follow_redirects {
        client_builder = client_builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
    } else {
        client_builder = client_builder.redirect(reqwest::redirect::Policy::none());
    }
    Ok(client_builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Auth;

    fn config() -> Config {
        Config::with_base_url(
            "https://api.github.com".parse().unwrap(),
            Auth::Bearer("t".into()),
        )
    }

    #[test]
    fn build_client_basic() {
        assert!(build_client(&config()).is_ok());
    }

    #[test]
    fn build_client_with_redirects() {
        let mut config = config();
        config.follow_redirects = true;
        config.max_redirects = 5;
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn rejects_unencodable_accept() {
        let mut config = config();
        config.accept = "application/json\n".into();
        assert!(build_client(&config).is_err());
    }
}
