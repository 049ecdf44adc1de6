//! HTTP proxy support for network transports.
//!
//! Applies proxy settings to the HTTP client builders used by SSE and
//! streamable transports.

use std::time::Duration;

use crate::{
    core::config::ProxyConfig,
    error::{HubError, HubResult},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Apply proxy configuration to a `ClientBuilder`.
///
/// Reusable helper that configures the proxy without building the client,
/// so auth headers can still be added afterward.
pub(crate) fn apply_proxy_to_builder(
    mut builder: reqwest::ClientBuilder,
    proxy_cfg: &ProxyConfig,
) -> HubResult<reqwest::ClientBuilder> {
    if let Some(ref http_proxy) = proxy_cfg.http {
        let mut proxy = reqwest::Proxy::http(http_proxy)
            .map_err(|e| HubError::Configuration(format!("Invalid HTTP proxy: {}", e)))?;

        if let Some(ref no_proxy) = proxy_cfg.no_proxy {
            proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
        }

        if let (Some(ref username), Some(ref password)) = (&proxy_cfg.username, &proxy_cfg.password)
        {
            proxy = proxy.basic_auth(username, password);
        }

        builder = builder.proxy(proxy);
    }

    if let Some(ref https_proxy) = proxy_cfg.https {
        let mut proxy = reqwest::Proxy::https(https_proxy)
            .map_err(|e| HubError::Configuration(format!("Invalid HTTPS proxy: {}", e)))?;

        if let Some(ref no_proxy) = proxy_cfg.no_proxy {
            proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
        }

        if let (Some(ref username), Some(ref password)) = (&proxy_cfg.username, &proxy_cfg.password)
        {
            proxy = proxy.basic_auth(username, password);
        }

        builder = builder.proxy(proxy);
    }

    Ok(builder)
}

/// Build an HTTP client with the optional proxy applied.
pub(crate) fn create_http_client(proxy: Option<&ProxyConfig>) -> HubResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);

    if let Some(proxy_cfg) = proxy {
        builder = apply_proxy_to_builder(builder, proxy_cfg)?;
    }

    builder
        .build()
        .map_err(|e| HubError::Configuration(format!("build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_proxy_to_builder_with_http() {
        let proxy = ProxyConfig {
            http: Some("http://proxy.example.com:8080".to_string()),
            https: None,
            no_proxy: Some("localhost,127.0.0.1".to_string()),
            username: None,
            password: None,
        };

        let builder = reqwest::Client::builder();
        let result = apply_proxy_to_builder(builder, &proxy);
        assert!(result.is_ok(), "Should apply proxy to builder");
        assert!(result.unwrap().build().is_ok(), "Should build client");
    }

    #[test]
    fn test_apply_proxy_to_builder_with_auth() {
        let proxy = ProxyConfig {
            http: Some("http://proxy.example.com:8080".to_string()),
            https: None,
            no_proxy: None,
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
        };

        let builder = reqwest::Client::builder();
        let result = apply_proxy_to_builder(builder, &proxy);
        assert!(result.is_ok());
        assert!(result.unwrap().build().is_ok());
    }

    #[test]
    fn test_apply_proxy_to_builder_invalid_url() {
        let proxy = ProxyConfig {
            http: Some("://invalid".to_string()),
            https: None,
            no_proxy: None,
            username: None,
            password: None,
        };

        let builder = reqwest::Client::builder();
        let result = apply_proxy_to_builder(builder, &proxy);
        assert!(result.is_err(), "Should fail with invalid proxy URL");
    }

    #[test]
    fn test_create_http_client_no_proxy() {
        assert!(create_http_client(None).is_ok());
    }
}
