use std::net::IpAddr;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::config::RegionConfig;

/// Geolocation-backed region check. Lookup failures of any kind (transport,
/// timeout, non-2xx, malformed payload, absent flag) coerce to "outside the
/// region": the check may only ever push a submission toward manual review,
/// so the failure default is deny.
pub struct RegionClient {
    http: Client,
    config: RegionConfig,
}

#[derive(Debug, Deserialize)]
struct RegionLookup {
    in_eu: Option<bool>,
}

impl RegionClient {
    pub fn new(http: Client, config: RegionConfig) -> Self {
        Self { http, config }
    }

    pub async fn is_allowed_region(&self, source_addr: &str) -> bool {
        match source_addr.parse::<IpAddr>() {
            Ok(ip) if is_public(&ip) => {}
            Ok(_) => {
                tracing::debug!(target: "spam", addr = %source_addr, "non-public address, skipping region lookup");
                return false;
            }
            Err(_) => {
                tracing::warn!(target: "spam", addr = %source_addr, "unparseable source address, treating as outside region");
                return false;
            }
        }

        match self.lookup(source_addr).await {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::warn!(
                    target: "spam",
                    error = %err,
                    addr = %source_addr,
                    "region lookup failed, treating as outside region"
                );
                false
            }
        }
    }

    async fn lookup(&self, source_addr: &str) -> Result<bool> {
        let url = self
            .config
            .lookup_base_url
            .join(&format!("{source_addr}/json/"))
            .context("failed to build region lookup url")?;

        let payload: RegionLookup = self
            .http
            .get(url)
            .timeout(self.config.lookup_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(payload.in_eu.unwrap_or(false))
    }
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified())
        }
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn client_for(server: &MockServer) -> RegionClient {
        RegionClient::new(
            Client::new(),
            RegionConfig {
                lookup_base_url: Url::parse(&server.uri()).expect("mock server uri"),
                lookup_timeout: Duration::from_secs(2),
            },
        )
    }

    #[tokio::test]
    async fn allows_address_inside_region() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"in_eu": true})),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server).is_allowed_region("203.0.113.7").await);
    }

    #[tokio::test]
    async fn denies_address_outside_region() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"in_eu": false})),
            )
            .mount(&server)
            .await;

        assert!(!client_for(&server).is_allowed_region("203.0.113.7").await);
    }

    #[tokio::test]
    async fn absent_flag_defaults_to_deny() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ip": "203.0.113.7"})),
            )
            .mount(&server)
            .await;

        assert!(!client_for(&server).is_allowed_region("203.0.113.7").await);
    }

    #[tokio::test]
    async fn server_error_defaults_to_deny() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!client_for(&server).is_allowed_region("203.0.113.7").await);
    }

    #[tokio::test]
    async fn private_addresses_skip_the_lookup() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        assert!(!client.is_allowed_region("127.0.0.1").await);
        assert!(!client.is_allowed_region("192.168.1.20").await);
        assert!(!client.is_allowed_region("not-an-ip").await);
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 0);
    }
}
