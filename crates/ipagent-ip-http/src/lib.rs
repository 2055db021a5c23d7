// # HTTP IP Source
//
// Resolves the machine's public IP by asking an external "what is my IP"
// service. The default is ipify in JSON mode; any service that answers with
// either `{"ip": "..."}` or a bare address in the body works.
//
// One request per `current()` call. No polling, no caching, no retries.

use ipagent_core::config::IpServiceConfig;
use ipagent_core::traits::IpSource;
use ipagent_core::{Error, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Lookup service, e.g. "https://api.ipify.org?format=json"
    /// - `timeout`: Whole-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the `[ip_service]` config section
    pub fn from_config(config: &IpServiceConfig) -> Result<Self> {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        tracing::debug!("Resolving public IP via {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_resolution(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_resolution(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_resolution(format!("Failed to read response: {}", e)))?;

        parse_ip_body(&body)
    }

    fn source_name(&self) -> &str {
        "http"
    }
}

#[derive(Deserialize)]
struct IpResponse {
    ip: String,
}

/// Extract an address from a lookup service's response body
///
/// Accepts a JSON object with an `ip` field, or the address as plain text.
/// Surrounding whitespace is ignored.
pub fn parse_ip_body(body: &str) -> Result<IpAddr> {
    let body = body.trim();

    let text = if body.starts_with('{') {
        let parsed: IpResponse = serde_json::from_str(body)
            .map_err(|e| Error::ip_resolution(format!("Malformed JSON response: {}", e)))?;
        parsed.ip
    } else {
        body.to_string()
    };

    let text = text.trim();
    text.parse()
        .map_err(|_| Error::ip_resolution(format!("Invalid IP address: {:?}", text)))
}
