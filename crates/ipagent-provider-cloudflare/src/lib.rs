// # Cloudflare DNS Provider
//
// Cloudflare API v4 implementation of `ipagent_core::DnsProvider`.
//
// ## Behavior
//
// - One HTTP request per call, except listing which follows pagination
// - HTTP timeout of 30 seconds
// - Status codes mapped to specific errors (401/403, 404, 409, 429, 5xx)
// - No retries, no caching between calls, no background tasks
// - Never decides whether a change is needed; the agent does that
//
// ## Security
//
// - Credentials never appear in logs or Debug output
// - A scoped API token is preferred over the global key + email pair
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ipagent_core::config::CloudflareConfig;
use ipagent_core::traits::{DnsProvider, RemoteRecord};
use ipagent_core::{Domain, Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page when listing a zone
const PER_PAGE: u32 = 100;

/// TTL value meaning "automatic"
const AUTO_TTL: u32 = 1;

const PROVIDER: &str = "cloudflare";

/// Credentials for the Cloudflare API
#[derive(Clone, PartialEq, Eq)]
pub enum CloudflareAuth {
    /// Scoped API token, sent as `Authorization: Bearer`
    Token(String),
    /// Global API key, sent as `X-Auth-Email` / `X-Auth-Key`
    GlobalKey { email: String, key: String },
}

impl CloudflareAuth {
    /// Pick credentials from the config, preferring a non-empty token
    pub fn from_config(config: &CloudflareConfig) -> Result<Self> {
        if let Some(token) = config.api_token.as_deref()
            && !token.trim().is_empty()
        {
            return Ok(Self::Token(token.to_string()));
        }

        if config.api_key.trim().is_empty() || config.api_email.trim().is_empty() {
            return Err(Error::config(
                "Cloudflare credentials missing: set api_token, or both api_key and api_email",
            ));
        }

        Ok(Self::GlobalKey {
            email: config.api_email.clone(),
            key: config.api_key.clone(),
        })
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Token(token) => request.bearer_auth(token),
            Self::GlobalKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }
}

// Never print credential values.
impl std::fmt::Debug for CloudflareAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            Self::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Cloudflare DNS provider
///
/// Stateless and single-shot. The zone is passed on every call, so one
/// provider can serve any zone the credentials can reach.
#[derive(Debug)]
pub struct CloudflareProvider {
    auth: CloudflareAuth,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API root, overridable for testing against a local server
    base_url: String,
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the HTTP client cannot be built.
    pub fn new(auth: CloudflareAuth) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth,
            client,
            base_url: CLOUDFLARE_API_BASE.to_string(),
        })
    }

    /// Create a provider from the `[cloudflare]` config section
    pub fn from_config(config: &CloudflareConfig) -> Result<Self> {
        Self::new(CloudflareAuth::from_config(config)?)
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn list_url(&self, zone_id: &str, page: u32) -> String {
        format!(
            "{}?page={}&per_page={}",
            self.records_url(zone_id),
            page,
            PER_PAGE
        )
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/{}", self.records_url(zone_id), record_id)
    }

    /// Send a request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<CloudflareResponse<T>> {
        let response = self
            .auth
            .apply(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !status.is_success() {
            return Err(status_error(status, &body, action));
        }

        parse_envelope(&body, action)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RemoteRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            tracing::debug!("Listing Cloudflare DNS records (page {})", page);

            let envelope: CloudflareResponse<Vec<DnsRecordResponse>> = self
                .send(self.client.get(self.list_url(zone_id, page)), "list DNS records")
                .await?;

            let batch = envelope.result.unwrap_or_default();
            let fetched = batch.len();
            records.extend(batch.into_iter().map(RemoteRecord::from));

            let total_pages = envelope.result_info.map(|info| info.total_pages);
            if !has_next_page(page, total_pages, fetched) {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, domain: &Domain, ip: IpAddr) -> Result<()> {
        let payload = RecordPayload::new(domain, ip);
        tracing::debug!("Creating Cloudflare DNS record: {} -> {}", domain.name, ip);

        let _: CloudflareResponse<serde::de::IgnoredAny> = self
            .send(
                self.client.post(self.records_url(zone_id)).json(&payload),
                "create DNS record",
            )
            .await?;

        tracing::info!("DNS record created successfully: {} -> {}", domain.name, ip);
        Ok(())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        domain: &Domain,
        ip: IpAddr,
    ) -> Result<()> {
        let payload = RecordPayload::new(domain, ip);
        tracing::debug!(
            "Updating Cloudflare DNS record {}: {} -> {}",
            record_id,
            domain.name,
            ip
        );

        let _: CloudflareResponse<serde::de::IgnoredAny> = self
            .send(
                self.client
                    .put(self.record_url(zone_id, record_id))
                    .json(&payload),
                "update DNS record",
            )
            .await?;

        tracing::info!("DNS record updated successfully: {} -> {}", domain.name, ip);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Standard Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CloudflareMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct CloudflareMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    total_pages: u32,
}

/// DNS record as returned by the API
#[derive(Debug, Deserialize)]
struct DnsRecordResponse {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    proxied: bool,
}

impl From<DnsRecordResponse> for RemoteRecord {
    fn from(record: DnsRecordResponse) -> Self {
        RemoteRecord::new(
            record.id,
            record.name,
            record.record_type,
            record.content,
            record.proxied,
        )
    }
}

/// Request body for create and update
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: String,
    proxied: bool,
    ttl: u32,
}

impl<'a> RecordPayload<'a> {
    fn new(domain: &'a Domain, ip: IpAddr) -> Self {
        Self {
            record_type: domain.record_type.as_str(),
            name: &domain.name,
            content: ip.to_string(),
            proxied: domain.proxy,
            ttl: AUTO_TTL,
        }
    }
}

/// Whether another page follows `page`
///
/// A response without `result_info` is a single page. An empty page ends the
/// listing even if `total_pages` claims more.
fn has_next_page(page: u32, total_pages: Option<u32>, fetched: usize) -> bool {
    fetched > 0 && page < total_pages.unwrap_or(1)
}

/// Parse a 2xx body, turning `success: false` into an error
fn parse_envelope<T: DeserializeOwned>(body: &str, action: &str) -> Result<CloudflareResponse<T>> {
    let envelope: CloudflareResponse<T> = serde_json::from_str(body).map_err(|e| {
        Error::provider(PROVIDER, format!("{}: failed to parse response: {}", action, e))
    })?;

    if !envelope.success {
        let messages = envelope
            .errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::provider(
            PROVIDER,
            format!("{} rejected: {}", action, messages),
        ));
    }

    Ok(envelope)
}

/// Map a non-2xx status to an error
fn status_error(status: StatusCode, body: &str, action: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid credentials or insufficient permissions. Status: {}",
            action, status
        )),
        404 => Error::not_found(format!("{}: zone or record not found. Status: {}", action, status)),
        409 => Error::provider(
            PROVIDER,
            format!("{}: conflict with an existing record. Status: {} - {}", action, status, body),
        ),
        429 => Error::rate_limited(format!("{}: rate limit exceeded. Status: {}", action, status)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("{}: Cloudflare server error (transient): {} - {}", action, status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", action, status, body)),
    }
}
