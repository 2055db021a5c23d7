// # DNS Provider Trait
//
// Defines the interface to the remote DNS provider: read the zone's current
// records, create a record, update a record by ID.
//
// ## Implementations
//
// - Cloudflare: `ipagent-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ipagent_core::DnsProvider;
//
// let records = provider.list_records("zone-id").await?;
// for record in &records {
//     println!("{} {} -> {}", record.record_type, record.name, record.content);
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::domain::Domain;

/// A DNS record as the provider currently has it
///
/// Owned by the provider. The reconciler only reads it; changes go through
/// [`DnsProvider::create_record`] and [`DnsProvider::update_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Provider-assigned opaque identifier
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type as reported by the provider (may be outside the managed set)
    pub record_type: String,
    /// Record content (an IP address for A/AAAA)
    pub content: String,
    /// Whether the provider proxies this record
    pub proxied: bool,
}

impl RemoteRecord {
    /// Create a new remote record
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
        proxied: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            proxied,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Each method is a single-shot call against the provider. Implementations
/// must not retry, cache between calls, or decide whether a change is
/// needed; the reconciler decides, the agent sequences, the provider
/// executes.
///
/// Errors should use [`crate::Error::RemoteFetch`] for listing and
/// [`crate::Error::RemoteMutation`] (or a more specific transport error) for
/// create and update. Any error aborts the run.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record in the zone
    ///
    /// Implementations must follow pagination until the full record set has
    /// been read.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Create a record for `domain` pointing at `ip`
    async fn create_record(
        &self,
        zone_id: &str,
        domain: &Domain,
        ip: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Overwrite the record identified by `record_id` with `domain` and `ip`
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        domain: &Domain,
        ip: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
