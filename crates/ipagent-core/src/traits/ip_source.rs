// # IP Source Trait
//
// Defines the interface for determining the current public IP address.
//
// ## Implementations
//
// - HTTP echo service (ipify and friends): `ipagent-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ipagent_core::IpSource;
//
// let ip = source.current().await?;
// println!("public IP: {}", ip);
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// A source answers one question: what is the public address right now.
/// It performs a single lookup per call with no retries; any failure is
/// reported as [`crate::Error::IpResolution`] and ends the run.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Short name for logs
    fn source_name(&self) -> &str {
        "ip-source"
    }
}
