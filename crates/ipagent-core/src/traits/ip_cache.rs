// # IP Cache Trait
//
// Defines the interface for the last-applied IP address.
//
// ## Purpose
//
// The cache lets a run stop early when the public IP has not changed since
// the previous run, avoiding any provider API calls. It holds exactly one
// address: no history, no TTL.
//
// ## Implementations
//
// - File-based: `FileIpCache` (plain text file in the temp directory)
// - In-memory: `MemoryIpCache` (tests, embedding)

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP cache implementations
#[async_trait]
pub trait IpCache: Send + Sync {
    /// Read the previously stored address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ip))`: an address was stored by an earlier run
    /// - `Ok(None)`: nothing stored yet (first run)
    /// - `Err(Error::CacheRead)`: the cache exists but could not be read
    async fn read(&self) -> Result<Option<IpAddr>, crate::Error>;

    /// Overwrite the stored address
    ///
    /// Failures are reported as `Error::CacheWrite`; callers treat them as
    /// warnings.
    async fn write(&self, ip: IpAddr) -> Result<(), crate::Error>;
}

/// Whether `current` differs from what the cache holds
///
/// An empty cache is never equal to any address. An IPv4-mapped IPv6
/// address (`::ffff:a.b.c.d`) equals its IPv4 form.
pub fn ip_changed(cached: Option<IpAddr>, current: IpAddr) -> bool {
    cached.map(|ip| ip.to_canonical()) != Some(current.to_canonical())
}
