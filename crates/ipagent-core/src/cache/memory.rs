// # Memory IP Cache
//
// In-memory implementation of IpCache.
//
// ## Purpose
//
// Holds the last applied IP for the lifetime of the process only. Useful for
// tests and for embedding the agent in a long-running program that calls
// `run_once` repeatedly.
//
// ## Crash Behavior
//
// - The address is lost on restart
// - The first run after a restart always reconciles

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ip_cache::IpCache;

/// In-memory IP cache
///
/// Clones share the same slot, so a test can keep a handle while the agent
/// owns another.
///
/// # Example
///
/// ```rust
/// use ipagent_core::cache::MemoryIpCache;
/// use ipagent_core::traits::IpCache;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = MemoryIpCache::new();
///     assert_eq!(cache.read().await?, None);
///
///     cache.write("1.2.3.4".parse()?).await?;
///     assert_eq!(cache.read().await?, Some("1.2.3.4".parse()?));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryIpCache {
    inner: Arc<RwLock<Option<IpAddr>>>,
}

impl MemoryIpCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that already holds `ip`
    pub fn with_ip(ip: IpAddr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip))),
        }
    }

    /// Forget the stored address
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl IpCache for MemoryIpCache {
    async fn read(&self) -> Result<Option<IpAddr>, Error> {
        Ok(*self.inner.read().await)
    }

    async fn write(&self, ip: IpAddr) -> Result<(), Error> {
        *self.inner.write().await = Some(ip);
        Ok(())
    }
}
