// # File IP Cache
//
// File-based implementation of IpCache.
//
// ## File Format
//
// The file holds the textual form of one IP address and nothing else:
//
// ```text
// 203.0.113.7
// ```
//
// ## Behavior
//
// - Missing file: first run, reported as `Ok(None)`
// - Unreadable file (permissions, is a directory, ...): `Error::CacheRead`
// - Content that is not an IP: treated as empty, with a warning, so the next
//   run reconciles and rewrites it
// - Writes truncate and overwrite the file in place

use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::ip_cache::IpCache;

/// Default cache file name, placed in the system temp directory
pub const DEFAULT_CACHE_FILE: &str = "ipagent.tmp";

/// Plain-text file cache
///
/// # Example
///
/// ```rust,no_run
/// use ipagent_core::cache::FileIpCache;
/// use ipagent_core::traits::IpCache;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = FileIpCache::in_temp_dir();
///
///     if cache.read().await?.is_none() {
///         println!("first run");
///     }
///     cache.write("1.2.3.4".parse()?).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileIpCache {
    path: PathBuf,
}

impl FileIpCache {
    /// Cache backed by `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Cache at `<temp dir>/ipagent.tmp`
    pub fn in_temp_dir() -> Self {
        Self::new(Self::default_path())
    }

    /// Path used by [`FileIpCache::in_temp_dir`]
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_CACHE_FILE)
    }
}

#[async_trait]
impl IpCache for FileIpCache {
    async fn read(&self) -> Result<Option<IpAddr>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::cache_read(format!(
                    "Failed to read cache file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        match content.trim().parse::<IpAddr>() {
            Ok(ip) => Ok(Some(ip)),
            Err(_) => {
                tracing::warn!(
                    "Cache file {} does not contain an IP address, ignoring it",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    async fn write(&self, ip: IpAddr) -> Result<(), Error> {
        let mut file = fs::File::create(&self.path).await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to open cache file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        file.write_all(ip.to_string().as_bytes())
            .await
            .map_err(|e| {
                Error::cache_write(format!(
                    "Failed to write cache file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.flush().await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to flush cache file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache written: {} -> {}", self.path.display(), ip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_first_run() {
        let dir = tempdir().unwrap();
        let cache = FileIpCache::new(dir.path().join("ipagent.tmp"));

        assert_eq!(cache.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ipagent.tmp");
        let cache = FileIpCache::new(&path);

        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        cache.write(ip).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "203.0.113.7");

        let reopened = FileIpCache::new(&path);
        assert_eq!(reopened.read().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn test_shorter_ip_overwrites_completely() {
        let dir = tempdir().unwrap();
        let cache = FileIpCache::new(dir.path().join("ipagent.tmp"));

        cache.write("255.255.255.255".parse().unwrap()).await.unwrap();
        let short: IpAddr = "1.2.3.4".parse().unwrap();
        cache.write(short).await.unwrap();

        assert_eq!(cache.read().await.unwrap(), Some(short));
    }

    #[tokio::test]
    async fn test_garbage_content_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ipagent.tmp");
        std::fs::write(&path, "not an address").unwrap();

        let cache = FileIpCache::new(&path);
        assert_eq!(cache.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreadable_cache_is_read_error() {
        // A directory where the file should be cannot be read as a file.
        let dir = tempdir().unwrap();
        let cache = FileIpCache::new(dir.path());

        match cache.read().await {
            Err(Error::CacheRead(_)) => {}
            other => panic!("expected CacheRead error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_is_write_error() {
        let dir = tempdir().unwrap();
        let cache = FileIpCache::new(dir.path().join("missing").join("ipagent.tmp"));

        let err = cache.write("1.2.3.4".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::CacheWrite(_)));
    }

    #[test]
    fn test_default_path_in_temp_dir() {
        let path = FileIpCache::default_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with(DEFAULT_CACHE_FILE));
    }
}
