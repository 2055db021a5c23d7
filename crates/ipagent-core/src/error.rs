//! Error types for ipagent
//!
//! Every collaborator reports failures through [`Error`]. The variant says
//! which stage failed, and the orchestration layer decides whether that stage
//! is fatal (everything except [`Error::CacheWrite`]).

use thiserror::Error;

/// Result type alias for ipagent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ipagent
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file does not exist
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    /// The configuration file could not be read or is not valid TOML
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    /// The configuration parsed but failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The public IP could not be determined
    #[error("IP resolution error: {0}")]
    IpResolution(String),

    /// The cache exists but could not be read
    #[error("Cache read error: {0}")]
    CacheRead(String),

    /// The cache could not be written (non-fatal)
    #[error("Cache write error: {0}")]
    CacheWrite(String),

    /// The provider's record list could not be fetched
    #[error("Remote fetch error: {0}")]
    RemoteFetch(String),

    /// A create or update call against the provider failed
    #[error("Remote mutation error: {0}")]
    RemoteMutation(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "config file not found" error
    pub fn config_not_found(msg: impl Into<String>) -> Self {
        Self::ConfigNotFound(msg.into())
    }

    /// Create a configuration parse error
    pub fn config_parse(msg: impl Into<String>) -> Self {
        Self::ConfigParse(msg.into())
    }

    /// Create a configuration validation error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IP resolution error
    pub fn ip_resolution(msg: impl Into<String>) -> Self {
        Self::IpResolution(msg.into())
    }

    /// Create a cache read error
    pub fn cache_read(msg: impl Into<String>) -> Self {
        Self::CacheRead(msg.into())
    }

    /// Create a cache write error
    pub fn cache_write(msg: impl Into<String>) -> Self {
        Self::CacheWrite(msg.into())
    }

    /// Create a remote fetch error
    pub fn remote_fetch(msg: impl Into<String>) -> Self {
        Self::RemoteFetch(msg.into())
    }

    /// Create a remote mutation error
    pub fn remote_mutation(msg: impl Into<String>) -> Self {
        Self::RemoteMutation(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
