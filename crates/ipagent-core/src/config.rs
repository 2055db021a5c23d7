//! Configuration types for ipagent
//!
//! The configuration is a TOML file. It is loaded once at startup, validated,
//! and then passed by reference into the components that need it.
//!
//! ```toml
//! logging = true
//!
//! [cloudflare]
//! zone_id = "0123456789abcdef"
//! api_key = "..."
//! api_email = "ops@example.com"
//!
//! [domain]
//! name = "example.com"
//! proxy = true
//! type = "A"
//!
//! [[sub_domains]]
//! name = "a"
//! proxy = false
//! type = "A"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{Domain, build_desired_state};
use crate::error::{Error, Result};
use crate::reconcile::{IdentityKey, ReconcilePolicy};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "./ipagent.toml";

/// Main ipagent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Send output to syslog instead of stdout
    #[serde(default)]
    pub logging: bool,

    /// Cloudflare credentials and zone
    pub cloudflare: CloudflareConfig,

    /// Root domain
    pub domain: Domain,

    /// Subdomains of the root domain; names are single labels
    #[serde(default)]
    pub sub_domains: Vec<Domain>,

    /// Public IP lookup service
    #[serde(default)]
    pub ip_service: IpServiceConfig,

    /// Override for the cache file location
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Also update records whose proxied flag differs from the configured one
    #[serde(default)]
    pub sync_proxy: bool,
}

impl Config {
    /// Load and validate the configuration file at `path`
    ///
    /// # Errors
    ///
    /// - `Error::ConfigNotFound` if the file does not exist
    /// - `Error::ConfigParse` if it cannot be read or is not a valid config
    /// - `Error::Config` if it parses but fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::config_not_found(path.display().to_string())
            } else {
                Error::config_parse(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;

        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::config_parse(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from TOML text without validating it
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Expand the root domain and subdomains into the desired state
    pub fn domain_list(&self) -> Vec<Domain> {
        build_desired_state(&self.domain, &self.sub_domains)
    }

    /// Reconciliation policy derived from this configuration
    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            sync_proxy: self.sync_proxy,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.cloudflare.validate()?;
        self.ip_service.validate()?;

        validate_domain_name(&self.domain.name)
            .map_err(|e| Error::config(format!("domain.name: {}", e)))?;

        for sub in &self.sub_domains {
            validate_label(&sub.name)
                .map_err(|e| Error::config(format!("sub_domains: {}", e)))?;
        }

        let mut seen = HashSet::new();
        for domain in self.domain_list() {
            validate_domain_name(&domain.name).map_err(Error::config)?;

            let key = IdentityKey::for_domain(&domain);
            if !seen.insert(key.clone()) {
                return Err(Error::config(format!(
                    "'{}' is configured more than once",
                    key
                )));
            }
        }

        if let Some(path) = &self.cache_path
            && path.as_os_str().is_empty()
        {
            return Err(Error::config("cache_path cannot be empty"));
        }

        Ok(())
    }
}

/// Cloudflare credentials and zone
///
/// Either a scoped `api_token`, or the legacy `api_key` + `api_email` pair.
/// The token wins when both are present.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CloudflareConfig {
    /// Zone that holds every managed record
    pub zone_id: String,

    /// Global API key
    #[serde(default)]
    pub api_key: String,

    /// Account email paired with `api_key`
    #[serde(default)]
    pub api_email: String,

    /// Scoped API token
    #[serde(default)]
    pub api_token: Option<String>,
}

impl CloudflareConfig {
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::config("cloudflare.zone_id cannot be empty"));
        }

        let has_token = self.api_token.as_deref().is_some_and(|t| !t.trim().is_empty());
        let has_key_pair = !self.api_key.trim().is_empty() && !self.api_email.trim().is_empty();

        if !has_token && !has_key_pair {
            return Err(Error::config(
                "cloudflare credentials missing: set api_token, or both api_key and api_email",
            ));
        }

        Ok(())
    }
}

// Credentials must never show up in logs.
impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("zone_id", &self.zone_id)
            .field("api_key", &"<REDACTED>")
            .field("api_email", &self.api_email)
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Public IP lookup service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpServiceConfig {
    /// URL returning the caller's address, as JSON `{"ip": ...}` or plain text
    #[serde(default = "default_ip_service_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_ip_service_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(Error::config(format!(
                "ip_service.url must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("ip_service.timeout_secs must be > 0"));
        }

        Ok(())
    }
}

impl Default for IpServiceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_service_url(),
            timeout_secs: default_ip_service_timeout_secs(),
        }
    }
}

fn default_ip_service_url() -> String {
    "https://api.ipify.org?format=json".to_string()
}

fn default_ip_service_timeout_secs() -> u64 {
    10
}

/// Validate a fully-qualified domain name (RFC 1035 label rules)
fn validate_domain_name(domain: &str) -> std::result::Result<(), String> {
    if domain.is_empty() {
        return Err("domain name cannot be empty".to_string());
    }

    if domain.len() > 253 {
        return Err(format!(
            "domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        ));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(format!("domain name has empty label: '{}'", domain));
        }
        validate_label(label)?;
    }

    Ok(())
}

/// Validate a single label; `*` is allowed for wildcard records
fn validate_label(label: &str) -> std::result::Result<(), String> {
    if label.is_empty() {
        return Err("label cannot be empty".to_string());
    }

    if label.len() > 63 {
        return Err(format!(
            "label too long: {} chars (max 63). Label: '{}'",
            label.len(),
            label
        ));
    }

    if label == "*" {
        return Ok(());
    }

    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "label contains invalid characters. Label: '{}'. \
            Valid: alphanumeric, hyphen and underscore only.",
            label
        ));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(format!(
            "label cannot start or end with hyphen. Label: '{}'",
            label
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordType;

    const VALID: &str = r#"
logging = true

[cloudflare]
zone_id = "aaaaaaaaaaaaaaaa"
api_key = "bbbbbbbbbbbbbbbb"
api_email = "mail@example.com"

[domain]
name = "example.com"
proxy = true
type = "A"

[[sub_domains]]
name = "a"
proxy = false
type = "A"

[[sub_domains]]
name = "b"
proxy = true
type = "A"
"#;

    fn valid() -> Config {
        Config::from_toml_str(VALID).unwrap()
    }

    #[test]
    fn test_unmarshal() {
        let config = valid();

        assert!(config.logging);
        assert_eq!(config.cloudflare.api_email, "mail@example.com");
        assert_eq!(config.sub_domains.len(), 2);
        assert_eq!(config.domain.record_type, RecordType::A);
        assert_eq!(config.ip_service.url, "https://api.ipify.org?format=json");
        assert!(!config.sync_proxy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_domain_list() {
        let list = valid().domain_list();

        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name, "example.com");
        assert_eq!(list[1].name, "a.example.com");
        assert_eq!(list[2].name, "b.example.com");
        assert!(list[2].proxy);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(Config::from_toml_str("lorem ipsum").is_err());
    }

    #[test]
    fn test_unsupported_record_type_is_rejected() {
        let content = VALID.replacen("type = \"A\"", "type = \"TXT\"", 1);
        let err = Config::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("unsupported record type"));
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = valid();
        config.cloudflare.api_key.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.cloudflare.api_token = Some("scoped-token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_zone_id() {
        let mut config = valid();
        config.cloudflare.zone_id = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_duplicate_desired_identity_is_rejected() {
        let mut config = valid();
        config.sub_domains.push(Domain::new("A", true, RecordType::A));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("a.example.com"));
    }

    #[test]
    fn test_same_name_different_type_is_allowed() {
        let mut config = valid();
        config.sub_domains.push(Domain::new("a", false, RecordType::Aaaa));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subdomain_must_be_single_label() {
        let mut config = valid();
        config.sub_domains.push(Domain::new("x.", false, RecordType::A));
        assert!(config.validate().is_err());

        config.sub_domains.pop();
        config.sub_domains.push(Domain::new("", false, RecordType::A));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_subdomain_is_allowed() {
        let mut config = valid();
        config.sub_domains.push(Domain::new("*", false, RecordType::A));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ip_service_validation() {
        let mut config = valid();
        config.ip_service.url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.ip_service.url = "https://icanhazip.com".to_string();
        config.ip_service.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = valid();
        config.cloudflare.api_token = Some("secret_token_12345".to_string());

        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("bbbbbbbbbbbbbbbb"));
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("aaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipagent.toml");
        std::fs::write(&path, VALID).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.domain_list().len(), 3);

        std::fs::write(&path, "lorem ipsum").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::ConfigParse(_))));
    }
}
