//! Desired-state model
//!
//! A [`Domain`] is one record the operator wants to exist. The configured
//! root domain plus its subdomain fragments are expanded into a flat list by
//! [`build_desired_state`], which is what the reconciler consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// DNS record type managed by ipagent
///
/// Anything outside this set is rejected when parsed, so an invalid type can
/// never reach reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name record
    Cname,
    /// Mail exchange record
    Mx,
}

impl RecordType {
    /// Canonical upper-case form, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
        }
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "MX" => Ok(RecordType::Mx),
            _ => Err(Error::invalid_input(format!(
                "unsupported record type '{}' (expected one of A, AAAA, CNAME, MX)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for RecordType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record the operator wants to exist
///
/// In the configuration file the root domain carries a fully-qualified
/// name while subdomains carry a single label; after
/// [`build_desired_state`] every `name` is fully qualified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Record name
    pub name: String,

    /// Whether the provider should proxy traffic for this record
    #[serde(default)]
    pub proxy: bool,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
}

impl Domain {
    /// Create a new domain entry
    pub fn new(name: impl Into<String>, proxy: bool, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            proxy,
            record_type,
        }
    }

    /// Qualify this fragment under `root`
    fn qualified_under(&self, root: &Domain) -> Domain {
        Domain {
            name: format!("{}.{}", self.name, root.name),
            proxy: self.proxy,
            record_type: self.record_type,
        }
    }
}

/// Expand a root domain and its subdomain fragments into the desired state
///
/// The result has exactly `subdomains.len() + 1` entries: the root first,
/// unchanged, then each fragment with its name qualified as
/// `fragment.name + "." + root.name`. Fragments keep their own proxy flag and
/// record type. No deduplication happens here.
pub fn build_desired_state(root: &Domain, subdomains: &[Domain]) -> Vec<Domain> {
    let mut domains = Vec::with_capacity(subdomains.len() + 1);
    domains.push(root.clone());
    domains.extend(subdomains.iter().map(|sub| sub.qualified_under(root)));
    domains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Domain {
        Domain::new("example.com", true, RecordType::A)
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!("A".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!("Cname".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert_eq!("MX".parse::<RecordType>().unwrap(), RecordType::Mx);
        assert!("TXT".parse::<RecordType>().is_err());
        assert!("".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_record_type_display_is_wire_form() {
        assert_eq!(RecordType::Aaaa.to_string(), "AAAA");
        assert_eq!(String::from(RecordType::Cname), "CNAME");
    }

    #[test]
    fn test_root_is_first_and_unchanged() {
        let subs = vec![Domain::new("www", false, RecordType::A)];
        let list = build_desired_state(&root(), &subs);

        assert_eq!(list.len(), 2);
        assert_eq!(list[0], root());
    }

    #[test]
    fn test_fragment_is_qualified_with_dot() {
        let subs = vec![Domain::new("a", false, RecordType::Aaaa)];
        let list = build_desired_state(&root(), &subs);

        assert_eq!(list[1].name, "a.example.com");
        assert!(!list[1].proxy);
        assert_eq!(list[1].record_type, RecordType::Aaaa);
    }

    #[test]
    fn test_length_is_subdomains_plus_one() {
        for n in 0..5 {
            let subs: Vec<Domain> = (0..n)
                .map(|i| Domain::new(format!("s{}", i), i % 2 == 0, RecordType::A))
                .collect();
            assert_eq!(build_desired_state(&root(), &subs).len(), n + 1);
        }
    }

    #[test]
    fn test_duplicate_fragments_are_kept() {
        let subs = vec![
            Domain::new("a", false, RecordType::A),
            Domain::new("a", true, RecordType::A),
        ];
        let list = build_desired_state(&root(), &subs);

        assert_eq!(list.len(), 3);
        assert_eq!(list[1].name, list[2].name);
    }
}
