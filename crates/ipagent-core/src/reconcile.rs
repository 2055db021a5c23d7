//! Reconciliation of desired state against the provider's records
//!
//! [`reconcile`] is a pure function: given the desired domains, the records
//! the provider currently holds, and the current public IP, it decides per
//! domain whether to create, update, or leave the record alone. It performs
//! no I/O and cannot fail.
//!
//! ## Matching
//!
//! Domains and records are matched on [`IdentityKey`] (normalized name plus
//! record type). Remote records with a type outside [`RecordType`] never
//! match. When the provider returns several records with the same key, the
//! last one wins and the overwritten ones are reported in
//! [`RemoteIndex::duplicates`].
//!
//! ## Decision rule
//!
//! | remote record      | content == current IP | decision |
//! |--------------------|-----------------------|----------|
//! | absent             | -                     | Create   |
//! | present            | no                    | Update   |
//! | present            | yes                   | NoOp     |
//!
//! The proxy flag only participates when [`ReconcilePolicy::sync_proxy`] is
//! set.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use crate::domain::{Domain, RecordType};
use crate::traits::RemoteRecord;

/// Identity of a record: normalized name plus type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    name: String,
    record_type: RecordType,
}

impl IdentityKey {
    /// Build a key, normalizing the name
    ///
    /// Names compare ASCII-case-insensitively and ignore a single trailing
    /// dot, so `Example.COM.` and `example.com` are the same identity.
    pub fn new(name: &str, record_type: RecordType) -> Self {
        let name = name.strip_suffix('.').unwrap_or(name);
        Self {
            name: name.to_ascii_lowercase(),
            record_type,
        }
    }

    /// Key for a desired domain
    pub fn for_domain(domain: &Domain) -> Self {
        Self::new(&domain.name, domain.record_type)
    }

    /// Key for a remote record, or `None` if its type is not managed
    pub fn for_remote(record: &RemoteRecord) -> Option<Self> {
        let record_type = record.record_type.parse().ok()?;
        Some(Self::new(&record.name, record_type))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.record_type, self.name)
    }
}

/// A remote record that was shadowed by a later one with the same key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub key: IdentityKey,
    /// ID of the record that stays in the index
    pub kept_id: String,
    /// ID of the record that was overwritten
    pub dropped_id: String,
}

/// Lookup table from identity key to remote record
#[derive(Debug, Default)]
pub struct RemoteIndex<'a> {
    records: HashMap<IdentityKey, &'a RemoteRecord>,
    duplicates: Vec<DuplicateRecord>,
}

impl<'a> RemoteIndex<'a> {
    /// Index `remote` in iteration order, last write wins
    pub fn build(remote: &'a [RemoteRecord]) -> Self {
        let mut index = Self::default();

        for record in remote {
            let Some(key) = IdentityKey::for_remote(record) else {
                continue;
            };

            if let Some(previous) = index.records.insert(key.clone(), record) {
                index.duplicates.push(DuplicateRecord {
                    key,
                    kept_id: record.id.clone(),
                    dropped_id: previous.id.clone(),
                });
            }
        }

        index
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&'a RemoteRecord> {
        self.records.get(key).copied()
    }

    /// Keys that appeared more than once, in the order they were shadowed
    pub fn duplicates(&self) -> &[DuplicateRecord] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What to do with one desired domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Record exists and already points at the current IP
    NoOp { domain: Domain },
    /// Record exists but is stale; overwrite it by ID
    Update { domain: Domain, remote_id: String },
    /// Record does not exist yet
    Create { domain: Domain },
}

impl Decision {
    pub fn domain(&self) -> &Domain {
        match self {
            Decision::NoOp { domain }
            | Decision::Update { domain, .. }
            | Decision::Create { domain } => domain,
        }
    }

    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::NoOp { .. } => DecisionKind::NoOp,
            Decision::Update { .. } => DecisionKind::Update,
            Decision::Create { .. } => DecisionKind::Create,
        }
    }

    /// Whether applying this decision needs a provider call
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Decision::NoOp { .. })
    }
}

/// Tag of a [`Decision`], for events and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    NoOp,
    Update,
    Create,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionKind::NoOp => f.write_str("no-op"),
            DecisionKind::Update => f.write_str("update"),
            DecisionKind::Create => f.write_str("create"),
        }
    }
}

/// Knobs for the decision rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Also update records whose proxied flag differs from the desired one
    pub sync_proxy: bool,
}

/// Decide per desired domain, in order, using the default policy
pub fn reconcile(desired: &[Domain], remote: &[RemoteRecord], current_ip: IpAddr) -> Vec<Decision> {
    reconcile_with(ReconcilePolicy::default(), desired, remote, current_ip)
}

/// Decide per desired domain, in order
pub fn reconcile_with(
    policy: ReconcilePolicy,
    desired: &[Domain],
    remote: &[RemoteRecord],
    current_ip: IpAddr,
) -> Vec<Decision> {
    let index = RemoteIndex::build(remote);
    plan(policy, desired, &index, current_ip)
}

/// Decide per desired domain against a prebuilt index
pub fn plan(
    policy: ReconcilePolicy,
    desired: &[Domain],
    index: &RemoteIndex<'_>,
    current_ip: IpAddr,
) -> Vec<Decision> {
    desired
        .iter()
        .map(|domain| decide(policy, domain, index, current_ip))
        .collect()
}

fn decide(
    policy: ReconcilePolicy,
    domain: &Domain,
    index: &RemoteIndex<'_>,
    current_ip: IpAddr,
) -> Decision {
    let Some(record) = index.get(&IdentityKey::for_domain(domain)) else {
        return Decision::Create {
            domain: domain.clone(),
        };
    };

    let stale_content = !content_matches(&record.content, current_ip);
    let stale_proxy = policy.sync_proxy && record.proxied != domain.proxy;

    if stale_content || stale_proxy {
        Decision::Update {
            domain: domain.clone(),
            remote_id: record.id.clone(),
        }
    } else {
        Decision::NoOp {
            domain: domain.clone(),
        }
    }
}

/// Compare record content with the current IP
///
/// Content that parses as an address is compared as an address, so
/// `2001:db8:0:0::1` equals `2001:db8::1`. Anything else falls back to the
/// textual form of `ip`.
fn content_matches(content: &str, ip: IpAddr) -> bool {
    match content.trim().parse::<IpAddr>() {
        Ok(remote_ip) => remote_ip == ip,
        Err(_) => content == ip.to_string(),
    }
}
