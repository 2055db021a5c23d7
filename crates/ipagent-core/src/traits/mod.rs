//! Core traits for ipagent
//!
//! This module defines the seams between the reconciliation core and the
//! outside world.
//!
//! - [`IpSource`]: Determine the current public IP
//! - [`IpCache`]: Remember the last applied IP between runs
//! - [`DnsProvider`]: Read and mutate records at the DNS provider
//! - [`EventSink`]: Receive structured progress events

pub mod ip_source;
pub mod ip_cache;
pub mod dns_provider;
pub mod event_sink;

pub use ip_source::IpSource;
pub use ip_cache::{IpCache, ip_changed};
pub use dns_provider::{DnsProvider, RemoteRecord};
pub use event_sink::{AgentEvent, EventSink};
