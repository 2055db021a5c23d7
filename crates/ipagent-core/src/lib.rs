// # ipagent-core
//
// Core library for the ipagent dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the reconciliation core and the seams around it:
// - **IpSource**: Trait for determining the current public IP
// - **IpCache**: Trait for remembering the last applied IP between runs
// - **DnsProvider**: Trait for reading and mutating records at the provider
// - **EventSink**: Trait for receiving structured progress events
// - **build_desired_state**: Expands root domain + subdomains into targets
// - **reconcile**: Decides create / update / no-op per target
// - **UpdateAgent**: Sequences one pass from IP lookup to applied records
//
// ## Design Principles
//
// 1. **Pure core**: Desired-state building and reconciliation do no I/O
// 2. **Explicit configuration**: `Config` is passed in, never looked up
// 3. **Fail fast**: The first fetch or apply error ends the run
// 4. **Library-first**: The binary is a thin layer over this crate

pub mod traits;
pub mod domain;
pub mod reconcile;
pub mod engine;
pub mod config;
pub mod error;
pub mod cache;
pub mod sink;

// Re-export core types for convenience
pub use traits::{AgentEvent, DnsProvider, EventSink, IpCache, IpSource, RemoteRecord};
pub use domain::{Domain, RecordType, build_desired_state};
pub use reconcile::{Decision, DecisionKind, IdentityKey, ReconcilePolicy, reconcile, reconcile_with};
pub use engine::{ApplySummary, RunOutcome, UpdateAgent};
pub use config::{CloudflareConfig, Config, IpServiceConfig};
pub use error::{Error, Result};
pub use cache::{FileIpCache, MemoryIpCache};
pub use sink::{ChannelSink, TracingSink};
