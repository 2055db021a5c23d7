// # Event Sink Trait
//
// The agent reports progress as structured [`AgentEvent`]s instead of writing
// to a particular output. Where the events end up (stdout, syslog, a channel
// in a test) is decided by whoever supplies the sink.

use std::net::IpAddr;

use crate::domain::RecordType;
use crate::engine::ApplySummary;
use crate::reconcile::DecisionKind;

/// Events emitted by the UpdateAgent during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Public IP determined
    IpResolved {
        ip: IpAddr,
        cached: Option<IpAddr>,
    },

    /// Public IP matches the cache; the run stops here
    IpUnchanged { ip: IpAddr },

    /// The cache could not be written; the run continues
    CacheWriteFailed { error: String },

    /// A record currently held by the provider
    RemoteRecordSeen {
        name: String,
        record_type: String,
        content: String,
        proxied: bool,
    },

    /// Two remote records share an identity; the later one is used
    DuplicateRemoteRecord {
        name: String,
        record_type: RecordType,
        kept_id: String,
        dropped_id: String,
    },

    /// Reconciliation outcome for one domain
    Decided {
        name: String,
        kind: DecisionKind,
        dry_run: bool,
    },

    /// Provider call for one domain succeeded
    Applied { name: String, kind: DecisionKind },

    /// Provider call for one domain failed; the run aborts
    ApplyFailed {
        name: String,
        kind: DecisionKind,
        error: String,
    },

    /// Every decision was handled
    Completed { summary: ApplySummary },
}

/// Destination for agent events
///
/// Implementations must not block for long; the agent emits inline.
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: AgentEvent);
}
