//! Event sink implementations
//!
//! - [`TracingSink`]: one log line per event through `tracing`. The installed
//!   subscriber decides whether that ends up on stdout or in syslog.
//! - [`ChannelSink`]: forwards events over a bounded channel, for embedding
//!   and tests.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::reconcile::DecisionKind;
use crate::traits::{AgentEvent, EventSink};

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AgentEvent) {
        match event {
            AgentEvent::IpResolved { ip, cached } => match cached {
                Some(cached) => info!(%ip, %cached, "Public IP: {}", ip),
                None => info!(%ip, "Public IP: {} (no cached value)", ip),
            },
            AgentEvent::IpUnchanged { ip } => {
                info!(%ip, "Public IP address is same as before, no change required")
            }
            AgentEvent::CacheWriteFailed { error } => warn!(
                "Unable to write cache file, however execution will continue: {}",
                error
            ),
            AgentEvent::RemoteRecordSeen {
                name,
                record_type,
                content,
                proxied,
            } => info!("{} {}: {}, Proxied: {}", record_type, name, content, proxied),
            AgentEvent::DuplicateRemoteRecord {
                name,
                record_type,
                kept_id,
                dropped_id,
            } => warn!(
                "Provider returned more than one {} record for '{}'; using {} and ignoring {}",
                record_type, name, kept_id, dropped_id
            ),
            AgentEvent::Decided {
                name,
                kind,
                dry_run,
            } => {
                let suffix = if dry_run && kind != DecisionKind::NoOp {
                    " [dry-run, skipped]"
                } else {
                    ""
                };
                match kind {
                    DecisionKind::Update => {
                        info!("Updating domain '{}' as IP is not current{}", name, suffix)
                    }
                    DecisionKind::Create => info!(
                        "Domain '{}' does not currently have record, will create{}",
                        name, suffix
                    ),
                    DecisionKind::NoOp => info!(
                        "Domain '{}' does not need updating as the IP address is still current",
                        name
                    ),
                }
            }
            AgentEvent::Applied { name, kind } => debug!("Applied {} for '{}'", kind, name),
            AgentEvent::ApplyFailed { name, kind, error } => {
                error!("Unable to perform DNS record {} for '{}': {}", kind, name, error)
            }
            AgentEvent::Completed { summary } => info!(
                created = summary.created,
                updated = summary.updated,
                unchanged = summary.unchanged,
                dry_run = summary.dry_run,
                "Reconciliation complete"
            ),
        }
    }
}

/// Forwards events over a bounded `mpsc` channel
///
/// When the receiver falls behind and the channel is full, events are dropped
/// with a warning rather than blocking the run.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<AgentEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<AgentEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: AgentEvent) {
        if self.tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event");
        }
    }
}
