//! Update agent
//!
//! The UpdateAgent runs one reconciliation pass:
//! - Resolving the current public IP via IpSource
//! - Comparing it against the IpCache and stopping early if unchanged
//! - Fetching the zone's records via DnsProvider
//! - Reconciling them against the configured domains
//! - Applying creates and updates via DnsProvider
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐
//! │  IpSource   │      │   IpCache   │
//! └─────────────┘      └─────────────┘
//!        │ current()          │ read() / write()
//!        ▼                    ▼
//!     ┌──────────────────────────┐        ┌─────────────┐
//!     │       UpdateAgent        │──────▶ │  EventSink  │
//!     └──────────────────────────┘        └─────────────┘
//!        │ list_records()     ▲
//!        ▼                    │ decisions
//! ┌─────────────┐      ┌─────────────┐
//! │ DnsProvider │─────▶│  reconcile  │
//! └─────────────┘      └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Resolve IP (fatal on error)
//! 2. Read cache (fatal on error other than "not found")
//! 3. If the IP equals the cached one, stop
//! 4. Write cache (non-fatal on error)
//! 5. Fetch remote records (fatal on error)
//! 6. Reconcile desired state against remote state
//! 7. Apply each create/update in order, aborting at the first failure
//!
//! Every step is awaited in turn; nothing runs concurrently.

use std::net::IpAddr;

use tracing::{debug, info};

use crate::config::Config;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::reconcile::{Decision, DecisionKind, ReconcilePolicy, RemoteIndex, plan};
use crate::sink::TracingSink;
use crate::traits::{AgentEvent, DnsProvider, EventSink, IpCache, IpSource, ip_changed};

/// Counts of what a run did (or would have done, in dry-run mode)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Creates and updates were decided but not sent
    pub dry_run: bool,
}

impl ApplySummary {
    fn record(&mut self, kind: DecisionKind) {
        match kind {
            DecisionKind::Create => self.created += 1,
            DecisionKind::Update => self.updated += 1,
            DecisionKind::NoOp => self.unchanged += 1,
        }
    }

    /// Number of provider mutations decided
    pub fn changes(&self) -> usize {
        self.created + self.updated
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The public IP matches the cache; nothing was fetched or applied
    Unchanged { ip: IpAddr },
    /// The zone was reconciled against `ip`
    Reconciled { ip: IpAddr, summary: ApplySummary },
}

/// Single-pass dynamic DNS agent
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateAgent::new()`]
/// 2. Optionally attach a sink with [`UpdateAgent::with_sink()`] and enable
///    dry-run with [`UpdateAgent::with_dry_run()`]
/// 3. Call [`UpdateAgent::run_once()`]
pub struct UpdateAgent {
    /// Source of the current public IP
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and mutating records
    provider: Box<dyn DnsProvider>,

    /// Last applied IP
    cache: Box<dyn IpCache>,

    /// Progress events
    sink: Box<dyn EventSink>,

    /// Zone holding the managed records
    zone_id: String,

    /// Expanded desired state
    desired: Vec<Domain>,

    /// Decision rule knobs
    policy: ReconcilePolicy,

    /// Decide but do not apply
    dry_run: bool,
}

impl UpdateAgent {
    /// Create a new agent
    ///
    /// The configuration is validated and expanded once here; the agent keeps
    /// no reference to it.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        cache: Box<dyn IpCache>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            cache,
            sink: Box::new(TracingSink),
            zone_id: config.cloudflare.zone_id.clone(),
            desired: config.domain_list(),
            policy: config.reconcile_policy(),
            dry_run: false,
        })
    }

    /// Replace the default [`TracingSink`]
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Perform all reads and decisions but skip provider mutations
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pass
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome::Unchanged)`: IP matches the cache
    /// - `Ok(RunOutcome::Reconciled)`: every decision was applied (or logged,
    ///   in dry-run mode)
    /// - `Err(Error)`: a fatal step failed; remaining decisions were not
    ///   attempted
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let ip = self.ip_source.current().await.map_err(|e| match e {
            Error::IpResolution(_) => e,
            other => Error::ip_resolution(format!(
                "{} failed: {}",
                self.ip_source.source_name(),
                other
            )),
        })?;
        let cached = self.cache.read().await?;

        self.sink.emit(AgentEvent::IpResolved { ip, cached });

        if !ip_changed(cached, ip) {
            self.sink.emit(AgentEvent::IpUnchanged { ip });
            return Ok(RunOutcome::Unchanged { ip });
        }

        // Written before reconciling so a failed apply is not retried on the
        // next run unless the IP changes again.
        if let Err(e) = self.cache.write(ip).await {
            self.sink.emit(AgentEvent::CacheWriteFailed {
                error: e.to_string(),
            });
        }

        let remote = self
            .provider
            .list_records(&self.zone_id)
            .await
            .map_err(|e| match e {
                Error::RemoteFetch(_) => e,
                other => Error::remote_fetch(format!(
                    "{} listing failed: {}",
                    self.provider.provider_name(),
                    other
                )),
            })?;
        debug!(
            "Fetched {} record(s) from {}",
            remote.len(),
            self.provider.provider_name()
        );

        for record in &remote {
            self.sink.emit(AgentEvent::RemoteRecordSeen {
                name: record.name.clone(),
                record_type: record.record_type.clone(),
                content: record.content.clone(),
                proxied: record.proxied,
            });
        }

        let index = RemoteIndex::build(&remote);
        for duplicate in index.duplicates() {
            self.sink.emit(AgentEvent::DuplicateRemoteRecord {
                name: duplicate.key.name().to_string(),
                record_type: duplicate.key.record_type(),
                kept_id: duplicate.kept_id.clone(),
                dropped_id: duplicate.dropped_id.clone(),
            });
        }

        let decisions = plan(self.policy, &self.desired, &index, ip);
        let summary = self.apply(&decisions, ip).await?;

        self.sink.emit(AgentEvent::Completed { summary });
        Ok(RunOutcome::Reconciled { ip, summary })
    }

    /// Apply decisions in order, stopping at the first failure
    async fn apply(&self, decisions: &[Decision], ip: IpAddr) -> Result<ApplySummary> {
        let mut summary = ApplySummary {
            dry_run: self.dry_run,
            ..ApplySummary::default()
        };

        for decision in decisions {
            let name = decision.domain().name.clone();
            let kind = decision.kind();

            self.sink.emit(AgentEvent::Decided {
                name: name.clone(),
                kind,
                dry_run: self.dry_run,
            });

            if decision.is_mutation() && !self.dry_run {
                if let Err(e) = self.apply_one(decision, ip).await {
                    self.sink.emit(AgentEvent::ApplyFailed {
                        name,
                        kind,
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                self.sink.emit(AgentEvent::Applied { name, kind });
            }

            summary.record(kind);
        }

        if self.dry_run && summary.changes() > 0 {
            info!(
                "Dry-run: {} change(s) decided, none applied",
                summary.changes()
            );
        }

        Ok(summary)
    }

    /// Perform the provider call for one decision
    async fn apply_one(&self, decision: &Decision, ip: IpAddr) -> Result<()> {
        let result = match decision {
            Decision::Create { domain } => {
                self.provider
                    .create_record(&self.zone_id, domain, ip)
                    .await
            }
            Decision::Update { domain, remote_id } => {
                self.provider
                    .update_record(&self.zone_id, remote_id, domain, ip)
                    .await
            }
            Decision::NoOp { .. } => Ok(()),
        };

        result.map_err(|e| match e {
            Error::RemoteMutation(_) => e,
            other => Error::remote_mutation(format!(
                "{} {} failed: {}",
                decision.kind(),
                decision.domain().name,
                other
            )),
        })
    }
}
