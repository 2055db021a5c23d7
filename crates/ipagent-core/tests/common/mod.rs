//! Test doubles and common utilities for agent contract tests
//!
//! Every double keeps its state behind `Arc`s so a test can hand one copy to
//! the agent and keep another for assertions.

#![allow(dead_code)]

use ipagent_core::config::{CloudflareConfig, Config, IpServiceConfig};
use ipagent_core::domain::{Domain, RecordType};
use ipagent_core::error::{Error, Result};
use ipagent_core::traits::{AgentEvent, DnsProvider, EventSink, IpCache, IpSource, RemoteRecord};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Zone ID used by [`scenario_config`]
pub const ZONE_ID: &str = "zone-1";

/// An IpSource that always returns the same address
#[derive(Clone)]
pub struct FixedIpSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }
}

/// An IpSource whose lookup always fails with a transport error
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::http("connection refused"))
    }

    fn source_name(&self) -> &str {
        "failing"
    }
}

/// A provider call observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Create { name: String, content: String },
    Update { id: String, name: String, content: String },
}

/// A mock DnsProvider serving a fixed record set and recording mutations
#[derive(Clone)]
pub struct MockDnsProvider {
    /// Records returned by list_records()
    records: Arc<Mutex<Vec<RemoteRecord>>>,
    /// Mutations in the order they were attempted
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    /// Call counter for list_records()
    list_call_count: Arc<AtomicUsize>,
    /// 1-based mutation index that fails, if any
    fail_on_mutation: Option<usize>,
    /// Whether list_records() fails
    fail_list: bool,
}

impl MockDnsProvider {
    pub fn new(records: Vec<RemoteRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            calls: Arc::new(Mutex::new(Vec::new())),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            fail_on_mutation: None,
            fail_list: false,
        }
    }

    /// Fail the `n`th create/update call (1-based)
    pub fn failing_on_mutation(mut self, n: usize) -> Self {
        self.fail_on_mutation = Some(n);
        self
    }

    /// Fail every list_records() call
    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Mutations attempted so far, including a failed one
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of create/update calls
    pub fn mutation_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    fn record_call(&self, call: ProviderCall) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        if self.fail_on_mutation == Some(calls.len()) {
            return Err(Error::provider("mock", "injected failure"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RemoteRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID);

        if self.fail_list {
            return Err(Error::rate_limited("slow down"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(&self, _zone_id: &str, domain: &Domain, ip: IpAddr) -> Result<()> {
        self.record_call(ProviderCall::Create {
            name: domain.name.clone(),
            content: ip.to_string(),
        })
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        record_id: &str,
        domain: &Domain,
        ip: IpAddr,
    ) -> Result<()> {
        self.record_call(ProviderCall::Update {
            id: record_id.to_string(),
            name: domain.name.clone(),
            content: ip.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A mock IpCache with call counters and injectable failures
#[derive(Clone, Default)]
pub struct MockIpCache {
    value: Arc<Mutex<Option<IpAddr>>>,
    write_call_count: Arc<AtomicUsize>,
    fail_read: bool,
    fail_write: bool,
}

impl MockIpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(ip: IpAddr) -> Self {
        let cache = Self::default();
        *cache.value.lock().unwrap() = Some(ip);
        cache
    }

    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn failing_write(mut self) -> Self {
        self.fail_write = true;
        self
    }

    /// Currently stored address
    pub fn value(&self) -> Option<IpAddr> {
        *self.value.lock().unwrap()
    }

    /// Get the number of times write() was called
    pub fn write_call_count(&self) -> usize {
        self.write_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpCache for MockIpCache {
    async fn read(&self) -> Result<Option<IpAddr>> {
        if self.fail_read {
            return Err(Error::cache_read("permission denied"));
        }
        Ok(*self.value.lock().unwrap())
    }

    async fn write(&self, ip: IpAddr) -> Result<()> {
        self.write_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_write {
            return Err(Error::cache_write("read-only file system"));
        }
        *self.value.lock().unwrap() = Some(ip);
        Ok(())
    }
}

/// An EventSink that keeps every event
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AgentEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: AgentEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// Root "example.com" (A, proxied) with subdomains "a" (A) and "b" (A, proxied)
pub fn scenario_config() -> Config {
    Config {
        logging: false,
        cloudflare: CloudflareConfig {
            zone_id: ZONE_ID.to_string(),
            api_token: Some("test-token".to_string()),
            ..Default::default()
        },
        domain: Domain::new("example.com", true, RecordType::A),
        sub_domains: vec![
            Domain::new("a", false, RecordType::A),
            Domain::new("b", true, RecordType::A),
        ],
        ip_service: IpServiceConfig::default(),
        cache_path: None,
        sync_proxy: false,
    }
}

/// Remote state for [`scenario_config`]: root and "a" exist, "b" does not
pub fn scenario_records() -> Vec<RemoteRecord> {
    vec![
        RemoteRecord::new("id1", "example.com", "A", "1.2.3.4", true),
        RemoteRecord::new("id2", "a.example.com", "A", "5.6.7.8", false),
    ]
}
