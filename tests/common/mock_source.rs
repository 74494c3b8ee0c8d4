//! In-memory monitoring server for pipeline tests
//!
//! Failures are injected per call key (`host.get`, `item.get:<hostid>`,
//! `history.get:<itemid>`): the next `n` calls with that key fail. Every
//! call is recorded, and the number of calls in flight at once is tracked
//! so tests can check the worker bound.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zabbix_export::client::{HistorySource, HistorySourceFactory};
use zabbix_export::error::{SourceError, SourceResult};
use zabbix_export::models::{HistoryKind, HistoryRecord, Host, Metric, TimeWindow};

#[derive(Debug, Default)]
pub struct MockServer {
    hosts: Vec<Host>,
    metrics: HashMap<String, Vec<Metric>>,
    history: HashMap<String, Vec<HistoryRecord>>,
    failures: Mutex<HashMap<String, u32>>,
    panic_hosts: HashSet<String>,
    delay: Duration,
    fail_create: bool,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    sources_created: AtomicUsize,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host with its metrics and their history
    pub fn with_host(mut self, host: Host, metrics: Vec<(Metric, Vec<HistoryRecord>)>) -> Self {
        let mut listed = Vec::with_capacity(metrics.len());
        for (metric, records) in metrics {
            self.history.insert(metric.id.clone(), records);
            listed.push(metric);
        }
        self.metrics.insert(host.id.clone(), listed);
        self.hosts.push(host);
        self
    }

    /// Register `count` hosts named `srv-00..` with one metric each
    pub fn with_simple_hosts(mut self, count: usize) -> Self {
        for i in 0..count {
            let metric_id = format!("{}", 1000 + i);
            self = self.with_host(
                Host::new(format!("{}", 10_000 + i), format!("srv-{i:02}")),
                vec![(
                    Metric::new(&metric_id, "CPU load", HistoryKind::Float),
                    vec![crate::common::record(&metric_id, 60, "0.5")],
                )],
            );
        }
        self
    }

    /// Fail the next `times` calls with `key`
    pub fn fail(self, key: impl Into<String>, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(key.into(), times);
        self
    }

    /// Panic inside `item.get` for this host id
    pub fn panic_on_host(mut self, host_id: impl Into<String>) -> Self {
        self.panic_hosts.insert(host_id.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the factory refuse to build sources
    pub fn refuse_sources(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn hosts(&self) -> Vec<Host> {
        self.hosts.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == key).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn sources_created(&self) -> usize {
        self.sources_created.load(Ordering::SeqCst)
    }

    async fn enter(&self, key: String) -> SourceResult<()> {
        self.calls.lock().unwrap().push(key.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(SourceError::api(-32500, "Application error.", key))
            }
            _ => Ok(()),
        }
    }
}

/// One short-lived view onto a shared [`MockServer`]
#[derive(Debug, Clone)]
pub struct MockSource {
    server: Arc<MockServer>,
}

#[async_trait]
impl HistorySource for MockSource {
    async fn list_hosts(&self) -> SourceResult<Vec<Host>> {
        self.server.enter("host.get".to_string()).await?;
        Ok(self.server.hosts.clone())
    }

    async fn list_metrics(&self, host_id: &str) -> SourceResult<Vec<Metric>> {
        if self.server.panic_hosts.contains(host_id) {
            panic!("injected panic for host {host_id}");
        }
        self.server.enter(format!("item.get:{host_id}")).await?;
        Ok(self.server.metrics.get(host_id).cloned().unwrap_or_default())
    }

    async fn fetch_history(
        &self,
        _host_id: &str,
        metric_id: &str,
        _kind: HistoryKind,
        window: &TimeWindow,
    ) -> SourceResult<Vec<HistoryRecord>> {
        self.server.enter(format!("history.get:{metric_id}")).await?;
        Ok(self
            .server
            .history
            .get(metric_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| window.contains(r.clock))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct MockFactory {
    server: Arc<MockServer>,
}

impl MockFactory {
    pub fn new(server: MockServer) -> Self {
        Self {
            server: Arc::new(server),
        }
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }
}

impl HistorySourceFactory for MockFactory {
    type Source = MockSource;

    fn create(&self) -> SourceResult<MockSource> {
        if self.server.fail_create {
            return Err(SourceError::Configuration("source creation refused".to_string()));
        }
        self.server.sources_created.fetch_add(1, Ordering::SeqCst);
        Ok(MockSource {
            server: self.server.clone(),
        })
    }
}
