//! Counters for document store traffic and registry activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared metrics collector. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    store_requests_total: AtomicU64,
    store_errors_total: AtomicU64,
    store_duration_total_ms: AtomicU64,
    customers_written_total: AtomicU64,
    searches_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one round trip to the document store.
    pub fn record_store_request(&self, duration: Duration) {
        self.inner.store_requests_total.fetch_add(1, Ordering::Relaxed);
        self.inner
            .store_duration_total_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.inner.store_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a create, update or delete of a customer.
    pub fn record_customer_written(&self) {
        self.inner
            .customers_written_total
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a listing that applied a keyword search.
    pub fn record_search(&self) {
        self.inner.searches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_requests_total(&self) -> u64 {
        self.inner.store_requests_total.load(Ordering::Relaxed)
    }

    pub fn store_errors_total(&self) -> u64 {
        self.inner.store_errors_total.load(Ordering::Relaxed)
    }

    pub fn store_duration_total_ms(&self) -> u64 {
        self.inner.store_duration_total_ms.load(Ordering::Relaxed)
    }

    /// Average store round trip in milliseconds (0 when nothing was recorded).
    pub fn store_duration_avg_ms(&self) -> f64 {
        let count = self.store_requests_total();
        if count == 0 {
            0.0
        } else {
            self.store_duration_total_ms() as f64 / count as f64
        }
    }

    pub fn customers_written_total(&self) -> u64 {
        self.inner.customers_written_total.load(Ordering::Relaxed)
    }

    pub fn searches_total(&self) -> u64 {
        self.inner.searches_total.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            store_requests_total: self.store_requests_total(),
            store_errors_total: self.store_errors_total(),
            store_duration_avg_ms: self.store_duration_avg_ms(),
            customers_written_total: self.customers_written_total(),
            searches_total: self.searches_total(),
        }
    }
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub store_requests_total: u64,
    pub store_errors_total: u64,
    pub store_duration_avg_ms: f64,
    pub customers_written_total: u64,
    pub searches_total: u64,
}

/// Times one store request and records it when finished.
pub struct RequestTimer {
    start: Instant,
    metrics: Metrics,
}

impl RequestTimer {
    pub fn start(metrics: &Metrics) -> Self {
        Self {
            start: Instant::now(),
            metrics: metrics.clone(),
        }
    }

    /// Record the elapsed time, counting an error when `ok` is false.
    pub fn finish(self, ok: bool) {
        self.metrics.record_store_request(self.start.elapsed());
        if !ok {
            self.metrics.record_store_error();
        }
    }
}
