//! Triage throughput and outcome metrics for the service loop.

use crate::enrichment::dossier::DATA_QUALITY_FACTORS;
use crate::types::decision::{RoutingOutcome, TriageDecision};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared by all workers
pub struct TriageMetrics {
    pub alerts_processed: AtomicU64,
    pub alerts_rejected: AtomicU64,
    pub oracle_invocations: AtomicU64,
    pub oracle_failures: AtomicU64,
    /// Decisions whose rationale carries a data-quality note
    pub degraded_decisions: AtomicU64,
    by_classification: RwLock<BTreeMap<String, u64>>,
    by_route: RwLock<BTreeMap<String, u64>>,
    by_rule: RwLock<BTreeMap<String, u64>>,
    rejections: RwLock<BTreeMap<String, u64>>,
    /// Processing times in microseconds
    processing_times: RwLock<Vec<u64>>,
    /// Composite score histogram, 10 buckets over 0 - 100
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl TriageMetrics {
    /// Create zeroed counters starting the uptime clock now
    pub fn new() -> Self {
        Self {
            alerts_processed: AtomicU64::new(0),
            alerts_rejected: AtomicU64::new(0),
            oracle_invocations: AtomicU64::new(0),
            oracle_failures: AtomicU64::new(0),
            degraded_decisions: AtomicU64::new(0),
            by_classification: RwLock::new(BTreeMap::new()),
            by_route: RwLock::new(BTreeMap::new()),
            by_rule: RwLock::new(BTreeMap::new()),
            rejections: RwLock::new(BTreeMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a routed alert
    pub fn record_outcome(&self, outcome: &RoutingOutcome, processing_time: Duration) {
        self.alerts_processed.fetch_add(1, Ordering::Relaxed);
        self.record_decision(&outcome.decision);
        bump(&self.by_route, outcome.path.as_str());

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    fn record_decision(&self, decision: &TriageDecision) {
        bump(&self.by_classification, decision.classification.as_str());
        if let Some(rule) = decision.matched_rule {
            bump(&self.by_rule, rule.as_str());
        }
        if decision.oracle.was_invoked() {
            self.oracle_invocations.fetch_add(1, Ordering::Relaxed);
        }
        if decision.oracle.failed() {
            self.oracle_failures.fetch_add(1, Ordering::Relaxed);
        }
        if decision
            .rationale
            .iter()
            .any(|f| DATA_QUALITY_FACTORS.contains(&f.factor.as_str()))
        {
            self.degraded_decisions.fetch_add(1, Ordering::Relaxed);
        }

        let bucket = (decision.composite_score / 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a case that could not be classified
    pub fn record_rejection(&self, kind: &str) {
        self.alerts_rejected.fetch_add(1, Ordering::Relaxed);
        bump(&self.rejections, kind);
    }

    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Alerts per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.alerts_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    pub fn get_by_classification(&self) -> BTreeMap<String, u64> {
        snapshot(&self.by_classification)
    }

    pub fn get_by_route(&self) -> BTreeMap<String, u64> {
        snapshot(&self.by_route)
    }

    pub fn get_by_rule(&self) -> BTreeMap<String, u64> {
        snapshot(&self.by_rule)
    }

    /// Log a summary of the counters collected so far
    pub fn print_summary(&self) {
        let processed = self.alerts_processed.load(Ordering::Relaxed);
        let rejected = self.alerts_rejected.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();

        info!(
            processed,
            rejected,
            throughput = format!("{:.1} alerts/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Triage metrics summary"
        );
        info!(
            classifications = ?self.get_by_classification(),
            routes = ?self.get_by_route(),
            rules = ?self.get_by_rule(),
            rejections = ?snapshot(&self.rejections),
            "Triage outcomes"
        );
        info!(
            oracle_invocations = self.oracle_invocations.load(Ordering::Relaxed),
            oracle_failures = self.oracle_failures.load(Ordering::Relaxed),
            degraded_decisions = self.degraded_decisions.load(Ordering::Relaxed),
            "Degraded inputs"
        );

        let distribution = self.get_score_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = (count as f64 / total as f64) * 100.0;
            info!(
                "composite {:>3}-{:<3} {:>6} ({:>5.1}%) {}",
                i * 10,
                (i + 1) * 10,
                count,
                pct,
                "█".repeat(((pct / 5.0) as usize).min(20))
            );
        }
    }
}

impl Default for TriageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(map: &RwLock<BTreeMap<String, u64>>, key: &str) {
    if let Ok(mut map) = map.write() {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

fn snapshot(map: &RwLock<BTreeMap<String, u64>>) -> BTreeMap<String, u64> {
    map.read().map(|m| m.clone()).unwrap_or_default()
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Prints a metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<TriageMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    /// Create a reporter that logs a summary every `interval_secs`
    pub fn new(metrics: Arc<TriageMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Run the reporting loop. Never returns; spawn it as a task.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
