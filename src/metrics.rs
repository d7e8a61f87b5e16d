//! Request metrics for the readmission inference service.

use crate::risk::RiskLevel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for served assessments
pub struct ServiceMetrics {
    /// Requests that produced a prediction
    pub requests_succeeded: AtomicU64,
    /// Requests whose prediction failed
    pub requests_failed: AtomicU64,
    /// Payloads that could not be decoded
    pub requests_rejected: AtomicU64,
    by_risk_level: RwLock<HashMap<RiskLevel, u64>>,
    by_model: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets of width 0.1
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_succeeded: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            by_risk_level: RwLock::new(HashMap::new()),
            by_model: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_success(
        &self,
        model: &str,
        processing_time: Duration,
        probability: f64,
        risk_level: RiskLevel,
    ) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        let bucket = ((probability * 10.0).max(0.0) as usize).min(9);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
        if let Ok(mut levels) = self.by_risk_level.write() {
            *levels.entry(risk_level).or_insert(0) += 1;
        }
        if let Ok(mut models) = self.by_model.write() {
            *models.entry(model.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a failed prediction
    pub fn record_failure(&self, processing_time: Duration) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);
    }

    /// Record an undecodable request
    pub fn record_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Total requests that reached prediction
    pub fn total_processed(&self) -> u64 {
        self.requests_succeeded.load(Ordering::Relaxed) + self.requests_failed.load(Ordering::Relaxed)
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_processed() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or([0; 10])
    }

    pub fn get_by_risk_level(&self) -> HashMap<RiskLevel, u64> {
        self.by_risk_level
            .read()
            .map(|levels| levels.clone())
            .unwrap_or_default()
    }

    pub fn get_by_model(&self) -> HashMap<String, u64> {
        self.by_model
            .read()
            .map(|models| models.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let succeeded = self.requests_succeeded.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let rejected = self.requests_rejected.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let by_level = self.get_by_risk_level();

        info!(
            succeeded = succeeded,
            failed = failed,
            rejected = rejected,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Assessment summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Processing time"
        );

        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            let count = by_level.get(&level).copied().unwrap_or(0);
            let pct = if succeeded > 0 {
                (count as f64 / succeeded as f64) * 100.0
            } else {
                0.0
            };
            info!(risk_level = %level, count = count, "{:.1}% of predictions", pct);
        }

        for (model, count) in self.get_by_model() {
            info!(model = %model, count = count, "Predictions by model");
        }

        let distribution = self.get_probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
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

/// Prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_success("xgboost", Duration::from_micros(100), 0.25, RiskLevel::Low);
        metrics.record_success("xgboost", Duration::from_micros(300), 0.75, RiskLevel::High);
        metrics.record_failure(Duration::from_micros(200));
        metrics.record_rejected();

        assert_eq!(metrics.total_processed(), 3);
        assert_eq!(metrics.requests_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_by_model().get("xgboost"), Some(&2));
        assert_eq!(metrics.get_by_risk_level().get(&RiskLevel::High), Some(&1));

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_probability_buckets() {
        let metrics = ServiceMetrics::new();
        metrics.record_success("nn", Duration::from_micros(1), 1.0, RiskLevel::High);
        metrics.record_success("nn", Duration::from_micros(1), 0.05, RiskLevel::Low);

        let distribution = metrics.get_probability_distribution();
        assert_eq!(distribution[9], 1);
        assert_eq!(distribution[0], 1);
    }

    #[test]
    fn test_empty_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);
    }
}
