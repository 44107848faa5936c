//! Request metrics and statistics for the scoring service.

use crate::normalizer::Coercion;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// How a `/predict` request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Completed,
    BadRequest,
    InternalError,
}

/// Metrics collector for the inference service
pub struct ServiceMetrics {
    /// Total prediction requests received
    pub requests_total: AtomicU64,
    /// Requests answered with a prediction
    pub completed: AtomicU64,
    /// Requests rejected as malformed
    pub bad_requests: AtomicU64,
    /// Requests that failed during inference
    pub internal_errors: AtomicU64,
    /// Vectors that were zero-padded
    pub vectors_padded: AtomicU64,
    /// Vectors that were truncated
    pub vectors_truncated: AtomicU64,
    /// Request latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Class-1 probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            bad_requests: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
            vectors_padded: AtomicU64::new(0),
            vectors_truncated: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a finished request
    pub fn record_request(&self, outcome: RequestOutcome, latency: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            RequestOutcome::Completed => &self.completed,
            RequestOutcome::BadRequest => &self.bad_requests,
            RequestOutcome::InternalError => &self.internal_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a class-1 probability returned by the model
    pub fn record_probability(&self, probability: f64) {
        let bucket = (probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record how the normalizer reshaped a request vector
    pub fn record_coercion(&self, coercion: Coercion) {
        match coercion {
            Coercion::Exact => {}
            Coercion::Padded { .. } => {
                self.vectors_padded.fetch_add(1, Ordering::Relaxed);
            }
            Coercion::Truncated { .. } => {
                self.vectors_truncated.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
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
            self.requests_total.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get probability distribution
    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let total = self.requests_total.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let bad = self.bad_requests.load(Ordering::Relaxed);
        let failed = self.internal_errors.load(Ordering::Relaxed);
        let padded = self.vectors_padded.load(Ordering::Relaxed);
        let truncated = self.vectors_truncated.load(Ordering::Relaxed);

        let latency = self.get_latency_stats();
        let throughput = self.get_throughput();
        let distribution = self.get_probability_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             CREDIT SCORING SERVICE - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests: {:>8}  │  Throughput: {:>8.1} req/s              ║",
            total, throughput
        );
        info!(
            "║ Completed: {:>7}  │  Bad requests: {:>6}  │  Errors: {:>6} ║",
            completed, bad, failed
        );
        info!(
            "║ Vectors padded: {:>6}  │  Vectors truncated: {:>6}          ║",
            padded, truncated
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}        ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Default Probability Distribution:                            ║");
        let scored: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if scored > 0 {
                (count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
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
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
