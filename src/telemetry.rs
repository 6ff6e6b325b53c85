use crate::config::MetricsConfig;
use parking_lot::Mutex;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Endpoints with their own breakdown bucket. Everything else lands in `other`.
pub const TRACKED_ENDPOINTS: [&str; 3] = ["/health", "/metrics", "/predict"];
pub const OTHER_ENDPOINT: &str = "other";

const PROBE_ENDPOINTS: [&str; 3] = ["/health", "/metrics", "/metrics/prometheus"];

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    latency_sum: f64,
    per_endpoint: [u64; TRACKED_ENDPOINTS.len()],
    other: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub latency_sum: f64,
    pub latency_avg: f64,
    pub breakdown: BTreeMap<String, u64>,
}

/// Process-wide request counters.
///
/// Every update and every snapshot goes through the same lock, so the total
/// always equals the sum of the breakdown buckets.
pub struct Metrics {
    counters: Mutex<Counters>,
    count_probe_endpoints: bool,
    request_counter: IntCounterVec,
    request_duration: HistogramVec,
    pub registry: Registry,
}

impl Metrics {
    pub fn new(metrics_config: &MetricsConfig) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_counter = IntCounterVec::new(
            Opts::new("requests_total", "Total number of requests"),
            &["route"],
        )?;

        let boundaries = generate_boundaries((1, 20, 100, 500, 2000));
        let request_duration = HistogramVec::new(
            HistogramOpts::new("request_duration_ms", "Duration of requests in milliseconds")
                .buckets(boundaries),
            &["route"],
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Metrics {
            counters: Mutex::new(Counters::default()),
            count_probe_endpoints: metrics_config.count_probe_endpoints,
            request_counter,
            request_duration,
            registry,
        })
    }

    fn is_counted(&self, endpoint: &str) -> bool {
        self.count_probe_endpoints || !PROBE_ENDPOINTS.contains(&endpoint)
    }

    pub fn record(&self, endpoint: &str, elapsed_seconds: f64) {
        if !self.is_counted(endpoint) {
            return;
        }

        let bucket = TRACKED_ENDPOINTS.iter().position(|tracked| *tracked == endpoint);
        {
            let mut counters = self.counters.lock();
            counters.total += 1;
            counters.latency_sum += elapsed_seconds;
            match bucket {
                Some(index) => counters.per_endpoint[index] += 1,
                None => counters.other += 1,
            }
        }

        let route = bucket.map_or(OTHER_ENDPOINT, |index| TRACKED_ENDPOINTS[index]);
        self.request_counter.with_label_values(&[route]).inc();
        self.request_duration
            .with_label_values(&[route])
            .observe(elapsed_seconds * 1000.);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.lock();

        let mut breakdown: BTreeMap<String, u64> = TRACKED_ENDPOINTS
            .iter()
            .zip(counters.per_endpoint.iter())
            .map(|(endpoint, count)| (endpoint.to_string(), *count))
            .collect();
        breakdown.insert(OTHER_ENDPOINT.to_string(), counters.other);

        let latency_avg = if counters.total > 0 {
            counters.latency_sum / counters.total as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            total: counters.total,
            latency_sum: counters.latency_sum,
            latency_avg,
            breakdown,
        }
    }

    /// Prometheus text exposition of the registry.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 1;
    let middle_step: usize = 10;
    let end_step: usize = 50;
    let tail_step: usize = 500;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn metrics(count_probe_endpoints: bool) -> Metrics {
        Metrics::new(&MetricsConfig {
            count_probe_endpoints,
        })
        .unwrap()
    }

    #[test]
    fn test_generate_boundaries() {
        let parts = (1, 3, 23, 123, 1123);
        let get = generate_boundaries(parts);
        let expected = vec![1.0, 2.0, 3.0, 13.0, 23.0, 73.0, 123.0, 623.0, 1123.0];

        assert_eq!(get, expected);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = metrics(true).snapshot();

        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.latency_sum, 0.0);
        assert_eq!(snapshot.latency_avg, 0.0);
        assert_eq!(snapshot.breakdown.len(), 4);
        assert!(snapshot.breakdown.values().all(|count| *count == 0));
    }

    #[test]
    fn test_record_buckets_and_latency() {
        let metrics = metrics(true);

        metrics.record("/health", 0.5);
        metrics.record("/predict", 1.0);
        metrics.record("/predict", 1.5);
        metrics.record("/docs", 1.0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.latency_sum, 4.0);
        assert_eq!(snapshot.latency_avg, 1.0);
        assert_eq!(snapshot.breakdown["/health"], 1);
        assert_eq!(snapshot.breakdown["/metrics"], 0);
        assert_eq!(snapshot.breakdown["/predict"], 2);
        assert_eq!(snapshot.breakdown["other"], 1);
    }

    #[test]
    fn test_probe_endpoints_excluded_by_policy() {
        let metrics = metrics(false);

        metrics.record("/health", 0.1);
        metrics.record("/metrics", 0.1);
        metrics.record("/metrics/prometheus", 0.1);
        metrics.record("/predict", 0.2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total, 1);
        assert_eq!(snapshot.breakdown["/health"], 0);
        assert_eq!(snapshot.breakdown["/metrics"], 0);
        assert_eq!(snapshot.breakdown["/predict"], 1);
        assert_eq!(snapshot.breakdown["other"], 0);
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let metrics = Arc::new(metrics(true));
        let endpoints = ["/health", "/metrics", "/predict", "/unknown"];

        std::thread::scope(|scope| {
            for thread_id in 0..8 {
                let metrics = metrics.clone();
                scope.spawn(move || {
                    for i in 0..1000 {
                        metrics.record(endpoints[(thread_id + i) % endpoints.len()], 0.001);
                        if i % 100 == 0 {
                            let snapshot = metrics.snapshot();
                            assert_eq!(snapshot.total, snapshot.breakdown.values().sum::<u64>());
                        }
                    }
                });
            }
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total, 8000);
        assert_eq!(snapshot.breakdown.values().sum::<u64>(), 8000);
        assert_eq!(snapshot.breakdown["other"], 2000);
    }

    #[test]
    fn test_render_prometheus() {
        let metrics = metrics(true);
        metrics.record("/predict", 0.02);
        metrics.record("/favicon.ico", 0.001);

        let text = metrics.render().unwrap();

        assert!(text.contains(r#"requests_total{route="/predict"} 1"#));
        assert!(text.contains(r#"requests_total{route="other"} 1"#));
        assert!(text.contains("request_duration_ms_bucket"));
    }
}
