//! Metrics Module
//!
//! An explicitly constructed handle over a `metrics::Recorder`. Components
//! receive a clone at construction; no recorder is installed globally.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{Key, Label, Level, Metadata, NoopRecorder, Recorder, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const EXPONENTIAL_SECONDS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

// == Outcome ==
/// Result classification recorded for every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }

    pub fn of<T, E: Classify>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(err) => err.outcome(),
        }
    }
}

/// Errors that know which outcome they represent.
pub trait Classify {
    fn outcome(&self) -> Outcome;
}

// == Layer ==
/// Instrumented layer; selects metric names and the operation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Service,
    Repository,
}

impl Layer {
    fn counter_name(self) -> &'static str {
        match self {
            Layer::Service => "service_methods_total",
            Layer::Repository => "repository_queries_total",
        }
    }

    fn histogram_name(self) -> &'static str {
        match self {
            Layer::Service => "service_method_duration_seconds",
            Layer::Repository => "repository_query_duration_seconds",
        }
    }

    fn operation_label(self) -> &'static str {
        match self {
            Layer::Service => "method",
            Layer::Repository => "query",
        }
    }
}

/// Label value for a cache key, bounded to two series.
pub fn cache_key_label(key: &str) -> &'static str {
    if key.starts_with("ads:") {
        "list"
    } else {
        "ad"
    }
}

// == Metrics ==
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<dyn Recorder + Send + Sync>,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new(recorder: Arc<dyn Recorder + Send + Sync>) -> Self {
        let metrics = Self { recorder };
        metrics.describe();
        metrics
    }

    /// A handle that discards everything.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopRecorder))
    }

    /// Builds a Prometheus recorder without installing it, returning the
    /// handle and the renderer for the `/metrics` endpoint.
    pub fn prometheus() -> Result<(Self, PrometheusHandle), BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets(EXPONENTIAL_SECONDS)?
            .build_recorder();
        let handle = recorder.handle();
        Ok((Self::new(Arc::new(recorder)), handle))
    }

    fn describe(&self) {
        let describe_counter = |name: &'static str, help: &'static str| {
            self.recorder
                .describe_counter(name.into(), Some(Unit::Count), help.into());
        };
        let describe_histogram = |name: &'static str, help: &'static str| {
            self.recorder
                .describe_histogram(name.into(), Some(Unit::Seconds), help.into());
        };

        describe_counter(
            "handler_requests_total",
            "Total number of HTTP requests handled by the handler layer.",
        );
        describe_histogram(
            "handler_request_duration_seconds",
            "Response latency of the handler layer in seconds.",
        );
        describe_counter(
            "service_methods_total",
            "Total number of service methods executed.",
        );
        describe_histogram(
            "service_method_duration_seconds",
            "Service method execution duration in seconds.",
        );
        describe_counter(
            "repository_queries_total",
            "Total number of repository operations executed.",
        );
        describe_histogram(
            "repository_query_duration_seconds",
            "Repository operation duration in seconds.",
        );
        describe_counter(
            "cache_lookups_total",
            "Cache lookups by key kind and result (hit, miss, error).",
        );
        describe_counter(
            "cache_write_failures_total",
            "Best-effort cache writes or invalidations that failed.",
        );
    }

    fn increment(&self, name: &'static str, labels: Vec<Label>) {
        let key = Key::from_parts(name, labels);
        self.recorder.register_counter(&key, &METADATA).increment(1);
    }

    fn observe(&self, name: &'static str, labels: Vec<Label>, value: f64) {
        let key = Key::from_parts(name, labels);
        self.recorder.register_histogram(&key, &METADATA).record(value);
    }

    /// Starts timing one operation of `layer`.
    pub fn start(&self, layer: Layer, operation: &'static str) -> OperationTimer {
        OperationTimer {
            metrics: self.clone(),
            layer,
            operation,
            started: Instant::now(),
        }
    }

    /// Records one operation's outcome and latency.
    pub fn record_operation(
        &self,
        layer: Layer,
        operation: &'static str,
        outcome: Outcome,
        elapsed: Duration,
    ) {
        let labels = || {
            vec![
                Label::new(layer.operation_label(), operation),
                Label::new("status", outcome.as_str()),
            ]
        };
        self.increment(layer.counter_name(), labels());
        self.observe(layer.histogram_name(), labels(), elapsed.as_secs_f64());
    }

    /// Records one HTTP request.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let labels = || {
            vec![
                Label::new("method", method.to_string()),
                Label::new("endpoint", endpoint.to_string()),
                Label::new("status", status.to_string()),
            ]
        };
        self.increment("handler_requests_total", labels());
        self.observe(
            "handler_request_duration_seconds",
            labels(),
            elapsed.as_secs_f64(),
        );
    }

    /// Records a cache lookup result: `hit`, `miss` or `error`.
    pub fn record_cache_lookup(&self, key: &str, result: &'static str) {
        self.increment(
            "cache_lookups_total",
            vec![
                Label::new("key", cache_key_label(key)),
                Label::new("result", result),
            ],
        );
    }

    /// Records a failed best-effort cache write (`set`, `delete`, `serialize`).
    pub fn record_cache_write_failure(&self, key: &str, action: &'static str) {
        self.increment(
            "cache_write_failures_total",
            vec![
                Label::new("key", cache_key_label(key)),
                Label::new("action", action),
            ],
        );
    }
}

// == Operation Timer ==
/// Times one operation and records its outcome on the metrics handle and the
/// current span's `outcome` field. Failures also fill the span's `error` field.
#[must_use = "an unfinished timer records nothing"]
pub struct OperationTimer {
    metrics: Metrics,
    layer: Layer,
    operation: &'static str,
    started: Instant,
}

impl OperationTimer {
    pub fn finish<T, E: Classify + fmt::Display>(self, result: &Result<T, E>) {
        let outcome = Outcome::of(result);
        let span = tracing::Span::current();
        span.record("outcome", outcome.as_str());
        if let (Outcome::Error, Err(err)) = (outcome, result) {
            span.record("error", tracing::field::display(err));
        }
        self.metrics
            .record_operation(self.layer, self.operation, outcome, self.started.elapsed());
    }
}
