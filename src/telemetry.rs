//! Tracing subscriber setup: env-filtered fmt output, plus OTLP span export
//! when a collector endpoint is configured.

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{BatchConfig, RandomIdGenerator, Sampler, Tracer};
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggerConfig, TracingConfig};

const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log level `{level}`: {reason}")]
    Filter { level: String, reason: String },
    #[error("failed to build otlp exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Resource attributes attached to every exported span.
fn resource(tracing: &TracingConfig) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", tracing.service_name.clone()),
        KeyValue::new("service.version", tracing.version.clone()),
        KeyValue::new("deployment.environment", tracing.environment.clone()),
    ])
}

/// Installs a batch OTLP pipeline as the global tracer provider.
fn init_tracer(endpoint: &str, tracing: &TracingConfig) -> Result<Tracer, TelemetryError> {
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
                    tracing.sampling_rate,
                ))))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource(tracing)),
        )
        .with_batch_config(BatchConfig::default())
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(EXPORT_TIMEOUT),
        )
        .install_batch(runtime::Tokio)?;
    Ok(tracer)
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Must run inside the Tokio runtime when export is on.
pub fn init(logger: &LoggerConfig, tracing: &TracingConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logger.level).map_err(|err| TelemetryError::Filter {
            level: logger.level.clone(),
            reason: err.to_string(),
        })?,
    };

    let fmt_layer = match logger.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    let otel_layer = match tracing.otlp_endpoint() {
        Some(endpoint) => Some(OpenTelemetryLayer::new(init_tracer(endpoint, tracing)?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}

/// Flushes buffered spans. A no-op when export was never enabled.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}
