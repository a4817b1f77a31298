//! Tracing initialization and subscriber setup.

use super::tracer;
use crate::infrastructure::{get_data_dir, SPAN_FILE_NAME};
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name reported as `service.name` and as the instrumentation scope.
pub(super) const SERVICE_NAME: &str = "bolsas-queue";

/// Initializes the tracing subscriber with JSON-lines span export.
///
/// Spans pass through an `EnvFilter` built from `config.trace_level`, are
/// handed to OpenTelemetry and land in
/// `/host/.local/share/zellij/bolsas-queue/bolsas-queue-spans.jsonl`.
///
/// Observability is optional: if the data directory cannot be created or the
/// filter directive does not parse, the plugin keeps running without a
/// subscriber. Calling this twice is harmless, only the first call installs.
pub fn init_tracing(config: &Config) {
    let data_dir = get_data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return;
    }

    let Ok(filter) = EnvFilter::try_new(&config.trace_level) else {
        return;
    };

    let resource = Resource::new(vec![opentelemetry::KeyValue::new("service.name", SERVICE_NAME)]);
    let provider = tracer::create_tracer_provider(data_dir.join(SPAN_FILE_NAME), resource);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    let _ = tracing_subscriber::registry().with(filter).with(otel_layer).try_init();
}
