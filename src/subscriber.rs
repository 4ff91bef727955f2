//! `tracing` subscriber wiring.
//!
//! Console output goes through a fmt layer filtered by `RUST_LOG` (default
//! `info`). Spans are exported through the bundle's tracer provider and
//! events are bridged into its logger provider.

use crate::error::Error;
use crate::lifecycle::Telemetry;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global `tracing` subscriber for the bundle's providers.
///
/// Fails if a subscriber has already been installed in this process.
pub fn init(telemetry: &Telemetry, scope_name: String) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    match (telemetry.tracer_provider(), telemetry.logger_provider()) {
        (Some(tp), Some(lp)) => {
            let tracer = tp.tracer(scope_name);
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            let log_layer = OpenTelemetryTracingBridge::new(lp);
            registry.with(telemetry_layer).with(log_layer).try_init()?;
        }
        (Some(tp), None) => {
            let tracer = tp.tracer(scope_name);
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            registry.with(telemetry_layer).try_init()?;
        }
        (None, Some(lp)) => {
            let log_layer = OpenTelemetryTracingBridge::new(lp);
            registry.with(log_layer).try_init()?;
        }
        (None, None) => {
            registry.try_init()?;
        }
    }

    Ok(())
}
