//! Telemetry provider lifecycle management.
//!
//! [`Telemetry::setup`] builds the propagator and the tracer, meter and
//! logger providers in that order. Each provider registers exactly one
//! teardown callback in a [`ShutdownRegistry`] as soon as it exists. If a
//! later step fails, everything registered so far is torn down and the
//! teardown failures are joined with the construction failure.
//!
//! The returned [`Telemetry`] bundle is passed explicitly to whoever needs a
//! propagator, tracer or meter. Nothing is installed as a process-wide
//! default.

use crate::config::{BatchConfig, DiceConfig, Exporter, Protocol};
use crate::error::Error;
use crate::resource::build_resource;
use crate::subscriber;
use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{
    BatchConfigBuilder as LogBatchConfigBuilder, BatchLogProcessor, LogExporter, SdkLoggerProvider,
};
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{
    BatchConfigBuilder as TraceBatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracerProvider,
    SpanExporter,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};

/// The kind of telemetry a provider handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Spans, via the tracer provider.
    Traces,
    /// Instruments, via the meter provider.
    Metrics,
    /// Log records, via the logger provider.
    Logs,
}

impl Signal {
    /// Lowercase name used in log output and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
            Signal::Logs => "logs",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Teardown = Box<dyn FnOnce() -> Result<(), Error> + Send>;

/// Ordered list of teardown callbacks.
///
/// Callbacks run in registration order, each at most once.
#[derive(Default)]
pub struct ShutdownRegistry {
    callbacks: Vec<(Signal, Teardown)>,
}

impl ShutdownRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a teardown callback for a provider of the given kind.
    pub fn register<F>(&mut self, signal: Signal, teardown: F)
    where
        F: FnOnce() -> Result<(), Error> + Send + 'static,
    {
        self.callbacks.push((signal, Box::new(teardown)));
    }

    /// Number of callbacks still pending.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true when no callback is pending.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Runs every pending callback in registration order and clears the
    /// registry.
    ///
    /// All callbacks run even if earlier ones fail; their errors are joined.
    /// Calling this again afterwards does nothing and returns `Ok(())`.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        let callbacks = std::mem::take(&mut self.callbacks);
        let errors = callbacks.into_iter().filter_map(|(signal, teardown)| {
            tracing::debug!(target: "otel_lifecycle", %signal, "Shutting down provider");
            teardown().err()
        });

        match Error::join_all(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ShutdownRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.callbacks.iter().map(|(signal, _)| signal))
            .finish()
    }
}

/// Constructs the pieces [`Telemetry::setup`] composes.
///
/// [`SdkProviders`] is the production implementation; tests substitute
/// their own to observe or fail individual steps.
pub trait ProviderFactory {
    /// Builds the propagator used for cross-process context.
    ///
    /// Defaults to W3C trace context followed by W3C baggage.
    fn propagator(&self) -> TextMapCompositePropagator {
        TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ])
    }

    /// Builds the tracer provider.
    fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, Error>;

    /// Builds the meter provider.
    fn meter_provider(&self, resource: Resource) -> Result<SdkMeterProvider, Error>;

    /// Builds the logger provider.
    fn logger_provider(&self, resource: Resource) -> Result<SdkLoggerProvider, Error>;
}

/// Explicit bundle of the active propagator and providers.
///
/// Call [`shutdown()`](Self::shutdown) to flush and release the providers
/// with error reporting. Dropping an unshut bundle performs the same
/// teardown and logs any failure.
pub struct Telemetry {
    propagator: Arc<TextMapCompositePropagator>,
    resource: Resource,
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<SdkLoggerProvider>,
    registry: ShutdownRegistry,
}

impl Telemetry {
    /// Sets up OTLP or stdout export as described by `config`.
    ///
    /// This is typically called by [`TelemetryBuilder::build`](crate::TelemetryBuilder::build).
    pub fn init(config: &DiceConfig) -> Result<Self, Error> {
        let resource = build_resource(&config.resource);
        Self::setup(config, resource, &SdkProviders::new(config))
    }

    /// Constructs the propagator and the enabled providers in order, then
    /// installs the tracing subscriber if configured.
    ///
    /// On failure, providers built so far are shut down before returning, and
    /// the returned error carries both the construction failure and any
    /// teardown failures.
    pub fn setup<F>(config: &DiceConfig, resource: Resource, factory: &F) -> Result<Self, Error>
    where
        F: ProviderFactory + ?Sized,
    {
        let mut telemetry = Telemetry {
            propagator: Arc::new(factory.propagator()),
            resource: resource.clone(),
            tracer_provider: None,
            meter_provider: None,
            logger_provider: None,
            registry: ShutdownRegistry::new(),
        };

        if config.traces.enabled {
            match factory.tracer_provider(resource.clone()) {
                Ok(provider) => telemetry.register_tracer_provider(provider),
                Err(err) => return Err(telemetry.abort(err)),
            }
        }

        if config.metrics.enabled {
            match factory.meter_provider(resource.clone()) {
                Ok(provider) => telemetry.register_meter_provider(provider),
                Err(err) => return Err(telemetry.abort(err)),
            }
        }

        if config.logs.enabled {
            match factory.logger_provider(resource) {
                Ok(provider) => telemetry.register_logger_provider(provider),
                Err(err) => return Err(telemetry.abort(err)),
            }
        }

        if config.init_tracing_subscriber
            && let Err(err) = subscriber::init(&telemetry, config.scope_name())
        {
            return Err(telemetry.abort(err));
        }

        tracing::debug!(
            target: "otel_lifecycle",
            providers = ?telemetry.registry,
            "Telemetry providers ready"
        );

        Ok(telemetry)
    }

    fn register_tracer_provider(&mut self, provider: SdkTracerProvider) {
        let handle = provider.clone();
        self.registry.register(Signal::Traces, move || {
            handle.shutdown().map_err(|source| Error::Shutdown {
                signal: Signal::Traces,
                source,
            })
        });
        self.tracer_provider = Some(provider);
    }

    fn register_meter_provider(&mut self, provider: SdkMeterProvider) {
        let handle = provider.clone();
        self.registry.register(Signal::Metrics, move || {
            handle.shutdown().map_err(|source| Error::Shutdown {
                signal: Signal::Metrics,
                source,
            })
        });
        self.meter_provider = Some(provider);
    }

    fn register_logger_provider(&mut self, provider: SdkLoggerProvider) {
        let handle = provider.clone();
        self.registry.register(Signal::Logs, move || {
            handle.shutdown().map_err(|source| Error::Shutdown {
                signal: Signal::Logs,
                source,
            })
        });
        self.logger_provider = Some(provider);
    }

    fn abort(mut self, err: Error) -> Error {
        tracing::debug!(target: "otel_lifecycle", error = %err, "Telemetry setup failed, tearing down");
        err.with_cleanup(self.registry.shutdown())
    }

    /// Returns the propagator for injecting and extracting remote context.
    pub fn propagator(&self) -> Arc<TextMapCompositePropagator> {
        Arc::clone(&self.propagator)
    }

    /// Returns the resource shared by all providers.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Returns the tracer provider if configured.
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    /// Returns the meter provider if configured.
    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    /// Returns the logger provider if configured.
    pub fn logger_provider(&self) -> Option<&SdkLoggerProvider> {
        self.logger_provider.as_ref()
    }

    /// Returns a meter from the bundle's provider.
    ///
    /// With metrics disabled the meter is a no-op.
    pub fn meter(&self, name: &'static str) -> Meter {
        match &self.meter_provider {
            Some(provider) => provider.meter(name),
            None => opentelemetry::global::meter(name),
        }
    }

    /// Returns true once [`shutdown()`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.registry.is_empty()
    }

    /// Flushes all configured providers, joining any failures.
    ///
    /// Like [`shutdown()`](Self::shutdown), this blocks while exporting.
    pub fn flush(&self) -> Result<(), Error> {
        let flush = |signal: Signal, result: opentelemetry_sdk::error::OTelSdkResult| {
            result.map_err(|source| Error::Flush { signal, source }).err()
        };

        let errors = [
            self.tracer_provider
                .as_ref()
                .and_then(|p| flush(Signal::Traces, p.force_flush())),
            self.meter_provider
                .as_ref()
                .and_then(|p| flush(Signal::Metrics, p.force_flush())),
            self.logger_provider
                .as_ref()
                .and_then(|p| flush(Signal::Logs, p.force_flush())),
        ];

        match Error::join_all(errors.into_iter().flatten()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Shuts down every provider in the order it was constructed.
    ///
    /// Every provider is shut down even if an earlier one fails; all failures
    /// are joined into the returned error. A second call returns `Ok(())`
    /// without touching the providers again.
    ///
    /// Shutdown blocks while pending telemetry is exported. From async code,
    /// run it on a blocking thread.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        self.registry.shutdown()
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("tracer_provider", &self.tracer_provider.is_some())
            .field("meter_provider", &self.meter_provider.is_some())
            .field("logger_provider", &self.logger_provider.is_some())
            .field("pending_shutdown", &self.registry)
            .finish()
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        if let Err(e) = self.registry.shutdown() {
            tracing::error!(target: "otel_lifecycle", error = %e, "Failed to shut down telemetry providers");
        }
    }
}

/// Builds providers from a [`DiceConfig`], exporting each signal over OTLP
/// or to stdout as configured.
#[derive(Debug, Clone, Copy)]
pub struct SdkProviders<'a> {
    config: &'a DiceConfig,
}

impl<'a> SdkProviders<'a> {
    /// Creates a factory for the given configuration.
    pub fn new(config: &'a DiceConfig) -> Self {
        Self { config }
    }
}

fn build_tonic_metadata(headers: &HashMap<String, String>) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    for (key, value) in headers {
        if let (Ok(k), Ok(v)) = (
            key.parse::<MetadataKey<_>>(),
            value.parse::<MetadataValue<_>>(),
        ) {
            metadata.insert(k, v);
        }
    }
    metadata
}

macro_rules! build_exporter {
    ($config:expr, $exporter_type:ident, $signal_path:expr, $error_variant:ident) => {{
        match $config.endpoint.protocol {
            Protocol::Grpc => {
                let mut builder = opentelemetry_otlp::$exporter_type::builder()
                    .with_tonic()
                    .with_endpoint($config.effective_endpoint())
                    .with_timeout($config.endpoint.timeout);

                if !$config.endpoint.headers.is_empty() {
                    builder =
                        builder.with_metadata(build_tonic_metadata(&$config.endpoint.headers));
                }

                builder.build().map_err(Error::$error_variant)?
            }
            Protocol::HttpBinary | Protocol::HttpJson => {
                let protocol = match $config.endpoint.protocol {
                    Protocol::HttpJson => opentelemetry_otlp::Protocol::HttpJson,
                    _ => opentelemetry_otlp::Protocol::HttpBinary,
                };
                let mut builder = opentelemetry_otlp::$exporter_type::builder()
                    .with_http()
                    .with_endpoint($config.signal_endpoint($signal_path))
                    .with_timeout($config.endpoint.timeout)
                    .with_protocol(protocol);

                if !$config.endpoint.headers.is_empty() {
                    builder = builder.with_headers($config.endpoint.headers.clone());
                }

                builder.build().map_err(Error::$error_variant)?
            }
        }
    }};
}

fn tracer_provider_with<E>(exporter: E, batch: &BatchConfig, resource: Resource) -> SdkTracerProvider
where
    E: SpanExporter + 'static,
{
    let batch_config = TraceBatchConfigBuilder::default()
        .with_max_queue_size(batch.max_queue_size)
        .with_max_export_batch_size(batch.max_export_batch_size)
        .with_scheduled_delay(batch.scheduled_delay)
        .build();

    let span_processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_span_processor(span_processor)
        .with_resource(resource)
        .build()
}

fn meter_provider_with<E>(exporter: E, interval: Duration, resource: Resource) -> SdkMeterProvider
where
    E: PushMetricExporter,
{
    let reader = PeriodicReader::builder(exporter)
        .with_interval(interval)
        .build();

    SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build()
}

fn logger_provider_with<E>(exporter: E, batch: &BatchConfig, resource: Resource) -> SdkLoggerProvider
where
    E: LogExporter + 'static,
{
    let batch_config = LogBatchConfigBuilder::default()
        .with_max_queue_size(batch.max_queue_size)
        .with_max_export_batch_size(batch.max_export_batch_size)
        .with_scheduled_delay(batch.scheduled_delay)
        .build();

    let log_processor = BatchLogProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    SdkLoggerProvider::builder()
        .with_log_processor(log_processor)
        .with_resource(resource)
        .build()
}

impl ProviderFactory for SdkProviders<'_> {
    fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, Error> {
        let traces = &self.config.traces;
        Ok(match traces.exporter {
            Exporter::Otlp => {
                let exporter =
                    build_exporter!(self.config, SpanExporter, "/v1/traces", TraceExporter);
                tracer_provider_with(exporter, &traces.batch, resource)
            }
            Exporter::Stdout => tracer_provider_with(
                opentelemetry_stdout::SpanExporter::default(),
                &traces.batch,
                resource,
            ),
        })
    }

    fn meter_provider(&self, resource: Resource) -> Result<SdkMeterProvider, Error> {
        let metrics = &self.config.metrics;
        let interval = metrics.batch.scheduled_delay;
        Ok(match metrics.exporter {
            Exporter::Otlp => {
                let exporter =
                    build_exporter!(self.config, MetricExporter, "/v1/metrics", MetricExporter);
                meter_provider_with(exporter, interval, resource)
            }
            Exporter::Stdout => meter_provider_with(
                opentelemetry_stdout::MetricExporter::default(),
                interval,
                resource,
            ),
        })
    }

    fn logger_provider(&self, resource: Resource) -> Result<SdkLoggerProvider, Error> {
        let logs = &self.config.logs;
        Ok(match logs.exporter {
            Exporter::Otlp => {
                let exporter = build_exporter!(self.config, LogExporter, "/v1/logs", LogExporter);
                logger_provider_with(exporter, &logs.batch, resource)
            }
            Exporter::Stdout => logger_provider_with(
                opentelemetry_stdout::LogExporter::default(),
                &logs.batch,
                resource,
            ),
        })
    }
}
