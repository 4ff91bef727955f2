//! Builder for the service configuration.
//!
//! The builder supports layered configuration from multiple sources:
//! 1. Compiled defaults (gRPC to `localhost:4317`, insecure)
//! 2. Configuration files (TOML)
//! 3. Environment variables
//! 4. Programmatic overrides
//!
//! Sources are merged in order, with later sources taking precedence.

use crate::config::{ComputeEnvironment, DiceConfig, Exporter, Protocol, ResourceConfig};
use crate::error::Error;
use crate::lifecycle::Telemetry;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use humantime_serde::re::humantime;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Builder for configuring the service and initialising telemetry.
///
/// # Example
///
/// ```no_run
/// use otel_dice::{Error, TelemetryBuilder};
///
/// fn main() -> Result<(), Error> {
///     let mut telemetry = TelemetryBuilder::new()
///         .with_file("dice.toml")
///         .with_standard_env()
///         .service_name("dice")
///         .build()?;
///
///     tracing::info!("Application running");
///     telemetry.shutdown()
/// }
/// ```
#[must_use = "builders do nothing unless .build() is called"]
pub struct TelemetryBuilder {
    figment: Figment,
    resource_attributes: HashMap<String, String>,
}

impl TelemetryBuilder {
    /// Creates a new builder with default configuration.
    ///
    /// Defaults include:
    /// - Protocol: gRPC, endpoint `localhost:4317` without TLS
    /// - All signals enabled (traces, metrics, logs)
    /// - Tracing subscriber initialisation enabled
    /// - Server listening on `0.0.0.0:8080`
    pub fn new() -> Self {
        Self::from_figment(Figment::from(Serialized::defaults(DiceConfig::default())))
    }

    /// Creates a builder from an existing figment.
    ///
    /// The figment should start from [`DiceConfig::default()`] or provide
    /// every section itself.
    pub fn from_figment(figment: Figment) -> Self {
        Self {
            figment,
            resource_attributes: HashMap::new(),
        }
    }

    /// Merges configuration from a TOML file.
    ///
    /// If the file doesn't exist, it's silently skipped.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.figment = self.figment.merge(Toml::file(path));
        }
        self
    }

    /// Merges configuration from environment variables with the given prefix.
    ///
    /// Nested keys are separated by a double underscore. With prefix `DICE_`:
    /// - `DICE_ENDPOINT__URL` → `endpoint.url`
    /// - `DICE_SERVER__LISTEN_ADDR` → `server.listen_addr`
    /// - `DICE_RESOURCE__SERVICE_NAME` → `resource.service_name`
    pub fn with_env(mut self, prefix: &str) -> Self {
        self.figment = self.figment.merge(Env::prefixed(prefix).split("__"));
        self
    }

    /// Merges configuration from standard OpenTelemetry environment variables.
    ///
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT` → endpoint URL
    /// - `OTEL_EXPORTER_OTLP_PROTOCOL` → protocol (grpc, http/protobuf, http/json)
    /// - `OTEL_EXPORTER_OTLP_INSECURE` → transport security for bare addresses
    /// - `OTEL_SERVICE_NAME` → service name
    /// - `OTEL_TRACES_EXPORTER` / `OTEL_METRICS_EXPORTER` / `OTEL_LOGS_EXPORTER`
    ///   → `none` disables the signal, `console` prints it to stdout, `otlp`
    ///   exports it to the collector
    pub fn with_standard_env(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.figment = self
                .figment
                .merge(Serialized::default("endpoint.url", endpoint));
        }

        if let Ok(protocol) = std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL") {
            let protocol = match protocol.as_str() {
                "http/protobuf" => Protocol::HttpBinary,
                "http/json" => Protocol::HttpJson,
                _ => Protocol::Grpc,
            };
            self.figment = self
                .figment
                .merge(Serialized::default("endpoint.protocol", protocol.as_config_str()));
        }

        if let Ok(insecure) = std::env::var("OTEL_EXPORTER_OTLP_INSECURE") {
            let insecure = insecure.eq_ignore_ascii_case("true");
            self.figment = self
                .figment
                .merge(Serialized::default("endpoint.insecure", insecure));
        }

        if let Ok(service_name) = std::env::var("OTEL_SERVICE_NAME") {
            self.figment = self
                .figment
                .merge(Serialized::default("resource.service_name", service_name));
        }

        for (var, signal) in [
            ("OTEL_TRACES_EXPORTER", "traces"),
            ("OTEL_METRICS_EXPORTER", "metrics"),
            ("OTEL_LOGS_EXPORTER", "logs"),
        ] {
            let Ok(exporter) = std::env::var(var) else {
                continue;
            };
            self.figment = self.figment.merge(Serialized::default(
                &format!("{signal}.enabled"),
                exporter != "none",
            ));
            let kind = match exporter.as_str() {
                "console" | "stdout" => Some(Exporter::Stdout),
                "otlp" => Some(Exporter::Otlp),
                _ => None,
            };
            if let Some(kind) = kind {
                self.figment = self.figment.merge(Serialized::default(
                    &format!("{signal}.exporter"),
                    kind.as_config_str(),
                ));
            }
        }

        self
    }

    /// Sets the collector endpoint, as a URL or a bare `host:port`.
    ///
    /// For HTTP protocols, signal-specific paths (`/v1/traces`, `/v1/metrics`,
    /// `/v1/logs`) are appended automatically.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.url", url.into()));
        self
    }

    /// Sets the export protocol.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.protocol", protocol.as_config_str()));
        self
    }

    /// Chooses whether bare endpoint addresses are dialled without TLS.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.insecure", insecure));
        self
    }

    /// Sets the export request timeout.
    pub fn export_timeout(mut self, timeout: Duration) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.timeout", humantime_string(timeout)));
        self
    }

    /// Adds a header (HTTP) or metadata entry (gRPC) to all export requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let header_key = format!("endpoint.headers.{}", key.into());
        self.figment = self
            .figment
            .merge(Serialized::default(&header_key, value.into()));
        self
    }

    /// Sets the service name resource attribute.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("resource.service_name", name.into()));
        self
    }

    /// Sets the service version resource attribute.
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "resource.service_version",
            version.into(),
        ));
        self
    }

    /// Sets the deployment environment resource attribute.
    pub fn deployment_environment(mut self, env: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "resource.deployment_environment",
            env.into(),
        ));
        self
    }

    /// Adds a resource attribute.
    pub fn resource_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    /// Configures the resource using a builder function.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use otel_dice::TelemetryBuilder;
    ///
    /// let builder = TelemetryBuilder::new().resource(|r| {
    ///     r.service_name("dice")
    ///         .service_version(env!("CARGO_PKG_VERSION"))
    ///         .deployment_environment("development")
    /// });
    /// ```
    pub fn resource<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ResourceConfigBuilder) -> ResourceConfigBuilder,
    {
        let config = f(ResourceConfigBuilder::new()).build();

        if let Some(name) = config.service_name {
            self = self.service_name(name);
        }
        if let Some(version) = config.service_version {
            self = self.service_version(version);
        }
        if let Some(env) = config.deployment_environment {
            self = self.deployment_environment(env);
        }
        if let Some(env) = config.compute_environment {
            self = self.compute_environment(env);
        }
        self.resource_attributes.extend(config.attributes);

        self
    }

    /// Sets the compute environment for resource detection.
    pub fn compute_environment(mut self, env: ComputeEnvironment) -> Self {
        let env_str = match env {
            ComputeEnvironment::Auto => "auto",
            ComputeEnvironment::Kubernetes => "kubernetes",
            ComputeEnvironment::None => "none",
        };
        self.figment = self
            .figment
            .merge(Serialized::default("resource.compute_environment", env_str));
        self
    }

    /// Enables or disables trace collection.
    ///
    /// Default: enabled
    pub fn traces(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("traces.enabled", enabled));
        self
    }

    /// Enables or disables metrics collection.
    ///
    /// Default: enabled
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("metrics.enabled", enabled));
        self
    }

    /// Enables or disables log collection.
    ///
    /// Default: enabled
    pub fn logs(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("logs.enabled", enabled));
        self
    }

    /// Sets the exporter for every signal.
    pub fn exporter(mut self, exporter: Exporter) -> Self {
        for key in ["traces.exporter", "metrics.exporter", "logs.exporter"] {
            self.figment = self
                .figment
                .merge(Serialized::default(key, exporter.as_config_str()));
        }
        self
    }

    /// Prints every signal to stdout instead of exporting it.
    ///
    /// Spans are flushed every second and metrics collected every three
    /// seconds so output shows up while the service runs.
    pub fn stdout(self) -> Self {
        self.exporter(Exporter::Stdout)
            .trace_batch_delay(Duration::from_secs(1))
            .metric_interval(Duration::from_secs(3))
    }

    /// Sets the delay between span batch exports.
    pub fn trace_batch_delay(mut self, delay: Duration) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "traces.batch.scheduled_delay",
            humantime_string(delay),
        ));
        self
    }

    /// Sets how often metrics are collected and exported.
    pub fn metric_interval(mut self, interval: Duration) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "metrics.batch.scheduled_delay",
            humantime_string(interval),
        ));
        self
    }

    /// Disables automatic tracing subscriber initialisation.
    pub fn without_tracing_subscriber(mut self) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("init_tracing_subscriber", false));
        self
    }

    /// Sets the instrumentation scope name.
    ///
    /// If not set, defaults to the service name.
    pub fn instrumentation_scope_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "instrumentation_scope_name",
            name.into(),
        ));
        self
    }

    /// Sets the address the HTTP server binds to.
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("server.listen_addr", addr.to_string()));
        self
    }

    /// Sets how long in-flight requests may drain after a shutdown signal.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "server.shutdown_grace",
            humantime_string(grace),
        ));
        self
    }

    /// Extracts the configuration for inspection or debugging.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails or if the endpoint
    /// URL carries a scheme other than `http` or `https`.
    pub fn extract_config(&self) -> Result<DiceConfig, Error> {
        let mut config: DiceConfig = self
            .figment
            .extract()
            .map_err(|e| Error::Config(Box::new(e)))?;

        config
            .resource
            .attributes
            .extend(self.resource_attributes.clone());

        if let Some(ref url) = config.endpoint.url
            && let Some((scheme, _)) = url.split_once("://")
            && scheme != "http"
            && scheme != "https"
        {
            return Err(Error::InvalidEndpoint { url: url.clone() });
        }

        Ok(config)
    }

    /// Extracts the configuration and sets up telemetry from it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration extraction fails
    /// - Provider initialisation fails
    /// - Tracing subscriber initialisation fails
    pub fn build(self) -> Result<Telemetry, Error> {
        let config = self.extract_config()?;
        Telemetry::init(&config)
    }
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn humantime_string(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Builder for resource configuration.
///
/// Used with [`TelemetryBuilder::resource`] for fluent configuration. Unset
/// fields leave the corresponding configuration untouched.
#[derive(Default)]
#[must_use = "builders do nothing unless .build() is called"]
pub struct ResourceConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    deployment_environment: Option<String>,
    compute_environment: Option<ComputeEnvironment>,
    attributes: HashMap<String, String>,
}

/// Resource settings collected by [`ResourceConfigBuilder`].
#[derive(Debug, Default)]
pub struct ResourceOverrides {
    /// Service name, if set.
    pub service_name: Option<String>,
    /// Service version, if set.
    pub service_version: Option<String>,
    /// Deployment environment, if set.
    pub deployment_environment: Option<String>,
    /// Compute environment, if set.
    pub compute_environment: Option<ComputeEnvironment>,
    /// Extra attributes.
    pub attributes: HashMap<String, String>,
}

impl ResourceConfigBuilder {
    /// Creates a new resource config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the service version.
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Sets the deployment environment.
    pub fn deployment_environment(mut self, env: impl Into<String>) -> Self {
        self.deployment_environment = Some(env.into());
        self
    }

    /// Adds a resource attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the compute environment for resource detection.
    pub fn compute_environment(mut self, env: ComputeEnvironment) -> Self {
        self.compute_environment = Some(env);
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> ResourceOverrides {
        ResourceOverrides {
            service_name: self.service_name,
            service_version: self.service_version,
            deployment_environment: self.deployment_environment,
            compute_environment: self.compute_environment,
            attributes: self.attributes,
        }
    }

    /// Applies the collected settings on top of an existing resource config.
    pub fn apply_to(self, config: &mut ResourceConfig) {
        let overrides = self.build();
        if let Some(name) = overrides.service_name {
            config.service_name = name;
        }
        if overrides.service_version.is_some() {
            config.service_version = overrides.service_version;
        }
        if overrides.deployment_environment.is_some() {
            config.deployment_environment = overrides.deployment_environment;
        }
        if let Some(env) = overrides.compute_environment {
            config.compute_environment = env;
        }
        config.attributes.extend(overrides.attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = TelemetryBuilder::new().extract_config().unwrap();

        assert!(config.traces.enabled);
        assert!(config.metrics.enabled);
        assert!(config.logs.enabled);
        assert!(config.init_tracing_subscriber);
        assert!(config.endpoint.insecure);
        assert_eq!(config.endpoint.protocol, Protocol::Grpc);
        assert_eq!(config.resource.service_name, "dice");
        assert_eq!(config.server.listen_addr.port(), 8080);
    }

    #[test]
    fn builder_endpoint() {
        let config = TelemetryBuilder::new()
            .endpoint("collector:4317")
            .insecure(false)
            .extract_config()
            .unwrap();

        assert_eq!(config.endpoint.url.as_deref(), Some("collector:4317"));
        assert_eq!(config.effective_endpoint(), "https://collector:4317");
    }

    #[test]
    fn builder_protocol() {
        let config = TelemetryBuilder::new()
            .protocol(Protocol::HttpJson)
            .extract_config()
            .unwrap();

        assert_eq!(config.endpoint.protocol, Protocol::HttpJson);
    }

    #[test]
    fn builder_durations_round_trip_through_humantime() {
        let config = TelemetryBuilder::new()
            .export_timeout(Duration::from_millis(1500))
            .metric_interval(Duration::from_secs(3))
            .shutdown_grace(Duration::from_secs(2))
            .extract_config()
            .unwrap();

        assert_eq!(config.endpoint.timeout, Duration::from_millis(1500));
        assert_eq!(config.metrics.batch.scheduled_delay, Duration::from_secs(3));
        assert_eq!(config.server.shutdown_grace, Duration::from_secs(2));
    }

    #[test]
    fn builder_listen_addr() {
        let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
        let config = TelemetryBuilder::new()
            .listen_addr(addr)
            .extract_config()
            .unwrap();

        assert_eq!(config.server.listen_addr, addr);
    }

    #[test]
    fn builder_disable_signals() {
        let config = TelemetryBuilder::new()
            .traces(false)
            .metrics(false)
            .logs(false)
            .extract_config()
            .unwrap();

        assert!(!config.traces.enabled);
        assert!(!config.metrics.enabled);
        assert!(!config.logs.enabled);
    }

    #[test]
    fn builder_resource_fluent() {
        let config = TelemetryBuilder::new()
            .resource(|r| {
                r.service_name("roller")
                    .service_version("1.0.0")
                    .deployment_environment("production")
                    .compute_environment(ComputeEnvironment::None)
                    .attribute("custom.key", "custom.value")
            })
            .extract_config()
            .unwrap();

        assert_eq!(config.resource.service_name, "roller");
        assert_eq!(config.resource.service_version.as_deref(), Some("1.0.0"));
        assert_eq!(
            config.resource.deployment_environment.as_deref(),
            Some("production")
        );
        assert_eq!(
            config.resource.compute_environment,
            ComputeEnvironment::None
        );
        assert_eq!(
            config.resource.attributes.get("custom.key"),
            Some(&"custom.value".to_string())
        );
    }

    #[test]
    fn resource_builder_apply_to_keeps_unset_fields() {
        let mut config = ResourceConfig::default();
        ResourceConfigBuilder::new()
            .service_version("2.0.0")
            .apply_to(&mut config);

        assert_eq!(config.service_name, "dice");
        assert_eq!(config.service_version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn builder_without_tracing_subscriber() {
        let config = TelemetryBuilder::new()
            .without_tracing_subscriber()
            .extract_config()
            .unwrap();

        assert!(!config.init_tracing_subscriber);
    }

    #[test]
    fn builder_header() {
        let config = TelemetryBuilder::new()
            .header("authorization", "Bearer token123")
            .extract_config()
            .unwrap();

        assert_eq!(
            config.endpoint.headers.get("authorization"),
            Some(&"Bearer token123".to_string())
        );
    }

    #[test]
    fn with_standard_env_endpoint_and_insecure() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("collector:4317")),
                ("OTEL_EXPORTER_OTLP_INSECURE", Some("false")),
            ],
            || {
                let config = TelemetryBuilder::new()
                    .with_standard_env()
                    .extract_config()
                    .unwrap();
                assert_eq!(config.endpoint.url.as_deref(), Some("collector:4317"));
                assert!(!config.endpoint.insecure);
            },
        );
    }

    #[test]
    fn with_standard_env_service_name() {
        temp_env::with_var("OTEL_SERVICE_NAME", Some("test-service"), || {
            let config = TelemetryBuilder::new()
                .with_standard_env()
                .extract_config()
                .unwrap();
            assert_eq!(config.resource.service_name, "test-service");
        });
    }

    #[test]
    fn with_standard_env_protocol_http_protobuf() {
        temp_env::with_var("OTEL_EXPORTER_OTLP_PROTOCOL", Some("http/protobuf"), || {
            let config = TelemetryBuilder::new()
                .with_standard_env()
                .extract_config()
                .unwrap();
            assert_eq!(config.endpoint.protocol, Protocol::HttpBinary);
        });
    }

    #[test]
    fn with_standard_env_exporters_none_disable_signals() {
        temp_env::with_vars(
            [
                ("OTEL_TRACES_EXPORTER", Some("none")),
                ("OTEL_METRICS_EXPORTER", Some("otlp")),
                ("OTEL_LOGS_EXPORTER", Some("none")),
            ],
            || {
                let config = TelemetryBuilder::new()
                    .with_standard_env()
                    .extract_config()
                    .unwrap();
                assert!(!config.traces.enabled);
                assert!(config.metrics.enabled);
                assert!(!config.logs.enabled);
            },
        );
    }

    #[test]
    fn with_standard_env_console_selects_stdout() {
        temp_env::with_vars(
            [
                ("OTEL_TRACES_EXPORTER", Some("console")),
                ("OTEL_METRICS_EXPORTER", Some("otlp")),
                ("OTEL_LOGS_EXPORTER", None),
            ],
            || {
                let config = TelemetryBuilder::new()
                    .with_standard_env()
                    .extract_config()
                    .unwrap();
                assert!(config.traces.enabled);
                assert_eq!(config.traces.exporter, Exporter::Stdout);
                assert_eq!(config.metrics.exporter, Exporter::Otlp);
                assert_eq!(config.logs.exporter, Exporter::Otlp);
            },
        );
    }

    #[test]
    fn stdout_sets_exporters_and_short_intervals() {
        let config = TelemetryBuilder::new().stdout().extract_config().unwrap();

        assert_eq!(config.traces.exporter, Exporter::Stdout);
        assert_eq!(config.metrics.exporter, Exporter::Stdout);
        assert_eq!(config.logs.exporter, Exporter::Stdout);
        assert_eq!(config.traces.batch.scheduled_delay, Duration::from_secs(1));
        assert_eq!(config.metrics.batch.scheduled_delay, Duration::from_secs(3));
    }

    #[test]
    fn with_env_prefix_reads_nested_keys() {
        temp_env::with_vars(
            [
                ("DICE_SERVER__LISTEN_ADDR", Some("127.0.0.1:18080")),
                ("DICE_RESOURCE__SERVICE_NAME", Some("env-dice")),
            ],
            || {
                let config = TelemetryBuilder::new()
                    .with_env("DICE_")
                    .extract_config()
                    .unwrap();
                assert_eq!(config.server.listen_addr.port(), 18080);
                assert_eq!(config.resource.service_name, "env-dice");
            },
        );
    }

    #[test]
    fn programmatic_overrides_env() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("http://env:4317")),
                ("OTEL_SERVICE_NAME", Some("env-service")),
            ],
            || {
                let config = TelemetryBuilder::new()
                    .with_standard_env()
                    .endpoint("http://programmatic:4317")
                    .service_name("programmatic-service")
                    .extract_config()
                    .unwrap();

                assert_eq!(
                    config.endpoint.url.as_deref(),
                    Some("http://programmatic:4317")
                );
                assert_eq!(config.resource.service_name, "programmatic-service");
            },
        );
    }

    #[test]
    fn unsupported_endpoint_scheme_rejected() {
        let err = TelemetryBuilder::new()
            .endpoint("ftp://collector:4317")
            .extract_config()
            .unwrap_err();

        assert!(
            matches!(err, Error::InvalidEndpoint { ref url } if url == "ftp://collector:4317"),
            "Expected InvalidEndpoint error, got: {err:?}"
        );
    }

    #[test]
    fn bare_and_https_endpoints_accepted() {
        for url in ["localhost:4317", "https://collector.example.com:4317"] {
            let config = TelemetryBuilder::new()
                .endpoint(url)
                .extract_config()
                .unwrap();
            assert_eq!(config.endpoint.url.as_deref(), Some(url));
        }
    }
}
