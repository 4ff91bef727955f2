//! Configuration types for the dice service and its telemetry pipeline.
//!
//! These types are designed to be deserialised from multiple sources using
//! figment, supporting layered configuration from defaults, files, and
//! environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Compute environment for resource attribute detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeEnvironment {
    /// Run generic detectors (host, OS, process, Rust runtime) and check for
    /// Kubernetes.
    #[default]
    Auto,
    /// Generic detectors plus Kubernetes attributes.
    Kubernetes,
    /// No automatic detection, only explicitly configured attributes.
    None,
}

/// OTLP export protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// gRPC protocol (default port 4317).
    #[default]
    Grpc,
    /// HTTP with Protocol Buffers encoding (default port 4318).
    #[serde(alias = "http_binary", alias = "http-binary")]
    HttpBinary,
    /// HTTP with JSON encoding (default port 4318).
    #[serde(alias = "http_json", alias = "http-json")]
    HttpJson,
}

impl Protocol {
    /// Returns the default collector address for this protocol, without scheme.
    #[must_use]
    pub fn default_address(&self) -> &'static str {
        match self {
            Protocol::Grpc => "localhost:4317",
            Protocol::HttpBinary | Protocol::HttpJson => "localhost:4318",
        }
    }

    /// Returns the default port for this protocol.
    #[must_use]
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Grpc => 4317,
            Protocol::HttpBinary | Protocol::HttpJson => 4318,
        }
    }

    pub(crate) fn as_config_str(&self) -> &'static str {
        match self {
            Protocol::Grpc => "grpc",
            Protocol::HttpBinary => "httpbinary",
            Protocol::HttpJson => "httpjson",
        }
    }
}

/// Destination for a signal's exported data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exporter {
    /// Export to the configured OTLP endpoint.
    #[default]
    Otlp,
    /// Print to standard output. Needs no collector.
    #[serde(alias = "console")]
    Stdout,
}

impl Exporter {
    pub(crate) fn as_config_str(&self) -> &'static str {
        match self {
            Exporter::Otlp => "otlp",
            Exporter::Stdout => "stdout",
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Collector endpoint configuration.
    pub endpoint: EndpointConfig,

    /// Resource configuration.
    pub resource: ResourceConfig,

    /// Traces configuration.
    pub traces: SignalConfig,

    /// Metrics configuration.
    pub metrics: SignalConfig,

    /// Logs configuration.
    pub logs: SignalConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Whether to install the tracing subscriber during setup.
    pub init_tracing_subscriber: bool,

    /// Name for the instrumentation scope. Defaults to the service name.
    pub instrumentation_scope_name: Option<String>,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            resource: ResourceConfig::default(),
            traces: SignalConfig::default_enabled(),
            metrics: SignalConfig::default_enabled(),
            logs: SignalConfig::default_enabled(),
            server: ServerConfig::default(),
            init_tracing_subscriber: true,
            instrumentation_scope_name: None,
        }
    }
}

impl DiceConfig {
    /// Returns the effective endpoint URL.
    ///
    /// Falls back to the protocol's default address. A scheme-less address is
    /// dialled over `http://` when `insecure` is set and `https://` otherwise.
    #[must_use]
    pub fn effective_endpoint(&self) -> String {
        let address = self
            .endpoint
            .url
            .as_deref()
            .unwrap_or_else(|| self.endpoint.protocol.default_address());

        if address.contains("://") {
            address.to_string()
        } else if self.endpoint.insecure {
            format!("http://{address}")
        } else {
            format!("https://{address}")
        }
    }

    /// Returns the endpoint URL for a specific signal type.
    #[must_use]
    pub fn signal_endpoint(&self, signal_path: &str) -> String {
        let base = self.effective_endpoint();
        let base = base.trim_end_matches('/');

        match self.endpoint.protocol {
            Protocol::Grpc => base.to_string(),
            Protocol::HttpBinary | Protocol::HttpJson => {
                format!("{base}{signal_path}")
            }
        }
    }

    /// Returns the instrumentation scope name used for tracers and meters.
    #[must_use]
    pub fn scope_name(&self) -> String {
        self.instrumentation_scope_name
            .clone()
            .unwrap_or_else(|| self.resource.service_name.clone())
    }
}

/// Collector endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// OTLP endpoint, either a full URL or a bare `host:port`.
    ///
    /// If not specified, uses the protocol's default:
    /// - gRPC: `localhost:4317`
    /// - HTTP: `localhost:4318`
    pub url: Option<String>,

    /// Export protocol.
    pub protocol: Protocol,

    /// Dial bare addresses without transport security.
    pub insecure: bool,

    /// Request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Headers (HTTP) or metadata (gRPC) sent with every export.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            protocol: Protocol::default(),
            insecure: true,
            timeout: Duration::from_secs(10),
            headers: HashMap::new(),
        }
    }
}

/// Resource configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Service name.
    pub service_name: String,

    /// Service version.
    pub service_version: Option<String>,

    /// Deployment environment (e.g., "production", "staging").
    pub deployment_environment: Option<String>,

    /// Additional resource attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Compute environment for automatic resource detection.
    #[serde(default)]
    pub compute_environment: ComputeEnvironment,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            service_name: "dice".to_string(),
            service_version: None,
            deployment_environment: None,
            attributes: HashMap::new(),
            compute_environment: ComputeEnvironment::default(),
        }
    }
}

/// Configuration for an individual signal type (traces, metrics, logs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Whether this signal is enabled.
    pub enabled: bool,

    /// Where the signal is exported.
    pub exporter: Exporter,

    /// Batch export configuration.
    pub batch: BatchConfig,
}

impl SignalConfig {
    /// Creates a default config with the signal enabled.
    #[must_use]
    pub fn default_enabled() -> Self {
        Self {
            enabled: true,
            exporter: Exporter::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// Batch exporter configuration.
///
/// For metrics only `scheduled_delay` is used, as the periodic reader interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum queue size.
    pub max_queue_size: usize,

    /// Maximum batch size for export.
    pub max_export_batch_size: usize,

    /// Scheduled delay between exports.
    #[serde(with = "humantime_serde")]
    pub scheduled_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            max_export_batch_size: 512,
            scheduled_delay: Duration::from_secs(5),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub listen_addr: SocketAddr,

    /// Upper bound on handling a single request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How long in-flight requests may drain after a shutdown signal.
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}
