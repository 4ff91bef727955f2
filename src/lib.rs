//! Dice-rolling HTTP service instrumented with OpenTelemetry.
//!
//! [`Telemetry`] owns the propagator and the tracer, meter and logger
//! providers, built in that order and torn down in the same order. A failure
//! part way through setup tears down whatever was already built. The bundle
//! is handed explicitly to the HTTP [`server`], which instruments every
//! request and serves `GET /rolldice/{player}`.
//!
//! # Example
//!
//! ```no_run
//! use otel_dice::{Error, Server, TelemetryBuilder, server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let builder = TelemetryBuilder::new().with_standard_env();
//!     let config = builder.extract_config()?;
//!     let mut telemetry = builder.build()?;
//!
//!     let served = match Server::bind(&config.server).await {
//!         Ok(srv) => {
//!             let router = server::router(&telemetry, &config.server);
//!             srv.run(router, server::shutdown_signal()).await
//!         }
//!         Err(err) => Err(err),
//!     };
//!     let teardown = tokio::task::block_in_place(|| telemetry.shutdown());
//!     otel_dice::error::join_results(served, teardown)
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
pub mod error;
mod lifecycle;
mod resource;
pub mod rolldice;
pub mod server;
mod subscriber;

pub use builder::{ResourceConfigBuilder, ResourceOverrides, TelemetryBuilder};
pub use config::{
    BatchConfig, ComputeEnvironment, DiceConfig, EndpointConfig, Exporter, Protocol,
    ResourceConfig, ServerConfig, SignalConfig,
};
pub use error::Error;
pub use lifecycle::{ProviderFactory, SdkProviders, ShutdownRegistry, Signal, Telemetry};
pub use resource::{RustRuntimeDetector, build_resource};
pub use server::{Server, ShutdownSignal};

/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry;
/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry_sdk;
/// Re-exported for version compatibility with this crate's dependencies.
pub use tracing;

/// Re-exported for users who want to construct custom configuration providers.
pub use figment;
