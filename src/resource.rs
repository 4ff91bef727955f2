//! Resource descriptor construction.
//!
//! The resource is built once per process from [`ResourceConfig`] and shared
//! by every provider. Depending on [`ComputeEnvironment`], host, OS, process,
//! Rust runtime and Kubernetes detectors contribute attributes before the
//! explicitly configured ones are applied.

use crate::config::{ComputeEnvironment, ResourceConfig};
use opentelemetry::KeyValue;
use opentelemetry_resource_detectors::{
    HostResourceDetector, K8sResourceDetector, OsResourceDetector, ProcessResourceDetector,
};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::resource::{ResourceBuilder, ResourceDetector};
use opentelemetry_semantic_conventions::resource::{
    DEPLOYMENT_ENVIRONMENT_NAME, PROCESS_RUNTIME_NAME, SERVICE_NAME, SERVICE_VERSION,
};

/// Builds the resource descriptor for this process.
pub fn build_resource(config: &ResourceConfig) -> Resource {
    let mut builder = Resource::builder();

    match config.compute_environment {
        ComputeEnvironment::Auto => {
            builder = with_generic_detectors(builder);
            if std::env::var("KUBERNETES_SERVICE_HOST").is_ok() {
                builder = builder.with_detector(Box::new(K8sResourceDetector));
            }
        }
        ComputeEnvironment::Kubernetes => {
            builder = with_generic_detectors(builder).with_detector(Box::new(K8sResourceDetector));
        }
        ComputeEnvironment::None => {}
    }

    let mut attributes: Vec<KeyValue> = config
        .attributes
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect();

    attributes.push(KeyValue::new(SERVICE_NAME, config.service_name.clone()));

    if let Some(version) = &config.service_version {
        attributes.push(KeyValue::new(SERVICE_VERSION, version.clone()));
    }

    if let Some(env) = &config.deployment_environment {
        attributes.push(KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, env.clone()));
    }

    builder.with_attributes(attributes).build()
}

fn with_generic_detectors(builder: ResourceBuilder) -> ResourceBuilder {
    builder
        .with_detector(Box::new(HostResourceDetector::default()))
        .with_detector(Box::new(OsResourceDetector))
        .with_detector(Box::new(ProcessResourceDetector))
        .with_detector(Box::new(RustRuntimeDetector))
}

/// Detects attributes of the Rust runtime the binary was built for.
///
/// - `process.runtime.name` = "rust"
/// - `rust.target_os`, `rust.target_arch`
/// - `rust.debug` (true for debug builds)
pub struct RustRuntimeDetector;

impl ResourceDetector for RustRuntimeDetector {
    fn detect(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes([
                KeyValue::new(PROCESS_RUNTIME_NAME, "rust"),
                KeyValue::new("rust.target_os", std::env::consts::OS),
                KeyValue::new("rust.target_arch", std::env::consts::ARCH),
                KeyValue::new("rust.debug", cfg!(debug_assertions)),
            ])
            .build()
    }
}
