//! Sends a short burst of traces, metrics and logs to a local collector.
//!
//! Start the pipeline in `deploy/` first, then run:
//! `cargo run --example collector_workload`
//!
//! Spans show up in Jaeger, the `run` counter in Prometheus.

use otel_dice::opentelemetry::KeyValue;
use otel_dice::{Error, Protocol, TelemetryBuilder};
use std::time::Duration;

const ITERATIONS: u32 = 10;

fn main() -> Result<(), Error> {
    let mut telemetry = TelemetryBuilder::new()
        .with_standard_env()
        .endpoint("localhost:4318")
        .protocol(Protocol::HttpBinary)
        .service_name("collector-workload")
        .build()?;

    let common_attrs = [
        KeyValue::new("attrA", "chocolate"),
        KeyValue::new("attrB", "raspberry"),
        KeyValue::new("attrC", "vanilla"),
    ];

    let runs = telemetry
        .meter("collector-workload")
        .u64_counter("run")
        .with_description("The number of times the iteration ran")
        .build();

    {
        let parent = tracing::info_span!(
            "CollectorExporter-Example",
            attrA = "chocolate",
            attrB = "raspberry",
            attrC = "vanilla",
        );
        let _parent = parent.enter();

        for i in 0..ITERATIONS {
            let sample = tracing::info_span!("sample", otel.name = %format!("Sample-{i}"));
            let _sample = sample.enter();

            runs.add(1, &common_attrs);
            tracing::info!("Doing really hard work ({} / {ITERATIONS})", i + 1);

            std::thread::sleep(Duration::from_secs(1));
        }
    }

    tracing::info!("Done!");

    telemetry.shutdown()
}
