//! Prints the configuration the `dice` binary would run with.
//!
//! Sources are merged with clear precedence:
//! defaults → `dice.toml` → `DICE_*` variables → `OTEL_*` variables →
//! programmatic overrides.
//!
//! Run with:
//! `DICE_SERVER__LISTEN_ADDR=127.0.0.1:9000 OTEL_SERVICE_NAME=env-dice cargo run --example configuration_layers`

use otel_dice::{Error, TelemetryBuilder};

fn main() -> Result<(), Error> {
    let builder = TelemetryBuilder::new()
        .with_file("dice.toml")
        .with_env("DICE_")
        .with_standard_env()
        .resource(|r| {
            r.service_version(env!("CARGO_PKG_VERSION"))
                .attribute("custom.team", "platform")
        });

    let config = builder.extract_config()?;

    println!("Listen address:   {}", config.server.listen_addr);
    println!("Shutdown grace:   {:?}", config.server.shutdown_grace);
    println!("Request timeout:  {:?}", config.server.request_timeout);
    println!("Protocol:         {:?}", config.endpoint.protocol);
    println!("Endpoint:         {}", config.effective_endpoint());
    println!("Traces endpoint:  {}", config.signal_endpoint("/v1/traces"));
    println!("Service name:     {}", config.resource.service_name);
    println!("Scope name:       {}", config.scope_name());
    println!("Traces enabled:   {}", config.traces.enabled);
    println!("Traces exporter:  {:?}", config.traces.exporter);
    println!("Metrics enabled:  {}", config.metrics.enabled);
    println!("Metrics interval: {:?}", config.metrics.batch.scheduled_delay);
    println!("Logs enabled:     {}", config.logs.enabled);

    Ok(())
}
