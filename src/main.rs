//! `dice` binary: serves `/rolldice` until interrupted, exporting traces,
//! metrics and logs over OTLP.
//!
//! Configuration is read from `dice.toml` in the working directory (if
//! present), `DICE_`-prefixed environment variables and the standard
//! `OTEL_*` variables.

use otel_dice::error::join_results;
use otel_dice::server::{self, Server, ShutdownSignal};
use otel_dice::{Error, ServerConfig, Telemetry, TelemetryBuilder};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dice: {}", err.report());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<(), Error> {
    // Registered before setup so an early Ctrl-C still drains and tears down.
    let signal = ShutdownSignal::install()?;

    let config = TelemetryBuilder::new()
        .service_version(env!("CARGO_PKG_VERSION"))
        .with_file("dice.toml")
        .with_env("DICE_")
        .with_standard_env()
        .extract_config()?;

    let mut telemetry = Telemetry::init(&config)?;
    tracing::info!(
        telemetry = ?telemetry,
        resource = ?telemetry.resource(),
        "Telemetry initialised"
    );

    let served = serve(&telemetry, &config.server, signal).await;
    if let Err(err) = &served {
        tracing::error!(error = %err, "Server stopped with an error");
    }

    let teardown = tokio::task::block_in_place(|| telemetry.shutdown());
    join_results(served, teardown)
}

async fn serve(
    telemetry: &Telemetry,
    config: &ServerConfig,
    signal: ShutdownSignal,
) -> Result<(), Error> {
    let server = Server::bind(config).await?;
    server
        .run(server::router(telemetry, config), signal.recv())
        .await
}
