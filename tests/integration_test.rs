//! End-to-end test: serve a roll and check the spans reach an OTLP collector.
//!
//! The tracing subscriber can only be initialised once per process, so this
//! file holds a single test.

use mock_collector::{MockServer, Protocol as MockProtocol};
use otel_dice::server::{self, Server};
use otel_dice::{Error, Protocol, ServerConfig, TelemetryBuilder};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test(flavor = "multi_thread")]
async fn served_roll_is_exported_to_otlp_collector() -> Result<(), Error> {
    let collector = MockServer::builder()
        .protocol(MockProtocol::HttpBinary)
        .start()
        .await
        .expect("Failed to start mock collector");

    let endpoint = format!("http://{}", collector.addr());

    let mut telemetry = TelemetryBuilder::new()
        .service_name("dice-integration-test")
        .endpoint(&endpoint)
        .protocol(Protocol::HttpBinary)
        .build()?;

    let config = ServerConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        shutdown_grace: Duration::from_secs(2),
        ..ServerConfig::default()
    };
    let srv = Server::bind(&config).await?;
    let addr = srv.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(srv.run(server::router(&telemetry, &config), async move {
        let _ = stop_rx.await;
    }));

    let body = reqwest::get(format!("http://{addr}/rolldice/alice"))
        .await
        .expect("request succeeds")
        .text()
        .await
        .expect("body is text");
    assert!(body.ends_with('\n'), "unexpected body: {body:?}");

    let _ = stop_tx.send(());
    running.await.expect("server task completes")?;

    // Flush without starving the runtime.
    tokio::task::block_in_place(|| telemetry.flush())?;

    // One server span for the request and one internal `roll` span.
    collector
        .wait_for_spans(2, Duration::from_secs(5))
        .await
        .expect("Should receive all spans");

    collector
        .with_collector(|c| {
            c.expect_span_with_name("GET /rolldice/{player}")
                .assert_exists();
            c.expect_span_with_name("roll").assert_exists();
        })
        .await;

    tokio::task::block_in_place(|| telemetry.shutdown())?;
    assert!(telemetry.is_shut_down());

    Ok(())
}
