//! Instrumented HTTP server with bounded graceful shutdown.
//!
//! Every request gets one server span named `"{method} {route}"`, parented on
//! whatever remote context the bundle's propagator finds in the request
//! headers.

use crate::config::ServerConfig;
use crate::error::Error;
use crate::lifecycle::Telemetry;
use crate::rolldice::{self, DiceState};
use axum::Router;
use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response, StatusCode};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_http::HeaderExtractor;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Builds the dice router wrapped in request instrumentation.
pub fn router(telemetry: &Telemetry, config: &ServerConfig) -> Router {
    instrument(rolldice::routes(DiceState::new(telemetry)), telemetry, config)
}

/// Wraps `routes` in a per-request server span and the request timeout.
///
/// Requests that exceed `config.request_timeout` get `408 Request Timeout`.
pub fn instrument(routes: Router, telemetry: &Telemetry, config: &ServerConfig) -> Router {
    let propagator = telemetry.propagator();

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(move |request: &Request<Body>| {
            let method = request.method().as_str();
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str);
            let name = match route {
                Some(route) => format!("{method} {route}"),
                None => method.to_string(),
            };

            let span = tracing::info_span!(
                "request",
                otel.name = %name,
                otel.kind = "server",
                http.request.method = %method,
                http.route = route,
                url.path = %request.uri().path(),
                http.response.status_code = tracing::field::Empty,
                otel.status_code = tracing::field::Empty,
            );

            let parent = propagator.extract(&HeaderExtractor(request.headers()));
            if let Err(err) = span.set_parent(parent) {
                tracing::debug!(error = ?err, "Remote parent not attached to request span");
            }
            span
        })
        .on_response(|response: &Response<Body>, _latency: Duration, span: &Span| {
            let status = response.status();
            span.record("http.response.status_code", status.as_u16());
            if status.is_server_error() {
                span.record("otel.status_code", "ERROR");
            }
        });

    routes
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(trace_layer)
}

/// A bound listener waiting to serve.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    shutdown_grace: Duration,
}

impl Server {
    /// Binds the configured listen address.
    pub async fn bind(config: &ServerConfig) -> Result<Self, Error> {
        let addr = config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        Ok(Self {
            listener,
            shutdown_grace: config.shutdown_grace,
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.listener.local_addr().map_err(Error::Serve)
    }

    /// Serves `router` until the server fails or `shutdown` completes.
    ///
    /// After `shutdown` completes, in-flight requests get the grace period to
    /// finish; exceeding it yields [`Error::ShutdownTimeout`].
    pub async fn run<S>(self, router: Router, shutdown: S) -> Result<(), Error>
    where
        S: Future<Output = ()> + Send,
    {
        let Server {
            listener,
            shutdown_grace,
        } = self;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "Listening");
        }

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut serve = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::select! {
            result = &mut serve => return serve_outcome(result),
            () = shutdown => {
                tracing::info!(grace = ?shutdown_grace, "Shutdown requested, draining connections");
            }
        }

        let _ = stop_tx.send(());

        match tokio::time::timeout(shutdown_grace, &mut serve).await {
            Ok(result) => serve_outcome(result),
            Err(_) => {
                serve.abort();
                Err(Error::ShutdownTimeout(shutdown_grace))
            }
        }
    }
}

fn serve_outcome(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), Error> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(Error::Serve(err)),
        Err(join) => Err(Error::Serve(std::io::Error::other(join))),
    }
}

/// Registered handlers for the signals that start a graceful shutdown.
///
/// Handlers are registered by [`install`](Self::install). A signal that
/// arrives between installation and [`recv`](Self::recv) is not lost and
/// does not terminate the process.
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    /// Registers handlers for Ctrl-C and, on Unix, SIGTERM.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> Result<Self, Error> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let interrupt = signal(SignalKind::interrupt()).map_err(Error::SignalHandler)?;
            let terminate = signal(SignalKind::terminate()).map_err(Error::SignalHandler)?;
            Ok(Self {
                interrupt,
                terminate,
            })
        }

        #[cfg(not(unix))]
        Ok(Self {})
    }

    /// Completes on the first signal.
    ///
    /// Later signals are not observed; there is no forced exit path.
    #[cfg_attr(not(unix), allow(unused_mut))]
    pub async fn recv(mut self) {
        #[cfg(unix)]
        tokio::select! {
            _ = self.interrupt.recv() => tracing::info!("Received Ctrl-C"),
            _ = self.terminate.recv() => tracing::info!("Received SIGTERM"),
        }

        #[cfg(not(unix))]
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl-C"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Completes on the first Ctrl-C, or SIGTERM on Unix.
///
/// Handlers are registered on first poll. Use [`ShutdownSignal::install`] to
/// register them earlier.
pub async fn shutdown_signal() {
    match ShutdownSignal::install() {
        Ok(signal) => signal.recv().await,
        Err(e) => {
            tracing::error!(error = %e.report(), "Shutdown signals will not be observed");
            std::future::pending::<()>().await;
        }
    }
}
