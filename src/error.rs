//! Error types for telemetry setup, teardown and serving.
//!
//! Failures are never dropped: cleanup triggered by a failure is combined
//! with the failure itself through [`Error::join`], and a joined error keeps
//! every underlying failure reachable through [`Error::iter`].

use crate::lifecycle::Signal;
use figment::Error as FigmentError;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Errors from telemetry setup, provider teardown and the HTTP server.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to extract configuration from sources.
    #[error("configuration error: {0}")]
    Config(#[source] Box<FigmentError>),

    /// Invalid endpoint URL format.
    #[error("invalid endpoint URL: {url} (scheme must be http:// or https://)")]
    InvalidEndpoint {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Failed to create trace exporter.
    #[error("failed to create trace exporter")]
    TraceExporter(#[source] opentelemetry_otlp::ExporterBuildError),

    /// Failed to create metric exporter.
    #[error("failed to create metric exporter")]
    MetricExporter(#[source] opentelemetry_otlp::ExporterBuildError),

    /// Failed to create log exporter.
    #[error("failed to create log exporter")]
    LogExporter(#[source] opentelemetry_otlp::ExporterBuildError),

    /// Failed to initialise tracing subscriber.
    #[error("failed to initialise tracing subscriber")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),

    /// Failed to flush a provider.
    #[error("failed to flush {signal} provider")]
    Flush {
        /// Provider kind that failed.
        signal: Signal,
        /// Underlying SDK error.
        #[source]
        source: opentelemetry_sdk::error::OTelSdkError,
    },

    /// Failed to shut down a provider.
    #[error("failed to shut down {signal} provider")]
    Shutdown {
        /// Provider kind that failed.
        signal: Signal,
        /// Underlying SDK error.
        #[source]
        source: opentelemetry_sdk::error::OTelSdkError,
    },

    /// Failed to bind the HTTP listener.
    #[error("failed to bind HTTP listener on {addr}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to register the shutdown signal handlers.
    #[error("failed to install shutdown signal handler")]
    SignalHandler(#[source] std::io::Error),

    /// The HTTP server stopped with an error.
    #[error("HTTP server failed")]
    Serve(#[source] std::io::Error),

    /// The HTTP server did not drain within the grace period.
    #[error("HTTP server did not shut down within {0:?}")]
    ShutdownTimeout(Duration),

    /// Several independent failures.
    #[error("{}", DisplayJoined(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    /// Joins two optional errors, keeping both when both are present.
    ///
    /// Nested [`Error::Multiple`] values are flattened so the result lists
    /// every leaf failure in order: `first`'s failures, then `second`'s.
    pub fn join(first: Option<Error>, second: Option<Error>) -> Option<Error> {
        match (first, second) {
            (None, None) => None,
            (Some(e), None) | (None, Some(e)) => Some(e),
            (Some(a), Some(b)) => {
                let mut errors = a.into_leaves();
                errors.extend(b.into_leaves());
                Some(Error::Multiple(errors))
            }
        }
    }

    /// Joins a list of errors. An empty list yields `None`, a single error
    /// is returned as-is.
    pub fn join_all(errors: impl IntoIterator<Item = Error>) -> Option<Error> {
        errors
            .into_iter()
            .fold(None, |acc, err| Error::join(acc, Some(err)))
    }

    /// Combines this error with the outcome of the cleanup it triggered.
    pub fn with_cleanup(self, cleanup: Result<(), Error>) -> Error {
        match cleanup {
            Ok(()) => self,
            Err(cleanup) => {
                let mut errors = self.into_leaves();
                errors.extend(cleanup.into_leaves());
                Error::Multiple(errors)
            }
        }
    }

    /// Formats the error together with the chain of causes behind it.
    ///
    /// Joined errors list each failure with its own causes, separated by
    /// `"; "`.
    pub fn report(&self) -> impl fmt::Display + '_ {
        DisplayJoined(std::slice::from_ref(self))
    }

    /// Iterates over every underlying failure.
    ///
    /// A non-joined error yields itself.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Error> + '_> {
        match self {
            Error::Multiple(errors) => Box::new(errors.iter().flat_map(Error::iter)),
            other => Box::new(std::iter::once(other)),
        }
    }

    fn into_leaves(self) -> Vec<Error> {
        match self {
            Error::Multiple(errors) => errors.into_iter().flat_map(Error::into_leaves).collect(),
            other => vec![other],
        }
    }
}

/// Converts a pair of results into one, joining both failures.
pub fn join_results(first: Result<(), Error>, second: Result<(), Error>) -> Result<(), Error> {
    match Error::join(first.err(), second.err()) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct DisplayJoined<'a>(&'a [Error]);

impl fmt::Display for DisplayJoined<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
            let mut source = std::error::Error::source(err);
            while let Some(inner) = source {
                write!(f, ": {inner}")?;
                source = inner.source();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::error::OTelSdkError;

    fn shutdown_error(signal: Signal, reason: &str) -> Error {
        Error::Shutdown {
            signal,
            source: OTelSdkError::InternalFailure(reason.to_string()),
        }
    }

    #[test]
    fn join_of_nothing_is_nothing() {
        assert!(Error::join(None, None).is_none());
        assert!(Error::join_all(Vec::new()).is_none());
    }

    #[test]
    fn join_with_one_side_returns_it_unwrapped() {
        let joined = Error::join(Some(Error::ShutdownTimeout(Duration::from_secs(1))), None);
        assert!(matches!(joined, Some(Error::ShutdownTimeout(_))));

        let joined = Error::join(None, Some(Error::ShutdownTimeout(Duration::from_secs(1))));
        assert!(matches!(joined, Some(Error::ShutdownTimeout(_))));
    }

    #[test]
    fn join_keeps_both_failures_in_order() {
        let joined = Error::join(
            Some(shutdown_error(Signal::Traces, "first")),
            Some(shutdown_error(Signal::Metrics, "second")),
        )
        .unwrap();

        let signals: Vec<_> = joined
            .iter()
            .map(|e| match e {
                Error::Shutdown { signal, .. } => *signal,
                other => panic!("unexpected error: {other:?}"),
            })
            .collect();
        assert_eq!(signals, vec![Signal::Traces, Signal::Metrics]);
    }

    #[test]
    fn nested_joins_are_flattened() {
        let inner = Error::join_all([
            shutdown_error(Signal::Traces, "a"),
            shutdown_error(Signal::Metrics, "b"),
        ]);
        let joined = Error::join(inner, Some(shutdown_error(Signal::Logs, "c"))).unwrap();

        match &joined {
            Error::Multiple(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected joined error, got {other:?}"),
        }
        assert_eq!(joined.iter().count(), 3);
    }

    #[test]
    fn joined_display_mentions_every_failure() {
        let joined = Error::join_all([
            shutdown_error(Signal::Traces, "exporter hung"),
            shutdown_error(Signal::Logs, "channel closed"),
        ])
        .unwrap();

        let message = joined.to_string();
        assert!(message.contains("traces"), "{message}");
        assert!(message.contains("exporter hung"), "{message}");
        assert!(message.contains("logs"), "{message}");
        assert!(message.contains("channel closed"), "{message}");
    }

    #[test]
    fn with_cleanup_keeps_triggering_error_first() {
        let err = Error::ShutdownTimeout(Duration::from_secs(3))
            .with_cleanup(Err(shutdown_error(Signal::Traces, "flush")));

        let mut leaves = err.iter();
        assert!(matches!(leaves.next(), Some(Error::ShutdownTimeout(_))));
        assert!(matches!(
            leaves.next(),
            Some(Error::Shutdown { signal: Signal::Traces, .. })
        ));
        assert!(leaves.next().is_none());
    }

    #[test]
    fn report_includes_the_cause_of_a_single_error() {
        let err = Error::Bind {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };

        assert_eq!(
            err.report().to_string(),
            "failed to bind HTTP listener on 0.0.0.0:8080: address in use"
        );
    }

    #[test]
    fn report_of_a_joined_error_matches_its_display() {
        let joined = Error::join_all([
            shutdown_error(Signal::Traces, "exporter hung"),
            shutdown_error(Signal::Logs, "channel closed"),
        ])
        .unwrap();

        assert_eq!(joined.report().to_string(), joined.to_string());
    }

    #[test]
    fn with_successful_cleanup_is_unchanged() {
        let err = Error::ShutdownTimeout(Duration::from_secs(3)).with_cleanup(Ok(()));
        assert!(matches!(err, Error::ShutdownTimeout(_)));
    }

    #[test]
    fn join_results_prefers_ok_when_both_succeed() {
        assert!(join_results(Ok(()), Ok(())).is_ok());
        let err = join_results(Err(Error::ShutdownTimeout(Duration::ZERO)), Ok(())).unwrap_err();
        assert!(matches!(err, Error::ShutdownTimeout(_)));
    }
}
