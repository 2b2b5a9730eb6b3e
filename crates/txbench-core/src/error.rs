use std::path::PathBuf;

use thiserror::Error;

/// Canonical error type for benchmark setup and execution.
///
/// Variants split into two classes. Configuration errors (see
/// [`BenchError::is_configuration`]) abort a run before any worker starts.
/// Connection and execution errors are produced by backends and are
/// contained by the executor, surfacing only as error samples.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A template called a function that is not in the registry.
    #[error("unknown template function `{name}`")]
    UnknownFunction {
        /// Name used in the template.
        name: String,
    },

    /// A template function rejected its arguments.
    #[error("invalid arguments for `{function}`: {message}")]
    InvalidArguments {
        /// Function that rejected the call.
        function: String,
        /// Human-readable reason.
        message: String,
    },

    /// Workload description is missing fields or holds invalid values.
    #[error("invalid workload: {0}")]
    Workload(String),

    /// Reading a configuration file failed.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Workload document is not valid YAML or does not match the schema.
    #[error("failed to parse workload {path:?}: {source}")]
    Yaml {
        /// Workload file being parsed.
        path: PathBuf,
        /// Parser diagnostic, including the failing location.
        source: serde_yaml::Error,
    },

    /// No backend is registered under the requested name.
    #[error("unknown backend `{name}` (known: {known})")]
    UnknownBackend {
        /// Requested backend name.
        name: String,
        /// Comma separated list of registered names.
        known: String,
    },

    /// Some workers never reached the start gate within the bounded wait.
    #[error("workers {missing:?} did not reach the start gate in time")]
    StartTimeout {
        /// Indices of the workers that never signalled readiness.
        missing: Vec<usize>,
    },

    /// A worker thread panicked during the run.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker whose thread panicked.
        worker: usize,
    },

    /// Backend connection could not be established.
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend rejected a statement.
    #[error("execution error: {0}")]
    Execution(String),

    /// Unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BenchError {
    /// Creates an `UnknownFunction` variant.
    #[must_use]
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    /// Creates an `InvalidArguments` variant.
    #[must_use]
    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Creates a `Workload` variant.
    #[must_use]
    pub fn workload(message: impl Into<String>) -> Self {
        Self::Workload(message.into())
    }

    /// Creates a `Connection` variant.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates an `Execution` variant.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Creates an `Internal` variant.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error belongs to the fatal configuration class.
    ///
    /// Connection and execution errors are recovered inside the executor;
    /// everything else terminates the run.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Connection(_) | Self::Execution(_))
    }
}

/// Convenient result alias for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(BenchError::unknown_function("nope").is_configuration());
        assert!(BenchError::workload("threads must be >= 1").is_configuration());
        assert!(!BenchError::connection("refused").is_configuration());
        assert!(!BenchError::execution("syntax error").is_configuration());
    }

    #[test]
    fn test_error_messages() {
        let err = BenchError::invalid_arguments("random_string", "length must be >= 0");
        assert_eq!(
            err.to_string(),
            "invalid arguments for `random_string`: length must be >= 0"
        );

        let err = BenchError::StartTimeout {
            missing: vec![1, 3],
        };
        assert_eq!(
            err.to_string(),
            "workers [1, 3] did not reach the start gate in time"
        );
    }

    #[test]
    fn test_io_and_worker_messages() {
        let err = BenchError::Io {
            path: PathBuf::from("/etc/txbench/db.properties"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read \"/etc/txbench/db.properties\": no such file"
        );
        assert!(err.is_configuration());

        let err = BenchError::WorkerPanicked { worker: 2 };
        assert_eq!(err.to_string(), "worker 2 panicked");
        assert!(err.is_configuration());
    }
}
