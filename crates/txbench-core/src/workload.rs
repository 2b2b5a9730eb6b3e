//! Workload description: what each worker runs, how often, and with how many
//! workers.
//!
//! A workload is loaded from a YAML document:
//!
//! ```yaml
//! name: insert-users
//! count: 1000
//! threads: 8
//! transaction:
//!   queries:
//!     - INSERT INTO users VALUES ({{ random_number(1, 1000000) }}, '{{ random_string(12) }}')
//! ```
//!
//! The `begin`/`commit` statements and whether to wrap iterations in them are
//! supplied by the caller through [`TransactionSettings`].

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{BenchError, BenchResult};
use crate::template::{FunctionRegistry, Template};

/// Statements wrapped around every iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSettings {
    /// Statement issued before the iteration's queries (default: `BEGIN`).
    pub begin: String,

    /// Statement issued after the iteration's queries (default: `COMMIT`).
    pub commit: String,

    /// Whether to emit `begin`/`commit` at all (default: true).
    pub enabled: bool,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            begin: "BEGIN".to_string(),
            commit: "COMMIT".to_string(),
            enabled: true,
        }
    }
}

impl TransactionSettings {
    /// Settings that emit only the templated queries.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// On-disk workload document.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadDocument {
    pub name: String,
    pub count: usize,
    pub threads: usize,
    pub transaction: TransactionDocument,
}

/// `transaction` section of a workload document.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDocument {
    pub queries: Vec<String>,
}

/// Parsed benchmark definition.
#[derive(Debug, Clone)]
pub struct Workload {
    name: String,
    count: usize,
    threads: usize,
    queries: Vec<Template>,
    transaction: TransactionSettings,
    registry: FunctionRegistry,
}

impl Workload {
    /// Build a workload from its parts, using the built-in template functions.
    pub fn new(
        name: impl Into<String>,
        count: usize,
        threads: usize,
        queries: impl IntoIterator<Item = impl Into<String>>,
        transaction: TransactionSettings,
    ) -> BenchResult<Self> {
        let workload = Self {
            name: name.into(),
            count,
            threads,
            queries: queries.into_iter().map(Template::parse).collect(),
            transaction,
            registry: FunctionRegistry::with_builtins(),
        };
        workload.validate()?;
        Ok(workload)
    }

    /// Build a workload from a parsed document.
    pub fn from_document(
        document: WorkloadDocument,
        transaction: TransactionSettings,
    ) -> BenchResult<Self> {
        Self::new(
            document.name,
            document.count,
            document.threads,
            document.transaction.queries,
            transaction,
        )
    }

    /// Parse a workload from YAML text.
    pub fn from_yaml_str(yaml: &str, transaction: TransactionSettings) -> BenchResult<Self> {
        let document: WorkloadDocument = serde_yaml::from_str(yaml)
            .map_err(|e| BenchError::workload(format!("malformed workload document: {e}")))?;
        Self::from_document(document, transaction)
    }

    /// Load a workload from a YAML file.
    pub fn from_file(path: impl AsRef<Path>, transaction: TransactionSettings) -> BenchResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: WorkloadDocument =
            serde_yaml::from_str(&text).map_err(|source| BenchError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), name = %document.name, "loaded workload document");
        Self::from_document(document, transaction)
    }

    /// Replace the template functions, e.g. with built-ins plus overrides.
    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Validate field values.
    pub fn validate(&self) -> BenchResult<()> {
        if self.name.trim().is_empty() {
            return Err(BenchError::workload("name cannot be empty"));
        }
        if self.threads == 0 {
            return Err(BenchError::workload("threads must be >= 1"));
        }
        if self.queries.is_empty() {
            return Err(BenchError::workload(
                "transaction.queries must contain at least one query",
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterations per worker.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Override the worker count before execution.
    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads;
    }

    pub fn queries(&self) -> &[Template] {
        &self.queries
    }

    pub fn transaction(&self) -> &TransactionSettings {
        &self.transaction
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Render the queries of one iteration.
    ///
    /// Every template is evaluated again, so each call draws fresh random
    /// values. `begin`/`commit` are emitted verbatim when enabled.
    pub fn render_iteration(&self) -> BenchResult<Vec<String>> {
        let mut queries = Vec::with_capacity(self.queries.len() + 2);
        if self.transaction.enabled {
            queries.push(self.transaction.begin.clone());
        }
        for template in &self.queries {
            queries.push(template.render(&self.registry)?);
        }
        if self.transaction.enabled {
            queries.push(self.transaction.commit.clone());
        }
        Ok(queries)
    }

    /// Render `count` independent iterations.
    pub fn render_all(&self) -> BenchResult<Vec<Vec<String>>> {
        (0..self.count).map(|_| self.render_iteration()).collect()
    }

    /// Render `count` iterations and concatenate their queries.
    pub fn render_flat(&self) -> BenchResult<Vec<String>> {
        Ok(self.render_all()?.into_iter().flatten().collect())
    }
}
