use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use txbench_core::{Backend, BenchError, BenchResult};

use crate::noop::NoopBackend;
#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgresql"))]
use crate::sql::{SqlBackend, SqlDialect};
use crate::stdout::StdoutBackend;

/// Backends selectable by name.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend compiled into this build.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(StdoutBackend::new()));
        registry.register(Arc::new(NoopBackend));

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(SqlBackend::new(SqlDialect::Sqlite)));
        #[cfg(feature = "mysql")]
        registry.register(Arc::new(SqlBackend::new(SqlDialect::MySql)));
        #[cfg(feature = "postgresql")]
        {
            let postgres: Arc<dyn Backend> =
                Arc::new(SqlBackend::new(SqlDialect::Postgres));
            registry.register_as("postgres", Arc::clone(&postgres));
            registry.register(postgres);
        }

        registry
    }

    /// Register `backend` under its own name, replacing any previous entry.
    pub fn register(&mut self, backend: Arc<dyn Backend>) -> &mut Self {
        let name = backend.name().to_owned();
        self.register_as(name, backend)
    }

    /// Register `backend` under `name`, e.g. as an alias.
    pub fn register_as(
        &mut self,
        name: impl Into<String>,
        backend: Arc<dyn Backend>,
    ) -> &mut Self {
        self.backends.insert(name.into(), backend);
        self
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> BenchResult<Arc<dyn Backend>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| BenchError::UnknownBackend {
                name: name.to_owned(),
                known: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txbench_core::{Connection, FnBackend, Properties};

    #[test]
    fn test_defaults_include_builtin_backends() {
        let registry = BackendRegistry::with_defaults();
        assert!(registry.contains("stdout"));
        assert!(registry.contains("noop"));
        assert_eq!(registry.get("noop").unwrap().name(), "noop");
    }

    #[test]
    fn test_unknown_backend_lists_known_names() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(NoopBackend));
        let err = registry.get("oracle").err().unwrap();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "unknown backend `oracle` (known: noop)");
    }

    #[test]
    fn test_register_replaces_and_aliases() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(FnBackend::new("custom", |_: &Properties| {
            Ok(Box::new(NoopConn) as Box<dyn Connection>)
        })));
        let custom = registry.get("custom").unwrap();
        registry.register_as("alias", custom);

        assert_eq!(registry.names(), vec!["alias", "custom"]);
        assert_eq!(registry.get("alias").unwrap().name(), "custom");
    }

    struct NoopConn;

    impl Connection for NoopConn {
        fn execute(&mut self, _query: &str) -> BenchResult<()> {
            Ok(())
        }
    }
}
