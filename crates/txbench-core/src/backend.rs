//! Backend capability consumed by the executor.
//!
//! A [`Backend`] is a connection factory selected by name at startup. Each
//! worker asks it for one [`Connection`] and drives every statement of its
//! run through that connection. Dropping the connection releases it.

use std::fmt;

use crate::error::BenchResult;
use crate::properties::Properties;

/// A live connection owned by exactly one worker.
pub trait Connection: Send {
    /// Execute one opaque statement.
    ///
    /// Any error aborts the rest of the current iteration only.
    fn execute(&mut self, query: &str) -> BenchResult<()>;
}

/// Factory for [`Connection`]s.
pub trait Backend: Send + Sync {
    /// Registered name of this backend, e.g. `stdout` or `postgresql`.
    fn name(&self) -> &str;

    /// Open a new connection using `properties`.
    ///
    /// Called once per worker, concurrently from every worker thread.
    fn connect(&self, properties: &Properties) -> BenchResult<Box<dyn Connection>>;
}

impl fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").field("name", &self.name()).finish()
    }
}

/// Backend built from a closure, mostly useful for tests and embedding.
pub struct FnBackend<F> {
    name: String,
    connect: F,
}

impl<F> FnBackend<F>
where
    F: Fn(&Properties) -> BenchResult<Box<dyn Connection>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, connect: F) -> Self {
        Self {
            name: name.into(),
            connect,
        }
    }
}

impl<F> Backend for FnBackend<F>
where
    F: Fn(&Properties) -> BenchResult<Box<dyn Connection>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self, properties: &Properties) -> BenchResult<Box<dyn Connection>> {
        (self.connect)(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;

    struct Recording(Vec<String>);

    impl Connection for Recording {
        fn execute(&mut self, query: &str) -> BenchResult<()> {
            if query.is_empty() {
                return Err(BenchError::execution("empty statement"));
            }
            self.0.push(query.to_owned());
            Ok(())
        }
    }

    #[test]
    fn test_fn_backend_connects() {
        let backend = FnBackend::new("recording", |props: &Properties| {
            if props.get("fail").is_some() {
                return Err(BenchError::connection("refused"));
            }
            Ok(Box::new(Recording(Vec::new())) as Box<dyn Connection>)
        });

        assert_eq!(backend.name(), "recording");
        let mut conn = backend.connect(&Properties::new()).unwrap();
        conn.execute("SELECT 1").unwrap();
        assert!(conn.execute("").is_err());

        let refused = backend.connect(&Properties::new().with("fail", "1"));
        assert!(matches!(refused, Err(BenchError::Connection(_))));
    }
}
