use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use txbench_core::{Backend, BenchError, BenchResult, Connection, Properties};

type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Prints every statement on its own line instead of executing it.
///
/// Useful for checking what a workload renders to. All connections share one
/// writer, so lines from different workers never interleave mid-statement.
pub struct StdoutBackend {
    out: SharedWriter,
}

impl StdoutBackend {
    pub const NAME: &'static str = "stdout";

    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Print to `writer` instead of standard output.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(writer)),
        }
    }
}

impl Default for StdoutBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for StdoutBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn connect(&self, _properties: &Properties) -> BenchResult<Box<dyn Connection>> {
        Ok(Box::new(StdoutConnection {
            out: Arc::clone(&self.out),
        }))
    }
}

struct StdoutConnection {
    out: SharedWriter,
}

impl Connection for StdoutConnection {
    fn execute(&mut self, query: &str) -> BenchResult<()> {
        let mut out = self.out.lock();
        writeln!(out, "{query}").map_err(|e| BenchError::execution(e.to_string()))
    }
}
