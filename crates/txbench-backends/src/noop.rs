use std::thread;
use std::time::Duration;

use txbench_core::{Backend, BenchResult, Connection, Properties};

/// Accepts every statement without doing anything.
///
/// Reads `noop.latency_us` from the properties to simulate a fixed per-statement
/// latency, which makes it handy for measuring the harness overhead itself.
#[derive(Debug, Default)]
pub struct NoopBackend;

impl NoopBackend {
    pub const NAME: &'static str = "noop";

    /// Property holding the simulated latency in microseconds.
    pub const LATENCY_PROPERTY: &'static str = "noop.latency_us";
}

impl Backend for NoopBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn connect(&self, properties: &Properties) -> BenchResult<Box<dyn Connection>> {
        let latency = Duration::from_micros(properties.get_parsed_or(Self::LATENCY_PROPERTY, 0));
        Ok(Box::new(NoopConnection { latency }))
    }
}

struct NoopConnection {
    latency: Duration,
}

impl Connection for NoopConnection {
    fn execute(&mut self, _query: &str) -> BenchResult<()> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(())
    }
}
