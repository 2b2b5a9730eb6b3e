//! Core of the txbench transaction benchmarking harness: query templates,
//! workload descriptions, the synchronized executor and latency statistics.

pub mod backend;
pub mod error;
pub mod executor;
pub mod gate;
pub mod properties;
pub mod statistics;
pub mod template;
pub mod workload;

pub use backend::{Backend, Connection, FnBackend};
pub use error::{BenchError, BenchResult};
pub use executor::{Executor, ExecutorOptions};
pub use gate::{StartGate, Ticket};
pub use properties::Properties;
pub use statistics::{Category, ReportFormat, Statistics, Summary, WorkerSamples};
pub use template::{Evaluator, Expression, Fragment, FunctionRegistry, Template, Value};
pub use workload::{TransactionSettings, Workload, WorkloadDocument};
