//! Backend adapters for txbench.
//!
//! Every adapter implements [`txbench_core::Backend`] and is looked up by
//! name through a [`BackendRegistry`]. `stdout` and `noop` are always
//! available. SQL adapters are compiled in with the `sqlite`, `mysql` and
//! `postgresql` features.

mod noop;
mod registry;
#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgresql"))]
mod sql;
mod stdout;

pub use noop::NoopBackend;
pub use registry::BackendRegistry;
#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgresql"))]
pub use sql::{SqlBackend, SqlDialect};
pub use stdout::StdoutBackend;
