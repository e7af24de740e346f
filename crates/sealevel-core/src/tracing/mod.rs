//! Observability: `tracing` with an `EnvFilter` read from `SEALEVEL_LOG`.

pub mod setup;

pub use setup::{init_tracing, init_tracing_with, DEFAULT_DIRECTIVES, LOG_ENV};
