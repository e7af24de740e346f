//! Core types, errors, configuration, events, and tracing for the sea level
//! indicators pipeline.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod types;
