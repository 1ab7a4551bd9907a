//! # Trellis Telemetry
//!
//! Structured logging for the Trellis dispatch layer.
//!
//! The router emits diagnostics through [`tracing`] at registration and
//! dispatch time. This crate wires those events to an output: call
//! [`init_logging`] once at process start with a [`LogConfig`], and every
//! `tracing::debug!` in the dispatch path becomes a structured log line.
//! Verbosity is a process-wide concern configured here, never consulted by
//! the dispatch core itself.

#![doc(html_root_url = "https://docs.rs/trellis-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogConfig};
