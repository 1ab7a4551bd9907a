//! # Trellis Core
//!
//! Core types for the Trellis request-dispatch layer.
//!
//! This crate provides the foundational pieces shared by the router and by
//! caller-supplied request processing code:
//!
//! - [`Handler`] - The terminal request-processing interface
//! - [`Middleware`] - A composable wrapper turning one handler into another
//! - [`ResponseWriter`] - The outbound response interface handlers write to
//! - [`Takeover`] / [`Flusher`] / [`Pusher`] - Optional response-stream
//!   capabilities an implementation may or may not provide
//! - [`ResponseRecorder`] - An in-memory writer for tests
//!
//! Handlers and middleware are plain function values: any
//! `Fn(&mut dyn ResponseWriter, &Request)` is a handler, and any
//! `Fn(DynHandler) -> DynHandler` is a middleware. Composition happens by
//! nesting, never through a runtime pipeline.

#![doc(html_root_url = "https://docs.rs/trellis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod handler;
mod recorder;
mod types;
mod writer;

pub use handler::{handler_fn, middleware_fn, DynHandler, DynMiddleware, Handler, Middleware};
pub use recorder::ResponseRecorder;
pub use types::Request;
pub use writer::{
    flush, push, take_over, CapabilityError, Flusher, Pusher, ResponseWriter, TakenStream,
    Takeover,
};
