//! # Trellis
//!
//! **A request-dispatch composition layer for Rust servers**
//!
//! Trellis sits on top of a path-pattern matcher and gives callers a tree
//! of routers with a precise, testable middleware ordering contract:
//!
//! - **Ordered middleware** - chains compose at registration time; later
//!   additions never retroactively reach existing routes
//! - **Tree composition** - mount independent sub-trees under a prefix, or
//!   group routes sharing a matching space with isolated middleware
//! - **Safe redirects** - the automatic trailing-slash `301` is downgraded
//!   to a method-preserving `307`, so a redirected `POST` stays a `POST`
//! - **Not-found precedence** - a custom not-found handler answers
//!   unmatched requests before the global wrapper ever runs
//!
//! ## Quick Start
//!
//! ```rust
//! use http::StatusCode;
//! use trellis::prelude::*;
//!
//! let mut router = Router::new();
//! router.route(
//!     "/api",
//!     |api| {
//!         api.get(
//!             "/users/{id}",
//!             |w: &mut dyn ResponseWriter, _req: &Request| {
//!                 w.write_head(StatusCode::OK);
//!                 w.write(b"user");
//!             },
//!             &[],
//!         );
//!     },
//!     &[],
//! );
//! ```
//!
//! The transport is an external collaborator: it accepts connections,
//! buffers request bodies, and invokes
//! [`Router::dispatch`](trellis_router::Router::dispatch) once per request
//! on its own thread or task.

#![doc(html_root_url = "https://docs.rs/trellis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use trellis_core as core;

// Re-export router types
pub use trellis_router as router;

// Re-export telemetry types
pub use trellis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use trellis_core::{
        flush, handler_fn, middleware_fn, push, take_over, CapabilityError, DynHandler,
        DynMiddleware, Flusher, Handler, Middleware, Pusher, Request, ResponseRecorder,
        ResponseWriter, TakenStream, Takeover,
    };

    pub use trellis_router::{PatternDispatcher, PatternError, PatternRegistry, Router};

    pub use trellis_telemetry::{init_logging, LogConfig};
}
