//! # Trellis Router
//!
//! Router tree composition on top of an external path-pattern dispatcher.
//!
//! This crate is the heart of Trellis: it turns a flat pattern matcher into
//! a composable tree of routers with a precise middleware ordering
//! contract.
//!
//! - [`Router`] - route registration, grouping, mounting, sub-trees
//! - [`PatternRegistry`] - root prefix, global wrapper, not-found precedence
//! - [`PatternDispatcher`] - the mux adapter over the `matchit` radix tree
//! - [`StatusInterceptor`] - downgrades unsafe 301 trailing-slash redirects
//!   to method-preserving 307s
//! - [`path`] - prefix normalization and pattern prefixing
//!
//! ## Execution order
//!
//! For a request matching a registered route:
//!
//! ```text
//! global wrapper → router chain (insertion order) → per-route chain → handler
//! ```
//!
//! A request matching nothing is answered by the configured not-found
//! handler — bypassing the global wrapper and every chain — or by the
//! dispatcher's default 404.
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use trellis_core::{Request, ResponseWriter};
//! use trellis_router::Router;
//!
//! let mut router = Router::new();
//! router.route(
//!     "/api",
//!     |api| {
//!         api.get(
//!             "/users/{id}",
//!             |w: &mut dyn ResponseWriter, _req: &Request| {
//!                 w.write_head(StatusCode::OK);
//!             },
//!             &[],
//!         );
//!     },
//!     &[],
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatch;
mod interceptor;
pub mod path;
mod registry;
mod router;

pub use dispatch::{PatternDispatcher, PatternError, Resolution};
pub use interceptor::StatusInterceptor;
pub use registry::PatternRegistry;
pub use router::Router;
