//! Handler and middleware traits.
//!
//! A [`Handler`] writes a response for one request. A [`Middleware`] is a
//! pure transformation from one handler to the next, composed by nesting:
//! the outermost middleware sees the request first and may decline to invoke
//! its inner handler, short-circuiting the rest of the chain.
//!
//! Both traits are blanket-implemented for plain function values, so
//! closures compose without adapter types:
//!
//! ```
//! use std::sync::Arc;
//! use trellis_core::{middleware_fn, DynHandler, Handler, Request, ResponseWriter};
//!
//! let logging = middleware_fn(|next: DynHandler| -> DynHandler {
//!     Arc::new(move |w: &mut dyn ResponseWriter, req: &Request| {
//!         // pre-processing goes here
//!         next.call(w, req);
//!     })
//! });
//! ```

use std::sync::Arc;

use crate::types::Request;
use crate::writer::ResponseWriter;

/// A terminal request processor.
///
/// Handlers receive the response writer and the request, and communicate
/// exclusively through writes to the response. A handler may itself be a
/// fully composed middleware chain.
pub trait Handler: Send + Sync {
    /// Processes one request.
    fn call(&self, w: &mut dyn ResponseWriter, req: &Request);
}

/// A shared, type-erased [`Handler`].
pub type DynHandler = Arc<dyn Handler>;

impl<F> Handler for F
where
    F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync,
{
    fn call(&self, w: &mut dyn ResponseWriter, req: &Request) {
        self(w, req);
    }
}

/// A composable wrapper transforming one handler into another.
///
/// Middleware owns no state beyond closure capture. Wrapping happens once,
/// at route-registration time; the wrapped handler is then shared across
/// every request that matches the route.
pub trait Middleware: Send + Sync {
    /// Wraps `next`, returning the handler that will run in its place.
    fn wrap(&self, next: DynHandler) -> DynHandler;
}

/// A shared, type-erased [`Middleware`].
pub type DynMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(DynHandler) -> DynHandler + Send + Sync,
{
    fn wrap(&self, next: DynHandler) -> DynHandler {
        self(next)
    }
}

/// Erases a handler function into a [`DynHandler`].
pub fn handler_fn<F>(f: F) -> DynHandler
where
    F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Erases a middleware function into a [`DynMiddleware`].
pub fn middleware_fn<F>(f: F) -> DynMiddleware
where
    F: Fn(DynHandler) -> DynHandler + Send + Sync + 'static,
{
    Arc::new(f)
}
