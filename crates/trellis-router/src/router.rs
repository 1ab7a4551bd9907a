//! Router tree composition and the middleware ordering contract.
//!
//! A [`Router`] pairs a shared [`PatternRegistry`] with an ordered,
//! append-only middleware chain. Every registration call composes its final
//! handler immediately — the chain contents are captured at that moment, so
//! later [`use_middleware`](Router::use_middleware) calls never reach
//! already registered routes.
//!
//! For one composed route the observable execution order is:
//!
//! ```text
//! global wrapper → router chain (insertion order) → per-route chain → handler
//! ```
//!
//! Two composition primitives build the tree. [`group`](Router::group)
//! shares the registry (and therefore the matching space and path prefix)
//! but clones the chain, isolating later middleware additions on either
//! side. [`route`](Router::route) creates a sub-tree with its own registry
//! and dispatcher, mounted onto the parent under a path prefix.

use std::sync::Arc;

use http::{header, HeaderValue, Method, StatusCode};
use trellis_core::{DynHandler, DynMiddleware, Handler, Middleware, Request, ResponseWriter};

use crate::registry::PatternRegistry;

/// The public route-registration surface of the dispatch layer.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use trellis_router::Router;
/// use trellis_core::{Request, ResponseWriter};
///
/// let mut router = Router::new();
/// router.get(
///     "/health",
///     |w: &mut dyn ResponseWriter, _req: &Request| {
///         w.write_head(StatusCode::OK);
///         w.write(b"ok");
///     },
///     &[],
/// );
/// ```
#[derive(Clone)]
pub struct Router {
    registry: Arc<PatternRegistry>,
    chain: Vec<DynMiddleware>,
}

impl Router {
    /// Creates a router with an empty middleware chain.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(PatternRegistry::new()),
            chain: Vec::new(),
        }
    }

    /// Creates a router seeded with an initial middleware chain.
    pub fn with_middleware(chain: impl IntoIterator<Item = DynMiddleware>) -> Self {
        Self {
            registry: Arc::new(PatternRegistry::new()),
            chain: chain.into_iter().collect(),
        }
    }

    /// Appends a middleware onto the router's chain.
    ///
    /// The chain executes before per-route middleware, giving earlier
    /// additions the outermost position. Only routes registered *after*
    /// this call are affected; already composed routes keep the chain they
    /// were registered with.
    pub fn use_middleware(&mut self, middleware: DynMiddleware) {
        self.chain.push(middleware);
    }

    /// Sets the global wrapper applied around the entire resolve-and-serve
    /// step.
    ///
    /// Unlike chain middleware, the wrapper runs *before* pattern matching
    /// and around every matched route regardless of when the route was
    /// registered — but never for requests answered by the not-found path.
    pub fn set_global_wrapper<M: Middleware + 'static>(&self, wrapper: M) {
        self.registry.set_global_wrapper(Arc::new(wrapper));
    }

    /// Sets the handler invoked when no pattern matches.
    pub fn set_not_found_handler<H: Handler + 'static>(&self, handler: H) {
        self.registry.set_not_found_handler(Arc::new(handler));
    }

    /// Returns the registry's current root path.
    pub fn base_path(&self) -> String {
        self.registry.root_path()
    }

    /// Replaces the registry's root path.
    pub fn set_base_path(&self, path: impl Into<String>) {
        self.registry.set_root_path(path);
    }

    /// Extends the registry's root path with another segment.
    pub fn append_path(&self, segment: &str) {
        self.registry.append_path(segment);
    }

    /// Registers a handler for `GET` requests to `path`.
    pub fn get<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        self.handle(Method::GET, path, handler, chain);
    }

    /// Registers a handler for `POST` requests to `path`.
    pub fn post<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        self.handle(Method::POST, path, handler, chain);
    }

    /// Registers a handler for `PUT` requests to `path`.
    pub fn put<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        self.handle(Method::PUT, path, handler, chain);
    }

    /// Registers a handler for `DELETE` requests to `path`.
    pub fn delete<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        self.handle(Method::DELETE, path, handler, chain);
    }

    /// Registers a handler for `HEAD` requests to `path`.
    pub fn head<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        self.handle(Method::HEAD, path, handler, chain);
    }

    /// Registers a handler for `OPTIONS` requests to `path`.
    pub fn options<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        self.handle(Method::OPTIONS, path, handler, chain);
    }

    /// Registers a handler for an arbitrary `method` and `path`.
    ///
    /// # Panics
    ///
    /// Panics when the composed pattern is rejected by the dispatcher;
    /// route registration is a startup-time operation and a malformed
    /// pattern is a programming error.
    pub fn handle<H: Handler + 'static>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        chain: &[DynMiddleware],
    ) {
        let wrapped = self.wrap(Arc::new(handler), chain);
        self.register(&format!("{method} {path}"), wrapped);
    }

    /// Registers a handler for every method at `path`.
    ///
    /// The pattern carries no method token, so it matches any method the
    /// dispatcher would otherwise route individually.
    pub fn any<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        let wrapped = self.wrap(Arc::new(handler), chain);
        self.register(path, wrapped);
    }

    /// Invokes `f` with a sub-router sharing this router's registry.
    ///
    /// The sub-router starts with an independent copy of the current chain
    /// contents, so middleware added on either side afterwards stays
    /// isolated while the matching space and path prefix remain shared.
    pub fn group(&self, f: impl FnOnce(&mut Router)) {
        let mut sub = Self {
            registry: Arc::clone(&self.registry),
            chain: self.chain.clone(),
        };
        f(&mut sub);
    }

    /// Builds a sub-tree mounted under `path` and returns its router.
    ///
    /// The sub-router gets a fresh registry with its own dispatcher, a root
    /// path of `join(parent_root, path)`, and the parent's not-found
    /// handler. Its initial chain is exactly `chain` — the parent's chain
    /// is *not* inherited. After `f` registers the sub-tree's routes, the
    /// sub-tree is mounted onto this router at `path`.
    pub fn route(
        &mut self,
        path: &str,
        f: impl FnOnce(&mut Router),
        chain: &[DynMiddleware],
    ) -> Router {
        let registry = PatternRegistry::with_prefix([self.base_path().as_str(), path]);
        if let Some(not_found) = self.registry.not_found_handler() {
            registry.set_not_found_handler(not_found);
        }

        let mut sub = Self {
            registry: Arc::new(registry),
            chain: chain.to_vec(),
        };
        f(&mut sub);

        self.mount(path, sub.clone(), &[]);
        sub
    }

    /// Mounts `handler` under `path` with a trailing slash forced.
    ///
    /// Anything handler-shaped mounts: a [`Router`] (sub-trees created by
    /// [`route`](Self::route) go through here), or an arbitrary foreign
    /// handler. The mounted handler is composed through the same chain
    /// machinery as any other registration.
    pub fn mount<H: Handler + 'static>(&mut self, path: &str, handler: H, chain: &[DynMiddleware]) {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let wrapped = self.wrap(Arc::new(handler), chain);
        self.register(&format!("{trimmed}/"), wrapped);
    }

    /// Serves the not-found response directly.
    ///
    /// Invokes the configured not-found handler when one is set, else
    /// commits a generic 404 with a minimal structured body.
    pub fn not_found(&self, w: &mut dyn ResponseWriter, req: &Request) {
        if let Some(handler) = self.registry.not_found_handler() {
            handler.call(w, req);
            return;
        }
        w.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        w.write_head(StatusCode::NOT_FOUND);
        let body = serde_json::json!({ "error": "Not Found" });
        w.write(body.to_string().as_bytes());
    }

    /// The dispatch entry point: routes one request through the registry.
    pub fn dispatch(&self, w: &mut dyn ResponseWriter, req: &Request) {
        self.registry.dispatch(w, req);
    }

    /// Composes `handler` with the per-route chain and the router's own
    /// chain, innermost first.
    ///
    /// Folding each list back to front makes the *first* listed middleware
    /// the outermost of its group, so both groups execute in the order they
    /// were given.
    fn wrap(&self, handler: DynHandler, chain: &[DynMiddleware]) -> DynHandler {
        let mut out = handler;
        for middleware in chain.iter().rev() {
            out = middleware.wrap(out);
        }
        for middleware in self.chain.iter().rev() {
            out = middleware.wrap(out);
        }
        out
    }

    fn register(&self, pattern: &str, handler: DynHandler) {
        if let Err(err) = self.registry.register(pattern, handler) {
            panic!("invalid route pattern {pattern:?}: {err}");
        }
    }
}

impl Handler for Router {
    fn call(&self, w: &mut dyn ResponseWriter, req: &Request) {
        self.dispatch(w, req);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
