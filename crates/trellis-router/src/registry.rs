//! Pattern registry: root prefix, global wrapper, and dispatch entry.
//!
//! A [`PatternRegistry`] owns one [`PatternDispatcher`] plus the state that
//! surrounds it: the root path prefixed onto every pattern, an optional
//! global wrapper applied around the whole resolve-and-serve step, and an
//! optional not-found handler that bypasses the wrapper entirely.
//!
//! Registration happens single-threaded at startup; dispatch is concurrent
//! and read-only. The interior sits behind an `RwLock`, with write locks
//! confined to the registration phase.

use std::sync::Arc;

use parking_lot::RwLock;
use trellis_core::{DynHandler, DynMiddleware, Handler, Middleware, Request, ResponseWriter};

use crate::dispatch::{PatternDispatcher, PatternError};
use crate::interceptor::StatusInterceptor;
use crate::path;

/// Registration and dispatch surface shared by a tree of routers.
pub struct PatternRegistry {
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    dispatcher: Arc<PatternDispatcher>,
    root_path: String,
    global: Option<DynMiddleware>,
    not_found: Option<DynHandler>,
}

impl PatternRegistry {
    /// Creates a registry with an empty root path.
    pub fn new() -> Self {
        Self::with_prefix(std::iter::empty())
    }

    /// Creates a registry whose root path is the join of `segments`.
    pub fn with_prefix<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                dispatcher: Arc::new(PatternDispatcher::new()),
                root_path: path::join(segments),
                global: None,
                not_found: None,
            }),
        }
    }

    /// Returns the normalized root path (empty, or `/`-prefixed and never
    /// `/`-terminated).
    pub fn root_path(&self) -> String {
        self.inner.read().root_path.clone()
    }

    /// Replaces the root path.
    ///
    /// Only patterns registered afterwards are affected.
    pub fn set_root_path(&self, root: impl Into<String>) {
        self.inner.write().root_path = root.into();
    }

    /// Extends the root path with another segment.
    pub fn append_path(&self, segment: &str) {
        let mut inner = self.inner.write();
        let joined = path::join([inner.root_path.as_str(), segment]);
        inner.root_path = joined;
    }

    /// Sets the global wrapper applied around the resolve-and-serve step.
    ///
    /// The wrapper runs outside pattern resolution and outside every
    /// per-route middleware chain, for every request except those answered
    /// by the not-found path.
    pub fn set_global_wrapper(&self, wrapper: DynMiddleware) {
        self.inner.write().global = Some(wrapper);
    }

    /// Sets the handler invoked when no pattern matches.
    pub fn set_not_found_handler(&self, handler: DynHandler) {
        self.inner.write().not_found = Some(handler);
    }

    /// Returns the configured not-found handler, if any.
    pub fn not_found_handler(&self) -> Option<DynHandler> {
        self.inner.read().not_found.clone()
    }

    /// Registers `handler` under the root-prefixed `pattern`.
    ///
    /// A pattern containing a hyphen is additionally registered with every
    /// hyphen replaced by an underscore, and symmetrically for a pattern
    /// containing only underscores. Both spellings resolve directly to the
    /// same handler; this is an alias, not a redirect.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the dispatcher rejects the pattern.
    pub fn register(&self, pattern: &str, handler: DynHandler) -> Result<(), PatternError> {
        let mut inner = self.inner.write();
        let full = path::full_pattern(&inner.root_path, pattern);

        let dispatcher = Arc::make_mut(&mut inner.dispatcher);
        dispatcher.register(&full, Arc::clone(&handler))?;
        if full.contains('-') {
            dispatcher.register(&full.replace('-', "_"), handler)?;
        } else if full.contains('_') {
            dispatcher.register(&full.replace('_', "-"), handler)?;
        }
        Ok(())
    }

    /// Dispatches one request.
    ///
    /// The response is wrapped with the status interceptor (idempotently),
    /// not-found precedence is checked, and the dispatcher's own
    /// resolve-and-serve step runs inside the global wrapper when one is
    /// configured.
    pub fn dispatch(&self, w: &mut dyn ResponseWriter, req: &Request) {
        tracing::debug!(path = %req.uri().path(), "handling request");
        if w.is_intercepted() {
            self.dispatch_intercepted(w, req);
        } else {
            let mut wrapped = StatusInterceptor::new(w, req.uri().path());
            self.dispatch_intercepted(&mut wrapped, req);
        }
    }

    fn dispatch_intercepted(&self, w: &mut dyn ResponseWriter, req: &Request) {
        let (dispatcher, global, not_found) = {
            let inner = self.inner.read();
            (
                Arc::clone(&inner.dispatcher),
                inner.global.clone(),
                inner.not_found.clone(),
            )
        };

        if let Some(not_found) = not_found {
            if !dispatcher.resolve(req.method(), req.uri().path()).is_match() {
                not_found.call(w, req);
                return;
            }
        }

        match global {
            Some(global) => {
                let serve: DynHandler = {
                    let dispatcher = Arc::clone(&dispatcher);
                    Arc::new(move |w: &mut dyn ResponseWriter, req: &Request| {
                        dispatcher.serve(w, req);
                    })
                };
                global.wrap(serve).call(w, req);
            }
            None => dispatcher.serve(w, req),
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method, StatusCode};
    use trellis_core::{handler_fn, middleware_fn, ResponseRecorder};

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(bytes::Bytes::new())
            .expect("request builds")
    }

    fn ok(tag: &'static str) -> DynHandler {
        handler_fn(move |w: &mut dyn ResponseWriter, _req: &Request| {
            w.write_head(StatusCode::OK);
            w.write(tag.as_bytes());
        })
    }

    #[test]
    fn registers_under_the_root_prefix() {
        let registry = PatternRegistry::with_prefix(["api", "v1"]);
        registry.register("GET /users", ok("users")).expect("register");

        let mut recorder = ResponseRecorder::new();
        registry.dispatch(&mut recorder, &request(Method::GET, "/api/v1/users"));
        assert_eq!(recorder.body_str(), "users");

        let mut recorder = ResponseRecorder::new();
        registry.dispatch(&mut recorder, &request(Method::GET, "/users"));
        assert_eq!(recorder.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn hyphenated_patterns_gain_an_underscore_alias() {
        let registry = PatternRegistry::new();
        registry
            .register("GET /foo-bar", ok("dashed"))
            .expect("register");

        for path in ["/foo-bar", "/foo_bar"] {
            let mut recorder = ResponseRecorder::new();
            registry.dispatch(&mut recorder, &request(Method::GET, path));
            assert_eq!(recorder.body_str(), "dashed", "{path}");
        }
    }

    #[test]
    fn underscored_patterns_gain_a_hyphen_alias() {
        let registry = PatternRegistry::new();
        registry
            .register("GET /foo_bar", ok("scored"))
            .expect("register");

        for path in ["/foo_bar", "/foo-bar"] {
            let mut recorder = ResponseRecorder::new();
            registry.dispatch(&mut recorder, &request(Method::GET, path));
            assert_eq!(recorder.body_str(), "scored", "{path}");
        }
    }

    #[test]
    fn not_found_handler_bypasses_the_global_wrapper() {
        let registry = PatternRegistry::new();
        registry.register("GET /exists", ok("exists")).expect("register");
        registry.set_global_wrapper(middleware_fn(|next: DynHandler| -> DynHandler {
            Arc::new(move |w: &mut dyn ResponseWriter, req: &Request| {
                w.headers_mut()
                    .insert("x-global", HeaderValue::from_static("applied"));
                next.call(w, req);
            })
        }));
        registry.set_not_found_handler(handler_fn(
            |w: &mut dyn ResponseWriter, _req: &Request| {
                w.write_head(StatusCode::NOT_FOUND);
                w.write(b"custom not found");
            },
        ));

        let mut recorder = ResponseRecorder::new();
        registry.dispatch(&mut recorder, &request(Method::GET, "/nonexistent"));
        assert_eq!(recorder.status(), StatusCode::NOT_FOUND);
        assert_eq!(recorder.body_str(), "custom not found");
        assert_eq!(recorder.header_str("x-global"), None);
    }

    #[test]
    fn global_wrapper_runs_for_matched_routes() {
        let registry = PatternRegistry::new();
        registry.register("GET /exists", ok("exists")).expect("register");
        registry.set_global_wrapper(middleware_fn(|next: DynHandler| -> DynHandler {
            Arc::new(move |w: &mut dyn ResponseWriter, req: &Request| {
                w.headers_mut()
                    .insert("x-global", HeaderValue::from_static("applied"));
                next.call(w, req);
            })
        }));

        let mut recorder = ResponseRecorder::new();
        registry.dispatch(&mut recorder, &request(Method::GET, "/exists"));
        assert_eq!(recorder.body_str(), "exists");
        assert_eq!(recorder.header_str("x-global"), Some("applied"));
    }

    #[test]
    fn dispatch_rewrites_trailing_slash_redirects() {
        let registry = PatternRegistry::new();
        registry
            .register("POST /route/{$}", ok("slashed"))
            .expect("register");

        let mut recorder = ResponseRecorder::new();
        registry.dispatch(&mut recorder, &request(Method::POST, "/route"));
        assert_eq!(recorder.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(recorder.header_str("location"), Some("/route/"));
    }

    #[test]
    fn append_path_extends_the_root() {
        let registry = PatternRegistry::new();
        assert_eq!(registry.root_path(), "");

        registry.append_path("api");
        registry.append_path("v1");
        assert_eq!(registry.root_path(), "/api/v1");

        registry.set_root_path("/reset");
        assert_eq!(registry.root_path(), "/reset");
    }
}
