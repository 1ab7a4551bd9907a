//! The pattern-matching dispatcher behind the registry.
//!
//! [`PatternDispatcher`] adapts the [`matchit`] radix tree — which solves
//! path matching, `{name}` captures, and `{*name}` catch-alls — to the
//! pattern language consumed by this layer: an optional method token, a
//! single space or tab, and a path that may end in a `{name...}`
//! multi-segment capture, a `{$}` end anchor, or a trailing `/` marking a
//! subtree.
//!
//! The dispatcher also owns the protocol-level fallbacks that sit below
//! routing proper: the automatic `301` redirect for a request missing its
//! required trailing slash, `405 Method Not Allowed` with an `Allow` header,
//! and the plain-text `404` default.

use std::collections::HashMap;

use http::{header, HeaderValue, Method, StatusCode};
use thiserror::Error;
use trellis_core::{DynHandler, Handler, Request, ResponseWriter};

/// Internal parameter name for the catch-all twin of a subtree pattern.
const SUBTREE_PARAM: &str = "__subtree";

/// Errors raised while registering a pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern's path component is empty.
    #[error("pattern has an empty path")]
    EmptyPath,

    /// The pattern's path component does not begin with `/`.
    #[error("pattern path must begin with '/': {0:?}")]
    MissingLeadingSlash(String),

    /// The method token is not a valid HTTP method.
    #[error("pattern has an invalid method token {0:?}")]
    InvalidMethod(String),

    /// The path cannot coexist with an already registered path.
    #[error("pattern {pattern:?} conflicts with an existing route: {reason}")]
    Conflict {
        /// The rejected pattern.
        pattern: String,
        /// The matcher's description of the conflict.
        reason: String,
    },
}

/// The outcome of resolving a method and path against the dispatcher.
pub enum Resolution<'a> {
    /// A pattern matched; `pattern` is its normalized form.
    Matched {
        /// The registered handler.
        handler: &'a DynHandler,
        /// The normalized pattern the handler was registered under.
        pattern: &'a str,
    },

    /// The path only matches with a trailing slash appended; the client
    /// should be redirected to `location`.
    Redirect {
        /// The path with its missing trailing slash restored.
        location: String,
    },

    /// The path matched but no handler accepts this method.
    MethodNotAllowed {
        /// Comma-separated list of methods registered for the path.
        allow: String,
    },

    /// Nothing matched.
    NotFound,
}

impl Resolution<'_> {
    /// Whether this resolution counts as a matched pattern.
    ///
    /// A pending trailing-slash redirect counts as matched; a method
    /// mismatch does not, so a configured not-found handler takes over in
    /// that case.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. } | Self::Redirect { .. })
    }
}

impl std::fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched { pattern, .. } => f
                .debug_struct("Matched")
                .field("pattern", pattern)
                .finish_non_exhaustive(),
            Self::Redirect { location } => f
                .debug_struct("Redirect")
                .field("location", location)
                .finish(),
            Self::MethodNotAllowed { allow } => f
                .debug_struct("MethodNotAllowed")
                .field("allow", allow)
                .finish(),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// One registered path with its per-method handler table.
#[derive(Clone, Default)]
struct RouteEntry {
    by_method: HashMap<Method, Route>,
    any: Option<Route>,
}

#[derive(Clone)]
struct Route {
    pattern: String,
    handler: DynHandler,
}

/// Method + path dispatcher over a radix tree.
///
/// Patterns register a handler under `["METHOD "] PATH`; method-less
/// patterns match every method. Registering the same method and path twice
/// replaces the earlier handler (last registration wins), which is also the
/// resolution rule when spelling aliases collide.
#[derive(Clone, Default)]
pub struct PatternDispatcher {
    tree: matchit::Router<usize>,
    entries: Vec<RouteEntry>,
    by_path: HashMap<String, usize>,
}

impl PatternDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct paths registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no patterns are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers `handler` under `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for an empty or relative path, an invalid
    /// method token, or a path the underlying matcher rejects as
    /// conflicting.
    pub fn register(&mut self, pattern: &str, handler: DynHandler) -> Result<(), PatternError> {
        let (method, path) = split_pattern(pattern);
        if path.is_empty() {
            return Err(PatternError::EmptyPath);
        }
        if !path.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(path.to_string()));
        }

        let method = method
            .map(|token| {
                Method::from_bytes(token.as_bytes())
                    .map_err(|_| PatternError::InvalidMethod(token.to_string()))
            })
            .transpose()?;

        let (primary, twin) = translate(path);
        let idx = match self.by_path.get(&primary) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.insert_tree_route(&primary, pattern, idx)?;
                if let Some(twin) = &twin {
                    self.insert_tree_route(twin, pattern, idx)?;
                }
                self.entries.push(RouteEntry::default());
                self.by_path.insert(primary, idx);
                idx
            }
        };

        let normalized = match &method {
            Some(m) => format!("{m} {path}"),
            None => path.to_string(),
        };
        tracing::debug!(pattern = %normalized, "registered pattern");

        let route = Route {
            pattern: normalized,
            handler,
        };
        let entry = &mut self.entries[idx];
        match method {
            Some(m) => {
                entry.by_method.insert(m, route);
            }
            None => entry.any = Some(route),
        }
        Ok(())
    }

    fn insert_tree_route(
        &mut self,
        route: &str,
        pattern: &str,
        idx: usize,
    ) -> Result<(), PatternError> {
        self.tree
            .insert(route.to_string(), idx)
            .map_err(|err| PatternError::Conflict {
                pattern: pattern.to_string(),
                reason: err.to_string(),
            })
    }

    /// Resolves `method` and `path` without serving the request.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        if let Ok(hit) = self.tree.at(path) {
            let entry = &self.entries[*hit.value];

            if let Some(route) = entry.by_method.get(method) {
                return Resolution::Matched {
                    handler: &route.handler,
                    pattern: &route.pattern,
                };
            }
            // A GET registration also answers HEAD.
            if *method == Method::HEAD {
                if let Some(route) = entry.by_method.get(&Method::GET) {
                    return Resolution::Matched {
                        handler: &route.handler,
                        pattern: &route.pattern,
                    };
                }
            }
            if let Some(route) = &entry.any {
                return Resolution::Matched {
                    handler: &route.handler,
                    pattern: &route.pattern,
                };
            }

            let mut methods: Vec<&str> = entry.by_method.keys().map(Method::as_str).collect();
            methods.sort_unstable();
            return Resolution::MethodNotAllowed {
                allow: methods.join(", "),
            };
        }

        if !path.ends_with('/') {
            let with_slash = format!("{path}/");
            if self.tree.at(&with_slash).is_ok() {
                return Resolution::Redirect {
                    location: with_slash,
                };
            }
        }

        Resolution::NotFound
    }

    /// Resolves the request and invokes the winning handler, or commits the
    /// appropriate fallback response.
    pub fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        match self.resolve(req.method(), req.uri().path()) {
            Resolution::Matched { handler, pattern } => {
                tracing::debug!(pattern = %pattern, path = %req.uri().path(), "dispatching");
                handler.call(w, req);
            }
            Resolution::Redirect { location } => {
                if let Ok(value) = HeaderValue::from_str(&location) {
                    w.headers_mut().insert(header::LOCATION, value);
                }
                w.write_head(StatusCode::MOVED_PERMANENTLY);
            }
            Resolution::MethodNotAllowed { allow } => {
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    w.headers_mut().insert(header::ALLOW, value);
                }
                w.write_head(StatusCode::METHOD_NOT_ALLOWED);
            }
            Resolution::NotFound => {
                w.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                w.write_head(StatusCode::NOT_FOUND);
                w.write(b"404 page not found\n");
            }
        }
    }
}

/// Splits a pattern into its optional method token and path component.
fn split_pattern(pattern: &str) -> (Option<&str>, &str) {
    match pattern.find([' ', '\t']) {
        Some(i) => {
            let method = &pattern[..i];
            let path = pattern[i..].trim_start_matches([' ', '\t']);
            if method.is_empty() {
                (None, path)
            } else {
                (Some(method), path)
            }
        }
        None => (None, pattern),
    }
}

/// Translates a pattern path into the matcher's route syntax.
///
/// Returns the primary route plus an optional twin: subtree paths (trailing
/// `/` or a `{name...}` capture) match both the anchor itself and
/// everything below it, which takes two radix-tree routes.
fn translate(path: &str) -> (String, Option<String>) {
    if let Some(stripped) = path.strip_suffix("{$}") {
        // `{$}` anchors the pattern at the exact path (with its slash).
        return (stripped.to_string(), None);
    }

    if let Some(rest) = multi_segment_capture(path) {
        let (prefix, name) = rest;
        return (format!("{prefix}{{*{name}}}"), Some(prefix.to_string()));
    }

    if path.ends_with('/') {
        return (path.to_string(), Some(format!("{path}{{*{SUBTREE_PARAM}}}")));
    }

    (path.to_string(), None)
}

/// Matches a trailing `{name...}` capture, returning the preceding prefix
/// (ending in `/`) and the capture name.
fn multi_segment_capture(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_suffix("...}")?;
    let open = rest.rfind('{')?;
    let name = &rest[open + 1..];
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some((&path[..open], name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trellis_core::{handler_fn, ResponseRecorder};

    fn noop() -> DynHandler {
        handler_fn(|_w: &mut dyn ResponseWriter, _req: &Request| {})
    }

    fn tagged(tag: &'static str) -> DynHandler {
        handler_fn(move |w: &mut dyn ResponseWriter, _req: &Request| {
            w.write(tag.as_bytes());
        })
    }

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(bytes::Bytes::new())
            .expect("request builds")
    }

    #[test]
    fn resolves_method_and_path() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher.register("GET /users", noop()).expect("register");

        assert!(dispatcher.resolve(&Method::GET, "/users").is_match());
        assert!(!dispatcher.resolve(&Method::GET, "/posts").is_match());
    }

    #[test]
    fn method_mismatch_is_not_a_match() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher.register("GET /users", noop()).expect("register");

        let resolution = dispatcher.resolve(&Method::POST, "/users");
        assert!(!resolution.is_match());
        assert!(matches!(resolution, Resolution::MethodNotAllowed { .. }));
    }

    #[test]
    fn methodless_pattern_matches_every_method() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher.register("/ping", noop()).expect("register");

        for method in [Method::GET, Method::POST, Method::DELETE, Method::HEAD] {
            assert!(dispatcher.resolve(&method, "/ping").is_match(), "{method}");
        }
    }

    #[test]
    fn head_falls_back_to_get() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher.register("GET /users", noop()).expect("register");

        assert!(dispatcher.resolve(&Method::HEAD, "/users").is_match());
    }

    #[test]
    fn last_registration_wins() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("GET /users", tagged("first"))
            .expect("register");
        dispatcher
            .register("GET /users", tagged("second"))
            .expect("register");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/users"));
        assert_eq!(recorder.body_str(), "second");
    }

    #[test]
    fn missing_trailing_slash_resolves_to_redirect() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("GET /route/{$}", noop())
            .expect("register");

        match dispatcher.resolve(&Method::POST, "/route") {
            Resolution::Redirect { location } => assert_eq!(location, "/route/"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn redirect_serves_301_with_location() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("GET /route/{$}", noop())
            .expect("register");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/route"));
        assert_eq!(recorder.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(recorder.header_str("location"), Some("/route/"));
    }

    #[test]
    fn subtree_pattern_matches_anchor_and_descendants() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("/mounted/", tagged("sub"))
            .expect("register");

        for path in ["/mounted/", "/mounted/anything", "/mounted/a/b/c"] {
            let mut recorder = ResponseRecorder::new();
            dispatcher.serve(&mut recorder, &request(Method::GET, path));
            assert_eq!(recorder.body_str(), "sub", "{path}");
        }
    }

    #[test]
    fn multi_segment_capture_matches_descendants() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("GET /files/{path...}", tagged("file"))
            .expect("register");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/files/images/logo.png"));
        assert_eq!(recorder.body_str(), "file");
    }

    #[test]
    fn single_segment_capture_matches() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("GET /users/{id}", tagged("user"))
            .expect("register");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/users/123"));
        assert_eq!(recorder.body_str(), "user");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/users/1/extra"));
        assert_eq!(recorder.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn method_not_allowed_lists_registered_methods() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher.register("GET /users", noop()).expect("register");
        dispatcher.register("POST /users", noop()).expect("register");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::DELETE, "/users"));
        assert_eq!(recorder.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(recorder.header_str("allow"), Some("GET, POST"));
    }

    #[test]
    fn unmatched_path_serves_plain_404() {
        let dispatcher = PatternDispatcher::new();
        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/missing"));
        assert_eq!(recorder.status(), StatusCode::NOT_FOUND);
        assert_eq!(recorder.body_str(), "404 page not found\n");
    }

    #[test]
    fn rejects_malformed_patterns() {
        let mut dispatcher = PatternDispatcher::new();
        assert!(matches!(
            dispatcher.register("GET ", noop()),
            Err(PatternError::EmptyPath)
        ));
        assert!(matches!(
            dispatcher.register("GET users", noop()),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            dispatcher.register("G?T /users", noop()),
            Err(PatternError::InvalidMethod(_))
        ));
    }

    #[test]
    fn end_anchor_matches_only_the_exact_path() {
        let mut dispatcher = PatternDispatcher::new();
        dispatcher
            .register("GET /route/{$}", tagged("anchor"))
            .expect("register");

        let mut recorder = ResponseRecorder::new();
        dispatcher.serve(&mut recorder, &request(Method::GET, "/route/"));
        assert_eq!(recorder.body_str(), "anchor");

        assert!(!dispatcher.resolve(&Method::GET, "/route/deeper").is_match());
    }

    #[test]
    fn handlers_are_shared_not_cloned() {
        let mut dispatcher = PatternDispatcher::new();
        let handler = noop();
        dispatcher
            .register("GET /a", Arc::clone(&handler))
            .expect("register");
        dispatcher
            .register("GET /b", Arc::clone(&handler))
            .expect("register");
        assert_eq!(dispatcher.len(), 2);
    }
}
