//! Response status interception for dispatcher-generated redirects.
//!
//! The dispatcher answers a request that is missing its required trailing
//! slash with `301 Moved Permanently`. A 301 instructs some clients to
//! retry with `GET`, which silently turns a `POST`, `PUT`, or `DELETE` into
//! a `GET` on retry. [`StatusInterceptor`] watches the status commit and,
//! when the committed status is a 301 whose `Location` is exactly the
//! original request path plus `/`, rewrites it to `307 Temporary Redirect`
//! — same target, original method preserved.
//!
//! Redirects issued by handlers to any other location pass through
//! untouched, as does every other status code.

use http::{header, HeaderMap, StatusCode};
use trellis_core::{Flusher, Pusher, ResponseWriter, Takeover};

/// A transparent [`ResponseWriter`] wrapper observing the status commit.
///
/// The wrapper marks itself via
/// [`is_intercepted`](ResponseWriter::is_intercepted), so nested dispatch
/// (a mounted sub-router re-entering the dispatch entry point) never wraps
/// the response twice.
pub struct StatusInterceptor<'a> {
    inner: &'a mut dyn ResponseWriter,
    original_path: String,
    status: Option<StatusCode>,
}

impl<'a> StatusInterceptor<'a> {
    /// Wraps `inner` for a request to `original_path`.
    pub fn new(inner: &'a mut dyn ResponseWriter, original_path: impl Into<String>) -> Self {
        Self {
            inner,
            original_path: original_path.into(),
            status: None,
        }
    }

    /// Returns the status committed through this wrapper, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

impl ResponseWriter for StatusInterceptor<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        if status == StatusCode::MOVED_PERMANENTLY {
            let slashed = format!("{}/", self.original_path);
            let location = self
                .inner
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok());
            if location == Some(slashed.as_str()) {
                self.status = Some(StatusCode::TEMPORARY_REDIRECT);
                self.inner.write_head(StatusCode::TEMPORARY_REDIRECT);
                return;
            }
        }
        self.status = Some(status);
        self.inner.write_head(status);
    }

    fn write(&mut self, chunk: &[u8]) {
        self.inner.write(chunk);
    }

    fn takeover(&mut self) -> Option<&mut dyn Takeover> {
        self.inner.takeover()
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        self.inner.flusher()
    }

    fn pusher(&mut self) -> Option<&mut dyn Pusher> {
        self.inner.pusher()
    }

    fn is_intercepted(&self) -> bool {
        true
    }
}
