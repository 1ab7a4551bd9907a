//! In-memory response recorder for tests.

use http::{HeaderMap, StatusCode};

use crate::writer::{Flusher, ResponseWriter};

/// A [`ResponseWriter`] that records everything written to it.
///
/// The recorder mirrors the semantics of a real response stream: the first
/// call to [`write_head`](ResponseWriter::write_head) wins, and writing body
/// bytes first commits `200 OK` implicitly. It supports the [`Flusher`]
/// capability but deliberately not [`Takeover`](crate::Takeover) or
/// [`Pusher`](crate::Pusher), so tests can exercise the unsupported paths.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use trellis_core::{ResponseRecorder, ResponseWriter};
///
/// let mut recorder = ResponseRecorder::new();
/// recorder.write(b"ok");
///
/// assert_eq!(recorder.status(), StatusCode::OK);
/// assert_eq!(recorder.body_str(), "ok");
/// ```
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    flushed: bool,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed status, or `200 OK` when nothing was committed.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns `true` once a status line has been committed.
    pub fn committed(&self) -> bool {
        self.status.is_some()
    }

    /// Returns the recorded body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the recorded body as a string (lossy for invalid UTF-8).
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if [`flush`](crate::flush) reached this recorder.
    pub fn flushed(&self) -> bool {
        self.flushed
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        // Subsequent commits are superfluous and ignored, as on a real
        // connection.
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }
}

impl Flusher for ResponseRecorder {
    fn flush(&mut self) {
        self.flushed = true;
    }
}
