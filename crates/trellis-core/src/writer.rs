//! The outbound response interface and its optional capabilities.
//!
//! [`ResponseWriter`] is the write side of one in-flight request. Handlers
//! set headers, commit a status line with [`ResponseWriter::write_head`],
//! and append body bytes with [`ResponseWriter::write`].
//!
//! Beyond the mandatory surface, an implementation may offer secondary
//! capabilities: taking over the underlying byte stream ([`Takeover`]),
//! flushing buffered output ([`Flusher`]), or initiating a server push
//! ([`Pusher`]). Support is queried explicitly through the accessor methods
//! rather than assumed; the free functions [`take_over`], [`flush`], and
//! [`push`] wrap that query and apply the per-capability fallback: takeover
//! and push fail with [`CapabilityError::NotSupported`], while flush is
//! advisory and degrades to a no-op.

use std::io::{Read, Write};

use http::{HeaderMap, StatusCode};
use thiserror::Error;

/// Errors raised by the optional response-stream capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The underlying response implementation does not provide the
    /// requested capability.
    #[error("{0} is not supported by the underlying response writer")]
    NotSupported(&'static str),

    /// The capability is supported but the operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A buffered byte stream handed over by [`Takeover::take_over`].
///
/// After a takeover the caller owns the stream for the remainder of the
/// connection; the writer must not be used again.
pub trait TakenStream: Read + Write + Send {}

impl<T: Read + Write + Send> TakenStream for T {}

/// Capability: take over the underlying connection as a raw byte stream.
pub trait Takeover {
    /// Hands the underlying buffered stream to the caller.
    fn take_over(&mut self) -> Result<Box<dyn TakenStream>, CapabilityError>;
}

/// Capability: flush buffered response bytes to the client.
pub trait Flusher {
    /// Flushes any buffered output.
    fn flush(&mut self);
}

/// Capability: initiate a server push for a related resource.
pub trait Pusher {
    /// Pushes `target` with the given request headers.
    fn push(&mut self, target: &str, headers: &HeaderMap) -> Result<(), CapabilityError>;
}

/// The write side of one in-flight HTTP response.
///
/// The status line is committed at most once; writing body bytes before
/// [`write_head`](Self::write_head) commits `200 OK` implicitly. Headers may
/// only be modified before the commit.
pub trait ResponseWriter: Send {
    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    ///
    /// Mutations after the status line has been committed have no effect on
    /// the wire.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line and headers.
    fn write_head(&mut self, status: StatusCode);

    /// Appends body bytes, committing `200 OK` first if nothing was
    /// committed yet.
    fn write(&mut self, chunk: &[u8]);

    /// Returns the takeover capability, if this writer supports it.
    fn takeover(&mut self) -> Option<&mut dyn Takeover> {
        None
    }

    /// Returns the flush capability, if this writer supports it.
    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        None
    }

    /// Returns the push capability, if this writer supports it.
    fn pusher(&mut self) -> Option<&mut dyn Pusher> {
        None
    }

    /// Marker for wrappers that already observe the status line.
    ///
    /// Interceptors set this to `true` so that re-wrapping a response during
    /// nested dispatch is an O(1) no-op instead of a dynamic type test.
    fn is_intercepted(&self) -> bool {
        false
    }
}

/// Takes over the writer's underlying byte stream.
///
/// # Errors
///
/// Returns [`CapabilityError::NotSupported`] when the writer does not
/// implement [`Takeover`]; never a silent no-op.
pub fn take_over(w: &mut dyn ResponseWriter) -> Result<Box<dyn TakenStream>, CapabilityError> {
    match w.takeover() {
        Some(t) => t.take_over(),
        None => Err(CapabilityError::NotSupported("takeover")),
    }
}

/// Flushes buffered response bytes if the writer supports flushing.
///
/// Flushing is advisory, so a writer without the capability degrades to a
/// no-op.
pub fn flush(w: &mut dyn ResponseWriter) {
    if let Some(f) = w.flusher() {
        f.flush();
    }
}

/// Initiates a server push for `target`.
///
/// # Errors
///
/// Returns [`CapabilityError::NotSupported`] when the writer does not
/// implement [`Pusher`].
pub fn push(
    w: &mut dyn ResponseWriter,
    target: &str,
    headers: &HeaderMap,
) -> Result<(), CapabilityError> {
    match w.pusher() {
        Some(p) => p.push(target, headers),
        None => Err(CapabilityError::NotSupported("push")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseRecorder;
    use std::io::Cursor;

    struct TakeoverWriter {
        headers: HeaderMap,
        taken: bool,
    }

    impl TakeoverWriter {
        fn new() -> Self {
            Self {
                headers: HeaderMap::new(),
                taken: false,
            }
        }
    }

    impl ResponseWriter for TakeoverWriter {
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_head(&mut self, _status: StatusCode) {}

        fn write(&mut self, _chunk: &[u8]) {}

        fn takeover(&mut self) -> Option<&mut dyn Takeover> {
            Some(self)
        }
    }

    impl Takeover for TakeoverWriter {
        fn take_over(&mut self) -> Result<Box<dyn TakenStream>, CapabilityError> {
            self.taken = true;
            Ok(Box::new(Cursor::new(Vec::new())))
        }
    }

    #[test]
    fn take_over_errors_without_capability() {
        let mut recorder = ResponseRecorder::new();
        assert!(matches!(
            take_over(&mut recorder),
            Err(CapabilityError::NotSupported("takeover"))
        ));
    }

    #[test]
    fn take_over_delegates_when_supported() {
        let mut writer = TakeoverWriter::new();
        let mut stream = match take_over(&mut writer) {
            Ok(stream) => stream,
            Err(err) => panic!("takeover should succeed: {err}"),
        };
        assert!(writer.taken);

        stream.write_all(b"raw").expect("stream is writable");
    }

    #[test]
    fn push_errors_without_capability() {
        let mut recorder = ResponseRecorder::new();
        let err =
            push(&mut recorder, "/style.css", &HeaderMap::new()).expect_err("push unsupported");
        assert!(matches!(err, CapabilityError::NotSupported("push")));
    }

    #[test]
    fn flush_is_a_no_op_without_capability() {
        let mut writer = TakeoverWriter::new();
        // No Flusher implementation; must not panic.
        flush(&mut writer);
    }

    #[test]
    fn flush_delegates_when_supported() {
        let mut recorder = ResponseRecorder::new();
        flush(&mut recorder);
        assert!(recorder.flushed());
    }
}
