//! Common request type used throughout the dispatch layer.

use bytes::Bytes;

/// The HTTP request type handlers receive.
///
/// This is a standard `http::Request` with a fully buffered [`Bytes`] body.
/// The surrounding transport is responsible for reading the body off the
/// wire before dispatch; this layer never performs IO on the request.
pub type Request = http::Request<Bytes>;
