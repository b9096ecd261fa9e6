//! Pull-based streaming reader over a live HTTP response.

use crate::error::StoreError;
use crate::transport::HttpResponse;

/// Forward-only, non-restartable sequence of byte chunks backed by an open
/// connection. Chunks are at most the configured chunk size.
///
/// The underlying connection is closed exactly once: on exhaustion, on an
/// explicit [`close`](ObjectStream::close), or when the stream is dropped.
/// A stream that is abandoned but kept alive holds its connection open, so
/// callers that stop reading early should close or drop it promptly.
#[derive(Debug)]
pub struct ObjectStream {
    resp: HttpResponse,
}

impl ObjectStream {
    pub(crate) fn new(resp: HttpResponse) -> Self {
        Self { resp }
    }

    /// Next chunk, or `None` once the body is exhausted. The first `None`
    /// also tears the connection down; later calls keep returning `None`.
    pub fn next_chunk(&mut self) -> Option<Vec<u8>> {
        self.resp.next_chunk()
    }

    /// The transport error that cut the body short, if any. Available once
    /// [`next_chunk`](ObjectStream::next_chunk) has returned `None`; a
    /// clean end-of-stream yields `None`, so callers can tell a truncated
    /// body from a complete one.
    pub fn take_error(&mut self) -> Option<StoreError> {
        self.resp.take_error()
    }

    /// Stops reading and closes the underlying connection. Safe to call
    /// more than once.
    pub fn close(&mut self) {
        self.resp.close();
    }
}

impl Iterator for ObjectStream {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.next_chunk()
    }
}
