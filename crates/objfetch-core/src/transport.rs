//! Per-hop HTTP request execution over curl.
//!
//! Each request runs on its own worker thread owning a fresh `Easy2` handle
//! (no connection reuse across calls). Redirect following is disabled so the
//! fetch engine can inspect `Location` headers itself. The response head is
//! delivered over a rendezvous channel as soon as the first body byte
//! arrives (or when the transfer finishes body-less); body chunks flow
//! through a bounded channel, so the transfer blocks while the consumer is
//! not pulling. Dropping the chunk receiver aborts the transfer, which
//! closes the connection.

use curl::easy::{Easy2, Handler, List, WriteError};
use std::io;
use std::str;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::StoreError;

/// HTTP verbs the fetch engine issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verb {
    Get,
    Head,
}

/// Transport knobs threaded down from `FetchConfig`.
#[derive(Debug, Clone)]
pub(crate) struct RequestOptions {
    /// Receive buffer size; body chunks are at most this large.
    pub chunk_size: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
}

/// Chunks the transfer thread may buffer ahead of the consumer.
const BODY_CHANNEL_DEPTH: usize = 2;

/// Status line and headers of a response.
#[derive(Debug)]
pub(crate) struct ResponseHead {
    pub status: u32,
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Length`, defaulting to 0 when absent or unparseable.
    pub fn content_length(&self) -> u64 {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

fn head_from_lines(lines: &[String]) -> ResponseHead {
    let mut status = 0;
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            status = line
                .split_whitespace()
                .nth(1)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    ResponseHead { status, headers }
}

/// Curl handler: collects header lines, hands the head over once the body
/// starts, and forwards body chunks to the consumer.
struct TransferHandler {
    lines: Vec<String>,
    head_tx: Option<SyncSender<Result<ResponseHead, curl::Error>>>,
    body_tx: Option<SyncSender<Result<Vec<u8>, curl::Error>>>,
}

impl Handler for TransferHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // A new status line starts a fresh header block (e.g. after an
            // interim 100 Continue).
            if line.starts_with("HTTP/") {
                self.lines.clear();
            }
            self.lines.push(line.to_string());
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if let Some(tx) = self.head_tx.take() {
            let _ = tx.send(Ok(head_from_lines(&self.lines)));
        }
        let delivered = match &self.body_tx {
            Some(tx) => tx.send(Ok(data.to_vec())).is_ok(),
            None => false,
        };
        if delivered {
            Ok(data.len())
        } else {
            // Consumer is gone: a short write aborts the transfer so the
            // connection closes.
            self.body_tx = None;
            Ok(0)
        }
    }
}

/// A live response: parsed head plus the lazily pulled body.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub(crate) head: ResponseHead,
    body: Option<Receiver<Result<Vec<u8>, curl::Error>>>,
    worker: Option<JoinHandle<()>>,
    error: Option<curl::Error>,
}

impl HttpResponse {
    /// Next body chunk, or `None` once exhausted. The first `None` also
    /// tears the transfer down. A transfer that fails mid-body ends the
    /// stream too; the error is kept for [`take_error`](Self::take_error).
    pub(crate) fn next_chunk(&mut self) -> Option<Vec<u8>> {
        let chunk = match self.body.as_ref().map(|rx| rx.recv()) {
            Some(Ok(Ok(chunk))) => Some(chunk),
            Some(Ok(Err(err))) => {
                self.error = Some(err);
                None
            }
            _ => None,
        };
        if chunk.is_none() {
            self.close();
        }
        chunk
    }

    /// Drains the remaining body into memory (token-mode metadata payloads
    /// are small).
    pub(crate) fn read_to_end(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    /// The error that cut the body short, if any. Populated once
    /// `next_chunk` has returned `None`; a clean end-of-stream leaves it
    /// empty.
    pub(crate) fn take_error(&mut self) -> Option<StoreError> {
        self.error.take().map(StoreError::Transfer)
    }

    /// Shuts the transfer down. Idempotent: dropping the chunk receiver makes
    /// the write callback abort, and joining the worker completes the
    /// connection teardown exactly once.
    pub(crate) fn close(&mut self) {
        self.body.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for HttpResponse {
    fn drop(&mut self) {
        self.close();
    }
}

/// Issues one request and blocks until the response head is available.
/// The body (if any) is left on the wire for the caller to pull.
pub(crate) fn send_request(
    url: &str,
    verb: Verb,
    token: Option<&str>,
    opts: &RequestOptions,
) -> Result<HttpResponse, StoreError> {
    let (head_tx, head_rx) = mpsc::sync_channel(1);
    let (body_tx, body_rx) = mpsc::sync_channel(BODY_CHANNEL_DEPTH);

    let handler = TransferHandler {
        lines: Vec::new(),
        head_tx: Some(head_tx),
        body_tx: Some(body_tx),
    };
    let mut easy = Easy2::new(handler);
    easy.url(url)?;
    easy.follow_location(false)?;
    if verb == Verb::Head {
        easy.nobody(true)?;
    }
    easy.buffer_size(opts.chunk_size)?;
    easy.connect_timeout(opts.connect_timeout)?;
    if let Some(timeout) = opts.request_timeout {
        easy.timeout(timeout)?;
    }
    if let Some(token) = token {
        let mut list = List::new();
        list.append(&format!("x-auth-token: {}", token.trim()))?;
        easy.http_headers(list)?;
    }

    let worker = thread::Builder::new()
        .name("objfetch-transfer".to_string())
        .spawn(move || {
            let result = easy.perform();
            let handler = easy.get_mut();
            if let Some(tx) = handler.head_tx.take() {
                // Body-less transfer (HEAD, empty body) or pre-body failure.
                let _ = tx.send(match result {
                    Ok(()) => Ok(head_from_lines(&handler.lines)),
                    Err(e) => Err(e),
                });
            } else if let Err(e) = result {
                // The head is already out, so a mid-body failure (reset,
                // timeout, short read) travels down the chunk channel. A
                // consumer-side abort has cleared body_tx and is not an
                // error.
                if let Some(tx) = handler.body_tx.take() {
                    tracing::debug!("transfer ended early: {}", e);
                    let _ = tx.send(Err(e));
                }
            }
            // body_tx drops here, ending the chunk stream.
        })?;

    let head = head_rx
        .recv()
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::Other,
                "transfer worker exited without a response",
            )
        })?
        .map_err(StoreError::Transfer)?;

    Ok(HttpResponse {
        head,
        body: Some(body_rx),
        worker: Some(worker),
        error: None,
    })
}
