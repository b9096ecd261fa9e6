//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body at `/object`, an optional redirect chain at
//! `/r/{n}`, and a token metadata endpoint at `/meta` that requires an
//! `x-auth-token` header on a GET and answers with a configurable payload.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct HttpServerOptions {
    /// Number of redirect responses before `/r/0` reaches `/object`.
    pub redirect_hops: u32,
    /// Status used for redirect responses (301/302 are the valid ones).
    pub redirect_status: u16,
    /// Status for the `/object` response.
    pub object_status: u16,
    /// Attach a Location header to the final `/object` response (an invalid
    /// status/header combination when `object_status` is 200).
    pub location_on_object: bool,
    /// Expected `x-auth-token` value for `/meta` plus the body it returns.
    pub token: Option<(String, String)>,
    /// Declare the full body length on `/object` but close the connection
    /// after this many bytes.
    pub truncate_body_at: Option<usize>,
}

impl Default for HttpServerOptions {
    fn default() -> Self {
        Self {
            redirect_hops: 0,
            redirect_status: 302,
            object_status: 200,
            location_on_object: false,
            token: None,
            truncate_body_at: None,
        }
    }
}

/// Starts a server in a background thread serving `body`. Returns the base
/// URL without a trailing slash (e.g. "http://127.0.0.1:12345"). The server
/// runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, HttpServerOptions::default())
}

/// Like `start` but with custom redirect/status/token behavior.
pub fn start_with_options(body: Vec<u8>, opts: HttpServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{port}");
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    let server_base = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            let base = server_base.clone();
            thread::spawn(move || handle(stream, &body, &opts, &base));
        }
    });
    base
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: &HttpServerOptions, base: &str) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, auth_token) = parse_request(request);
    let head_only = method.eq_ignore_ascii_case("HEAD");

    if let Some(hop) = path.strip_prefix("/r/") {
        let n: u32 = hop.parse().unwrap_or(0);
        let target = if n + 1 < opts.redirect_hops {
            format!("{base}/r/{}", n + 1)
        } else {
            format!("{base}/object")
        };
        respond(
            &mut stream,
            opts.redirect_status,
            &[("Location", target.as_str())],
            b"",
            head_only,
        );
        return;
    }

    if path == "/meta" {
        match &opts.token {
            Some((expected, payload))
                if method.eq_ignore_ascii_case("GET")
                    && auth_token.as_deref() == Some(expected.as_str()) =>
            {
                respond(&mut stream, 200, &[], payload.as_bytes(), false);
            }
            _ => {
                respond(&mut stream, 400, &[], b"bad token request", false);
            }
        }
        return;
    }

    // Everything else is the object itself.
    if opts.object_status != 200 {
        respond(&mut stream, opts.object_status, &[], b"", head_only);
        return;
    }
    if let Some(sent) = opts.truncate_body_at {
        if head_only {
            respond(&mut stream, 200, &[], body, true);
        } else {
            respond_truncated(&mut stream, body, sent);
        }
        return;
    }
    if opts.location_on_object {
        let target = format!("{base}/elsewhere");
        respond(
            &mut stream,
            200,
            &[("Location", target.as_str())],
            body,
            head_only,
        );
        return;
    }
    respond(&mut stream, 200, &[], body, head_only);
}

fn respond(
    stream: &mut std::net::TcpStream,
    status: u16,
    extra_headers: &[(&str, &str)],
    body: &[u8],
    head_only: bool,
) {
    let reason = match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        reason,
        body.len()
    );
    for (name, value) in extra_headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    if !head_only {
        let _ = stream.write_all(body);
    }
}

/// Declares the full body length, writes only a prefix of it, and drops the
/// connection.
fn respond_truncated(stream: &mut std::net::TcpStream, body: &[u8], sent: usize) {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body[..sent.min(body.len())]);
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

/// Returns (method, path, x-auth-token value).
fn parse_request(request: &str) -> (String, String, Option<String>) {
    let mut method = String::new();
    let mut path = String::new();
    let mut auth_token = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("").to_string();
            path = parts.next().unwrap_or("").to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("x-auth-token") {
                auth_token = Some(value.trim().to_string());
            }
        }
    }
    (method, path, auth_token)
}
