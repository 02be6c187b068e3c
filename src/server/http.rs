//! Minimal HTTP/1.1 handling for the socket channel
//!
//! One request per connection. Requests are capped at
//! [`MAX_REQUEST_BYTES`]; the connection is closed after the response.

use crate::context::{BridgeContext, BridgeStatus};
use crate::memory::AttachedProcess;
use crate::server::command::parse_grant_body;
use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::warn;

/// Upper bound on request line, headers and body together
pub const MAX_REQUEST_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Request exceeds 4096 bytes")]
    TooLarge,

    #[error("Malformed request: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    success: bool,
    message: &'a str,
}

#[derive(Serialize)]
struct StatusBody {
    success: bool,
    #[serde(flatten)]
    status: BridgeStatus,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => HttpResponse { status, body },
            Err(e) => HttpResponse {
                status: 500,
                body: format!(
                    "{{\"success\":false,\"message\":\"Serialization failed: {}\"}}",
                    e.to_string().replace('"', "'")
                ),
            },
        }
    }

    pub fn message(status: u16, success: bool, message: &str) -> Self {
        Self::json(status, &MessageBody { success, message })
    }

    fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }

    /// Serialize as a complete HTTP response
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            self.status,
            self.status_text(),
            self.body.len()
        )?;
        writer.write_all(self.body.as_bytes())?;
        writer.flush()
    }
}

/// Read one request, bounded by [`MAX_REQUEST_BYTES`]
pub fn read_request<R: Read>(reader: &mut R) -> Result<HttpRequest, HttpError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        if buffer.len() >= MAX_REQUEST_BYTES {
            return Err(HttpError::TooLarge);
        }
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Err(HttpError::Malformed(
                "Connection closed before end of headers".to_string(),
            ));
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buffer[..header_end])
        .map_err(|_| HttpError::Malformed("Headers are not UTF-8".to_string()))?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(_version)) => (
            method.to_string(),
            target.split('?').next().unwrap_or(target).to_string(),
        ),
        _ => {
            return Err(HttpError::Malformed(format!(
                "Invalid request line: {}",
                request_line
            )))
        }
    };

    let mut content_length = None;
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                let length = value.trim().parse::<usize>().map_err(|_| {
                    HttpError::Malformed(format!("Invalid Content-Length: {}", value.trim()))
                })?;
                content_length = Some(length);
            }
        }
    }

    let body_start = header_end + 4;
    // Without Content-Length the body is whatever arrived with the headers
    let total = match content_length {
        Some(length) => body_start.checked_add(length).ok_or(HttpError::TooLarge)?,
        None => buffer.len(),
    };
    if total > MAX_REQUEST_BYTES {
        return Err(HttpError::TooLarge);
    }

    while buffer.len() < total {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Err(HttpError::Malformed("Truncated body".to_string()));
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buffer[body_start..total]).into_owned();

    Ok(HttpRequest { method, path, body })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Route a parsed request against the bridge
pub fn handle_request<P: AttachedProcess>(
    context: &BridgeContext<P>,
    request: &HttpRequest,
) -> HttpResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/give_item") => give_item(context, &request.body),
        ("GET", "/status") => HttpResponse::json(
            200,
            &StatusBody {
                success: true,
                status: context.status(),
            },
        ),
        _ => HttpResponse::message(404, false, "Not found"),
    }
}

fn give_item<P: AttachedProcess>(context: &BridgeContext<P>, body: &str) -> HttpResponse {
    let request = match parse_grant_body(body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected give_item body {:?}: {}", body, e);
            return HttpResponse::message(400, false, &e.to_string());
        }
    };

    match context.grant_item(request) {
        Ok(_) => HttpResponse::message(200, true, "Item granted"),
        Err(e) => HttpResponse::message(500, false, &format!("Failed to grant item: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Address;
    use crate::inventory::InventoryLayout;
    use crate::memory::{ProcessMemory, SnapshotMemory};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: body.to_string(),
        }
    }

    fn attached_context() -> BridgeContext<SnapshotMemory> {
        let ctx = BridgeContext::new(InventoryLayout::default());
        let session = ctx.attach(SnapshotMemory::builder().pid(9).zeroed(0x8000, 0x20).build());
        session.set_pointer(Address::new(0x8000)).unwrap();
        ctx
    }

    #[test]
    fn test_read_request_with_body() {
        let raw = concat!(
            "POST /give_item?x=1 HTTP/1.1\r\n",
            "Host: localhost\r\n",
            "content-length: 18\r\n\r\n",
            "{\"id\":100,\"qty\":5}"
        );
        let parsed = read_request(&mut Cursor::new(raw.as_bytes())).unwrap();
        assert_eq!(parsed, request("POST", "/give_item", r#"{"id":100,"qty":5}"#));
    }

    #[test]
    fn test_read_request_without_body() {
        let raw = "GET /status HTTP/1.1\r\n\r\n";
        let parsed = read_request(&mut Cursor::new(raw.as_bytes())).unwrap();
        assert_eq!(parsed, request("GET", "/status", ""));
    }

    /// Delivers at most a few bytes per read, like a slow client
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.0.len()).min(7);
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_request_body_in_pieces() {
        let raw = b"POST /give_item HTTP/1.1\r\nContent-Length: 18\r\n\r\n{\"id\":100,\"qty\":5}";
        let parsed = read_request(&mut Trickle(raw)).unwrap();
        assert_eq!(parsed, request("POST", "/give_item", r#"{"id":100,"qty":5}"#));
    }

    #[test]
    fn test_read_request_body_without_length() {
        let raw = "POST /give_item HTTP/1.1\r\nHost: localhost\r\n\r\n{\"id\":100,\"qty\":5}";
        let parsed = read_request(&mut Cursor::new(raw.as_bytes())).unwrap();
        assert_eq!(parsed, request("POST", "/give_item", r#"{"id":100,"qty":5}"#));

        let ctx = attached_context();
        let session = ctx.session().unwrap();
        session.target().write_i32(Address::new(0x800C), 10).unwrap();
        let response = handle_request(&ctx, &parsed);
        assert_eq!(response.status, 200);
        assert_eq!(session.target().read_i32(Address::new(0x800C)).unwrap(), 15);
        assert_eq!(session.target().read_i32(Address::new(0x8008)).unwrap(), 100);
    }

    #[test]
    fn test_read_request_limits() {
        let huge = format!("GET /{} HTTP/1.1\r\n", "a".repeat(MAX_REQUEST_BYTES));
        assert!(matches!(
            read_request(&mut Cursor::new(huge.into_bytes())),
            Err(HttpError::TooLarge)
        ));

        let claimed = "POST /give_item HTTP/1.1\r\nContent-Length: 999999\r\n\r\n{}";
        assert!(matches!(
            read_request(&mut Cursor::new(claimed.as_bytes())),
            Err(HttpError::TooLarge)
        ));

        let truncated = "POST /give_item HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}";
        assert!(matches!(
            read_request(&mut Cursor::new(truncated.as_bytes())),
            Err(HttpError::Malformed(_))
        ));

        assert!(matches!(
            read_request(&mut Cursor::new(b"garbage\r\n\r\n".to_vec())),
            Err(HttpError::Malformed(_))
        ));
    }

    #[test]
    fn test_give_item_route() {
        let ctx = attached_context();
        let session = ctx.session().unwrap();
        session.target().write_i32(Address::new(0x800C), 10).unwrap();

        let body = r#"{"id":100,"qty":5}"#;
        let response = handle_request(&ctx, &request("POST", "/give_item", body));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"success":true,"message":"Item granted"}"#);
        assert_eq!(session.target().read_i32(Address::new(0x800C)).unwrap(), 15);
    }

    #[test]
    fn test_give_item_errors() {
        let ctx = attached_context();
        assert_eq!(
            handle_request(&ctx, &request("POST", "/give_item", "not json")).status,
            400
        );
        assert_eq!(
            handle_request(&ctx, &request("POST", "/give_item", r#"{"id":-1,"qty":5}"#)).status,
            400
        );

        let unattached: BridgeContext<SnapshotMemory> =
            BridgeContext::new(InventoryLayout::default());
        let body = r#"{"id":1,"qty":1}"#;
        let response = handle_request(&unattached, &request("POST", "/give_item", body));
        assert_eq!(response.status, 500);
        assert!(response.body.starts_with(r#"{"success":false,"message":"Failed to grant item"#));
    }

    #[test]
    fn test_status_and_unknown_routes() {
        let ctx = attached_context();
        let response = handle_request(&ctx, &request("GET", "/status", ""));
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            r#"{"success":true,"running":true,"pid":9,"inventoryPtr":"0x8000"}"#
        );

        assert_eq!(handle_request(&ctx, &request("GET", "/nope", "")).status, 404);
        assert_eq!(handle_request(&ctx, &request("GET", "/give_item", "")).status, 404);
    }

    #[test]
    fn test_write_response() {
        let mut out = Vec::new();
        HttpResponse::message(404, false, "Not found")
            .write_to(&mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"success\":false,\"message\":\"Not found\"}"));
    }
}
