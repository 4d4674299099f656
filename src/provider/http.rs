//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::PilotError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall request timeout: a streamed turn lasts as long as the model
/// keeps talking. Only connection setup is bounded.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            })
    })
}

/// Build default headers for a Bearer-token API that answers with SSE.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Outcome of one SSE line.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine<'a> {
    Data(&'a str),
    Done,
    Ignored,
}

/// Classify an SSE line. Comments, blank lines and non-data fields are ignored.
pub fn parse_sse_line(line: &str) -> SseLine<'_> {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        SseLine::Done
    } else if data.is_empty() {
        SseLine::Ignored
    } else {
        SseLine::Data(data)
    }
}

/// Splits a byte stream into lines.
///
/// Bytes are held until a full line has arrived, so a multi-byte character
/// split across network reads is decoded intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line, trimmed, or `None` until more bytes arrive.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.bytes.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=end).collect();
        let text = match std::str::from_utf8(&line[..end]) {
            Ok(text) => text.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "invalid UTF-8 in SSE line");
                String::from_utf8_lossy(&line[..end]).into_owned()
            }
        };
        Some(text.trim().to_string())
    }
}

/// Map a non-success HTTP status to a typed error.
pub fn status_to_error(status: u16, body: &str) -> PilotError {
    match status {
        401 | 403 => PilotError::Authentication(body.to_string()),
        429 => PilotError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => PilotError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    // Try to parse retry-after from JSON error body
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_lines_are_classified() {
        assert_eq!(parse_sse_line("data: {\"a\":1}"), SseLine::Data("{\"a\":1}"));
        assert_eq!(parse_sse_line("data:{}"), SseLine::Data("{}"));
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Ignored);
        assert_eq!(parse_sse_line("event: message"), SseLine::Ignored);
    }

    #[test]
    fn line_buffer_keeps_split_characters_intact() {
        let line = "data: {\"content\":\"café\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut buffer = LineBuffer::new();
        buffer.push(&line[..split]);
        assert_eq!(buffer.next_line(), None);
        buffer.push(&line[split..]);
        assert_eq!(
            buffer.next_line().as_deref(),
            Some("data: {\"content\":\"café\"}")
        );
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn line_buffer_yields_every_line_in_a_chunk() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: a\r\n\ndata: b\ndata: c");
        assert_eq!(buffer.next_line().as_deref(), Some("data: a"));
        assert_eq!(buffer.next_line().as_deref(), Some(""));
        assert_eq!(buffer.next_line().as_deref(), Some("data: b"));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn statuses_map_to_error_kinds() {
        assert!(matches!(status_to_error(401, "no"), PilotError::Authentication(_)));
        assert!(matches!(
            status_to_error(429, r#"{"error":{"retry_after":1.5}}"#),
            PilotError::RateLimited { retry_after_ms: Some(1500) }
        ));
        assert!(matches!(status_to_error(500, "boom"), PilotError::Api { status: 500, .. }));
    }
}
