//! Response representation shared by the network, cache and synthetic paths.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the header carrying the capture timestamp of a response.
pub const DATE_HEADER: &str = "date";

/// An HTTP response as seen by the edge cache.
///
/// Headers are kept as ordered name/value pairs; lookups are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl EdgeResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Build a locally generated plain-text response (never cached).
    pub fn synthetic(status: u16, body: &'static str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "text/plain; charset=utf-8".to_string())],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with a single `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// HTTP 200 exactly.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Capture timestamp parsed from the `Date` header.
    ///
    /// Accepts HTTP-date (RFC 2822 form) and RFC 3339; anything else is `None`.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.header(DATE_HEADER)?.trim();
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Ensure a capture timestamp is present, stamping `now` if it is missing.
    pub fn stamp_if_missing(&mut self, now: DateTime<Utc>) {
        if self.header(DATE_HEADER).is_none() {
            self.set_header(DATE_HEADER, now.to_rfc2822());
        }
    }
}
