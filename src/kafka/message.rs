//! Message envelope exchanged over the publishing pipeline topics.
//!
//! Messages on these topics carry their headers inside the payload using the
//! FT message framing:
//!
//! ```text
//! FTMSG/1.0
//! X-Request-Id: tid_123
//! Origin-System-Id: http://cmdb.ft.com/systems/pac
//!
//! {"uuid":"..."}
//! ```
//!
//! # Example
//!
//! ```rust
//! use annotation_mapper::kafka::FtMessage;
//!
//! let raw = "FTMSG/1.0\nX-Request-Id: tid_1\n\n{\"uuid\":\"u1\"}";
//! let message = FtMessage::parse(raw);
//! assert_eq!(message.header("X-Request-Id"), "tid_1");
//! assert_eq!(message.body, "{\"uuid\":\"u1\"}");
//! ```

use std::collections::BTreeMap;

/// First line of every framed message.
pub const FT_MESSAGE_PREAMBLE: &str = "FTMSG/1.0";

/// A message as seen by handlers and producers: string headers plus a UTF-8 body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FtMessage {
    /// Message headers keyed by name.
    pub headers: BTreeMap<String, String>,

    /// Message body.
    pub body: String,
}

impl FtMessage {
    /// Creates a message from headers and a body.
    pub fn new(headers: BTreeMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Returns a header value, or the empty string when it is absent.
    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name).map(String::as_str).unwrap_or("")
    }

    /// Renders the framed wire representation.
    pub fn build(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 64 * (self.headers.len() + 1));
        out.push_str(FT_MESSAGE_PREAMBLE);
        out.push('\n');
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out
    }

    /// Parses the framed wire representation.
    ///
    /// Both `\n` and `\r\n` line endings are accepted in the header block.
    /// Header lines without a colon are ignored. A payload that does not
    /// start with the preamble is taken as a bare body with no headers.
    pub fn parse(raw: &str) -> Self {
        let Some(rest) = raw
            .strip_prefix(FT_MESSAGE_PREAMBLE)
            .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
        else {
            return Self::new(BTreeMap::new(), raw);
        };

        let mut headers = BTreeMap::new();
        let mut remaining = rest;

        while !remaining.is_empty() {
            let (line, tail) = remaining.split_once('\n').unwrap_or((remaining, ""));
            remaining = tail;

            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }

            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        Self::new(headers, remaining)
    }
}
