//! Parsed request representation.
//!
//! # Responsibilities
//! - Hold the framing-relevant fields of one HTTP/1.x request
//! - Preserve header names and values exactly as received
//! - Expose read access once parsing has handed the value over

use std::collections::HashMap;

use bytes::Bytes;

/// The framing-relevant fields of one parsed HTTP request.
///
/// Built incrementally by [`RequestParser`](crate::http::RequestParser),
/// which owns the value exclusively until parsing completes and then hands
/// it to the caller by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Method token, e.g. `GET`. Set once, from the request line.
    pub(crate) method: String,

    /// Request target exactly as received, e.g. `/index.html`.
    pub(crate) path: String,

    /// Version token, e.g. `HTTP/1.1`, with the trailing carriage return
    /// already stripped.
    pub(crate) version: String,

    /// Header fields, names exactly as received (no case folding).
    /// Last write wins on duplicate names.
    pub(crate) headers: HashMap<String, String>,

    /// Body bytes, present only when the body policy captured some.
    pub(crate) body: Option<Bytes>,
}

impl Request {
    /// An empty request for the parser to fill in.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The method token.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The version token, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up a header by its exact name.
    ///
    /// No case folding: `Connection` and `connection` are distinct names,
    /// matching how the relay frames what it forwards untouched.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// All header fields, in no particular order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The body, if one was captured during parsing.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }
}
