//! Incremental HTTP/1.x request parser.
//!
//! # Responsibilities
//! - Accept request bytes in arbitrarily sized chunks and resume cleanly
//!   across chunk boundaries
//! - Track framing state explicitly so callers can tell "need more input"
//!   apart from "request complete"
//! - Enforce Content-Length framing while leaving any trailing bytes in
//!   the buffer unconsumed
//!
//! # Design Decisions
//! - A parse call that runs out of input returns `Ok(())` and parks the
//!   parser in its current state; only malformed input is an error. This
//!   keeps the chunk-boundary contract simple: feeding a request in N
//!   chunks produces exactly the same result as feeding it in one.
//! - Lines are decoded lossily. The relay forwards raw bytes verbatim, so
//!   the parsed view only needs to be good enough for framing decisions,
//!   and lossy decoding keeps the error set closed.
//! - The body policy runs exactly once per parse call, on entry to the
//!   body state. A request with no Content-Length takes whatever is
//!   buffered at that moment, which for a bodyless request is nothing.
//!
//! # Data Flow
//! ```text
//! chunk --> accumulation buffer --> [RequestLine] --> [Headers] --> [Body] --> [Done]
//!                                        |                |            |
//!                                   method/path/      header map   body bytes
//!                                   version           + declared
//!                                                     length
//! ```

use bytes::BytesMut;
use thiserror::Error;

use crate::http::request::Request;

/// Errors produced by [`RequestParser::parse`].
///
/// Every variant means the input is malformed and the parser should be
/// discarded; running out of input is not an error.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The request line held fewer than the method, path and version tokens.
    #[error("malformed request line")]
    MalformedRequestLine,

    /// A header line carried no colon separator.
    #[error("malformed header line")]
    MalformedHeaderLine,

    /// A Content-Length header value failed to parse as a non-negative
    /// integer.
    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),
}

/// Where the parser currently is in the request grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for the full request line.
    RequestLine,

    /// Consuming header lines until the blank separator line.
    Headers,

    /// Waiting for the declared body length, or capturing an undeclared
    /// body from whatever is buffered.
    Body,

    /// The request is complete; further input is ignored.
    Done,
}

/// Incremental parser for a single HTTP/1.x request.
///
/// Feed chunks with [`parse`](Self::parse) until [`is_done`](Self::is_done)
/// reports completion, then take the result with
/// [`into_request`](Self::into_request). One parser handles one request;
/// sessions build a fresh parser per request cycle.
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    buffer: BytesMut,
    request: Request,
    declared_body_length: Option<usize>,
}

impl RequestParser {
    /// A parser ready for the first chunk of a request.
    pub fn new() -> Self {
        Self {
            state: ParserState::RequestLine,
            buffer: BytesMut::new(),
            request: Request::new(),
            declared_body_length: None,
        }
    }

    /// Feed one chunk of request bytes.
    ///
    /// Advances through as many states as the buffered input allows and
    /// then returns `Ok(())`, leaving the parser parked where input ran
    /// out. Errors are terminal: the request is malformed and none of the
    /// chunk should be forwarded.
    pub fn parse(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        self.buffer.extend_from_slice(chunk);

        loop {
            match self.state {
                ParserState::RequestLine => {
                    let Some(line) = self.take_line() else {
                        return Ok(());
                    };
                    self.parse_request_line(&line)?;
                    self.state = ParserState::Headers;
                }
                ParserState::Headers => {
                    let Some(line) = self.take_line() else {
                        return Ok(());
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        self.state = ParserState::Body;
                    } else {
                        self.parse_header_line(line)?;
                    }
                }
                ParserState::Body => {
                    self.consume_body();
                    return Ok(());
                }
                ParserState::Done => return Ok(()),
            }
        }
    }

    /// Current position in the request grammar.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Whether a complete request has been parsed.
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Hand over the parsed request.
    ///
    /// Meaningful once [`is_done`](Self::is_done) returns true; called
    /// earlier it yields whatever fields have been filled in so far.
    pub fn into_request(self) -> Request {
        self.request
    }

    /// Remove one `\n`-terminated line from the buffer, or report that no
    /// complete line is available yet.
    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&byte| byte == b'\n')?;
        let line = self.buffer.split_to(end + 1);
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn parse_request_line(&mut self, line: &str) -> Result<(), ParseError> {
        // Three tokens are required; anything after them is ignored.
        let mut tokens = line.split_whitespace();
        let (Some(method), Some(path), Some(version)) =
            (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ParseError::MalformedRequestLine);
        };

        self.request.method = method.to_string();
        self.request.path = path.to_string();
        self.request.version = version.to_string();
        Ok(())
    }

    fn parse_header_line(&mut self, line: &str) -> Result<(), ParseError> {
        let Some(separator) = line.find(':') else {
            return Err(ParseError::MalformedHeaderLine);
        };

        let name = line[..separator].trim();
        let value = line[separator + 1..].trim();
        self.request
            .headers
            .insert(name.to_string(), value.to_string());

        if name == "Content-Length" {
            let length = value
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(value.to_string()))?;
            self.declared_body_length = Some(length);
        }
        Ok(())
    }

    /// Apply the body policy once: wait out a declared length, or capture
    /// whatever is buffered when no length was declared.
    fn consume_body(&mut self) {
        match self.declared_body_length {
            Some(length) if length > 0 => {
                if self.buffer.len() >= length {
                    self.request.body = Some(self.buffer.split_to(length).freeze());
                    self.state = ParserState::Done;
                }
                // Not enough buffered yet: stay in Body and wait for the
                // next chunk.
            }
            Some(_) => {
                // Content-Length: 0 declares no body.
                self.state = ParserState::Done;
            }
            None => {
                if !self.buffer.is_empty() {
                    self.request.body = Some(self.buffer.split().freeze());
                }
                self.state = ParserState::Done;
            }
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}
