//! HTTP Relay Library
//!
//! A forward/reverse HTTP relay: accepts client connections, parses
//! HTTP/1.x requests incrementally while forwarding the bytes verbatim
//! to a single upstream, relays the response back, and keeps the client
//! connection alive per HTTP semantics.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;

pub use config::RelayConfig;
pub use http::{ParseError, ParserState, Request, RequestParser};
pub use lifecycle::Shutdown;
pub use proxy::{ProxySession, RelayServer};
