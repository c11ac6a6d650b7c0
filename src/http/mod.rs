//! HTTP/1.x request handling.
//!
//! # Responsibilities
//! - Parse request bytes incrementally into a structured [`Request`]
//! - Decide connection persistence from the parsed request
//!
//! # Data Flow
//! ```text
//! client chunks --> RequestParser --> Request --> should_close()
//!                        |                             |
//!                   framing state                 close / persist
//! ```

pub mod keep_alive;
pub mod parser;
pub mod request;

pub use keep_alive::should_close;
pub use parser::{ParseError, ParserState, RequestParser};
pub use request::Request;
