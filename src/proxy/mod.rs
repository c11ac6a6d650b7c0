//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! net::Listener (accepted connection)
//!     → server.rs (spawn session task)
//!     → session.rs (request cycles: parse, forward, relay response)
//!     → http (parser + keep-alive decision)
//! ```
//!
//! # Design Decisions
//! - Sessions own their client stream; nothing is shared between tasks
//! - The server owns shutdown: sessions finish their cycle naturally

pub mod server;
pub mod session;

pub use server::{RelayServer, ServerError};
pub use session::{ProxySession, SessionError};
