//! Connection persistence decision.
//!
//! # Responsibilities
//! - Decide from a parsed request whether the client connection should
//!   close once the response has been relayed
//!
//! # Design Decisions
//! - Only the version token and the exact-case `Connection` header feed
//!   the decision. HTTP/1.1 persists unless the client opts out;
//!   HTTP/1.0 closes unless the client opts in. Anything else closes.

use crate::http::request::Request;

/// Whether the client connection should close after this request's
/// response has been relayed.
pub fn should_close(request: &Request) -> bool {
    let connection = request.header("Connection");

    // HTTP/1.1 defaults to persistent connections.
    if request.version() == "HTTP/1.1" && connection != Some("close") {
        return false;
    }

    // HTTP/1.0 persists only on an explicit opt-in.
    !(request.version() == "HTTP/1.0" && connection == Some("keep-alive"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: &str, connection: Option<&str>) -> Request {
        let mut request = Request::new();
        request.version = version.to_string();
        if let Some(value) = connection {
            request
                .headers
                .insert("Connection".to_string(), value.to_string());
        }
        request
    }

    #[test]
    fn test_http11_defaults_to_keep_alive() {
        assert!(!should_close(&request("HTTP/1.1", None)));
    }

    #[test]
    fn test_http11_explicit_close() {
        assert!(should_close(&request("HTTP/1.1", Some("close"))));
    }

    #[test]
    fn test_http11_explicit_keep_alive() {
        assert!(!should_close(&request("HTTP/1.1", Some("keep-alive"))));
    }

    #[test]
    fn test_http10_defaults_to_close() {
        assert!(should_close(&request("HTTP/1.0", None)));
    }

    #[test]
    fn test_http10_explicit_keep_alive() {
        assert!(!should_close(&request("HTTP/1.0", Some("keep-alive"))));
    }

    #[test]
    fn test_http10_explicit_close() {
        assert!(should_close(&request("HTTP/1.0", Some("close"))));
    }

    #[test]
    fn test_unknown_version_closes() {
        assert!(should_close(&request("HTTP/2.0", None)));
        assert!(should_close(&request("HTTP/2.0", Some("keep-alive"))));
    }

    #[test]
    fn test_connection_value_is_case_sensitive() {
        // "Close" is not "close": the HTTP/1.1 default applies.
        assert!(!should_close(&request("HTTP/1.1", Some("Close"))));
        // "Keep-Alive" is not "keep-alive": the HTTP/1.0 default applies.
        assert!(should_close(&request("HTTP/1.0", Some("Keep-Alive"))));
    }
}
