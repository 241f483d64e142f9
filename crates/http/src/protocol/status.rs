//! Status line rendering.
//!
//! This module provides the fixed status-code reason-phrase table and the
//! protocol token used for the status line of a response. The table is the
//! classic 1xx-5xx set; codes outside it render with an empty reason phrase
//! but the status line is still emitted.

use http::StatusCode;
use std::fmt;

/// The protocol token written at the start of the status line.
///
/// Anything other than HTTP/1.0 or HTTP/1.1 reported by the host
/// environment falls back to HTTP/1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    Http10,
    #[default]
    Http11,
}

impl Protocol {
    /// Parses the protocol string reported by the host environment.
    pub fn from_ambient(value: &str) -> Self {
        match value {
            "HTTP/1.1" => Protocol::Http11,
            _ => Protocol::Http10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http10 => "HTTP/1.0",
            Protocol::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders the full status line, e.g. `HTTP/1.1 200 OK`.
///
/// Unknown codes keep their numeric value and get an empty reason phrase.
pub fn status_line(protocol: Protocol, code: StatusCode) -> String {
    format!("{} {} {}", protocol, code.as_u16(), reason_phrase(code))
}

/// Looks up the reason phrase for a status code.
///
/// Returns the empty string for codes outside the table.
pub fn reason_phrase(code: StatusCode) -> &'static str {
    match code.as_u16() {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 => "Reserved",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        426 => "Upgrade Required",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        510 => "Not Extended",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_reason_phrases() {
        assert_eq!(reason_phrase(StatusCode::OK), "OK");
        assert_eq!(reason_phrase(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(reason_phrase(StatusCode::from_u16(306).unwrap()), "Reserved");
        assert_eq!(reason_phrase(StatusCode::from_u16(507).unwrap()), "Insufficient Storage");
    }

    #[test]
    fn unknown_code_has_empty_reason() {
        assert_eq!(reason_phrase(StatusCode::from_u16(299).unwrap()), "");
    }

    #[test]
    fn status_line_rendering() {
        assert_eq!(status_line(Protocol::Http11, StatusCode::OK), "HTTP/1.1 200 OK");
        assert_eq!(status_line(Protocol::Http10, StatusCode::FOUND), "HTTP/1.0 302 Found");
        // unknown code still renders, reason phrase is empty
        assert_eq!(status_line(Protocol::Http11, StatusCode::from_u16(299).unwrap()), "HTTP/1.1 299 ");
    }

    #[test]
    fn ambient_protocol_fallback() {
        assert_eq!(Protocol::from_ambient("HTTP/1.1"), Protocol::Http11);
        assert_eq!(Protocol::from_ambient("HTTP/1.0"), Protocol::Http10);
        assert_eq!(Protocol::from_ambient("HTTP/2.0"), Protocol::Http10);
        assert_eq!(Protocol::from_ambient(""), Protocol::Http10);
    }
}
