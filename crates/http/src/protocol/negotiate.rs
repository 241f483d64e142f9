//! Accept header negotiation.
//!
//! Matching is deliberately simple: the header value is split on commas and
//! each token is compared for exact equality against the allowed table, by
//! short name or by MIME value, first match wins. There is no RFC 7231
//! quality-weight parsing, no wildcard expansion and no token trimming.
//! Finding no match is not an error; the composer falls back to its
//! configured default type.

use crate::protocol::media::ContentTypeTable;
use http::HeaderMap;
use http::header::{ACCEPT, ACCEPT_ENCODING};

use super::header;

/// Returns a raw header value unmodified, if present.
pub fn raw<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header::get(headers, name)
}

/// Literal substring search within a header value.
pub fn contains(headers: &HeaderMap, name: &str, needle: &str) -> bool {
    header::get(headers, name).is_some_and(|value| value.contains(needle))
}

/// Negotiates the `Accept` header against the allowed table.
///
/// Returns the short name of the first CSV token found in the table, or
/// `None` when the header is absent or nothing matches.
pub fn accept(headers: &HeaderMap, table: &ContentTypeTable) -> Option<&'static str> {
    let value = header::get(headers, ACCEPT.as_str())?;
    value.split(',').find_map(|token| table.resolve(token))
}

/// The raw `Accept` header value, if present.
pub fn accept_raw(headers: &HeaderMap) -> Option<&str> {
    header::get(headers, ACCEPT.as_str())
}

/// Whether the `Accept-Encoding` header mentions the given encoding.
pub fn accepts_encoding(headers: &HeaderMap, encoding: &str) -> bool {
    contains(headers, ACCEPT_ENCODING.as_str(), encoding)
}

/// The raw `Accept-Encoding` header value, if present.
pub fn accept_encoding_raw(headers: &HeaderMap) -> Option<&str> {
    header::get(headers, ACCEPT_ENCODING.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(accept: Option<&str>, encoding: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(accept) = accept {
            map.insert(ACCEPT, HeaderValue::from_str(accept).unwrap());
        }
        if let Some(encoding) = encoding {
            map.insert(ACCEPT_ENCODING, HeaderValue::from_str(encoding).unwrap());
        }
        map
    }

    #[test]
    fn first_csv_token_in_table_wins() {
        let table = ContentTypeTable::default();
        let headers = headers(Some("application/json,text/html"), None);
        assert_eq!(accept(&headers, &table), Some("json"));
    }

    #[test]
    fn short_names_match_too() {
        let table = ContentTypeTable::default();
        let headers = headers(Some("jsonp,application/json"), None);
        assert_eq!(accept(&headers, &table), Some("jsonp"));
    }

    #[test]
    fn no_token_in_table_is_none() {
        let table = ContentTypeTable::default();
        let headers = headers(Some("image/png,image/webp"), None);
        assert_eq!(accept(&headers, &table), None);
    }

    #[test]
    fn absent_header_is_none() {
        let table = ContentTypeTable::default();
        assert_eq!(accept(&headers(None, None), &table), None);
        assert_eq!(accept_raw(&headers(None, None)), None);
    }

    #[test]
    fn tokens_are_not_trimmed() {
        // the original matching scheme compares tokens verbatim; a space
        // after the comma prevents the match
        let table = ContentTypeTable::default();
        let headers = headers(Some("image/png, text/html"), None);
        assert_eq!(accept(&headers, &table), None);
    }

    #[test]
    fn raw_passthrough() {
        let headers = headers(Some("application/json, text/html"), None);
        assert_eq!(accept_raw(&headers), Some("application/json, text/html"));
    }

    #[test]
    fn encoding_substring_search() {
        let headers = headers(None, Some("gzip, deflate, br"));
        assert!(accepts_encoding(&headers, "gzip"));
        assert!(accepts_encoding(&headers, "br"));
        assert!(!accepts_encoding(&headers, "zstd"));
        assert_eq!(accept_encoding_raw(&headers), Some("gzip, deflate, br"));

        let empty = HeaderMap::new();
        assert!(!accepts_encoding(&empty, "gzip"));
        assert_eq!(accept_encoding_raw(&empty), None);
    }
}
