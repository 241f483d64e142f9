//! Request header normalization and response header lists.
//!
//! Incoming requests describe their headers in one of two raw shapes: a
//! CGI/environ-style map (`HTTP_ACCEPT_ENCODING=gzip` mixed with server
//! noise) or an already parsed header map with inconsistent casing.
//! [`normalize`] folds either shape into a canonical [`http::HeaderMap`]
//! whose keys are lowercase and dash-separated.
//!
//! The normalized map belongs to exactly one request and lives only as long
//! as that request. It must never be memoized process-wide: a long-lived
//! server handling many requests would leak headers from one request into
//! the next.
//!
//! Outgoing headers use [`HeaderList`] instead, which keeps the exact names
//! and insertion order the handler chose.

use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

/// Environ fields that are request headers despite missing the `HTTP_`
/// prefix.
const UNPREFIXED_FIELDS: [&str; 7] = [
    "content-type",
    "content-length",
    "content-md5",
    "auth-user",
    "auth-pw",
    "auth-digest",
    "auth-type",
];

/// A raw, per-request header source.
#[derive(Debug)]
pub enum HeaderSource<I> {
    /// CGI/environ-style map: `HTTP_`-prefixed header fields mixed with
    /// non-header server variables (`QUERY_STRING`, `SERVER_NAME`, ...).
    Environ(I),
    /// An already parsed header map, possibly case/underscore inconsistent.
    Headers(I),
}

/// Normalizes a raw header source into a canonical header map.
///
/// Keys are lowercased with underscores converted to dashes. For environ
/// sources the `HTTP_` prefix is stripped and non-header variables are
/// dropped, except for the fixed allowlist of unprefixed header fields.
/// The last value wins when two raw keys collapse onto the same canonical
/// name. Keys that cannot form a valid header name are skipped, never an
/// error.
pub fn normalize<I, K, V>(source: HeaderSource<I>) -> HeaderMap
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();

    match source {
        HeaderSource::Environ(fields) => {
            for (key, value) in fields {
                let canonical = canonical_key(key.as_ref());
                if let Some(name) = canonical.strip_prefix("http-") {
                    insert(&mut headers, name, value.as_ref());
                } else if UNPREFIXED_FIELDS.contains(&canonical.as_str()) {
                    insert(&mut headers, &canonical, value.as_ref());
                }
            }
        }
        HeaderSource::Headers(fields) => {
            for (key, value) in fields {
                let canonical = canonical_key(key.as_ref());
                insert(&mut headers, &canonical, value.as_ref());
            }
        }
    }

    headers
}

/// Returns a request header value as a string, if present and readable.
pub fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn canonical_key(raw: &str) -> String {
    raw.to_ascii_lowercase().replace('_', "-")
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => {
            // last value wins on duplicate canonical keys
            headers.insert(name, value);
        }
        _ => trace!(field = name, "skipping malformed header field"),
    }
}

/// An insertion-ordered, case-sensitive header list for responses.
///
/// Names are kept exactly as the handler wrote them and lookups are
/// exact-match. A name appears at most once: [`HeaderList::set`] replaces
/// in place, [`HeaderList::add`] preserves an existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    fields: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sets a field, replacing an existing value without moving its
    /// position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Sets a field only when no value exists for the name yet.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.fields.push((name, value.into()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Removes a field, returning its value when it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Iterates name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
