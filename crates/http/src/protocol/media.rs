//! Media type short names.
//!
//! Handlers and negotiation work with terse short names (`json`, `html`)
//! that map onto full MIME strings. The registry here is a fixed lookup
//! table; [`ContentTypeTable`] is the smaller, ordered set of types a
//! response is actually allowed to negotiate.

pub const JSON: &str = "application/json";
pub const JS: &str = "text/javascript";
pub const XML: &str = "text/xml";
pub const HTML: &str = "text/html";
pub const XHTML: &str = "application/html+xml";
pub const CSV: &str = "text/csv";
pub const TEXT: &str = "text/plain";
pub const FORM: &str = "application/x-www-form-urlencoded";
pub const UPLOAD: &str = "multipart/form-data";

const REGISTRY: [(&str, &str); 12] = [
    ("json", JSON),
    ("jsonp", JS),
    ("js", JS),
    ("javascript", JS),
    ("xml", XML),
    ("html", HTML),
    ("xhtml", XHTML),
    ("csv", CSV),
    ("plain", TEXT),
    ("text", TEXT),
    ("form", FORM),
    ("upload", UPLOAD),
];

/// Returns the full MIME string for a short name, e.g. `json` ->
/// `application/json`.
pub fn mime_type(short_name: &str) -> Option<&'static str> {
    REGISTRY.iter().find(|(name, _)| *name == short_name).map(|(_, mime)| *mime)
}

/// Whether the registry knows the given short name.
pub fn is_known(short_name: &str) -> bool {
    mime_type(short_name).is_some()
}

/// Reverse lookup: the first short name registered for a MIME string.
pub fn short_name(mime: &str) -> Option<&'static str> {
    REGISTRY.iter().find(|(_, m)| *m == mime).map(|(name, _)| *name)
}

/// The ordered set of content types a response may negotiate.
///
/// Entries are `(short name, MIME)` pairs kept in insertion order; the
/// first match wins during negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeTable {
    entries: Vec<(&'static str, &'static str)>,
}

impl Default for ContentTypeTable {
    fn default() -> Self {
        Self { entries: vec![("html", HTML), ("json", JSON), ("jsonp", JS), ("xml", XML)] }
    }
}

impl ContentTypeTable {
    pub fn new(entries: Vec<(&'static str, &'static str)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds the given short name.
    pub fn contains(&self, short_name: &str) -> bool {
        self.entries.iter().any(|(name, _)| *name == short_name)
    }

    /// The MIME string registered under a short name.
    pub fn mime_for(&self, short_name: &str) -> Option<&'static str> {
        self.entries.iter().find(|(name, _)| *name == short_name).map(|(_, mime)| *mime)
    }

    /// Resolves a negotiation token to a short name.
    ///
    /// The token matches either a short name or a MIME value, by exact
    /// equality.
    pub fn resolve(&self, token: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(name, mime)| *name == token || *mime == token)
            .map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}
