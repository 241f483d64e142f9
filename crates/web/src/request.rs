//! Request snapshot construction.
//!
//! This module turns the ambient, per-call request description — header
//! source, method, URI, query string, body stream — into an immutable
//! [`RequestContext`] that handler code can query. Construction happens
//! exactly once at request entry; afterwards only the router may attach
//! path parameters via [`RequestContext::set_path_params`].
//!
//! Parsing here is best-effort by design: malformed query strings and
//! bodies fold to empty parameter maps, and the sanitizer transforms
//! instead of rejecting. Request construction never fails.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use tracing::{debug, trace};
use wicket_http::protocol::{HeaderSource, header};

/// The ambient description of one incoming call, before normalization.
///
/// Built by the host glue (CGI shim, test harness, server adapter) and
/// consumed once by [`RequestContext::from_raw`].
pub struct RawRequest {
    method: String,
    uri: String,
    path_info: Option<String>,
    query_string: String,
    headers: HeaderMap,
    form: Option<HashMap<String, String>>,
    body: Option<Box<dyn Read>>,
    allow_method_override: bool,
}

impl fmt::Debug for RawRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("path_info", &self.path_info)
            .field("query_string", &self.query_string)
            .field("headers", &self.headers)
            .field("form", &self.form)
            .field("body", &self.body.is_some())
            .field("allow_method_override", &self.allow_method_override)
            .finish()
    }
}

impl RawRequest {
    /// Creates a raw request from the ambient method and URI.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            path_info: None,
            query_string: String::new(),
            headers: HeaderMap::new(),
            form: None,
            body: None,
            allow_method_override: true,
        }
    }

    /// Sets the raw query string.
    pub fn query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = query.into();
        self
    }

    /// Sets a pre-split request path, for hosts that separate path from
    /// query themselves.
    pub fn path_info(mut self, path: impl Into<String>) -> Self {
        self.path_info = Some(path.into());
        self
    }

    /// Normalizes and attaches a raw header source.
    pub fn header_source<I, K, V>(mut self, source: HeaderSource<I>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.headers = header::normalize(source);
        self
    }

    /// Attaches an already normalized header map.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attaches the host-parsed form map, used for POST requests.
    pub fn form(mut self, form: HashMap<String, String>) -> Self {
        self.form = Some(form);
        self
    }

    /// Attaches the raw request body stream. It is read at most once.
    pub fn body(mut self, body: impl Read + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Enables or disables method override via header and query parameter.
    pub fn method_override(mut self, allow: bool) -> Self {
        self.allow_method_override = allow;
        self
    }
}

/// The normalized, queryable snapshot of one request.
///
/// Immutable after construction, except for the router attaching matched
/// path parameters. Parameter precedence in the merged view is
/// query < body < path.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: String,
    headers: HeaderMap,
    query_params: HashMap<String, String>,
    body_params: HashMap<String, String>,
    path_params: HashMap<String, String>,
    params: HashMap<String, String>,
    xhr: bool,
    allow_method_override: bool,
}

impl RequestContext {
    /// Builds the request snapshot. Never fails; see the module docs.
    pub fn from_raw(mut raw: RawRequest) -> Self {
        let headers = std::mem::take(&mut raw.headers);

        let query = clean(&url_decode(&raw.query_string));

        let path = match raw.path_info.take() {
            Some(path_info) => url_decode(&path_info),
            // the host didn't separate path from query, strip the suffix
            None => url_decode(&raw.uri).replace(&format!("?{query}"), ""),
        };
        let path = clean(&path);

        let query_params = parse_form(&raw.query_string);

        let body_params = if raw.method == "POST" {
            raw.form.take().unwrap_or_default()
        } else {
            read_form(raw.body.take())
        };

        let mut resolved = raw.method.clone();
        if raw.allow_method_override {
            if let Some(value) = header::get(&headers, "x-http-method-override") {
                resolved = value.to_string();
            }
            if let Some(value) = query_params.get("_method") {
                resolved = value.clone();
            }
        }
        let method = resolve_method(&resolved, &raw.method);

        let xhr = header::get(&headers, "x-requested-with") == Some("XMLHttpRequest");

        let mut params = query_params.clone();
        params.extend(body_params.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            method,
            path,
            query,
            headers,
            query_params,
            body_params,
            path_params: HashMap::new(),
            params,
            xhr,
            allow_method_override: raw.allow_method_override,
        }
    }

    /// Attaches the path parameters matched by the router.
    ///
    /// Path parameters win over query and body parameters in the merged
    /// view. This is the only mutation permitted after construction.
    pub fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.params.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.path_params = params;
    }

    /// The resolved HTTP method, override applied.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The sanitized, query-stripped request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The sanitized query string.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The canonical request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single request header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        header::get(&self.headers, name)
    }

    /// The merged parameter view (query < body < path).
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// A single merged parameter, if set.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn body_params(&self) -> &HashMap<String, String> {
        &self.body_params
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Whether the request was flagged as an XML HTTP request.
    pub fn is_xhr(&self) -> bool {
        self.xhr
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Whether method override via header or parameter was permitted.
    pub fn method_override_allowed(&self) -> bool {
        self.allow_method_override
    }
}

impl From<RawRequest> for RequestContext {
    fn from(raw: RawRequest) -> Self {
        Self::from_raw(raw)
    }
}

/// Uppercases and trims the resolved method token.
///
/// An override token that cannot form a valid method falls back to the
/// ambient method; construction never fails.
fn resolve_method(resolved: &str, ambient: &str) -> Method {
    let token = resolved.trim().to_ascii_uppercase();
    match Method::from_bytes(token.as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            debug!(token, "invalid method token, keeping ambient method");
            Method::from_bytes(ambient.trim().to_ascii_uppercase().as_bytes()).unwrap_or(Method::GET)
        }
    }
}

/// Decodes `+` and percent escapes, lossy on broken UTF-8.
fn url_decode(value: &str) -> String {
    let plus_decoded = value.replace('+', " ");
    percent_decode_str(&plus_decoded).decode_utf8_lossy().into_owned()
}

/// Best-effort URL-encoded form parsing; malformed input folds to an
/// empty map.
fn parse_form(value: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(value)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

/// Reads the body stream once and parses it as URL-encoded form data.
///
/// An absent, unreadable or exhausted stream yields an empty map.
fn read_form(body: Option<Box<dyn Read>>) -> HashMap<String, String> {
    let Some(mut body) = body else {
        return HashMap::new();
    };

    let mut raw = String::new();
    if let Err(e) = body.read_to_string(&mut raw) {
        trace!(cause = %e, "unreadable request body, treating as empty");
        return HashMap::new();
    }

    parse_form(&raw)
}

/// The crude transform sanitizer for path and query components: strips tag
/// spans, control and non-ASCII bytes, encodes quotes and trims the
/// surrounding slashes. Transforms only, rejects nothing.
fn clean(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;

    for ch in value.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }
        match ch {
            '<' => in_tag = true,
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            c if (c as u32) < 0x20 || (c as u32) > 0x7f => {}
            c => out.push(c),
        }
    }

    out.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn environ(fields: &[(&str, &str)]) -> HeaderSource<std::vec::IntoIter<(String, String)>> {
        HeaderSource::Environ(
            fields.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect::<Vec<_>>().into_iter(),
        )
    }

    #[test]
    fn snapshot_from_environ_source() {
        let request = RawRequest::new("GET", "/api/items?sort=asc")
            .query_string("sort=asc")
            .header_source(environ(&[
                ("HTTP_ACCEPT", "application/json,text/html"),
                ("HTTP_ACCEPT_ENCODING", "gzip"),
            ]));
        let context = RequestContext::from_raw(request);

        assert_eq!(context.method(), &Method::GET);
        assert_eq!(context.path(), "api/items");
        assert_eq!(context.query(), "sort=asc");
        assert_eq!(context.param("sort"), Some("asc"));
        assert_eq!(context.header("accept"), Some("application/json,text/html"));
        assert!(!context.is_xhr());
    }

    #[test]
    fn query_values_are_decoded() {
        let request = RawRequest::new("GET", "/search?q=hello+world%21").query_string("q=hello+world%21");
        let context = RequestContext::from_raw(request);

        assert_eq!(context.param("q"), Some("hello world!"));
        assert_eq!(context.path(), "search");
    }

    #[test]
    fn method_override_header() {
        let build = |allow| {
            RawRequest::new("GET", "/items")
                .header_source(environ(&[("HTTP_X_HTTP_METHOD_OVERRIDE", "DELETE")]))
                .method_override(allow)
        };

        let overridden = RequestContext::from_raw(build(true));
        assert_eq!(overridden.method(), &Method::DELETE);
        assert!(overridden.method_override_allowed());

        let ambient = RequestContext::from_raw(build(false));
        assert_eq!(ambient.method(), &Method::GET);
        assert!(!ambient.method_override_allowed());
    }

    #[test]
    fn query_param_override_wins_over_header() {
        let request = RawRequest::new("GET", "/items?_method=put")
            .query_string("_method=put")
            .header_source(environ(&[("HTTP_X_HTTP_METHOD_OVERRIDE", "DELETE")]));
        let context = RequestContext::from_raw(request);

        // uppercased and trimmed
        assert_eq!(context.method(), &Method::PUT);
    }

    #[test]
    fn invalid_override_token_keeps_ambient_method() {
        let request = RawRequest::new("POST", "/items?_method=no%20method").query_string("_method=no%20method");
        let context = RequestContext::from_raw(request);
        assert_eq!(context.method(), &Method::POST);
    }

    #[test]
    fn parameter_precedence() {
        let request = RawRequest::new("POST", "/items?foo=1")
            .query_string("foo=1")
            .form(HashMap::from([("foo".to_string(), "2".to_string())]));
        let mut context = RequestContext::from_raw(request);

        assert_eq!(context.param("foo"), Some("2"));
        assert_eq!(context.query_params().get("foo").map(String::as_str), Some("1"));
        assert_eq!(context.body_params().get("foo").map(String::as_str), Some("2"));

        context.set_path_params(HashMap::from([("foo".to_string(), "3".to_string())]));
        assert_eq!(context.param("foo"), Some("3"));
        assert_eq!(context.path_params().get("foo").map(String::as_str), Some("3"));
    }

    #[test]
    fn non_post_body_is_read_and_parsed() {
        let request = RawRequest::new("PUT", "/items/7").body(Cursor::new("name=kettle&qty=2"));
        let context = RequestContext::from_raw(request);

        assert_eq!(context.param("name"), Some("kettle"));
        assert_eq!(context.param("qty"), Some("2"));
        assert!(context.has_param("name"));
    }

    #[test]
    fn exhausted_or_absent_body_yields_empty_params() {
        let mut exhausted = Cursor::new("name=kettle".to_string());
        let mut sink = String::new();
        exhausted.read_to_string(&mut sink).unwrap();

        let context = RequestContext::from_raw(RawRequest::new("PUT", "/items").body(exhausted));
        assert!(context.body_params().is_empty());

        let context = RequestContext::from_raw(RawRequest::new("PUT", "/items"));
        assert!(context.body_params().is_empty());
    }

    #[test]
    fn xhr_requires_exact_header_value() {
        let xhr = RequestContext::from_raw(
            RawRequest::new("GET", "/").header_source(environ(&[("HTTP_X_REQUESTED_WITH", "XMLHttpRequest")])),
        );
        assert!(xhr.is_xhr());

        let not_xhr = RequestContext::from_raw(
            RawRequest::new("GET", "/").header_source(environ(&[("HTTP_X_REQUESTED_WITH", "xmlhttprequest")])),
        );
        assert!(!not_xhr.is_xhr());
    }

    #[test]
    fn method_predicates() {
        let head = RequestContext::from_raw(RawRequest::new("head", "/"));
        assert!(head.is_head());
        assert!(!head.is_get());
        assert!(!head.is_post());
    }

    #[test]
    fn pre_split_path_is_used_verbatim() {
        let request = RawRequest::new("GET", "ignored").path_info("/users/42/").query_string("a=1");
        let context = RequestContext::from_raw(request);
        assert_eq!(context.path(), "users/42");
    }

    #[test]
    fn sanitizer_transforms_and_never_rejects() {
        assert_eq!(clean("/items/<script>alert(1)</script>ok/"), "itemsalert(1)ok");
        assert_eq!(clean("a'b\"c"), "a&#39;b&#34;c");
        assert_eq!(clean("/caf\u{e9}\u{7}/"), "caf");
        assert_eq!(clean(""), "");
    }
}
