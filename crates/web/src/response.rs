//! Response composition and emission.
//!
//! A [`Response`] is a mutable builder with a one-shot emitter: handler
//! code sets status, content type, headers and body in any order, then
//! [`Response::send`] writes the status line, headers and body exactly
//! once. The `sent` latch makes every later call a no-op, and
//! [`ResponseScope`] guarantees emission at the end of a request-handling
//! scope even when the owner forgets to call `send` on some exit path.
//!
//! The composer is single-owner: one instance per request, never shared
//! across concurrent requests.

use std::io::Write;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::StatusCode;
use serde_json::Value;
use tracing::{error, trace, warn};
use wicket_http::protocol::{
    BodyError, ContentTypeTable, HeaderList, Protocol, SendError, cache, negotiate, status,
};

use crate::request::RequestContext;
use crate::session::{CookieOptions, Session, cookie_header};

/// Default charset sent with the content type.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Value of the `X-Frame-Options` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameOptions {
    #[default]
    SameOrigin,
    Deny,
}

impl FrameOptions {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameOptions::SameOrigin => "SAMEORIGIN",
            FrameOptions::Deny => "DENY",
        }
    }
}

/// Mutable response builder with a single-emission lifecycle.
#[derive(Debug)]
pub struct Response {
    protocol: Protocol,
    status: Option<StatusCode>,
    /// Negotiated short name; always a member of `allowed_types`.
    content_type: Option<&'static str>,
    default_content_type: mime::Mime,
    charset: String,
    allowed_types: ContentTypeTable,
    headers: HeaderList,
    body: Vec<u8>,
    gzip: bool,
    send_body: bool,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Creates an unseeded composer with the default configuration.
    pub fn new() -> Self {
        Self {
            protocol: Protocol::default(),
            status: None,
            content_type: None,
            default_content_type: mime::TEXT_HTML,
            charset: DEFAULT_CHARSET.to_string(),
            allowed_types: ContentTypeTable::default(),
            headers: HeaderList::new(),
            body: Vec::new(),
            gzip: false,
            send_body: true,
            sent: false,
        }
    }

    /// Creates a composer seeded from the request snapshot.
    ///
    /// Seeds: body suppression for HEAD, the gzip flag from
    /// `Accept-Encoding`, defensive headers for XHR requests, and the
    /// content type from a `content_type` parameter when valid, otherwise
    /// negotiated from the `Accept` header.
    pub fn from_request(request: &RequestContext) -> Self {
        let mut response = Self::new();

        response.send_body = !request.is_head();
        response.gzip = negotiate::accepts_encoding(request.headers(), "gzip");

        if request.is_xhr() {
            response.no_cache().nosniff().deny_iframes();
        }

        match request.param("content_type") {
            Some(param) if response.try_set_content_type(param) => {}
            _ => response.content_type = negotiate::accept(request.headers(), &response.allowed_types),
        }

        response
    }

    /// Sets the protocol token used for the status line.
    pub fn set_protocol(&mut self, protocol: Protocol) -> &mut Self {
        self.protocol = protocol;
        self
    }

    /// Sets the response status code.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// The explicit status, when one was set.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Sets the content type when the token names an allowed type, by
    /// short name or MIME value. Unknown tokens leave the current type
    /// unchanged.
    pub fn set_content_type(&mut self, token: &str) -> &mut Self {
        if !self.try_set_content_type(token) {
            warn!(token, "content type not in the allowed table, leaving unchanged");
        }
        self
    }

    /// Fallible variant of [`Response::set_content_type`]; returns whether
    /// the token resolved to an allowed type.
    pub fn try_set_content_type(&mut self, token: &str) -> bool {
        match self.allowed_types.resolve(token) {
            Some(short_name) => {
                self.content_type = Some(short_name);
                true
            }
            None => false,
        }
    }

    /// The negotiated content type short name, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    /// Replaces the allowed content type table.
    pub fn set_allowed_types(&mut self, table: ContentTypeTable) -> &mut Self {
        self.allowed_types = table;
        self
    }

    /// Sets the MIME type emitted when nothing was negotiated.
    pub fn set_default_content_type(&mut self, mime: mime::Mime) -> &mut Self {
        self.default_content_type = mime;
        self
    }

    pub fn set_charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = charset.into();
        self
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Sets a header, replacing an existing value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Sets a header only when absent.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.add(name, value);
        self
    }

    /// Sets a batch of headers, replacing existing values.
    pub fn set_headers<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in fields {
            self.headers.set(name, value);
        }
        self
    }

    /// Sets a batch of headers, preserving existing values.
    pub fn add_headers<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in fields {
            self.headers.add(name, value);
        }
        self
    }

    /// The headers set so far, in insertion order.
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Sets the cache headers for a TTL in seconds; `None` or zero
    /// disables caching and removes any `Last-Modified` header.
    pub fn set_cache_headers(&mut self, ttl: Option<u64>) -> &mut Self {
        let directives = cache::build(ttl);
        if directives.drop_last_modified {
            self.headers.remove("Last-Modified");
        }
        for (name, value) in directives.fields() {
            self.headers.set(name, value);
        }
        self
    }

    /// Disables caching for this response.
    pub fn no_cache(&mut self) -> &mut Self {
        self.set_cache_headers(None)
    }

    /// Replaces the body.
    pub fn set_body(&mut self, value: impl Into<Bytes>) -> &mut Self {
        self.body = value.into().to_vec();
        self
    }

    /// Appends to the body.
    pub fn append_body(&mut self, value: impl Into<Bytes>) -> &mut Self {
        self.body.extend_from_slice(&value.into());
        self
    }

    /// Prepends to the body.
    pub fn prepend_body(&mut self, value: impl Into<Bytes>) -> &mut Self {
        let mut body = value.into().to_vec();
        body.extend_from_slice(&self.body);
        self.body = body;
        self
    }

    /// Replaces the body with the string rendition of a dynamic value.
    ///
    /// Only scalars (strings, numbers, booleans) have one; anything else
    /// is rejected rather than coerced.
    pub fn set_body_value(&mut self, value: &Value) -> Result<&mut Self, BodyError> {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => return Err(BodyError::invalid_body_type("null")),
            Value::Array(_) => return Err(BodyError::invalid_body_type("array")),
            Value::Object(_) => return Err(BodyError::invalid_body_type("object")),
        };
        self.body = rendered.into_bytes();
        Ok(self)
    }

    /// The body buffer as composed so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Sets the `X-Frame-Options` header.
    pub fn set_frame_options(&mut self, value: FrameOptions) -> &mut Self {
        self.set_header("X-Frame-Options", value.as_str())
    }

    /// Sets `X-Frame-Options: DENY`.
    pub fn deny_iframes(&mut self) -> &mut Self {
        self.set_frame_options(FrameOptions::Deny)
    }

    /// Sets `X-Frame-Options: SAMEORIGIN`.
    pub fn sameorigin_iframes(&mut self) -> &mut Self {
        self.set_frame_options(FrameOptions::SameOrigin)
    }

    /// Sets `X-Content-Type-Options: nosniff`.
    pub fn nosniff(&mut self) -> &mut Self {
        self.set_header("X-Content-Type-Options", "nosniff")
    }

    /// Marks the response as a redirect to `url`, suppressing the body.
    ///
    /// A non-3xx `status` is ignored; without one the code resolves to 302
    /// at send time.
    pub fn redirect(&mut self, url: impl Into<String>, status: Option<StatusCode>) -> &mut Self {
        self.headers.set("Location", url.into());
        self.send_body = false;
        if let Some(status) = status.filter(StatusCode::is_redirection) {
            self.status = Some(status);
        }
        self
    }

    /// Emits the session cookie for a started session.
    pub fn set_session_cookie(&mut self, session: &dyn Session, options: &CookieOptions) -> &mut Self {
        match session.id() {
            Some(id) => {
                let value = cookie_header(&session.name(), &id, options);
                self.headers.set("Set-Cookie", value);
            }
            None => warn!("session has no id, skipping Set-Cookie"),
        }
        self
    }

    /// Whether emission has begun. Set before the first byte goes out, so
    /// it also holds after a send attempt that failed partway.
    pub fn sent(&self) -> bool {
        self.sent
    }

    /// Emits the response: status line, content type, headers in insertion
    /// order, then the body (unless suppressed for HEAD).
    ///
    /// Only the first call writes anything. The latch flips as soon as
    /// emission begins, so a failed attempt is never retried into the same
    /// stream; the error surfaces to the caller instead.
    pub fn send<W: Write>(&mut self, writer: &mut W) -> Result<(), SendError> {
        if self.sent {
            trace!("response already sent, ignoring");
            return Ok(());
        }
        // latch before the first byte: a partial emission must not be
        // followed by a second one on the same wire
        self.sent = true;

        // send at least some cache directive
        if !self.headers.contains("Cache-Control") {
            self.no_cache();
        }

        // drain and compress before the header pass so Content-Encoding
        // is in place when the headers are written
        let plain = std::mem::take(&mut self.body);
        let body = if self.gzip && self.send_body && !plain.is_empty() {
            let compressed = gzip(&plain)?;
            self.headers.set("Content-Encoding", "gzip");
            compressed
        } else {
            plain
        };

        let status = self.resolved_status();
        write!(writer, "{}\r\n", status::status_line(self.protocol, status))?;
        write!(writer, "Content-Type: {}; charset={}\r\n", self.resolved_content_type(), self.charset)?;
        for (name, value) in self.headers.iter() {
            write!(writer, "{name}: {value}\r\n")?;
        }
        write!(writer, "\r\n")?;

        if self.send_body {
            writer.write_all(&body)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn resolved_status(&self) -> StatusCode {
        match self.status {
            Some(status) => status,
            None if self.headers.contains("Location") => StatusCode::FOUND,
            None => StatusCode::OK,
        }
    }

    fn resolved_content_type(&self) -> &str {
        self.content_type
            .and_then(|short_name| self.allowed_types.mime_for(short_name))
            .unwrap_or_else(|| self.default_content_type.as_ref())
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, SendError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len()), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Guarantees emission at the end of a request-handling scope.
///
/// The scope owns both the composer and the writer. `send` may be called
/// explicitly on any exit path; when the owner forgets, the drop
/// implementation sends instead. The `sent` latch keeps the two paths from
/// emitting twice, and single ownership keeps them from racing. An attempt
/// that failed partway also counts as sent; the guard never retries into a
/// stream that already carries a partial emission.
#[derive(Debug)]
pub struct ResponseScope<W: Write> {
    response: Response,
    writer: W,
}

impl<W: Write> ResponseScope<W> {
    pub fn new(response: Response, writer: W) -> Self {
        Self { response, writer }
    }

    /// Explicitly emits the response.
    pub fn send(&mut self) -> Result<(), SendError> {
        self.response.send(&mut self.writer)
    }
}

impl<W: Write> Deref for ResponseScope<W> {
    type Target = Response;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

impl<W: Write> DerefMut for ResponseScope<W> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.response
    }
}

impl<W: Write> Drop for ResponseScope<W> {
    fn drop(&mut self) {
        if !self.response.sent() {
            if let Err(e) = self.response.send(&mut self.writer) {
                error!(cause = %e, "failed to send response at end of scope");
            }
        }
    }
}
