//! Session collaborator interface.
//!
//! The framework never persists sessions itself; it only talks to a store
//! through the [`Session`] trait and emits the session cookie. The
//! in-process [`MemorySession`] covers tests and single-process hosts.

use std::collections::HashMap;
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Default session cookie name.
pub const DEFAULT_SESSION_NAME: &str = "wicket_session";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot set session id: session already started")]
    AlreadyStarted,
}

/// Attributes of the session cookie.
///
/// The cookie domain is always caller-supplied; deriving it from the host
/// header and script location is not reliable outside root document roots.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    /// Cookie lifetime in seconds.
    pub lifetime: u64,
    pub path: String,
    /// Cookie domain; empty means host-only.
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            lifetime: 86400 * 7,
            path: "/".to_string(),
            domain: String::new(),
            secure: false,
            http_only: false,
        }
    }
}

/// A session store keyed by a cookie name/value pair.
#[cfg_attr(test, mockall::automock)]
pub trait Session {
    /// Starts the session, allocating an id when none was set.
    fn start(&mut self) -> bool;

    fn is_started(&self) -> bool;

    /// The session id, once set or started.
    fn id(&self) -> Option<String>;

    /// Sets the session id. Fails once the session has started.
    fn set_id(&mut self, id: String) -> Result<(), SessionError>;

    /// The session (and cookie) name.
    fn name(&self) -> String;

    fn set_name(&mut self, name: String);

    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: String, value: String);

    fn exists(&self, key: &str) -> bool;

    fn remove(&mut self, key: &str) -> Option<String>;

    /// Destroys the session: all variables and the id are gone.
    fn destroy(&mut self);
}

/// Renders the `Set-Cookie` value for a session cookie.
pub fn cookie_header(name: &str, id: &str, options: &CookieOptions) -> String {
    let mut value = format!("{name}={id}; Max-Age={}; Path={}", options.lifetime, options.path);
    if !options.domain.is_empty() {
        let _ = write!(value, "; Domain={}", options.domain);
    }
    if options.secure {
        value.push_str("; Secure");
    }
    if options.http_only {
        value.push_str("; HttpOnly");
    }
    value
}

/// In-process session store.
#[derive(Debug)]
pub struct MemorySession {
    name: String,
    id: Option<String>,
    started: bool,
    values: HashMap<String, String>,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_SESSION_NAME.to_string(),
            id: None,
            started: false,
            values: HashMap::new(),
        }
    }
}

impl Session for MemorySession {
    fn start(&mut self) -> bool {
        if self.started {
            return true;
        }
        if self.id.is_none() {
            self.id = Some(generate_id());
        }
        self.started = true;
        debug!(name = %self.name, "session started");
        true
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn set_id(&mut self, id: String) -> Result<(), SessionError> {
        if self.started {
            return Err(SessionError::AlreadyStarted);
        }
        self.id = Some(id);
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: String, value: String) {
        self.values.insert(key, value);
    }

    fn exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    fn destroy(&mut self) {
        self.values.clear();
        self.id = None;
        self.started = false;
    }
}

/// Process-unique id for the in-memory store. Not a cryptographic token;
/// real deployments bring their own store behind [`Session`].
fn generate_id() -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default();
    format!("{nanos:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_allocates_an_id_once() {
        let mut session = MemorySession::new();
        assert!(!session.is_started());
        assert_eq!(session.id(), None);

        assert!(session.start());
        assert!(session.is_started());
        let id = session.id().unwrap();

        assert!(session.start());
        assert_eq!(session.id().unwrap(), id);
    }

    #[test]
    fn set_id_after_start_is_rejected() {
        let mut session = MemorySession::new();
        session.set_id("abc".to_string()).unwrap();
        session.start();
        assert_eq!(session.id().as_deref(), Some("abc"));

        assert_eq!(session.set_id("def".to_string()), Err(SessionError::AlreadyStarted));
        assert_eq!(session.id().as_deref(), Some("abc"));
    }

    #[test]
    fn variables_round_trip_and_destroy_clears() {
        let mut session = MemorySession::new();
        session.start();
        session.set("user".to_string(), "alice".to_string());

        assert!(session.exists("user"));
        assert_eq!(session.get("user").as_deref(), Some("alice"));
        assert_eq!(session.remove("user").as_deref(), Some("alice"));
        assert!(!session.exists("user"));

        session.set("user".to_string(), "bob".to_string());
        session.destroy();
        assert!(!session.is_started());
        assert_eq!(session.id(), None);
        assert!(!session.exists("user"));
    }

    #[test]
    fn cookie_header_formatting() {
        let options = CookieOptions::default();
        assert_eq!(
            cookie_header("wicket_session", "abc123", &options),
            "wicket_session=abc123; Max-Age=604800; Path=/"
        );

        let options = CookieOptions {
            lifetime: 60,
            path: "/app".to_string(),
            domain: "example.com".to_string(),
            secure: true,
            http_only: true,
        };
        assert_eq!(
            cookie_header("sid", "x", &options),
            "sid=x; Max-Age=60; Path=/app; Domain=example.com; Secure; HttpOnly"
        );
    }
}
