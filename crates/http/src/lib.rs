//! Protocol primitives for the wicket web framework
//!
//! This crate holds the stateless building blocks of an HTTP message
//! exchange: header-source normalization, simplified accept negotiation,
//! cache directive computation, the status reason-phrase table and the
//! media short-name registry. The per-request lifecycle types live in the
//! companion `wicket-web` crate.
//!
//! # Example
//!
//! ```
//! use wicket_http::protocol::{header, negotiate, ContentTypeTable, HeaderSource};
//!
//! let headers = header::normalize(HeaderSource::Environ(
//!     [("HTTP_ACCEPT", "application/json,text/html")].iter().copied(),
//! ));
//!
//! let table = ContentTypeTable::default();
//! assert_eq!(negotiate::accept(&headers, &table), Some("json"));
//! ```
//!
//! # Scoping
//!
//! A normalized header map belongs to exactly one request. Callers in
//! long-lived processes must build a fresh map per incoming call rather
//! than caching one across requests.

pub mod protocol;
