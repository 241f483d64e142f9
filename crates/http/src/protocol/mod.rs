//! Protocol-level building blocks for the HTTP message exchange.
//!
//! Everything in this module is a leaf: pure functions and value types with
//! no request lifecycle state of their own. The per-request types in
//! `wicket-web` compose them.
//!
//! - **Header handling** ([`header`]): normalization of raw header sources
//!   into canonical [`http::HeaderMap`]s, plus the insertion-ordered
//!   [`HeaderList`] used for response emission.
//! - **Negotiation** ([`negotiate`]): simplified `Accept` /
//!   `Accept-Encoding` matching against an allowed table.
//! - **Cache directives** ([`cache`]): TTL to `Cache-Control` / `Expires` /
//!   `Pragma` computation.
//! - **Status** ([`status`]): the reason-phrase table and status line
//!   rendering.
//! - **Media types** ([`media`]): the short-name registry and the
//!   [`ContentTypeTable`] of negotiable response types.
//! - **Errors** ([`error`]): [`HttpError`], [`SendError`] and [`BodyError`].

pub mod cache;
pub mod header;
pub mod media;
pub mod negotiate;
pub mod status;

mod error;
pub use error::BodyError;
pub use error::HttpError;
pub use error::SendError;

pub use cache::CacheDirectives;
pub use header::HeaderList;
pub use header::HeaderSource;
pub use media::ContentTypeTable;
pub use status::Protocol;
