use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("send error: {source}")]
    SendError {
        #[from]
        source: SendError,
    },

    #[error("body error: {source}")]
    BodyError {
        #[from]
        source: BodyError,
    },
}

/// Errors raised while emitting a composed response.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised while converting a value into a response body.
///
/// Body conversion never coerces silently: a value without a string
/// rendition is rejected and the caller decides what to substitute.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BodyError {
    #[error("cannot use {kind} value as response body")]
    InvalidBodyType { kind: &'static str },
}

impl BodyError {
    pub fn invalid_body_type(kind: &'static str) -> Self {
        Self::InvalidBodyType { kind }
    }
}
