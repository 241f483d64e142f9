//! Cache directive computation.
//!
//! A response's cache headers are a pure function of one knob: the TTL in
//! seconds. A missing or zero TTL disables caching and produces the
//! defensive triple of `Cache-Control`, a fixed past `Expires` and
//! `Pragma: no-cache` that the different browser generations understand.

use std::time::{Duration, SystemTime};

/// Fixed past `Expires` value sent when caching is disabled.
pub const DISABLED_EXPIRES: &str = "Thu, 19 Nov 1981 08:52:00 GMT";

const DISABLED_CACHE_CONTROL: &str = "no-cache, must-revalidate, max-age=0";

/// The directive set computed for a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectives {
    pub cache_control: String,
    pub expires: String,
    pub pragma: &'static str,
    /// Disabling the cache invalidates a previously set `Last-Modified`;
    /// the caller must remove it.
    pub drop_last_modified: bool,
}

impl CacheDirectives {
    /// The directives as header name/value pairs, in emission order.
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("Cache-Control", self.cache_control.as_str()),
            ("Expires", self.expires.as_str()),
            ("Pragma", self.pragma),
        ]
    }
}

/// Builds the cache directive set for a TTL in seconds.
///
/// `None` or `Some(0)` disables caching.
pub fn build(ttl: Option<u64>) -> CacheDirectives {
    match ttl {
        Some(ttl) if ttl > 0 => CacheDirectives {
            cache_control: format!("public, max-age={ttl}"),
            expires: httpdate::fmt_http_date(SystemTime::now() + Duration::from_secs(ttl)),
            pragma: "public",
            drop_last_modified: false,
        },
        _ => CacheDirectives {
            cache_control: DISABLED_CACHE_CONTROL.to_string(),
            expires: DISABLED_EXPIRES.to_string(),
            pragma: "no-cache",
            drop_last_modified: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_for_none_and_zero() {
        for ttl in [None, Some(0)] {
            let directives = build(ttl);
            assert_eq!(directives.cache_control, "no-cache, must-revalidate, max-age=0");
            assert_eq!(directives.expires, DISABLED_EXPIRES);
            assert_eq!(directives.pragma, "no-cache");
            assert!(directives.drop_last_modified);
        }
    }

    #[test]
    fn enabled_sets_public_max_age() {
        let directives = build(Some(86400));
        assert_eq!(directives.cache_control, "public, max-age=86400");
        assert_eq!(directives.pragma, "public");
        assert!(!directives.drop_last_modified);
    }

    #[test]
    fn enabled_expires_tracks_now_plus_ttl() {
        let ttl = 3600u64;
        let directives = build(Some(ttl));
        let expires = httpdate::parse_http_date(&directives.expires).unwrap();
        let expected = SystemTime::now() + Duration::from_secs(ttl);
        // RFC-1123 has second granularity; allow 1s of skew either way
        let skew = match expires.duration_since(expected) {
            Ok(ahead) => ahead,
            Err(e) => e.duration(),
        };
        assert!(skew <= Duration::from_secs(1), "expires skew too large: {skew:?}");
    }

    #[test]
    fn fields_emission_order() {
        let directives = build(None);
        let names: Vec<_> = directives.fields().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["Cache-Control", "Expires", "Pragma"]);
    }
}
