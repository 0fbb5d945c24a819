//! Per-request strategy selection.

use crate::cache::http::Request;
use crate::config::CacheConfig;

/// How a request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Cached entry if present, else network; offline placeholder on failure.
    CachePreferred,
    /// Network first, cached copy on failure.
    NetworkPreferred,
    /// Cached entry now plus background refresh; network inline on a miss.
    CacheFirstRevalidate,
}

/// Picks the strategy for `request` from its host.
///
/// A host matches a configured entry when equal to it or a subdomain of it.
pub fn classify(config: &CacheConfig, request: &Request) -> Strategy {
    let Some(host) = request.host() else {
        return Strategy::CacheFirstRevalidate;
    };

    if host_matches(host, &config.font_hosts) {
        Strategy::CachePreferred
    } else if host_matches(host, &config.cdn_hosts) {
        Strategy::NetworkPreferred
    } else {
        Strategy::CacheFirstRevalidate
    }
}

fn host_matches(host: &str, candidates: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    candidates.iter().any(|candidate| {
        let candidate = candidate.to_ascii_lowercase();
        host == candidate || host.ends_with(&format!(".{candidate}"))
    })
}

#[cfg(test)]
mod tests {
    use super::{classify, Strategy};
    use crate::cache::http::Request;
    use crate::config::CacheConfig;

    fn strategy_for(url: &str) -> Strategy {
        classify(&CacheConfig::default(), &Request::get(url).unwrap())
    }

    #[test]
    fn fonts_are_cache_preferred() {
        assert_eq!(
            strategy_for("https://fonts.googleapis.com/css2?family=Roboto"),
            Strategy::CachePreferred
        );
        assert_eq!(
            strategy_for("https://fonts.gstatic.com/s/roboto.woff2"),
            Strategy::CachePreferred
        );
    }

    #[test]
    fn cdn_is_network_preferred() {
        assert_eq!(
            strategy_for("https://cdn.tailwindcss.com/3.4.1"),
            Strategy::NetworkPreferred
        );
    }

    #[test]
    fn everything_else_is_cache_first() {
        assert_eq!(
            strategy_for("http://localhost:8080/js/app.js"),
            Strategy::CacheFirstRevalidate
        );
        assert_eq!(
            strategy_for("https://notfonts.googleapis.com.evil.test/x"),
            Strategy::CacheFirstRevalidate
        );
    }
}
