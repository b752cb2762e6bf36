//! Pure helpers: URL building, Retry-After parsing, backoff (no HTTP I/O).

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::content_id::ContentId;

/// Upper bound for any single backoff.
pub(crate) const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// URL of a block on a path-style gateway.
pub(crate) fn block_url(base_url: &str, cid: &ContentId) -> String {
    format!("{}/ipfs/{}", base_url, cid)
}

/// Identifier segment of a block URL, for error reporting.
///
/// URL format: .../ipfs/{cid} (query string ignored)
pub(crate) fn parse_block_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    match path.rsplit_once("/ipfs/") {
        Some((_, cid)) if !cid.is_empty() => cid.trim_end_matches('/').to_string(),
        _ => "unknown".to_string(),
    }
}

/// Retry-After header in delta-seconds form.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Delay before retry number `retry` (1-based).
///
/// A server-provided Retry-After is honored (capped, +/-10% jitter);
/// otherwise exponential backoff with full jitter.
pub(crate) fn backoff_delay(retry: u32, retry_after: Option<Duration>) -> Duration {
    match retry_after {
        Some(retry_after) => {
            let base_ms = retry_after.min(MAX_BACKOFF).as_millis() as u64;
            let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
            Duration::from_millis(jittered_ms.max(100))
        }
        None => {
            let base_backoff = Duration::from_secs(1_u64 << retry.min(5)).min(MAX_BACKOFF);
            let jittered_ms = rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
            Duration::from_millis(jittered_ms.max(10))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_block_url_roundtrip() {
        let cid = ContentId::for_raw_block(b"x");
        let url = block_url("https://gw.example", &cid);
        assert_eq!(url, format!("https://gw.example/ipfs/{}", cid));
        assert_eq!(parse_block_url(&url), cid.to_string());
    }

    #[test]
    fn test_parse_block_url_ignores_query() {
        assert_eq!(
            parse_block_url("https://gw.example/ipfs/bafkabc?format=raw"),
            "bafkabc"
        );
        assert_eq!(parse_block_url("https://gw.example/other"), "unknown");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_backoff_honors_retry_after_with_jitter() {
        for _ in 0..50 {
            let d = backoff_delay(1, Some(Duration::from_secs(2)));
            assert!(d >= Duration::from_millis(1800) && d <= Duration::from_millis(2200));
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        for retry in 1..20 {
            assert!(backoff_delay(retry, None) <= MAX_BACKOFF);
            assert!(
                backoff_delay(retry, Some(Duration::from_secs(600)))
                    <= MAX_BACKOFF + Duration::from_secs(3)
            );
        }
    }
}
