//! Method selection heuristics.
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. Huge payloads stream (bounded memory).
//! 2. Large media skips compression and goes to base-85.
//! 3. Text prefers zstd when big, then Brotli, then gzip.
//! 4. Small payloads take the fastest backend, or base-85 without one.
//! 5. Medium payloads take gzip.
//! 6. Everything else is benchmarked.

use super::{Backend, CapabilitySet, ContentType, Method};
use crate::config::SelectionConfig;

/// Pick a codec for a payload. Pure: same inputs, same answer.
pub fn select_method(
    size: usize,
    hint: ContentType,
    caps: &CapabilitySet,
    thresholds: &SelectionConfig,
) -> Method {
    if size > thresholds.streaming_threshold {
        return Method::Streaming;
    }

    if hint.is_media() && size > thresholds.media_threshold {
        return Method::Z85;
    }

    if hint.is_text() {
        if size > thresholds.high_ratio_threshold && caps.is_available(Backend::Zstd) {
            return Method::Zstd;
        }
        if caps.is_available(Backend::Brotli) {
            return Method::Brotli;
        }
        return Method::Gzip;
    }

    if size < thresholds.small_threshold {
        return if caps.is_available(Backend::Lz4) {
            Method::Lz4
        } else {
            Method::Z85
        };
    }

    if size < thresholds.medium_threshold {
        return Method::Gzip;
    }

    Method::Hybrid
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    fn all() -> CapabilitySet {
        CapabilitySet::from_backends(&Backend::ALL)
    }

    fn select(size: usize, hint: ContentType, caps: &CapabilitySet) -> Method {
        select_method(size, hint, caps, &SelectionConfig::default())
    }

    #[test]
    fn test_streaming_wins_first() {
        assert_eq!(
            select(11 * MIB, ContentType::Image, &all()),
            Method::Streaming
        );
        assert_eq!(
            select(11 * MIB, ContentType::DocumentText, &all()),
            Method::Streaming
        );
    }

    #[test]
    fn test_media() {
        assert_eq!(select(200 * KIB, ContentType::Video, &all()), Method::Z85);
        // small media falls through to the size rules
        assert_eq!(select(50 * KIB, ContentType::Audio, &all()), Method::Lz4);
    }

    #[test]
    fn test_text_preferences() {
        let caps = all();
        assert_eq!(select(2 * MIB, ContentType::DocumentText, &caps), Method::Zstd);
        assert_eq!(select(10 * KIB, ContentType::StructuredText, &caps), Method::Brotli);

        let no_zstd = caps.without(Backend::Zstd);
        assert_eq!(select(2 * MIB, ContentType::DocumentText, &no_zstd), Method::Brotli);

        let gzip_only = CapabilitySet::from_backends(&[]);
        assert_eq!(select(2 * MIB, ContentType::DocumentText, &gzip_only), Method::Gzip);
    }

    #[test]
    fn test_size_rules() {
        let caps = all();
        assert_eq!(select(0, ContentType::Unknown, &caps), Method::Lz4);
        assert_eq!(select(500 * KIB, ContentType::Unknown, &caps), Method::Gzip);
        assert_eq!(select(5 * MIB, ContentType::Unknown, &caps), Method::Hybrid);

        let no_lz4 = caps.without(Backend::Lz4);
        assert_eq!(select(10, ContentType::Unknown, &no_lz4), Method::Z85);
    }

    #[test]
    fn test_boundaries() {
        let caps = all();
        // thresholds are strict
        assert_eq!(select(10 * MIB, ContentType::Unknown, &caps), Method::Hybrid);
        assert_eq!(select(100 * KIB, ContentType::Image, &caps), Method::Gzip);
        assert_eq!(select(MIB, ContentType::Unknown, &caps), Method::Hybrid);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = SelectionConfig {
            streaming_threshold: 1000,
            ..SelectionConfig::default()
        };
        assert_eq!(
            select_method(1001, ContentType::Unknown, &all(), &thresholds),
            Method::Streaming
        );
    }
}
