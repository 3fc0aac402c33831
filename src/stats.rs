//! Compression statistics.
//!
//! Running totals over every successful `compress` call of one engine, plus
//! a derived report (overall ratio, savings, improvement over plain base64,
//! throughput).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::{CompressionMetadata, Method};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Running totals. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsAccumulator {
    /// Successful compress calls
    pub files_processed: u64,
    /// Sum of payload lengths
    pub total_original_size: u64,
    /// Sum of encoded lengths
    pub total_compressed_size: u64,
    /// Sum of plain base64 lengths of the payloads
    pub total_baseline_size: u64,
    /// Sum of encode times
    pub total_processing_time_ms: f64,
    /// Calls per method actually used
    pub method_usage: BTreeMap<Method, u64>,
}

impl StatsAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one compress call
    pub fn record(&mut self, meta: &CompressionMetadata) {
        self.files_processed += 1;
        self.total_original_size += meta.original_size as u64;
        self.total_compressed_size += meta.compressed_size as u64;
        self.total_baseline_size += crate::codec::base64_len(meta.original_size) as u64;
        self.total_processing_time_ms += meta.processing_time_ms;
        *self.method_usage.entry(meta.method).or_insert(0) += 1;
    }

    /// Method with the most calls. Ties go to the earlier method.
    pub fn most_used_method(&self) -> Option<Method> {
        let mut best: Option<(Method, u64)> = None;
        for (&method, &count) in &self.method_usage {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((method, count));
            }
        }
        best.map(|(method, _)| method)
    }

    /// Derive a report
    pub fn report(&self) -> CompressionReport {
        let original = self.total_original_size as f64;
        let compressed = self.total_compressed_size as f64;
        let baseline = self.total_baseline_size as f64;
        let has_bytes = self.total_original_size > 0;
        let space_saved_bytes = self.total_original_size as i64 - self.total_compressed_size as i64;

        CompressionReport {
            files_processed: self.files_processed,
            total_original_size: self.total_original_size,
            total_compressed_size: self.total_compressed_size,
            total_processing_time_ms: self.total_processing_time_ms,
            method_usage: self.method_usage.clone(),
            overall_compression_ratio: has_bytes.then(|| 1.0 - compressed / original),
            space_saved_bytes,
            space_saved_mb: space_saved_bytes as f64 / BYTES_PER_MB,
            improvement_vs_base64: (baseline > 0.0).then(|| 1.0 - compressed / baseline),
            avg_processing_speed_mbps: (has_bytes && self.total_processing_time_ms > 0.0)
                .then(|| (original / BYTES_PER_MB) / (self.total_processing_time_ms / 1000.0)),
            most_used_method: self.most_used_method(),
            generated_at: Utc::now(),
        }
    }
}

/// Derived statistics report
#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    /// Successful compress calls
    pub files_processed: u64,
    /// Sum of payload lengths
    pub total_original_size: u64,
    /// Sum of encoded lengths
    pub total_compressed_size: u64,
    /// Sum of encode times
    pub total_processing_time_ms: f64,
    /// Calls per method actually used
    pub method_usage: BTreeMap<Method, u64>,
    /// `1 - compressed/original` over all calls
    pub overall_compression_ratio: Option<f64>,
    /// `original - compressed` (negative when encodings grew)
    pub space_saved_bytes: i64,
    /// `space_saved_bytes` in MiB
    pub space_saved_mb: f64,
    /// `1 - compressed/base64` over all calls
    pub improvement_vs_base64: Option<f64>,
    /// Input throughput in MiB/s
    pub avg_processing_speed_mbps: Option<f64>,
    /// Method with the most calls
    pub most_used_method: Option<Method>,
    /// Report creation time
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn meta(method: Method, original: usize, encoded_len: usize, ms: u64) -> CompressionMetadata {
        CompressionMetadata::measure(
            method,
            original,
            &"x".repeat(encoded_len),
            Duration::from_millis(ms),
            6,
        )
    }

    #[test]
    fn test_stats_recording() {
        let mut stats = StatsAccumulator::new();
        stats.record(&meta(Method::Gzip, 1000, 700, 50));
        stats.record(&meta(Method::Gzip, 2000, 1400, 100));
        stats.record(&meta(Method::Z85, 300, 375, 1));

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.total_original_size, 3300);
        assert_eq!(stats.total_compressed_size, 2475);
        assert_eq!(stats.method_usage[&Method::Gzip], 2);
        assert_eq!(stats.method_usage[&Method::Z85], 1);
        assert_eq!(stats.most_used_method(), Some(Method::Gzip));
    }

    #[test]
    fn test_report() {
        let mut stats = StatsAccumulator::new();
        stats.record(&meta(Method::Brotli, 3000, 1500, 1000));

        let report = stats.report();
        assert!((report.overall_compression_ratio.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(report.space_saved_bytes, 1500);
        // base64 of 3000 bytes is 4000 chars
        assert!((report.improvement_vs_base64.unwrap() - (1.0 - 1500.0 / 4000.0)).abs() < 1e-9);
        let mbps = report.avg_processing_speed_mbps.unwrap();
        assert!((mbps - 3000.0 / (1024.0 * 1024.0)).abs() < 1e-6);
    }

    #[test]
    fn test_empty_report() {
        let report = StatsAccumulator::new().report();
        assert_eq!(report.files_processed, 0);
        assert!(report.overall_compression_ratio.is_none());
        assert!(report.improvement_vs_base64.is_none());
        assert!(report.avg_processing_speed_mbps.is_none());
        assert!(report.most_used_method.is_none());
    }

    #[test]
    fn test_most_used_tie_goes_to_enumeration_order() {
        let mut stats = StatsAccumulator::new();
        stats.record(&meta(Method::Z85, 10, 20, 0));
        stats.record(&meta(Method::Gzip, 10, 20, 0));
        assert_eq!(stats.most_used_method(), Some(Method::Gzip));
    }

    #[test]
    fn test_report_serializes_method_names() {
        let mut stats = StatsAccumulator::new();
        stats.record(&meta(Method::Raw, 3, 4, 0));
        let json = serde_json::to_string(&stats.report()).unwrap();
        assert!(json.contains("\"base64_only\":1"));
        assert!(json.contains("\"most_used_method\":\"base64_only\""));
    }
}
