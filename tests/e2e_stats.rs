//! Statistics tests across many calls and threads.

use std::thread;

use metadoc::codec::Method;
use metadoc::{CompressionEngine, MethodRequest};

/// Totals are the sum of every per-call delta
#[test]
fn test_stats_consistency() {
    let engine = CompressionEngine::new();
    let payloads: Vec<Vec<u8>> = (0..10).map(|i| vec![b'x'; i * 300]).collect();

    let mut compressed_total = 0;
    let mut time_total = 0.0;
    for payload in &payloads {
        let (_, meta) = engine.compress(payload, MethodRequest::Auto, 6).unwrap();
        compressed_total += meta.compressed_size as u64;
        time_total += meta.processing_time_ms;
    }

    let stats = engine.stats();
    let expected: usize = payloads.iter().map(Vec::len).sum();
    assert_eq!(stats.files_processed, 10);
    assert_eq!(stats.total_original_size, expected as u64);
    assert_eq!(stats.total_compressed_size, compressed_total);
    assert!((stats.total_processing_time_ms - time_total).abs() < 1e-6);
    assert_eq!(stats.method_usage.values().sum::<u64>(), 10);
}

/// One engine shared by worker threads loses no updates
#[test]
fn test_concurrent_compress() {
    let engine = CompressionEngine::new();
    let workers = 8;
    let per_worker = 25;

    thread::scope(|s| {
        for w in 0..workers {
            let engine = &engine;
            s.spawn(move || {
                for i in 0..per_worker {
                    let payload = vec![(w * 31 + i) as u8; 100 + i];
                    let method = if i % 2 == 0 { Method::Z85 } else { Method::Gzip };
                    let (text, meta) = engine.compress(&payload, method, 6).unwrap();
                    assert_eq!(engine.decompress(&text, &meta).unwrap(), payload);
                }
            });
        }
    });

    let stats = engine.stats();
    let per_worker_bytes: usize = (0..per_worker).map(|i| 100 + i).sum();
    assert_eq!(stats.files_processed, (workers * per_worker) as u64);
    assert_eq!(
        stats.total_original_size,
        (workers * per_worker_bytes) as u64
    );
    assert_eq!(stats.method_usage[&Method::Z85], 13 * workers as u64);
    assert_eq!(stats.method_usage[&Method::Gzip], 12 * workers as u64);
}

/// The report reflects what was recorded
#[test]
fn test_report_after_calls() {
    let engine = CompressionEngine::new();
    assert!(engine.report().overall_compression_ratio.is_none());

    let text = "repetitive text for the report ".repeat(400);
    for _ in 0..3 {
        engine.compress(text.as_bytes(), Method::Gzip, 9).unwrap();
    }
    engine.compress(b"z", Method::Z85, 6).unwrap();

    let report = engine.report();
    assert_eq!(report.files_processed, 4);
    assert_eq!(report.most_used_method, Some(Method::Gzip));
    assert!(report.overall_compression_ratio.unwrap() > 0.9);
    assert!(report.improvement_vs_base64.unwrap() > 0.9);
    assert!(report.space_saved_bytes > 0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["method_usage"]["gzip_base64"], 3);
    assert!(json["generated_at"].is_string());
}

/// Failed calls leave the totals untouched
#[test]
fn test_invalid_calls_not_recorded() {
    let engine = CompressionEngine::new();
    let _ = engine.compress(b"abc", Method::Gzip, 99);
    assert_eq!(engine.stats().files_processed, 0);
}
