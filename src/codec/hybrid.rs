//! Hybrid benchmarker: try several codecs, keep the best.
//!
//! Each candidate is timed and scored as
//!
//! ```text
//! score = 1 / (encoded_size * size_weight + elapsed_ms * time_weight)
//! ```
//!
//! and the highest score wins. Candidates that fail are dropped. Exact ties
//! go to the earliest candidate in enumeration order, whatever order the
//! trials actually finished in. The winner is framed as
//! `HYBRID:<method>:<artifact>`.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use super::framing::{self, Frame};
use super::{decode_leaf, encode_leaf, Backend, CapabilitySet, Codec, Method, RawCodec};
use crate::config::HybridConfig;
use crate::error::{MetaDocError, Result};

/// One successful candidate run
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// Candidate method
    pub method: Method,
    /// Candidate output
    pub encoded: String,
    /// Output length in bytes
    pub size: usize,
    /// Wall-clock encode time
    pub elapsed: Duration,
}

impl Trial {
    /// Weighted score, higher is better
    pub fn score(&self, config: &HybridConfig) -> f64 {
        let cost = self.size as f64 * config.size_weight
            + self.elapsed.as_secs_f64() * 1000.0 * config.time_weight;
        if cost > 0.0 {
            1.0 / cost
        } else {
            f64::INFINITY
        }
    }
}

/// Best trial by score. Ties keep the earlier trial.
pub fn select_best<'t>(trials: &'t [Trial], config: &HybridConfig) -> Option<&'t Trial> {
    let mut best: Option<(&Trial, f64)> = None;
    for trial in trials {
        let score = trial.score(config);
        match best {
            Some((_, best_score)) if score <= best_score => {},
            _ => best = Some((trial, score)),
        }
    }
    best.map(|(trial, _)| trial)
}

/// Benchmarking meta-codec
#[derive(Debug, Clone, Copy)]
pub struct HybridBenchmarker<'a> {
    config: &'a HybridConfig,
    caps: &'a CapabilitySet,
    level: u32,
}

impl<'a> HybridBenchmarker<'a> {
    /// Create a benchmarker over the given capabilities
    pub fn new(config: &'a HybridConfig, caps: &'a CapabilitySet, level: u32) -> Self {
        Self {
            config,
            caps,
            level,
        }
    }

    /// Candidate set for a payload size, in enumeration order
    pub fn candidates(&self, size: usize) -> Vec<Method> {
        let pipelines = [
            Backend::Gzip,
            Backend::Deflate,
            Backend::Brotli,
            Backend::Zstd,
        ];
        let mut candidates: Vec<Method> = pipelines
            .into_iter()
            .filter(|&b| self.caps.is_available(b))
            .map(Method::pipeline)
            .collect();

        if size < self.config.fast_backend_threshold && self.caps.is_available(Backend::Lz4) {
            candidates.push(Method::Lz4);
        }
        if size < self.config.z85_threshold {
            candidates.push(Method::Z85);
        }
        candidates
    }

    /// Run every candidate, returning the successful trials in candidate order
    pub fn benchmark(&self, data: &[u8]) -> Vec<Trial> {
        let candidates = self.candidates(data.len());
        let results = match self.config.candidate_timeout_ms {
            Some(ms) => self.run_with_timeout(&candidates, data, Duration::from_millis(ms)),
            None => self.run_all(&candidates, data),
        };

        results
            .into_iter()
            .filter_map(|result| match result {
                Ok(trial) => Some(trial),
                Err(e) => {
                    tracing::warn!("Dropping hybrid candidate: {e}");
                    None
                },
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn run_all(&self, candidates: &[Method], data: &[u8]) -> Vec<Result<Trial>> {
        use rayon::prelude::*;

        if self.config.parallel {
            let level = self.level;
            return candidates
                .par_iter()
                .map(|&method| run_candidate(method, data, level))
                .collect();
        }
        self.run_sequential(candidates, data)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_all(&self, candidates: &[Method], data: &[u8]) -> Vec<Result<Trial>> {
        self.run_sequential(candidates, data)
    }

    fn run_sequential(&self, candidates: &[Method], data: &[u8]) -> Vec<Result<Trial>> {
        candidates
            .iter()
            .map(|&method| run_candidate(method, data, self.level))
            .collect()
    }

    /// One thread per candidate. Candidates still running at the deadline
    /// are dropped; their threads finish in the background and the number
    /// abandoned is logged.
    fn run_with_timeout(
        &self,
        candidates: &[Method],
        data: &[u8],
        timeout: Duration,
    ) -> Vec<Result<Trial>> {
        let payload: Arc<[u8]> = Arc::from(data);
        let (tx, rx) = mpsc::channel();

        for (idx, &method) in candidates.iter().enumerate() {
            let tx = tx.clone();
            let payload = Arc::clone(&payload);
            let level = self.level;
            thread::spawn(move || {
                let _ = tx.send((idx, run_candidate(method, &payload, level)));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Result<Trial>>> = candidates.iter().map(|_| None).collect();
        let deadline = Instant::now() + timeout;
        let mut received = 0;
        while received < candidates.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((idx, result)) => {
                    slots[idx] = Some(result);
                    received += 1;
                },
                Err(_) => break,
            }
        }

        let abandoned = candidates.len() - received;
        if abandoned > 0 {
            tracing::warn!(
                "Abandoned {abandoned} of {} hybrid candidates still running after {} ms",
                candidates.len(),
                timeout.as_millis()
            );
        }

        candidates
            .iter()
            .zip(slots)
            .map(|(&method, slot)| {
                slot.unwrap_or_else(|| {
                    Err(MetaDocError::CandidateFailure {
                        method,
                        reason: format!("timed out after {} ms", timeout.as_millis()),
                    })
                })
            })
            .collect()
    }
}

fn run_candidate(method: Method, data: &[u8], level: u32) -> Result<Trial> {
    let start = Instant::now();
    let encoded = encode_leaf(method, data, level).map_err(|e| MetaDocError::CandidateFailure {
        method,
        reason: e.to_string(),
    })?;
    let elapsed = start.elapsed();
    Ok(Trial {
        method,
        size: encoded.len(),
        encoded,
        elapsed,
    })
}

impl Codec for HybridBenchmarker<'_> {
    fn encode(&self, data: &[u8]) -> Result<String> {
        let trials = self.benchmark(data);
        match select_best(&trials, self.config) {
            Some(winner) => {
                tracing::debug!(
                    "Hybrid winner {} ({} bytes, {:.3} ms) out of {} candidates",
                    winner.method,
                    winner.size,
                    winner.elapsed.as_secs_f64() * 1000.0,
                    trials.len()
                );
                Ok(framing::write_hybrid(winner.method, &winner.encoded))
            },
            None => {
                tracing::warn!("All hybrid candidates failed, framing raw base64");
                Ok(framing::write_hybrid(
                    Method::Raw,
                    &RawCodec::encode_infallible(data),
                ))
            },
        }
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        decode_hybrid(text)
    }
}

/// Decode a `HYBRID:` frame by dispatching to the named leaf codec.
pub(crate) fn decode_hybrid(text: &str) -> Result<Vec<u8>> {
    match Frame::parse(text)? {
        Frame::Hybrid { method, artifact } => decode_leaf(method, artifact),
        _ => Err(MetaDocError::MalformedFraming(
            "expected HYBRID frame".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(method: Method, size: usize, ms: u64) -> Trial {
        Trial {
            method,
            encoded: String::new(),
            size,
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_score() {
        let config = HybridConfig::default();
        let t = trial(Method::Gzip, 100, 10);
        // 1 / (100 * 0.8 + 10 * 0.2) = 1 / 82
        assert!((t.score(&config) - 1.0 / 82.0).abs() < 1e-12);
    }

    #[test]
    fn test_select_best_prefers_smaller() {
        let config = HybridConfig::default();
        let trials = vec![
            trial(Method::Gzip, 500, 1),
            trial(Method::Brotli, 300, 2),
            trial(Method::Z85, 900, 0),
        ];
        assert_eq!(select_best(&trials, &config).unwrap().method, Method::Brotli);
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let config = HybridConfig::default();
        let trials = vec![
            trial(Method::Deflate, 100, 5),
            trial(Method::Gzip, 100, 5),
        ];
        assert_eq!(select_best(&trials, &config).unwrap().method, Method::Deflate);
        assert!(select_best(&[], &config).is_none());
    }

    #[test]
    fn test_candidates() {
        let config = HybridConfig::default();
        let caps = CapabilitySet::from_backends(&Backend::ALL);
        let bench = HybridBenchmarker::new(&config, &caps, 6);

        assert_eq!(
            bench.candidates(1024),
            vec![
                Method::Gzip,
                Method::Deflate,
                Method::Brotli,
                Method::Zstd,
                Method::Lz4,
                Method::Z85
            ]
        );
        assert_eq!(
            bench.candidates(2 * 1024 * 1024),
            vec![Method::Gzip, Method::Deflate, Method::Brotli, Method::Zstd]
        );

        let gzip_only = CapabilitySet::from_backends(&[]);
        let bench = HybridBenchmarker::new(&config, &gzip_only, 6);
        assert_eq!(bench.candidates(10), vec![Method::Gzip, Method::Z85]);
    }

    #[test]
    fn test_hybrid_roundtrip() {
        let config = HybridConfig::default();
        let caps = CapabilitySet::probe();
        let bench = HybridBenchmarker::new(&config, &caps, 6);
        let data = "the quick brown fox ".repeat(200);

        let encoded = bench.encode(data.as_bytes()).unwrap();
        let Frame::Hybrid { method, .. } = Frame::parse(&encoded).unwrap() else {
            panic!("not a hybrid frame: {encoded}");
        };
        assert!(bench.candidates(data.len()).contains(&method));
        assert_eq!(bench.decode(&encoded).unwrap(), data.as_bytes());
    }

    #[test]
    fn test_timeout_path_keeps_order() {
        let config = HybridConfig {
            time_weight: 0.0,
            candidate_timeout_ms: Some(10_000),
            ..HybridConfig::default()
        };
        let caps = CapabilitySet::probe();
        let bench = HybridBenchmarker::new(&config, &caps, 6);
        let data = vec![7u8; 4096];

        let methods: Vec<Method> = bench.benchmark(&data).iter().map(|t| t.method).collect();
        assert_eq!(methods, bench.candidates(data.len()));
    }

    #[test]
    fn test_expired_deadline_still_encodes() {
        let config = HybridConfig {
            candidate_timeout_ms: Some(0),
            ..HybridConfig::default()
        };
        let caps = CapabilitySet::probe();
        let bench = HybridBenchmarker::new(&config, &caps, 6);
        let data = "late candidates ".repeat(4096);

        let candidates = bench.candidates(data.len());
        let trials = bench.benchmark(data.as_bytes());
        assert!(trials.len() <= candidates.len());
        let order: Vec<usize> = trials
            .iter()
            .map(|t| candidates.iter().position(|&m| m == t.method).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        let encoded = bench.encode(data.as_bytes()).unwrap();
        assert_eq!(bench.decode(&encoded).unwrap(), data.as_bytes());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_path_keeps_order() {
        let config = HybridConfig {
            time_weight: 0.0,
            parallel: true,
            ..HybridConfig::default()
        };
        let caps = CapabilitySet::probe();
        let bench = HybridBenchmarker::new(&config, &caps, 6);
        let data = "parallel hybrid candidates ".repeat(300);

        let methods: Vec<Method> = bench
            .benchmark(data.as_bytes())
            .iter()
            .map(|t| t.method)
            .collect();
        assert_eq!(methods, bench.candidates(data.len()));

        let first = bench.encode(data.as_bytes()).unwrap();
        for _ in 0..5 {
            assert_eq!(bench.encode(data.as_bytes()).unwrap(), first);
        }
        assert_eq!(bench.decode(&first).unwrap(), data.as_bytes());
    }

    #[test]
    fn test_raw_fallback_frame_decodes() {
        let framed = framing::write_hybrid(Method::Raw, &RawCodec::encode_infallible(b"abc"));
        assert_eq!(framed, "HYBRID:base64_only:YWJj");
        assert_eq!(decode_hybrid(&framed).unwrap(), b"abc");
    }

    #[test]
    fn test_decode_rejects_other_frames() {
        assert!(matches!(
            decode_hybrid("Z85:0:"),
            Err(MetaDocError::MalformedFraming(_))
        ));
    }
}
