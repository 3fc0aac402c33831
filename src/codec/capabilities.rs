//! Backend capability registry.
//!
//! Availability is probed once, when the engine is built, and never changes
//! afterwards. A backend counts as available when it was compiled in, is not
//! disabled by configuration, and survives a smoke round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Backend, Method};
use crate::config::BackendConfig;

const SMOKE_PAYLOAD: &[u8] = b"metadoc capability probe";

/// Immutable backend availability map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    backends: BTreeMap<Backend, bool>,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::probe()
    }
}

impl CapabilitySet {
    /// Probe with no backends disabled
    pub fn probe() -> Self {
        Self::probe_with(&BackendConfig::default())
    }

    /// Probe, treating `config.disabled` as unavailable
    pub fn probe_with(config: &BackendConfig) -> Self {
        let backends = Backend::ALL
            .into_iter()
            .map(|backend| {
                let available = backend == Backend::Gzip
                    || (!config.disabled.contains(&backend) && smoke_test(backend));
                (backend, available)
            })
            .collect();
        let caps = Self { backends };

        tracing::info!(
            "Backends available: {}",
            caps.available()
                .iter()
                .map(Backend::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        caps
    }

    /// Build from an explicit list. gzip is always included.
    pub fn from_backends(available: &[Backend]) -> Self {
        let backends = Backend::ALL
            .into_iter()
            .map(|b| (b, b == Backend::Gzip || available.contains(&b)))
            .collect();
        Self { backends }
    }

    /// Copy with one backend marked unavailable (gzip cannot be removed)
    pub fn without(&self, backend: Backend) -> Self {
        let mut caps = self.clone();
        if backend != Backend::Gzip {
            caps.backends.insert(backend, false);
        }
        caps
    }

    /// Whether a backend is usable
    pub fn is_available(&self, backend: Backend) -> bool {
        self.backends.get(&backend).copied().unwrap_or(false)
    }

    /// Usable backends in enumeration order
    pub fn available(&self) -> Vec<Backend> {
        self.backends
            .iter()
            .filter_map(|(&b, &ok)| ok.then_some(b))
            .collect()
    }

    /// Whether a method can run. Methods without a backend always can;
    /// streaming needs gzip, which is always present.
    pub fn supports(&self, method: Method) -> bool {
        match method.backend() {
            Some(backend) => self.is_available(backend),
            None => true,
        }
    }
}

fn smoke_test(backend: Backend) -> bool {
    if !backend.is_compiled() {
        return false;
    }
    backend
        .compress(SMOKE_PAYLOAD, 1)
        .and_then(|c| backend.decompress(&c))
        .is_ok_and(|d| d == SMOKE_PAYLOAD)
}
