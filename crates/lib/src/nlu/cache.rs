//! Classifier memo: quick-pattern result cache plus rolling metrics.
//!
//! One instance is injected into each classifier. Both halves tolerate lost
//! updates under concurrency; nothing here affects correctness.

use crate::nlu::intent::{IntentResult, SourceTier};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Smoothing factor for the AI latency average.
pub const LATENCY_SMOOTHING: f64 = 0.2;

/// normalized text -> result. Unbounded, never evicted; cleared when the alias index changes.
#[derive(Default)]
pub struct QuickPatternCache {
    entries: RwLock<HashMap<String, IntentResult>>,
}

impl QuickPatternCache {
    pub fn get(&self, key: &str) -> Option<IntentResult> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: impl Into<String>, result: IntentResult) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), result);
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime counters for the classification pipeline.
#[derive(Default)]
pub struct ClassifierMetrics {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    pattern_hits: AtomicU64,
    ai_calls: AtomicU64,
    ai_accepted: AtomicU64,
    ai_failures: AtomicU64,
    legacy_results: AtomicU64,
    /// f64 bits of the smoothed latency in ms; 0 until the first sample.
    avg_ai_latency_ms: AtomicU64,
}

/// Point-in-time copy of the metrics, serialized on `GET /metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_hit_rate: f64,
    pub pattern_hits: u64,
    pub ai_calls: u64,
    pub ai_accepted: u64,
    pub ai_failures: u64,
    pub legacy_results: u64,
    pub avg_ai_latency_ms: f64,
    pub cached_entries: usize,
}

impl ClassifierMetrics {
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count the tier that produced the final result.
    pub fn record_result(&self, tier: SourceTier) {
        let counter = match tier {
            SourceTier::Cache => &self.cache_hits,
            SourceTier::Pattern => &self.pattern_hits,
            SourceTier::Ai => &self.ai_accepted,
            SourceTier::Legacy => &self.legacy_results,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ai_call(&self, latency: Duration, ok: bool) {
        self.ai_calls.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.ai_failures.fetch_add(1, Ordering::Relaxed);
        }
        let sample = latency.as_secs_f64() * 1000.0;
        let prev = f64::from_bits(self.avg_ai_latency_ms.load(Ordering::Relaxed));
        let next = if prev == 0.0 {
            sample
        } else {
            LATENCY_SMOOTHING * sample + (1.0 - LATENCY_SMOOTHING) * prev
        };
        self.avg_ai_latency_ms.store(next.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self, cached_entries: usize) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let hits = self.cache_hits.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests: total,
            cache_hits: hits,
            cache_hit_rate: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
            pattern_hits: self.pattern_hits.load(Ordering::Relaxed),
            ai_calls: self.ai_calls.load(Ordering::Relaxed),
            ai_accepted: self.ai_accepted.load(Ordering::Relaxed),
            ai_failures: self.ai_failures.load(Ordering::Relaxed),
            legacy_results: self.legacy_results.load(Ordering::Relaxed),
            avg_ai_latency_ms: f64::from_bits(self.avg_ai_latency_ms.load(Ordering::Relaxed)),
            cached_entries,
        }
    }
}

/// Cache and metrics owned together and shared by reference.
#[derive(Default)]
pub struct ClassifierMemo {
    pub cache: QuickPatternCache,
    pub metrics: ClassifierMetrics,
}

impl ClassifierMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.cache.len())
    }
}
