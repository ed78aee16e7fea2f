//! Host call counters
//!
//! Counts the calls the reflection layer makes into the runtime so callers
//! can observe whether a result came from the reflection cache or from the
//! host.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for host calls
#[derive(Debug, Default)]
pub struct HostMetrics {
    make_generic_type: AtomicU64,
    make_generic_method: AtomicU64,
    invoke: AtomicU64,
    construct: AtomicU64,
    describe_type: AtomicU64,
}

/// Point-in-time copy of [`HostMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// `make_generic_type` calls
    pub make_generic_type: u64,
    /// `make_generic_method` calls
    pub make_generic_method: u64,
    /// `invoke` calls
    pub invoke: u64,
    /// `construct` calls
    pub construct: u64,
    /// `describe_type` calls
    pub describe_type: u64,
}

impl HostMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_make_generic_type(&self) {
        self.make_generic_type.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_make_generic_method(&self) {
        self.make_generic_method.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invoke(&self) {
        self.invoke.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_construct(&self) {
        self.construct.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_describe_type(&self) {
        self.describe_type.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            make_generic_type: self.make_generic_type.load(Ordering::Relaxed),
            make_generic_method: self.make_generic_method.load(Ordering::Relaxed),
            invoke: self.invoke.load(Ordering::Relaxed),
            construct: self.construct.load(Ordering::Relaxed),
            describe_type: self.describe_type.load(Ordering::Relaxed),
        }
    }

    /// Zero all counters
    pub fn reset(&self) {
        self.make_generic_type.store(0, Ordering::Relaxed);
        self.make_generic_method.store(0, Ordering::Relaxed);
        self.invoke.store(0, Ordering::Relaxed);
        self.construct.store(0, Ordering::Relaxed);
        self.describe_type.store(0, Ordering::Relaxed);
    }
}
