//! Relay counters.

use core::sync::atomic::{AtomicU64, Ordering};

/// Per-channel relay statistics.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Notifications acknowledged by firmware.
    pub forwarded: AtomicU64,
    /// Edges dropped because the line could not be read.
    pub sampling_errors: AtomicU64,
    /// Notifications firmware failed or answered malformed.
    pub forwarding_errors: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sampling_error(&self) {
        self.sampling_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_forwarding_error(&self) {
        self.forwarding_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sampling_errors(&self) -> u64 {
        self.sampling_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forwarding_errors(&self) -> u64 {
        self.forwarding_errors.load(Ordering::Relaxed)
    }

    /// Total number of failed relays.
    #[inline]
    pub fn errors(&self) -> u64 {
        self.sampling_errors() + self.forwarding_errors()
    }
}

/// Device-wide counters for edges that never reached a channel.
#[derive(Debug, Default)]
pub struct DeviceStats {
    /// IRQs that matched no armed channel.
    pub unknown_irqs: AtomicU64,
    /// Edges rejected because teardown had started.
    pub rejected: AtomicU64,
}

impl DeviceStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_unknown_irq(&self) {
        self.unknown_irqs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn unknown_irqs(&self) -> u64 {
        self.unknown_irqs.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
