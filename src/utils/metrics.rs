//! Observability and Metrics
//!
//! Counters for the traffic a node pushes through its codec.
//!
//! Uses atomic counters for thread-safe metrics collection. Each node owns
//! its own instance, so nodes sharing a process never mix their numbers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::error::ProtocolError;

/// Metrics collector for one node
#[derive(Debug)]
pub struct Metrics {
    /// Envelopes encoded
    pub messages_encoded: AtomicU64,
    /// Envelopes decoded
    pub messages_decoded: AtomicU64,
    /// Envelope bytes produced by encode
    pub bytes_encoded: AtomicU64,
    /// Envelope bytes accepted by decode
    pub bytes_decoded: AtomicU64,
    /// Encode attempts for unregistered shapes
    pub encode_failures: AtomicU64,
    /// Envelopes shorter than an opcode
    pub truncated_envelopes: AtomicU64,
    /// Envelopes with an unknown opcode
    pub unregistered_opcodes: AtomicU64,
    /// Envelopes whose payload the shape decoder rejected
    pub payload_errors: AtomicU64,
    /// Envelopes refused before decoding for exceeding the size limit
    pub oversized_envelopes: AtomicU64,
    /// Decoded messages that no handler accepted
    pub dispatch_failures: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            messages_encoded: AtomicU64::new(0),
            messages_decoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            truncated_envelopes: AtomicU64::new(0),
            unregistered_opcodes: AtomicU64::new(0),
            payload_errors: AtomicU64::new(0),
            oversized_envelopes: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful encode
    pub fn message_encoded(&self, byte_count: u64) {
        self.messages_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a successful decode
    pub fn message_decoded(&self, byte_count: u64) {
        self.messages_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a failed encode
    pub fn encode_failed(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed decode, bucketed by cause
    pub fn decode_failed(&self, err: &ProtocolError) {
        let counter = match err {
            ProtocolError::TruncatedEnvelope(_) => &self.truncated_envelopes,
            ProtocolError::UnregisteredOpcode(_) => &self.unregistered_opcodes,
            ProtocolError::OversizedEnvelope { .. } => &self.oversized_envelopes,
            _ => &self.payload_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message no handler accepted
    pub fn dispatch_failed(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_encoded: self.messages_encoded.load(Ordering::Relaxed),
            messages_decoded: self.messages_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            truncated_envelopes: self.truncated_envelopes.load(Ordering::Relaxed),
            unregistered_opcodes: self.unregistered_opcodes.load(Ordering::Relaxed),
            payload_errors: self.payload_errors.load(Ordering::Relaxed),
            oversized_envelopes: self.oversized_envelopes.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_encoded = snapshot.messages_encoded,
            messages_decoded = snapshot.messages_decoded,
            bytes_encoded = snapshot.bytes_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            encode_failures = snapshot.encode_failures,
            truncated_envelopes = snapshot.truncated_envelopes,
            unregistered_opcodes = snapshot.unregistered_opcodes,
            payload_errors = snapshot.payload_errors,
            oversized_envelopes = snapshot.oversized_envelopes,
            dispatch_failures = snapshot.dispatch_failures,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_encoded: u64,
    pub messages_decoded: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub encode_failures: u64,
    pub truncated_envelopes: u64,
    pub unregistered_opcodes: u64,
    pub payload_errors: u64,
    pub oversized_envelopes: u64,
    pub dispatch_failures: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Every decode failure regardless of cause
    pub fn decode_failures(&self) -> u64 {
        self.truncated_envelopes
            + self.unregistered_opcodes
            + self.payload_errors
            + self.oversized_envelopes
    }
}
