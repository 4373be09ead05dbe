//! Structured oscillator telemetry.
//!
//! Events are delivered through [`OscillatorObserver`]. Observers must not
//! block or perform I/O; [`NoOpObserver`] compiles away, [`EventRingBuffer`]
//! keeps the last N events for diagnostics and [`OscillatorMetrics`] folds
//! events into `AtomicU64` counters updated with `Ordering::Relaxed`.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::config::StreamOrder;

/// Nanoseconds since the first telemetry timestamp taken in this process.
#[must_use]
pub fn monotonic_ns() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
}

/// Telemetry event emitted by oscillator operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OscillatorEvent {
    /// A buffer was walked into a coordinate.
    Encoded {
        length_bytes: u64,
        symbols: u64,
        /// Steps that hit a lattice bound and reset.
        reflections: u64,
        timestamp_ns: u64,
    },

    /// A coordinate decoded and verified.
    Decoded {
        length_bytes: u64,
        ambiguous_steps: u64,
        /// Whether the backward walk came back to the stored start.
        start_matches: bool,
        timestamp_ns: u64,
    },

    /// A decode ended in an error.
    DecodeFailed {
        /// Stable error label, see `ErrorKind::as_str`.
        kind: &'static str,
        probe_miss: bool,
        timestamp_ns: u64,
    },

    /// A decode stream ran to completion or failure.
    StreamFinished {
        order: StreamOrder,
        bytes_emitted: u64,
        chunks: u64,
        verified: bool,
        timestamp_ns: u64,
    },
}

impl OscillatorEvent {
    #[must_use]
    pub fn timestamp_ns(&self) -> u64 {
        match self {
            Self::Encoded { timestamp_ns, .. }
            | Self::Decoded { timestamp_ns, .. }
            | Self::DecodeFailed { timestamp_ns, .. }
            | Self::StreamFinished { timestamp_ns, .. } => *timestamp_ns,
        }
    }

    /// Short classification label for this event kind.
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Encoded { .. } => "encoded",
            Self::Decoded { .. } => "decoded",
            Self::DecodeFailed { .. } => "decode_failed",
            Self::StreamFinished { .. } => "stream_finished",
        }
    }
}

/// Receiver of [`OscillatorEvent`]s.
pub trait OscillatorObserver: Send + Sync {
    fn on_event(&self, event: &OscillatorEvent);
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl OscillatorObserver for NoOpObserver {
    #[inline(always)]
    fn on_event(&self, _event: &OscillatorEvent) {}
}

/// Keeps the most recent `capacity` events.
pub struct EventRingBuffer {
    events: parking_lot::Mutex<RingInner>,
}

struct RingInner {
    buf: Vec<OscillatorEvent>,
    capacity: usize,
    write_pos: usize,
    count: usize,
}

impl EventRingBuffer {
    /// A zero capacity is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: parking_lot::Mutex::new(RingInner {
                buf: Vec::with_capacity(capacity),
                capacity,
                write_pos: 0,
                count: 0,
            }),
        }
    }

    /// Stored events, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<OscillatorEvent> {
        let inner = self.events.lock();
        let n = inner.count.min(inner.capacity);
        let start = if inner.count >= inner.capacity {
            inner.write_pos
        } else {
            0
        };
        (0..n)
            .map(|i| inner.buf[(start + i) % inner.capacity].clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.events.lock();
        inner.count.min(inner.capacity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events observed, including overwritten ones.
    #[must_use]
    pub fn total_observed(&self) -> usize {
        self.events.lock().count
    }
}

impl OscillatorObserver for EventRingBuffer {
    fn on_event(&self, event: &OscillatorEvent) {
        let mut inner = self.events.lock();
        let pos = inner.write_pos;
        if inner.buf.len() < inner.capacity {
            inner.buf.push(event.clone());
        } else {
            inner.buf[pos] = event.clone();
        }
        inner.write_pos = (pos + 1) % inner.capacity;
        inner.count += 1;
    }
}

/// Point-in-time copy of [`OscillatorMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OscillatorMetricsSnapshot {
    pub encodes_total: u64,
    pub bytes_encoded_total: u64,
    pub reflections_total: u64,
    pub decodes_total: u64,
    pub bytes_decoded_total: u64,
    pub ambiguous_steps_total: u64,
    pub decode_failures_total: u64,
    pub probe_misses_total: u64,
    pub streams_total: u64,
}

/// Counters fed from oscillator events.
#[derive(Debug, Default)]
pub struct OscillatorMetrics {
    encodes: AtomicU64,
    bytes_encoded: AtomicU64,
    reflections: AtomicU64,
    decodes: AtomicU64,
    bytes_decoded: AtomicU64,
    ambiguous_steps: AtomicU64,
    decode_failures: AtomicU64,
    probe_misses: AtomicU64,
    streams: AtomicU64,
}

impl OscillatorMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> OscillatorMetricsSnapshot {
        OscillatorMetricsSnapshot {
            encodes_total: self.encodes.load(Ordering::Relaxed),
            bytes_encoded_total: self.bytes_encoded.load(Ordering::Relaxed),
            reflections_total: self.reflections.load(Ordering::Relaxed),
            decodes_total: self.decodes.load(Ordering::Relaxed),
            bytes_decoded_total: self.bytes_decoded.load(Ordering::Relaxed),
            ambiguous_steps_total: self.ambiguous_steps.load(Ordering::Relaxed),
            decode_failures_total: self.decode_failures.load(Ordering::Relaxed),
            probe_misses_total: self.probe_misses.load(Ordering::Relaxed),
            streams_total: self.streams.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.encodes,
            &self.bytes_encoded,
            &self.reflections,
            &self.decodes,
            &self.bytes_decoded,
            &self.ambiguous_steps,
            &self.decode_failures,
            &self.probe_misses,
            &self.streams,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl OscillatorObserver for OscillatorMetrics {
    fn on_event(&self, event: &OscillatorEvent) {
        match *event {
            OscillatorEvent::Encoded {
                length_bytes,
                reflections,
                ..
            } => {
                self.encodes.fetch_add(1, Ordering::Relaxed);
                self.bytes_encoded.fetch_add(length_bytes, Ordering::Relaxed);
                self.reflections.fetch_add(reflections, Ordering::Relaxed);
            }
            OscillatorEvent::Decoded {
                length_bytes,
                ambiguous_steps,
                ..
            } => {
                self.decodes.fetch_add(1, Ordering::Relaxed);
                self.bytes_decoded.fetch_add(length_bytes, Ordering::Relaxed);
                self.ambiguous_steps
                    .fetch_add(ambiguous_steps, Ordering::Relaxed);
            }
            OscillatorEvent::DecodeFailed { probe_miss, .. } => {
                self.decode_failures.fetch_add(1, Ordering::Relaxed);
                if probe_miss {
                    self.probe_misses.fetch_add(1, Ordering::Relaxed);
                }
            }
            OscillatorEvent::StreamFinished { .. } => {
                self.streams.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(n: u64) -> OscillatorEvent {
        OscillatorEvent::Encoded {
            length_bytes: n,
            symbols: n * 8 / 6,
            reflections: 0,
            timestamp_ns: n,
        }
    }

    #[test]
    fn ring_buffer_keeps_latest_in_order() {
        let ring = EventRingBuffer::new(3);
        assert!(ring.is_empty());
        for n in 1..=5 {
            ring.on_event(&encoded(n));
        }
        let stamps: Vec<u64> = ring.drain().iter().map(OscillatorEvent::timestamp_ns).collect();
        assert_eq!(stamps, vec![3, 4, 5]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.total_observed(), 5);
    }

    #[test]
    fn zero_capacity_ring_still_records() {
        let ring = EventRingBuffer::new(0);
        ring.on_event(&encoded(1));
        ring.on_event(&encoded(2));
        assert_eq!(ring.drain(), vec![encoded(2)]);
    }

    #[test]
    fn metrics_fold_events() {
        let metrics = OscillatorMetrics::new();
        metrics.on_event(&encoded(10));
        metrics.on_event(&OscillatorEvent::Decoded {
            length_bytes: 10,
            ambiguous_steps: 12,
            start_matches: true,
            timestamp_ns: 1,
        });
        metrics.on_event(&OscillatorEvent::DecodeFailed {
            kind: "anchor_mismatch",
            probe_miss: true,
            timestamp_ns: 2,
        });
        let snap = metrics.snapshot();
        assert_eq!(snap.encodes_total, 1);
        assert_eq!(snap.bytes_encoded_total, 10);
        assert_eq!(snap.decodes_total, 1);
        assert_eq!(snap.ambiguous_steps_total, 12);
        assert_eq!(snap.decode_failures_total, 1);
        assert_eq!(snap.probe_misses_total, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), OscillatorMetricsSnapshot::default());
    }

    #[test]
    fn events_serialize_with_kind_labels() {
        let event = OscillatorEvent::StreamFinished {
            order: StreamOrder::Original,
            bytes_emitted: 4,
            chunks: 1,
            verified: true,
            timestamp_ns: 9,
        };
        assert_eq!(event.kind_str(), "stream_finished");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("StreamFinished"));
        assert!(json.contains("\"original\""));
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let a = monotonic_ns();
        let b = monotonic_ns();
        assert!(b >= a);
    }
}
