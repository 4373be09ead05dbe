//! Odin's Eye: encode a byte buffer as a bounded walk over an integer
//! lattice, store the walk's [`Coordinate`], and decode it back.
//!
//! ```
//! use odin::{OdinsEye, OscillatorConfig};
//!
//! let eye = OdinsEye::new(OscillatorConfig::default()).unwrap();
//! let coord = eye.encode(&[0_u8; 16]);
//! assert_eq!(eye.decode(&coord).unwrap(), vec![0_u8; 16]);
//! ```
//!
//! Only a narrow class of payloads survives the round trip (see
//! [`odin_oscillator::resolver`]). Anything else fails with one of the four
//! decode errors, which [`OdinsEye::probe`] and [`OdinsEye::scan`] treat as
//! "not a match".

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

pub use odin_error::{ErrorKind, OdinError, Result};
pub use odin_oscillator::{
    DecodeReport, DecodeStream, EventRingBuffer, NoOpObserver, OscillatorConfig, OscillatorEvent,
    OscillatorMetrics, OscillatorMetricsSnapshot, OscillatorObserver, Resolution, StreamOrder,
    VerifyPolicy,
};
pub use odin_types::{ContentHash, Coordinate, Direction, Position, Symbol};

use odin_oscillator::monotonic_ns;

/// Delivers each event to the facade's metrics and then to the user
/// observer.
struct Fanout {
    metrics: Arc<OscillatorMetrics>,
    observer: Arc<dyn OscillatorObserver>,
}

impl OscillatorObserver for Fanout {
    fn on_event(&self, event: &OscillatorEvent) {
        self.metrics.on_event(event);
        self.observer.on_event(event);
    }
}

/// A candidate accepted by [`OdinsEye::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    /// Position of the candidate in the scanned sequence.
    pub index: usize,
    pub coordinate: Coordinate,
    pub bytes: Vec<u8>,
}

/// Entry point bundling configuration, metrics and an optional observer.
///
/// Every call is independent; an `OdinsEye` can be shared across threads.
pub struct OdinsEye {
    config: OscillatorConfig,
    start: Position,
    metrics: Arc<OscillatorMetrics>,
    events: Arc<Fanout>,
}

impl std::fmt::Debug for OdinsEye {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdinsEye")
            .field("config", &self.config)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

impl OdinsEye {
    pub fn new(config: OscillatorConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(NoOpObserver))
    }

    pub fn with_observer(
        config: OscillatorConfig,
        observer: Arc<dyn OscillatorObserver>,
    ) -> Result<Self> {
        config.validate()?;
        let start = config.start()?;
        let metrics = Arc::new(OscillatorMetrics::new());
        let events = Arc::new(Fanout {
            metrics: Arc::clone(&metrics),
            observer,
        });
        Ok(Self {
            config,
            start,
            metrics,
            events,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &OscillatorConfig {
        &self.config
    }

    /// Encode from the configured start position.
    #[must_use]
    pub fn encode(&self, data: &[u8]) -> Coordinate {
        self.encode_at(data, self.start)
    }

    #[must_use]
    pub fn encode_at(&self, data: &[u8], start: Position) -> Coordinate {
        let summary = odin_oscillator::walk(data, start);
        self.events.on_event(&OscillatorEvent::Encoded {
            length_bytes: summary.coordinate.length_bytes,
            symbols: summary.symbols,
            reflections: summary.reflections,
            timestamp_ns: monotonic_ns(),
        });
        summary.coordinate
    }

    /// Encode from a start position derived from `label`, so that two
    /// parties sharing the label agree on the start without storing it.
    #[must_use]
    pub fn encode_labeled(&self, data: &[u8], label: &str) -> Coordinate {
        self.encode_at(data, Position::derive_from_label(label))
    }

    pub fn decode(&self, coord: &Coordinate) -> Result<Vec<u8>> {
        self.decode_report(coord).map(|report| report.bytes)
    }

    pub fn decode_report(&self, coord: &Coordinate) -> Result<DecodeReport> {
        let outcome = if coord.is_empty() {
            self.decode_empty(coord)
        } else {
            odin_oscillator::decode_with_report(coord, self.config.verify)
        };
        match &outcome {
            Ok(report) => self.events.on_event(&OscillatorEvent::Decoded {
                length_bytes: coord.length_bytes,
                ambiguous_steps: report.resolution.ambiguous_steps,
                start_matches: report.resolution.start_matches,
                timestamp_ns: monotonic_ns(),
            }),
            Err(err) => {
                debug!(error = %err, kind = err.kind().as_str(), "decode failed");
                self.events.on_event(&OscillatorEvent::DecodeFailed {
                    kind: err.kind().as_str(),
                    probe_miss: err.is_probe_miss(),
                    timestamp_ns: monotonic_ns(),
                });
            }
        }
        outcome
    }

    fn decode_empty(&self, coord: &Coordinate) -> Result<DecodeReport> {
        odin_oscillator::verify_content(coord, &[], self.config.verify)?;
        Ok(DecodeReport {
            bytes: Vec::new(),
            resolution: Resolution {
                symbols: Vec::new(),
                ambiguous_steps: 0,
                unwound_resets: 0,
                anchor_kind: None,
                reconstructed_start: coord.end().ok(),
                start_matches: coord.end_mask == coord.start_mask,
                trail_xxh3: 0,
            },
            verified: coord.content_hash.is_some(),
        })
    }

    /// Chunked decode using the configured order and chunk size.
    #[must_use]
    pub fn decode_stream(&self, coord: &Coordinate) -> DecodeStream {
        DecodeStream::new(
            coord,
            self.config.stream_order,
            self.config.verify,
            self.config.stream_chunk_bytes,
        )
        .with_observer(Arc::clone(&self.events) as Arc<dyn OscillatorObserver>)
    }

    /// Decode `coord`, mapping every failure to `None`.
    pub fn probe(&self, coord: &Coordinate) -> Option<Vec<u8>> {
        match self.decode(coord) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.is_probe_miss() => None,
            Err(err) => {
                warn!(error = %err, "probe failed outside the decode path");
                None
            }
        }
    }

    /// Probe `candidates` in order and return the first one that decodes
    /// and whose bytes `accept` approves.
    pub fn scan<I>(&self, candidates: I, mut accept: impl FnMut(&[u8]) -> bool) -> Option<ProbeHit>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut probed = 0_usize;
        for (index, coordinate) in candidates.into_iter().enumerate() {
            probed += 1;
            let Some(bytes) = self.probe(&coordinate) else {
                continue;
            };
            if accept(&bytes) {
                info!(
                    index,
                    length_bytes = coordinate.length_bytes,
                    "probe matched candidate coordinate"
                );
                return Some(ProbeHit {
                    index,
                    coordinate,
                    bytes,
                });
            }
        }
        debug!(probed, "scan found no match");
        None
    }

    #[must_use]
    pub fn metrics(&self) -> OscillatorMetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Load a coordinate from a `.json` file path, or parse `source` itself as
/// an inline JSON object.
pub fn load_coordinate(source: &str) -> Result<Coordinate> {
    if source.ends_with(".json") {
        let json = std::fs::read_to_string(source)?;
        debug!(path = source, "loaded coordinate file");
        Coordinate::from_json(&json)
    } else {
        Coordinate::from_json(source)
    }
}

/// Write `coord` as pretty JSON.
pub fn save_coordinate(path: impl AsRef<Path>, coord: &Coordinate) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, coord.to_json()?)?;
    debug!(path = %path.display(), "saved coordinate file");
    Ok(())
}
