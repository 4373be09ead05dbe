//! The Odin's Eye oscillator.
//!
//! Encoding packs bytes into 6-bit symbols and drives a bounded walk over
//! `[LOW, HIGH]`, one step of `(symbol - 32) * 8` per symbol, resetting to the
//! opposite bound whenever a step would leave the lattice. The walk is
//! summarized in a [`Coordinate`](odin_types::Coordinate).
//!
//! Decoding runs the walk backward from the end position. Most interior
//! steps are ambiguous (see [`resolver`]), so in general only payloads whose
//! symbols all resolve the same way as the first-match rule come back
//! intact; everything else is rejected by the SHA-256 check rather than
//! returned corrupted.

pub mod config;
pub mod decode;
pub mod resolver;
pub mod stream;
pub mod symbol_codec;
pub mod telemetry;
pub mod verify;
pub mod walker;

pub use config::{DEFAULT_STREAM_CHUNK_BYTES, OscillatorConfig, StreamOrder, VerifyPolicy};
pub use decode::{DecodeReport, decode, decode_with_report};
pub use resolver::{
    AnchorKind, AnchorResolution, Predecessor, Resolution, ResolvedStep, Resolver, StepResolution,
    resolve_anchor, resolve_symbols, search_predecessor,
};
pub use stream::DecodeStream;
pub use symbol_codec::{BitRegrouper, PackedSymbols, pack, unpack};
pub use telemetry::{
    EventRingBuffer, NoOpObserver, OscillatorEvent, OscillatorMetrics, OscillatorMetricsSnapshot,
    OscillatorObserver, monotonic_ns,
};
pub use verify::{IncrementalVerifier, MISSING_HASH, verify_against, verify_content};
pub use walker::{EncodeSummary, Reflection, StepOutcome, Walker, encode, reflect, walk};
