//! Error types shared by every Odin's Eye crate.
//!
//! The four decode failures ([`OdinError::AnchorMismatch`],
//! [`OdinError::BackwardDecodeStuck`], [`OdinError::MalformedSymbolStream`],
//! [`OdinError::IntegrityMismatch`]) are terminal for a single decode call and
//! are never retried internally. Callers probing many candidate coordinates
//! should treat all four the same way; see [`OdinError::is_probe_miss`].

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, OdinError>;

/// Stable classification of [`OdinError`] values, used for metrics and
/// telemetry where the payload is not needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    AnchorMismatch,
    BackwardDecodeStuck,
    MalformedSymbolStream,
    IntegrityMismatch,
    InvalidSymbol,
    PositionOutOfLattice,
    InvalidDirection,
    CoordinateFormat,
    InvalidConfig,
    Io,
}

impl ErrorKind {
    /// Short snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnchorMismatch => "anchor_mismatch",
            Self::BackwardDecodeStuck => "backward_decode_stuck",
            Self::MalformedSymbolStream => "malformed_symbol_stream",
            Self::IntegrityMismatch => "integrity_mismatch",
            Self::InvalidSymbol => "invalid_symbol",
            Self::PositionOutOfLattice => "position_out_of_lattice",
            Self::InvalidDirection => "invalid_direction",
            Self::CoordinateFormat => "coordinate_format",
            Self::InvalidConfig => "invalid_config",
            Self::Io => "io",
        }
    }
}

/// Errors produced by the oscillator and its facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OdinError {
    /// The stored anchor/end/last-symbol triple is internally inconsistent.
    #[error("anchor mismatch: {detail}")]
    AnchorMismatch { detail: String },

    /// No candidate symbol reconciles the current position during the
    /// backward search.
    #[error(
        "backward decode stuck at step {step}: no symbol reconciles position {position} (direction {direction})"
    )]
    BackwardDecodeStuck {
        step: usize,
        position: i64,
        direction: i8,
    },

    /// The reconstructed bit-stream is shorter than `length_bytes * 8`.
    #[error("malformed symbol stream: need {required_bits} bits, have {available_bits}")]
    MalformedSymbolStream {
        required_bits: u64,
        available_bits: u64,
    },

    /// Digest of the recovered bytes differs from the coordinate's digest.
    #[error("integrity mismatch: expected {expected}, computed {computed}")]
    IntegrityMismatch { expected: String, computed: String },

    /// A symbol value outside `0..=63`.
    #[error("invalid symbol {value}: must be in 0..=63")]
    InvalidSymbol { value: u8 },

    /// A position outside the lattice bounds.
    #[error("position {value} lies outside the lattice [{low}, {high}]")]
    PositionOutOfLattice { value: i64, low: i64, high: i64 },

    /// A direction value other than `1` or `-1`.
    #[error("invalid direction {value}: must be 1 or -1")]
    InvalidDirection { value: i64 },

    /// A stored coordinate could not be parsed or serialized.
    #[error("coordinate format error: {detail}")]
    CoordinateFormat { detail: String },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    /// Filesystem failure while reading or writing a coordinate.
    #[error("i/o error: {detail}")]
    Io { detail: String },
}

impl OdinError {
    /// Classification without payload.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AnchorMismatch { .. } => ErrorKind::AnchorMismatch,
            Self::BackwardDecodeStuck { .. } => ErrorKind::BackwardDecodeStuck,
            Self::MalformedSymbolStream { .. } => ErrorKind::MalformedSymbolStream,
            Self::IntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
            Self::InvalidSymbol { .. } => ErrorKind::InvalidSymbol,
            Self::PositionOutOfLattice { .. } => ErrorKind::PositionOutOfLattice,
            Self::InvalidDirection { .. } => ErrorKind::InvalidDirection,
            Self::CoordinateFormat { .. } => ErrorKind::CoordinateFormat,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether this is one of the four terminal decode failures.
    ///
    /// The core makes no distinction between "corrupt" and "not mine"; a
    /// probing caller should treat every such error as a non-match and move
    /// on to the next candidate.
    #[must_use]
    pub const fn is_probe_miss(&self) -> bool {
        matches!(
            self,
            Self::AnchorMismatch { .. }
                | Self::BackwardDecodeStuck { .. }
                | Self::MalformedSymbolStream { .. }
                | Self::IntegrityMismatch { .. }
        )
    }

    /// Build an [`OdinError::AnchorMismatch`].
    pub fn anchor_mismatch(detail: impl Into<String>) -> Self {
        Self::AnchorMismatch {
            detail: detail.into(),
        }
    }

    /// Build an [`OdinError::CoordinateFormat`].
    pub fn coordinate_format(detail: impl Into<String>) -> Self {
        Self::CoordinateFormat {
            detail: detail.into(),
        }
    }
}

impl From<std::io::Error> for OdinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            detail: err.to_string(),
        }
    }
}
