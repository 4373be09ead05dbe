//! Oscillator configuration.

use odin_error::{OdinError, Result};
use odin_types::Position;
use serde::{Deserialize, Serialize};

/// Default number of bytes per streamed chunk.
pub const DEFAULT_STREAM_CHUNK_BYTES: usize = 4096;

/// What decode does when a coordinate carries no content hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyPolicy {
    /// A missing hash fails verification.
    #[default]
    Strict,
    /// A missing hash is logged and the bytes are returned unverified.
    AllowUnhashed,
}

/// Order in which a [`DecodeStream`](crate::DecodeStream) emits bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOrder {
    /// Resolve the whole walk first, then emit bytes in original order.
    /// Output is identical to batch decode.
    #[default]
    Original,
    /// Emit bits as soon as each symbol is resolved, i.e. last symbol
    /// first. Bytes come out permuted and verification of a non-trivial
    /// payload fails; kept for callers that only need resolution progress.
    Resolution,
}

/// Tunables shared by encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorConfig {
    /// Start position for encodes that do not pass one explicitly.
    pub start_mask: i64,
    pub verify: VerifyPolicy,
    pub stream_order: StreamOrder,
    pub stream_chunk_bytes: usize,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            start_mask: Position::DEFAULT_START.get(),
            verify: VerifyPolicy::default(),
            stream_order: StreamOrder::default(),
            stream_chunk_bytes: DEFAULT_STREAM_CHUNK_BYTES,
        }
    }
}

impl OscillatorConfig {
    #[must_use]
    pub const fn with_start(mut self, start: Position) -> Self {
        self.start_mask = start.get();
        self
    }

    #[must_use]
    pub const fn with_verify(mut self, verify: VerifyPolicy) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub const fn with_stream_order(mut self, order: StreamOrder) -> Self {
        self.stream_order = order;
        self
    }

    #[must_use]
    pub const fn with_stream_chunk_bytes(mut self, bytes: usize) -> Self {
        self.stream_chunk_bytes = bytes;
        self
    }

    /// Validated start position.
    pub fn start(&self) -> Result<Position> {
        Position::new(self.start_mask)
    }

    /// Reject configurations no operation can run with.
    pub fn validate(&self) -> Result<()> {
        if self.stream_chunk_bytes == 0 {
            return Err(OdinError::InvalidConfig {
                detail: "stream_chunk_bytes must be greater than zero".to_owned(),
            });
        }
        self.start().map_err(|err| OdinError::InvalidConfig {
            detail: format!("start_mask: {err}"),
        })?;
        Ok(())
    }
}
