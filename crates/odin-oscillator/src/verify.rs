//! Integrity checks on recovered bytes.

use odin_error::{OdinError, Result};
use odin_types::{CONTENT_HASH_BYTES, ContentHash, Coordinate};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::VerifyPolicy;

/// Placeholder reported as `expected` when a coordinate carries no hash.
pub const MISSING_HASH: &str = "<none>";

/// Compare the SHA-256 of `data` against `expected`.
pub fn verify_against(expected: &ContentHash, data: &[u8]) -> Result<()> {
    let computed = ContentHash::of(data);
    if &computed == expected {
        Ok(())
    } else {
        Err(OdinError::IntegrityMismatch {
            expected: expected.to_hex(),
            computed: computed.to_hex(),
        })
    }
}

/// Check `data` against the coordinate's hash under `policy`.
pub fn verify_content(coord: &Coordinate, data: &[u8], policy: VerifyPolicy) -> Result<()> {
    match &coord.content_hash {
        Some(expected) => verify_against(expected, data),
        None => missing_hash(data.len() as u64, ContentHash::of(data), policy),
    }
}

fn missing_hash(length: u64, computed: ContentHash, policy: VerifyPolicy) -> Result<()> {
    match policy {
        VerifyPolicy::Strict => Err(OdinError::IntegrityMismatch {
            expected: MISSING_HASH.to_owned(),
            computed: computed.to_hex(),
        }),
        VerifyPolicy::AllowUnhashed => {
            warn!(length, "coordinate has no content hash; returning unverified bytes");
            Ok(())
        }
    }
}

/// SHA-256 verifier fed chunk by chunk, for streaming decode.
#[derive(Debug, Clone)]
pub struct IncrementalVerifier {
    hasher: Sha256,
    expected: Option<ContentHash>,
    policy: VerifyPolicy,
    consumed: u64,
}

impl IncrementalVerifier {
    #[must_use]
    pub fn new(expected: Option<ContentHash>, policy: VerifyPolicy) -> Self {
        Self {
            hasher: Sha256::new(),
            expected,
            policy,
            consumed: 0,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.consumed += chunk.len() as u64;
    }

    /// Bytes hashed so far.
    #[must_use]
    pub const fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Finalize and compare.
    pub fn finish(self) -> Result<()> {
        let mut digest = [0_u8; CONTENT_HASH_BYTES];
        digest.copy_from_slice(&self.hasher.finalize());
        let computed = ContentHash::from_bytes(digest);
        match self.expected {
            Some(expected) if expected == computed => Ok(()),
            Some(expected) => Err(OdinError::IntegrityMismatch {
                expected: expected.to_hex(),
                computed: computed.to_hex(),
            }),
            None => missing_hash(self.consumed, computed, self.policy),
        }
    }
}
