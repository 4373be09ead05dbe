//! Content digest carried by a [`Coordinate`](crate::Coordinate).
//!
//! The digest is SHA-256 over the original buffer, persisted as 64 lowercase
//! hex characters. It is used only to verify a reconstruction, never to
//! drive one.

use std::fmt;
use std::str::FromStr;

use odin_error::{OdinError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest length in bytes.
pub const CONTENT_HASH_BYTES: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; CONTENT_HASH_BYTES]);

impl ContentHash {
    /// Digest `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut out = [0_u8; CONTENT_HASH_BYTES];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Wrap an already computed digest.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CONTENT_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CONTENT_HASH_BYTES] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";

        let mut hex = String::with_capacity(CONTENT_HASH_BYTES * 2);
        for byte in self.0 {
            hex.push(char::from(HEX[usize::from(byte >> 4)]));
            hex.push(char::from(HEX[usize::from(byte & 0x0F)]));
        }
        hex
    }

    /// Parse 64 hex characters (either case).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let raw = hex.as_bytes();
        if raw.len() != CONTENT_HASH_BYTES * 2 {
            return Err(OdinError::coordinate_format(format!(
                "content_hash must be {} hex characters, got {}",
                CONTENT_HASH_BYTES * 2,
                raw.len()
            )));
        }
        let mut out = [0_u8; CONTENT_HASH_BYTES];
        for (index, pair) in raw.chunks_exact(2).enumerate() {
            let high = hex_nibble(pair[0])?;
            let low = hex_nibble(pair[1])?;
            out[index] = (high << 4) | low;
        }
        Ok(Self(out))
    }
}

fn hex_nibble(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        other => Err(OdinError::coordinate_format(format!(
            "content_hash contains non-hex character {:?}",
            char::from(other)
        ))),
    }
}

impl FromStr for ContentHash {
    type Err = OdinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = OdinError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_digest_matches_known_sha256() {
        assert_eq!(
            ContentHash::of(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hex_keeps_leading_zero_nibbles() {
        let mut bytes = [0_u8; CONTENT_HASH_BYTES];
        bytes[0] = 0x0a;
        bytes[31] = 0xf0;
        let hex = ContentHash::from_bytes(bytes).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("0a00"));
        assert!(hex.ends_with("00f0"));
        assert_eq!(ContentHash::from_hex(&hex).unwrap(), ContentHash::from_bytes(bytes));
    }

    #[test]
    fn hex_parse_accepts_uppercase() {
        let hash = ContentHash::of(b"odin");
        let upper = hash.to_hex().to_uppercase();
        assert_eq!(ContentHash::from_hex(&upper), Ok(hash));
    }

    #[test]
    fn hex_parse_rejects_bad_input() {
        assert!(ContentHash::from_hex("abc").is_err());
        let mut bad = "0".repeat(63);
        bad.push('g');
        let err = ContentHash::from_hex(&bad).unwrap_err();
        assert!(err.to_string().contains("non-hex"), "{err}");
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = ContentHash::of(b"lattice");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
