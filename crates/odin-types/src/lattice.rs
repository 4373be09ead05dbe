//! Lattice bounds, step parameters and the bounded value types of the walk.

use std::fmt;

use odin_error::{OdinError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lower lattice bound (inclusive).
pub const LOW: i64 = 10_000;
/// Upper lattice bound (inclusive).
pub const HIGH: i64 = 99_999;
/// Distance between the bounds (`HIGH - LOW`).
pub const LATTICE_WIDTH: i64 = HIGH - LOW;
/// Lattice units per unit of symbol offset.
pub const STEP_FACTOR: i64 = 8;
/// Symbol value that maps to a zero offset.
pub const CENTER: i64 = 32;
/// Bits carried by one symbol.
pub const SYMBOL_BITS: u32 = 6;
/// Number of distinct symbols.
pub const SYMBOL_ALPHABET: u8 = 64;
/// Start mask used when the caller does not pick one.
pub const DEFAULT_START_MASK: i64 = 50_000;
/// Span covered by the candidate predecessors of a single backward step.
///
/// Whenever a position sits farther than this from both bounds, every
/// candidate symbol yields an in-range predecessor.
pub const CANDIDATE_WINDOW: i64 = (SYMBOL_ALPHABET as i64 - 1) * STEP_FACTOR;

/// Number of symbols produced by packing `length_bytes` bytes
/// (`ceil(length_bytes * 8 / 6)`).
#[must_use]
pub fn symbol_count(length_bytes: u64) -> u64 {
    let bits = u128::from(length_bytes) * 8;
    let count = bits.div_ceil(u128::from(SYMBOL_BITS));
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// One 6-bit unit of packed input (`0..=63`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Symbol(u8);

impl Symbol {
    /// Smallest symbol.
    pub const MIN: Self = Self(0);
    /// Largest symbol.
    pub const MAX: Self = Self(SYMBOL_ALPHABET - 1);

    /// Validate a raw symbol value.
    pub const fn new(value: u8) -> Result<Self> {
        if value < SYMBOL_ALPHABET {
            Ok(Self(value))
        } else {
            Err(OdinError::InvalidSymbol { value })
        }
    }

    /// Build a symbol from the low six bits of `value`, discarding the rest.
    #[must_use]
    pub const fn from_low_bits(value: u8) -> Self {
        Self(value & (SYMBOL_ALPHABET - 1))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Signed offset `s - CENTER`, in `[-32, 31]`.
    #[must_use]
    pub const fn offset(self) -> i64 {
        self.0 as i64 - CENTER
    }

    /// Iterate all 64 symbols in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..SYMBOL_ALPHABET).map(Self)
    }
}

impl TryFrom<u8> for Symbol {
    type Error = OdinError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Walk direction. Flips only when a reflection occurs.
///
/// Serialized as the integers `1` and `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// `+1` or `-1`.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// Signed step for `symbol` taken in this direction:
    /// `direction * (symbol - CENTER) * STEP_FACTOR`.
    #[must_use]
    pub const fn delta(self, symbol: Symbol) -> i64 {
        self.sign() * symbol.offset() * STEP_FACTOR
    }
}

impl TryFrom<i64> for Direction {
    type Error = OdinError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Backward),
            other => Err(OdinError::InvalidDirection { value: other }),
        }
    }
}

impl From<Direction> for i64 {
    fn from(direction: Direction) -> Self {
        direction.sign()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+1"),
            Self::Backward => write!(f, "-1"),
        }
    }
}

/// A point of the lattice, always inside `[LOW, HIGH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Position(i64);

impl Position {
    pub const LOW: Self = Self(LOW);
    pub const HIGH: Self = Self(HIGH);
    pub const DEFAULT_START: Self = Self(DEFAULT_START_MASK);

    /// Validate a raw lattice value.
    pub const fn new(value: i64) -> Result<Self> {
        if value >= LOW && value <= HIGH {
            Ok(Self(value))
        } else {
            Err(OdinError::PositionOutOfLattice {
                value,
                low: LOW,
                high: HIGH,
            })
        }
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Distance to the nearer lattice bound.
    #[must_use]
    pub const fn distance_to_bound(self) -> i64 {
        let below = self.0 - LOW;
        let above = HIGH - self.0;
        if below < above { below } else { above }
    }

    /// Deterministic start mask for an identity label.
    ///
    /// The first 32 bits of the label's SHA-256 digest are folded into the
    /// lattice, so every label lands on a valid start.
    #[must_use]
    pub fn derive_from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        Self(LOW + i64::from(prefix) % (LATTICE_WIDTH + 1))
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::DEFAULT_START
    }
}

impl TryFrom<i64> for Position {
    type Error = OdinError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Position> for i64 {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
