//! The persisted summary record of a walk.
//!
//! A [`Coordinate`] is created once by encode and never mutated. It
//! serializes as a flat JSON object with integer fields and a hex digest:
//!
//! ```json
//! {
//!   "start_mask": 50000,
//!   "end_mask": 49744,
//!   "anchor_mask": 50000,
//!   "last_symbol": 0,
//!   "last_direction": 1,
//!   "length_bytes": 1,
//!   "content_hash": "6e340b9c...",
//!   "format_version": "0.2.0"
//! }
//! ```
//!
//! Older stored coordinates used `prev_mask`, `end_d`/`last_choice` and
//! `version`; those names are accepted on input only.

use odin_error::{OdinError, Result};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::lattice::{Direction, Position, Symbol, symbol_count};

/// Version stamped on every coordinate produced by this crate.
pub const COORDINATE_FORMAT_VERSION: &str = "0.2.0";
/// Version assumed for stored coordinates that carry no version field.
pub const LEGACY_FORMAT_VERSION: &str = "0.1.0";

fn legacy_format_version() -> String {
    LEGACY_FORMAT_VERSION.to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Position the walk started from.
    pub start_mask: i64,
    /// Position after the final step.
    pub end_mask: i64,
    /// Position immediately before the final step.
    #[serde(alias = "prev_mask")]
    pub anchor_mask: i64,
    /// Symbol consumed by the final step.
    #[serde(alias = "end_d", alias = "last_choice")]
    pub last_symbol: u8,
    /// Direction used to compute the final step.
    #[serde(default)]
    pub last_direction: Direction,
    /// Exact byte length of the original buffer.
    pub length_bytes: u64,
    /// Digest of the original buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    #[serde(alias = "version", default = "legacy_format_version")]
    pub format_version: String,
}

impl Coordinate {
    /// Coordinate of the empty buffer walked from `start`.
    #[must_use]
    pub fn empty(start: Position) -> Self {
        Self {
            start_mask: start.get(),
            end_mask: start.get(),
            anchor_mask: start.get(),
            last_symbol: 0,
            last_direction: Direction::Forward,
            length_bytes: 0,
            content_hash: Some(ContentHash::of(&[])),
            format_version: COORDINATE_FORMAT_VERSION.to_owned(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length_bytes == 0
    }

    /// Number of symbols the original buffer packed into.
    #[must_use]
    pub fn total_symbols(&self) -> u64 {
        symbol_count(self.length_bytes)
    }

    /// Stored start position, validated against the lattice.
    pub fn start(&self) -> Result<Position> {
        Position::new(self.start_mask)
    }

    /// Stored end position, validated against the lattice.
    pub fn end(&self) -> Result<Position> {
        Position::new(self.end_mask)
    }

    /// Stored anchor position, validated against the lattice.
    pub fn anchor(&self) -> Result<Position> {
        Position::new(self.anchor_mask)
    }

    /// Stored last symbol, validated against the alphabet.
    pub fn last(&self) -> Result<Symbol> {
        Symbol::new(self.last_symbol)
    }

    /// Pretty JSON rendering using the canonical field names.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| OdinError::coordinate_format(err.to_string()))
    }

    /// Parse a JSON object, accepting legacy field names.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| OdinError::coordinate_format(err.to_string()))
    }
}
