//! Core types for the Odin's Eye oscillator.
//!
//! The oscillator maps a byte buffer onto a bounded random walk over the
//! integer lattice `[LOW, HIGH]` and summarizes the walk in a [`Coordinate`].
//! This crate holds the lattice constants, the value types that are only
//! constructible inside their valid ranges, and the persisted record itself.

pub mod coordinate;
pub mod hash;
pub mod lattice;

pub use coordinate::{COORDINATE_FORMAT_VERSION, Coordinate, LEGACY_FORMAT_VERSION};
pub use hash::{CONTENT_HASH_BYTES, ContentHash};
pub use lattice::{
    CANDIDATE_WINDOW, CENTER, DEFAULT_START_MASK, Direction, HIGH, LATTICE_WIDTH, LOW, Position,
    STEP_FACTOR, SYMBOL_ALPHABET, SYMBOL_BITS, Symbol, symbol_count,
};
