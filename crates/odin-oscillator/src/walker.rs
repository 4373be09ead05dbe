//! Forward Walker: drives a bounded position through the lattice, one step
//! per symbol, and summarizes the walk as a [`Coordinate`].
//!
//! Boundary handling is a reset, not a mirror: a step that would leave the
//! lattice above `HIGH` lands on `LOW` heading forward, and a step that
//! would leave it below `LOW` lands on `HIGH` heading backward.

use odin_types::{
    COORDINATE_FORMAT_VERSION, ContentHash, Coordinate, Direction, HIGH, Position, Symbol,
};
use tracing::debug;

use crate::symbol_codec::PackedSymbols;

/// Which reset a step triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Reflection {
    /// The candidate exceeded `HIGH`; the walk restarts at `LOW` heading `+1`.
    ResetToLow,
    /// The candidate fell below `LOW`; the walk restarts at `HIGH` heading `-1`.
    ResetToHigh,
}

/// Apply the reset rule to a raw candidate position.
#[must_use]
pub fn reflect(candidate: i64, direction: Direction) -> (Position, Direction, Option<Reflection>) {
    match Position::new(candidate) {
        Ok(position) => (position, direction, None),
        Err(_) if candidate > HIGH => (
            Position::LOW,
            Direction::Forward,
            Some(Reflection::ResetToLow),
        ),
        Err(_) => (
            Position::HIGH,
            Direction::Backward,
            Some(Reflection::ResetToHigh),
        ),
    }
}

/// Record of a single forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub symbol: Symbol,
    pub from: Position,
    pub to: Position,
    pub direction_before: Direction,
    pub direction_after: Direction,
    pub reflection: Option<Reflection>,
}

/// Walk state `(position, direction)` plus what the coordinate needs to
/// remember about the final step.
#[derive(Debug, Clone)]
pub struct Walker {
    start: Position,
    position: Position,
    direction: Direction,
    anchor: Position,
    last_symbol: Symbol,
    last_direction: Direction,
    steps: u64,
    reflections: u64,
}

impl Walker {
    #[must_use]
    pub const fn new(start: Position) -> Self {
        Self {
            start,
            position: start,
            direction: Direction::Forward,
            anchor: start,
            last_symbol: Symbol::MIN,
            last_direction: Direction::Forward,
            steps: 0,
            reflections: 0,
        }
    }

    /// Consume one symbol.
    pub fn step(&mut self, symbol: Symbol) -> StepOutcome {
        let direction_before = self.direction;
        let candidate = self.position.get() + direction_before.delta(symbol);
        let (to, direction_after, reflection) = reflect(candidate, direction_before);

        let outcome = StepOutcome {
            symbol,
            from: self.position,
            to,
            direction_before,
            direction_after,
            reflection,
        };

        self.anchor = self.position;
        self.position = to;
        self.direction = direction_after;
        self.last_symbol = symbol;
        self.last_direction = direction_before;
        self.steps += 1;
        if reflection.is_some() {
            self.reflections += 1;
        }
        outcome
    }

    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub const fn anchor(&self) -> Position {
        self.anchor
    }

    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub const fn reflections(&self) -> u64 {
        self.reflections
    }

    /// Summarize the walk over `data` (which must be the buffer whose
    /// symbols were fed to [`Walker::step`]).
    #[must_use]
    pub fn into_coordinate(self, data: &[u8]) -> Coordinate {
        Coordinate {
            start_mask: self.start.get(),
            end_mask: self.position.get(),
            anchor_mask: self.anchor.get(),
            last_symbol: self.last_symbol.get(),
            last_direction: self.last_direction,
            length_bytes: data.len() as u64,
            content_hash: Some(ContentHash::of(data)),
            format_version: COORDINATE_FORMAT_VERSION.to_owned(),
        }
    }
}

/// Summary of a completed forward walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub coordinate: Coordinate,
    pub symbols: u64,
    pub reflections: u64,
}

/// Walk `data` from `start` and return the resulting coordinate along with
/// step counters.
#[must_use]
pub fn walk(data: &[u8], start: Position) -> EncodeSummary {
    if data.is_empty() {
        return EncodeSummary {
            coordinate: Coordinate::empty(start),
            symbols: 0,
            reflections: 0,
        };
    }

    let mut walker = Walker::new(start);
    for symbol in PackedSymbols::new(data) {
        walker.step(symbol);
    }
    let symbols = walker.steps();
    let reflections = walker.reflections();
    let coordinate = walker.into_coordinate(data);
    debug!(
        length_bytes = coordinate.length_bytes,
        symbols,
        reflections,
        start_mask = coordinate.start_mask,
        end_mask = coordinate.end_mask,
        anchor_mask = coordinate.anchor_mask,
        "forward walk complete"
    );
    EncodeSummary {
        coordinate,
        symbols,
        reflections,
    }
}

/// Encode `data` into a coordinate, starting the walk at `start`.
#[must_use]
pub fn encode(data: &[u8], start: Position) -> Coordinate {
    walk(data, start).coordinate
}
