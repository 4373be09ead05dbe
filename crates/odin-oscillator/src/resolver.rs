//! Backward Resolver: reconstructs the symbol sequence of a walk from its
//! [`Coordinate`] by searching back from the end position.
//!
//! # Known limitation
//!
//! Candidate predecessors for the 64 symbols are spaced `STEP_FACTOR` apart
//! and span `CANDIDATE_WINDOW` (504) units. Whenever the current position is
//! far enough from both bounds, every candidate produces an in-range
//! predecessor and the ascending first-match rule picks `d = 0` regardless
//! of which symbol actually produced the step. Such steps are reported as
//! [`StepResolution::AmbiguousButAccepted`]; the first-match choice itself is
//! kept as is, because any other choice changes observable output.
//!
//! # Reachability
//!
//! The 64 candidate predecessors of a step span `CANDIDATE_WINDOW` units
//! around the current position, and every position is inside the lattice, so
//! at least one candidate is always in range. [`OdinError::BackwardDecodeStuck`]
//! therefore cannot occur for a coordinate that passed [`resolve_anchor`]; the
//! reset-unwinding branches of the acceptance test cannot fire either, since
//! a single step moves at most 256 units.

use odin_error::{OdinError, Result};
use odin_types::{Coordinate, Direction, HIGH, LATTICE_WIDTH, LOW, Position, Symbol, symbol_count};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::walker::Reflection;

/// Upper bound on up-front allocation for reconstructed symbols; longer
/// walks grow the buffer as they go.
const MAX_PREALLOCATED_SYMBOLS: usize = 1 << 20;

/// Outcome of a single backward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepResolution {
    /// Exactly one candidate symbol satisfied the acceptance test.
    Resolved(Symbol),
    /// Several candidates satisfied it; the smallest was accepted.
    AmbiguousButAccepted(Symbol),
}

impl StepResolution {
    #[must_use]
    pub const fn symbol(self) -> Symbol {
        match self {
            Self::Resolved(symbol) | Self::AmbiguousButAccepted(symbol) => symbol,
        }
    }

    #[must_use]
    pub const fn is_ambiguous(self) -> bool {
        matches!(self, Self::AmbiguousButAccepted(_))
    }
}

/// How the final step was reconciled with the stored anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnchorKind {
    /// `end - direction * delta == anchor`: no reset on the final step.
    Direct,
    /// The final step overflowed `HIGH` and reset to `LOW`.
    ResetFromAbove,
    /// The final step underflowed `LOW` and reset to `HIGH`.
    ResetFromBelow,
}

/// Result of re-deriving the final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorResolution {
    pub end: Position,
    pub anchor: Position,
    pub last_symbol: Symbol,
    /// Direction the backward search continues with.
    pub direction: Direction,
    pub kind: AnchorKind,
}

/// Re-derive the final step of the walk and check it against the stored
/// anchor.
///
/// The search continues with the coordinate's `last_direction`, which is the
/// direction that was in effect while the walk arrived at the anchor. After
/// a reset this is not the direction the reset produced: a walk that reset
/// from above while heading backward reached its anchor heading backward.
pub fn resolve_anchor(coord: &Coordinate) -> Result<AnchorResolution> {
    reconcile(Seed::of(coord))
}

fn reconcile(seed: Seed) -> Result<AnchorResolution> {
    let end = Position::new(seed.end_mask).map_err(|_| {
        OdinError::anchor_mismatch(format!("end_mask {} outside the lattice", seed.end_mask))
    })?;
    let anchor = Position::new(seed.anchor_mask).map_err(|_| {
        OdinError::anchor_mismatch(format!(
            "anchor_mask {} outside the lattice",
            seed.anchor_mask
        ))
    })?;
    let last_symbol = Symbol::new(seed.last_symbol).map_err(|_| {
        OdinError::anchor_mismatch(format!(
            "last_symbol {} outside the symbol alphabet",
            seed.last_symbol
        ))
    })?;
    let direction = seed.last_direction;
    let delta = direction.delta(last_symbol);

    let kind = if end.get() - delta == anchor.get() {
        AnchorKind::Direct
    } else if end == Position::LOW && anchor.get() + delta > HIGH {
        AnchorKind::ResetFromAbove
    } else if end == Position::HIGH && anchor.get() + delta < LOW {
        AnchorKind::ResetFromBelow
    } else {
        return Err(OdinError::anchor_mismatch(format!(
            "end_mask {end} with last_symbol {last_symbol} (direction {direction}) implies anchor {}, stored anchor_mask is {anchor}",
            end.get() - delta
        )));
    };

    debug!(
        end_mask = end.get(),
        anchor_mask = anchor.get(),
        last_symbol = last_symbol.get(),
        kind = ?kind,
        "anchor resolved"
    );
    Ok(AnchorResolution {
        end,
        anchor,
        last_symbol,
        direction,
        kind,
    })
}

/// An accepted predecessor for one backward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predecessor {
    pub resolution: StepResolution,
    pub position: Position,
    /// Direction in effect before the step.
    pub direction: Direction,
    /// Reset that was unwound to reach the predecessor, if any.
    pub unwound: Option<Reflection>,
    /// How many of the 64 candidates satisfied the acceptance test.
    pub candidates: u8,
}

/// Test one candidate symbol against `(position, direction)`.
fn accept(
    position: Position,
    direction: Direction,
    symbol: Symbol,
) -> Option<(Position, Direction, Option<Reflection>)> {
    let predecessor = position.get() - direction.delta(symbol);
    if let Ok(plain) = Position::new(predecessor) {
        return Some((plain, direction, None));
    }
    if position == Position::LOW && predecessor > HIGH {
        return Position::new(predecessor - LATTICE_WIDTH)
            .ok()
            .map(|real| (real, Direction::Forward, Some(Reflection::ResetToLow)));
    }
    if position == Position::HIGH && predecessor < LOW {
        return Position::new(predecessor + LATTICE_WIDTH)
            .ok()
            .map(|real| (real, Direction::Backward, Some(Reflection::ResetToHigh)));
    }
    None
}

/// Search the 64 candidate symbols in ascending order and accept the first
/// one whose predecessor is valid. Returns `None` when no candidate fits.
#[must_use]
pub fn search_predecessor(position: Position, direction: Direction) -> Option<Predecessor> {
    let mut first: Option<(Symbol, Position, Direction, Option<Reflection>)> = None;
    let mut candidates = 0_u8;
    for symbol in Symbol::all() {
        if let Some((pred, dir, unwound)) = accept(position, direction, symbol) {
            candidates += 1;
            if first.is_none() {
                first = Some((symbol, pred, dir, unwound));
            }
        }
    }
    first.map(|(symbol, position, direction, unwound)| Predecessor {
        resolution: if candidates == 1 {
            StepResolution::Resolved(symbol)
        } else {
            StepResolution::AmbiguousButAccepted(symbol)
        },
        position,
        direction,
        unwound,
        candidates,
    })
}

/// One reconstructed step, reported in reverse chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStep {
    /// Chronological index of the symbol in the original sequence.
    pub index: u64,
    pub resolution: StepResolution,
    /// Position the step arrived at.
    pub to: Position,
    /// Position the step started from.
    pub from: Position,
    /// Direction used to take the step.
    pub direction: Direction,
    pub unwound: Option<Reflection>,
}

/// The coordinate fields the backward search starts from.
#[derive(Debug, Clone, Copy)]
struct Seed {
    end_mask: i64,
    anchor_mask: i64,
    last_symbol: u8,
    last_direction: Direction,
}

impl Seed {
    const fn of(coord: &Coordinate) -> Self {
        Self {
            end_mask: coord.end_mask,
            anchor_mask: coord.anchor_mask,
            last_symbol: coord.last_symbol,
            last_direction: coord.last_direction,
        }
    }
}

/// Resolution engine shared by batch and streaming decode.
///
/// Yields the last original symbol first and walks toward the start. The
/// iterator is finite (`ceil(length_bytes * 8 / 6)` items), does at most 64
/// candidate checks per item, and is fused after the first error.
#[derive(Debug, Clone)]
pub struct Resolver {
    seed: Seed,
    total: u64,
    produced: u64,
    cursor: Option<(Position, Direction)>,
    anchor_kind: Option<AnchorKind>,
    ambiguous_steps: u64,
    unwound_resets: u64,
    failed: bool,
}

impl Resolver {
    #[must_use]
    pub fn new(coord: &Coordinate) -> Self {
        Self {
            seed: Seed::of(coord),
            total: symbol_count(coord.length_bytes),
            produced: 0,
            cursor: None,
            anchor_kind: None,
            ambiguous_steps: 0,
            unwound_resets: 0,
            failed: false,
        }
    }

    /// Total symbols this resolver will produce on success.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Symbols produced so far.
    #[must_use]
    pub const fn produced(&self) -> u64 {
        self.produced
    }

    #[must_use]
    pub const fn ambiguous_steps(&self) -> u64 {
        self.ambiguous_steps
    }

    #[must_use]
    pub const fn unwound_resets(&self) -> u64 {
        self.unwound_resets
    }

    #[must_use]
    pub const fn anchor_kind(&self) -> Option<AnchorKind> {
        self.anchor_kind
    }

    /// Position reached by the backward walk so far. Once the resolver is
    /// exhausted this is the reconstructed start of the walk.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.cursor.map(|(position, _)| position)
    }

    fn resolve_final(&mut self) -> Result<ResolvedStep> {
        let anchored = reconcile(self.seed)?;
        self.cursor = Some((anchored.anchor, anchored.direction));
        self.anchor_kind = Some(anchored.kind);
        Ok(ResolvedStep {
            index: self.total - 1,
            resolution: StepResolution::Resolved(anchored.last_symbol),
            to: anchored.end,
            from: anchored.anchor,
            direction: anchored.direction,
            unwound: match anchored.kind {
                AnchorKind::Direct => None,
                AnchorKind::ResetFromAbove => Some(Reflection::ResetToLow),
                AnchorKind::ResetFromBelow => Some(Reflection::ResetToHigh),
            },
        })
    }

    fn resolve_previous(&mut self) -> Result<ResolvedStep> {
        let Some((position, direction)) = self.cursor else {
            return Err(OdinError::anchor_mismatch(
                "backward search started before the anchor was resolved",
            ));
        };
        let step = usize::try_from(self.produced).unwrap_or(usize::MAX);
        let predecessor = search_predecessor(position, direction).ok_or(
            OdinError::BackwardDecodeStuck {
                step,
                position: position.get(),
                direction: direction.sign() as i8,
            },
        )?;

        if predecessor.resolution.is_ambiguous() {
            self.ambiguous_steps += 1;
        }
        if predecessor.unwound.is_some() {
            self.unwound_resets += 1;
        }
        self.cursor = Some((predecessor.position, predecessor.direction));
        Ok(ResolvedStep {
            index: self.total - 1 - self.produced,
            resolution: predecessor.resolution,
            to: position,
            from: predecessor.position,
            direction: predecessor.direction,
            unwound: predecessor.unwound,
        })
    }
}

impl Iterator for Resolver {
    type Item = Result<ResolvedStep>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.produced >= self.total {
            return None;
        }
        let step = if self.produced == 0 {
            self.resolve_final()
        } else {
            self.resolve_previous()
        };
        match step {
            Ok(step) => {
                self.produced += 1;
                Some(Ok(step))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let left = usize::try_from(self.total - self.produced).unwrap_or(usize::MAX);
        (0, Some(left))
    }
}

impl std::iter::FusedIterator for Resolver {}

/// Complete backward reconstruction of a coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Reconstructed symbols in chronological order.
    pub symbols: Vec<Symbol>,
    /// Steps where more than one candidate was acceptable.
    pub ambiguous_steps: u64,
    /// Steps that unwound a reset.
    pub unwound_resets: u64,
    pub anchor_kind: Option<AnchorKind>,
    /// Where the backward walk ended up.
    pub reconstructed_start: Option<Position>,
    /// Whether the reconstructed start equals the stored `start_mask`.
    /// Reported only; a mismatch is not an error.
    pub start_matches: bool,
    /// xxh3 fingerprint of the reconstructed symbol trail.
    pub trail_xxh3: u64,
}

impl Resolution {
    /// Whether every step was uniquely determined.
    #[must_use]
    pub const fn is_unambiguous(&self) -> bool {
        self.ambiguous_steps == 0
    }
}

/// Run the resolver to completion and return the symbols in chronological
/// order.
pub fn resolve_symbols(coord: &Coordinate) -> Result<Resolution> {
    let mut resolver = Resolver::new(coord);
    let preallocate = usize::try_from(resolver.total())
        .unwrap_or(MAX_PREALLOCATED_SYMBOLS)
        .min(MAX_PREALLOCATED_SYMBOLS);
    let mut symbols = Vec::with_capacity(preallocate);
    for step in resolver.by_ref() {
        symbols.push(step?.resolution.symbol());
    }
    symbols.reverse();

    let reconstructed_start = resolver.position();
    let start_matches = match reconstructed_start {
        Some(start) => start.get() == coord.start_mask,
        None => coord.end_mask == coord.start_mask,
    };
    if !start_matches {
        warn!(
            start_mask = coord.start_mask,
            reconstructed = ?reconstructed_start.map(Position::get),
            ambiguous_steps = resolver.ambiguous_steps(),
            "backward walk did not return to the stored start"
        );
    }
    debug!(
        symbols = symbols.len(),
        ambiguous_steps = resolver.ambiguous_steps(),
        unwound_resets = resolver.unwound_resets(),
        "backward resolution complete"
    );

    Ok(Resolution {
        trail_xxh3: hash_trail(&symbols),
        symbols,
        ambiguous_steps: resolver.ambiguous_steps(),
        unwound_resets: resolver.unwound_resets(),
        anchor_kind: resolver.anchor_kind(),
        reconstructed_start,
        start_matches,
    })
}

fn hash_trail(symbols: &[Symbol]) -> u64 {
    let mut bytes = Vec::with_capacity("symbol_trail".len() + symbols.len());
    bytes.extend_from_slice(b"symbol_trail");
    bytes.extend(symbols.iter().map(|symbol| symbol.get()));
    xxh3_64(&bytes)
}
