//! Chunked decode over the shared [`Resolver`].

use std::sync::Arc;

use odin_error::{OdinError, Result};
use odin_types::{Coordinate, SYMBOL_BITS, Symbol};
use tracing::{debug, warn};

use crate::config::{StreamOrder, VerifyPolicy};
use crate::resolver::{Resolver, resolve_symbols};
use crate::symbol_codec::BitRegrouper;
use crate::telemetry::{OscillatorEvent, OscillatorObserver, monotonic_ns};
use crate::verify::IncrementalVerifier;

enum Source {
    /// Symbols in original order, resolved in one pass on first use.
    Forward {
        pending: Option<Box<Coordinate>>,
        symbols: Vec<Symbol>,
        cursor: usize,
    },
    /// Symbols as the resolver produces them, last one first.
    Resolution(Resolver),
}

impl Source {
    fn next_symbol(&mut self) -> Option<Result<Symbol>> {
        match self {
            Self::Forward {
                pending,
                symbols,
                cursor,
            } => {
                if let Some(coord) = pending.take() {
                    match resolve_symbols(&coord) {
                        Ok(resolution) => *symbols = resolution.symbols,
                        Err(err) => return Some(Err(err)),
                    }
                }
                let symbol = symbols.get(*cursor).copied()?;
                *cursor += 1;
                Some(Ok(symbol))
            }
            Self::Resolution(resolver) => resolver
                .next()
                .map(|step| step.map(|step| step.resolution.symbol())),
        }
    }
}

/// Iterator of decoded byte chunks.
///
/// Every chunk is hashed as it is emitted. After the last chunk the stream
/// yields one `Err(IntegrityMismatch)` if verification fails, then ends. A
/// resolution error is delivered after any partial chunk already assembled;
/// the stream is fused after any error.
pub struct DecodeStream {
    source: Source,
    order: StreamOrder,
    regrouper: BitRegrouper,
    verifier: Option<IncrementalVerifier>,
    chunk_bytes: usize,
    length_bytes: u64,
    symbols_consumed: u64,
    bytes_emitted: u64,
    chunks: u64,
    pending_error: Option<OdinError>,
    finished: bool,
    observer: Option<Arc<dyn OscillatorObserver>>,
}

impl std::fmt::Debug for DecodeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeStream")
            .field("order", &self.order)
            .field("chunk_bytes", &self.chunk_bytes)
            .field("length_bytes", &self.length_bytes)
            .field("bytes_emitted", &self.bytes_emitted)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl DecodeStream {
    /// A `chunk_bytes` of zero is treated as one.
    #[must_use]
    pub fn new(
        coord: &Coordinate,
        order: StreamOrder,
        policy: VerifyPolicy,
        chunk_bytes: usize,
    ) -> Self {
        let source = match order {
            StreamOrder::Original => Source::Forward {
                pending: Some(Box::new(coord.clone())),
                symbols: Vec::new(),
                cursor: 0,
            },
            StreamOrder::Resolution => Source::Resolution(Resolver::new(coord)),
        };
        Self {
            source,
            order,
            regrouper: BitRegrouper::new(coord.length_bytes),
            verifier: Some(IncrementalVerifier::new(coord.content_hash, policy)),
            chunk_bytes: chunk_bytes.max(1),
            length_bytes: coord.length_bytes,
            symbols_consumed: 0,
            bytes_emitted: 0,
            chunks: 0,
            pending_error: None,
            finished: false,
            observer: None,
        }
    }

    /// Report a [`OscillatorEvent::StreamFinished`] to `observer` when the
    /// stream ends.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn OscillatorObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub const fn order(&self) -> StreamOrder {
        self.order
    }

    #[must_use]
    pub const fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    fn shortfall(&self) -> OdinError {
        OdinError::MalformedSymbolStream {
            required_bits: self.length_bytes.saturating_mul(8),
            available_bits: self.symbols_consumed.saturating_mul(u64::from(SYMBOL_BITS)),
        }
    }

    fn finish(&mut self, verified: bool) {
        self.finished = true;
        debug!(
            order = ?self.order,
            bytes_emitted = self.bytes_emitted,
            chunks = self.chunks,
            verified,
            "decode stream finished"
        );
        if let Some(observer) = &self.observer {
            observer.on_event(&OscillatorEvent::StreamFinished {
                order: self.order,
                bytes_emitted: self.bytes_emitted,
                chunks: self.chunks,
                verified,
                timestamp_ns: monotonic_ns(),
            });
        }
    }

    fn fail(&mut self, err: OdinError) -> Option<Result<Vec<u8>>> {
        warn!(error = %err, bytes_emitted = self.bytes_emitted, "decode stream failed");
        self.finish(false);
        Some(Err(err))
    }
}

impl Iterator for DecodeStream {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(err) = self.pending_error.take() {
            return self.fail(err);
        }

        let owed = usize::try_from(self.regrouper.remaining()).unwrap_or(usize::MAX);
        let mut chunk = Vec::with_capacity(self.chunk_bytes.min(owed));
        while chunk.len() < self.chunk_bytes && !self.regrouper.is_complete() {
            match self.source.next_symbol() {
                Some(Ok(symbol)) => {
                    self.symbols_consumed += 1;
                    self.regrouper.push(symbol, &mut chunk);
                }
                Some(Err(err)) => {
                    self.pending_error = Some(err);
                    break;
                }
                None => {
                    self.pending_error = Some(self.shortfall());
                    break;
                }
            }
        }

        if !chunk.is_empty() {
            if let Some(verifier) = self.verifier.as_mut() {
                verifier.update(&chunk);
            }
            self.bytes_emitted += chunk.len() as u64;
            self.chunks += 1;
            return Some(Ok(chunk));
        }
        if let Some(err) = self.pending_error.take() {
            return self.fail(err);
        }

        let verdict = self.verifier.take().map_or(Ok(()), IncrementalVerifier::finish);
        match verdict {
            Ok(()) => {
                self.finish(true);
                None
            }
            Err(err) => self.fail(err),
        }
    }
}

impl std::iter::FusedIterator for DecodeStream {}
