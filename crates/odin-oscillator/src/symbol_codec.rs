//! Packing between byte buffers and 6-bit symbol sequences.
//!
//! Bits are taken most-significant first. A trailing group shorter than six
//! bits is left-shifted so the data bits occupy the high positions and the
//! low positions are zero. Unpacking truncates back to `length_bytes * 8`
//! bits, discarding that padding.

use odin_error::{OdinError, Result};
use odin_types::{SYMBOL_BITS, Symbol, symbol_count};

const SYMBOL_MASK: u32 = (1 << SYMBOL_BITS) - 1;

/// Lazily packs a byte slice into symbols.
#[derive(Debug, Clone)]
pub struct PackedSymbols<'a> {
    bytes: std::slice::Iter<'a, u8>,
    acc: u32,
    bits: u32,
    remaining: u64,
}

impl<'a> PackedSymbols<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            bytes: data.iter(),
            acc: 0,
            bits: 0,
            remaining: symbol_count(data.len() as u64),
        }
    }
}

impl Iterator for PackedSymbols<'_> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        if self.bits < SYMBOL_BITS {
            if let Some(&byte) = self.bytes.next() {
                self.acc = (self.acc << 8) | u32::from(byte);
                self.bits += 8;
            } else if self.bits > 0 {
                // Zero-fill the low-order positions of the final group.
                let padded = (self.acc << (SYMBOL_BITS - self.bits)) & SYMBOL_MASK;
                self.acc = 0;
                self.bits = 0;
                self.remaining -= 1;
                return Some(Symbol::from_low_bits(padded as u8));
            } else {
                return None;
            }
        }
        self.bits -= SYMBOL_BITS;
        let value = (self.acc >> self.bits) & SYMBOL_MASK;
        self.acc &= (1 << self.bits) - 1;
        self.remaining -= 1;
        Some(Symbol::from_low_bits(value as u8))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

/// Pack `data` into its symbol sequence. Empty input packs to nothing.
#[must_use]
pub fn pack(data: &[u8]) -> Vec<Symbol> {
    PackedSymbols::new(data).collect()
}

/// Regroups a symbol sequence into bytes as symbols arrive.
///
/// Complete bytes are released as soon as eight bits have accumulated.
/// After `length_bytes` bytes have been released, further bits are padding
/// and are dropped.
#[derive(Debug, Clone, Default)]
pub struct BitRegrouper {
    acc: u32,
    bits: u32,
    remaining: u64,
}

impl BitRegrouper {
    #[must_use]
    pub const fn new(length_bytes: u64) -> Self {
        Self {
            acc: 0,
            bits: 0,
            remaining: length_bytes,
        }
    }

    /// Feed one symbol, appending any completed bytes to `out`.
    /// Returns the number of bytes appended.
    pub fn push(&mut self, symbol: Symbol, out: &mut Vec<u8>) -> usize {
        if self.remaining == 0 {
            return 0;
        }
        self.acc = (self.acc << SYMBOL_BITS) | u32::from(symbol.get());
        self.bits += SYMBOL_BITS;
        let mut released = 0;
        while self.bits >= 8 && self.remaining > 0 {
            self.bits -= 8;
            out.push(((self.acc >> self.bits) & 0xFF) as u8);
            self.remaining -= 1;
            released += 1;
        }
        self.acc &= (1 << self.bits) - 1;
        if self.remaining == 0 {
            self.acc = 0;
            self.bits = 0;
        }
        released
    }

    /// Bytes still owed.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// Unpack `symbols` into exactly `length_bytes` bytes.
///
/// Fails with [`OdinError::MalformedSymbolStream`] when the symbols carry
/// fewer than `length_bytes * 8` bits.
pub fn unpack(symbols: &[Symbol], length_bytes: u64) -> Result<Vec<u8>> {
    let required_bits = u128::from(length_bytes) * 8;
    let available_bits = symbols.len() as u128 * u128::from(SYMBOL_BITS);
    if available_bits < required_bits {
        return Err(OdinError::MalformedSymbolStream {
            required_bits: u64::try_from(required_bits).unwrap_or(u64::MAX),
            available_bits: u64::try_from(available_bits).unwrap_or(u64::MAX),
        });
    }

    // available_bits >= required_bits bounds length_bytes by the slice length.
    let mut out = Vec::with_capacity(usize::try_from(length_bytes).unwrap_or(0));
    let mut regrouper = BitRegrouper::new(length_bytes);
    for &symbol in symbols {
        if regrouper.is_complete() {
            break;
        }
        regrouper.push(symbol, &mut out);
    }
    Ok(out)
}
