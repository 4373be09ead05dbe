//! Documented behavior of the backward resolver on payloads it cannot
//! recover.

use odin_error::{ErrorKind, OdinError};
use odin_oscillator::{
    AnchorKind, DecodeStream, StreamOrder, VerifyPolicy, decode, encode, resolve_anchor,
    resolve_symbols, unpack,
};
use odin_types::{ContentHash, HIGH, LOW, Position, Symbol};

fn symbols(values: &[u8]) -> Vec<Symbol> {
    values
        .iter()
        .map(|&v| Symbol::new(v).expect("symbol in range"))
        .collect()
}

#[test]
fn reordered_interior_walks_collapse_to_the_same_decode() {
    let a = unpack(&symbols(&[5, 40, 17, 33]), 3).unwrap();
    let b = unpack(&symbols(&[40, 17, 5, 33]), 3).unwrap();
    let ca = encode(&a, Position::DEFAULT_START);
    let cb = encode(&b, Position::DEFAULT_START);
    assert_eq!(ca.end_mask, cb.end_mask);
    assert_eq!(ca.anchor_mask, cb.anchor_mask);
    assert_eq!(ca.last_symbol, cb.last_symbol);

    let ra = resolve_symbols(&ca).unwrap();
    let rb = resolve_symbols(&cb).unwrap();
    assert_eq!(ra.symbols, symbols(&[0, 0, 0, 33]));
    assert_eq!(ra.symbols, rb.symbols);
    assert_eq!(ra.ambiguous_steps, 3);
    assert_eq!(ra.trail_xxh3, rb.trail_xxh3);
    assert!(!ra.start_matches);

    for coord in [&ca, &cb] {
        let err = decode(coord, VerifyPolicy::Strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
    }
}

#[test]
fn double_reset_passes_the_anchor_check_but_fails_integrity() {
    // 0xFC packs to symbols 63 0: HIGH resets to LOW, then LOW resets to HIGH.
    let coord = encode(&[0xFC], Position::HIGH);
    assert_eq!(coord.anchor_mask, LOW);
    assert_eq!(coord.end_mask, HIGH);
    assert_eq!(resolve_anchor(&coord).unwrap().kind, AnchorKind::ResetFromBelow);

    let resolution = resolve_symbols(&coord).unwrap();
    assert_eq!(resolution.symbols, symbols(&[0, 0]));
    let err = decode(&coord, VerifyPolicy::Strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
}

#[test]
fn tampered_fields_are_rejected() {
    let data = [0_u8; 9];
    let coord = encode(&data, Position::DEFAULT_START);

    let mut bad_hash = coord.clone();
    bad_hash.content_hash = Some(ContentHash::of(b"something else"));
    assert_eq!(
        decode(&bad_hash, VerifyPolicy::Strict).unwrap_err().kind(),
        ErrorKind::IntegrityMismatch
    );

    let mut bad_anchor = coord.clone();
    bad_anchor.anchor_mask -= 1;
    assert_eq!(
        decode(&bad_anchor, VerifyPolicy::Strict).unwrap_err().kind(),
        ErrorKind::AnchorMismatch
    );

    let mut bad_symbol = coord.clone();
    bad_symbol.last_symbol = 200;
    assert_eq!(
        decode(&bad_symbol, VerifyPolicy::Strict).unwrap_err().kind(),
        ErrorKind::AnchorMismatch
    );

    let mut out_of_lattice = coord;
    out_of_lattice.end_mask = HIGH + 10;
    assert!(decode(&out_of_lattice, VerifyPolicy::Strict).unwrap_err().is_probe_miss());
}

#[test]
fn resolution_order_stream_permutes_bytes_and_fails_verification() {
    let data = [0x82, 0x08, 0x3F];
    let coord = encode(&data, Position::HIGH);

    let mut emitted = Vec::new();
    let mut failure = None;
    for item in DecodeStream::new(&coord, StreamOrder::Resolution, VerifyPolicy::Strict, 8) {
        match item {
            Ok(chunk) => emitted.extend(chunk),
            Err(err) => failure = Some(err),
        }
    }
    // Symbols come out 63 32 32 32 instead of 32 32 32 63.
    assert_eq!(emitted, vec![0xFE, 0x08, 0x20]);
    assert!(matches!(failure, Some(OdinError::IntegrityMismatch { .. })));

    let original: Vec<u8> =
        DecodeStream::new(&coord, StreamOrder::Original, VerifyPolicy::Strict, 8)
            .flat_map(|item| item.unwrap())
            .collect();
    assert_eq!(original, data);
}

#[test]
fn resolution_order_is_exact_for_uniform_payloads() {
    let data = vec![0_u8; 12];
    let coord = encode(&data, Position::DEFAULT_START);
    let streamed: Vec<u8> =
        DecodeStream::new(&coord, StreamOrder::Resolution, VerifyPolicy::Strict, 5)
            .flat_map(|item| item.unwrap())
            .collect();
    assert_eq!(streamed, data);
}
