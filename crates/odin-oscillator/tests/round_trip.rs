//! Payloads the backward resolver recovers exactly.

use odin_oscillator::{
    AnchorKind, DecodeStream, StreamOrder, VerifyPolicy, decode, decode_with_report, encode,
    resolve_anchor, walk,
};
use odin_types::{Coordinate, Direction, HIGH, LOW, Position};
use proptest::prelude::*;

#[test]
fn empty_input_round_trips_from_any_start() {
    for start in [Position::LOW, Position::DEFAULT_START, Position::HIGH] {
        let coord = encode(&[], start);
        assert_eq!(coord, Coordinate::empty(start));
        assert_eq!(decode(&coord, VerifyPolicy::Strict).unwrap(), Vec::<u8>::new());
    }
}

#[test]
fn all_zero_payloads_round_trip_until_the_walk_reaches_low() {
    for len in [1_usize, 2, 3, 10, 64, 117] {
        let data = vec![0_u8; len];
        let coord = encode(&data, Position::DEFAULT_START);
        let report = decode_with_report(&coord, VerifyPolicy::Strict)
            .unwrap_or_else(|err| panic!("{len} zero bytes: {err}"));
        assert_eq!(report.bytes, data);
        assert!(report.resolution.start_matches);
    }
}

#[test]
fn centered_symbols_pinned_at_high_round_trip() {
    // 0x82 0x08 0x20 packs to symbols 32 32 32 32: zero-length steps at HIGH.
    let data = [0x82, 0x08, 0x20];
    let coord = encode(&data, Position::HIGH);
    assert_eq!(coord.end_mask, HIGH);
    assert_eq!(coord.anchor_mask, HIGH);
    let report = decode_with_report(&coord, VerifyPolicy::Strict).unwrap();
    assert_eq!(report.bytes, data);
    assert_eq!(report.resolution.anchor_kind, Some(AnchorKind::Direct));
}

#[test]
fn final_step_reset_round_trips() {
    // Symbols 32 32 32 63: three idle steps at HIGH, then a reset to LOW.
    let data = [0x82, 0x08, 0x3F];
    let summary = walk(&data, Position::HIGH);
    assert_eq!(summary.reflections, 1);
    let coord = summary.coordinate;
    assert_eq!(coord.anchor_mask, HIGH);
    assert_eq!(coord.end_mask, LOW);
    assert_eq!(coord.last_symbol, 63);

    let anchored = resolve_anchor(&coord).unwrap();
    assert_eq!(anchored.kind, AnchorKind::ResetFromAbove);
    assert_eq!(decode(&coord, VerifyPolicy::Strict).unwrap(), data);
}

#[test]
fn reset_from_above_heading_backward_round_trips() {
    // 0x00 from LOW: reset to HIGH heading backward, then overshoot to LOW.
    let coord = encode(&[0x00], Position::LOW);
    assert_eq!(coord.anchor_mask, HIGH);
    assert_eq!(coord.end_mask, LOW);
    assert_eq!(coord.last_direction, Direction::Backward);

    let anchored = resolve_anchor(&coord).unwrap();
    assert_eq!(anchored.kind, AnchorKind::ResetFromAbove);
    assert_eq!(anchored.direction, Direction::Backward);
    assert_eq!(decode(&coord, VerifyPolicy::Strict).unwrap(), vec![0x00]);
}

#[test]
fn stored_coordinate_decodes_after_json_round_trip() {
    let data = vec![0_u8; 30];
    let coord = encode(&data, Position::DEFAULT_START);
    let restored = Coordinate::from_json(&coord.to_json().unwrap()).unwrap();
    assert_eq!(restored, coord);
    assert_eq!(decode(&restored, VerifyPolicy::Strict).unwrap(), data);
}

#[test]
fn legacy_coordinate_without_hash_decodes_when_allowed() {
    let data = [0_u8; 4];
    let coord = encode(&data, Position::DEFAULT_START);
    let legacy = format!(
        r#"{{"start_mask":{},"end_mask":{},"prev_mask":{},"end_d":{},"last_direction":1,"length_bytes":4}}"#,
        coord.start_mask, coord.end_mask, coord.anchor_mask, coord.last_symbol
    );
    let restored = Coordinate::from_json(&legacy).unwrap();
    assert_eq!(restored.content_hash, None);
    assert!(decode(&restored, VerifyPolicy::Strict).is_err());
    assert_eq!(decode(&restored, VerifyPolicy::AllowUnhashed).unwrap(), data);
}

#[test]
fn streaming_in_original_order_equals_batch() {
    let data = vec![0_u8; 100];
    let coord = encode(&data, Position::DEFAULT_START);
    for chunk in [1, 3, 64, 4096] {
        let mut streamed = Vec::new();
        for item in DecodeStream::new(&coord, StreamOrder::Original, VerifyPolicy::Strict, chunk) {
            streamed.extend(item.unwrap());
        }
        assert_eq!(streamed, data, "chunk size {chunk}");
    }
}

proptest! {
    #[test]
    fn final_step_always_reconciles(
        data in proptest::collection::vec(any::<u8>(), 1..64),
        start in LOW..=HIGH,
    ) {
        let start = Position::new(start).unwrap();
        let coord = encode(&data, start);
        prop_assert!(resolve_anchor(&coord).is_ok());
    }

    #[test]
    fn decode_returns_the_input_or_a_decode_failure(
        data in proptest::collection::vec(any::<u8>(), 0..48),
        start in LOW..=HIGH,
    ) {
        let coord = encode(&data, Position::new(start).unwrap());
        match decode(&coord, VerifyPolicy::Strict) {
            Ok(bytes) => prop_assert_eq!(bytes, data),
            Err(err) => prop_assert!(err.is_probe_miss(), "unexpected error {err}"),
        }
    }
}
