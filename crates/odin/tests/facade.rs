use std::sync::Arc;

use odin::{
    ErrorKind, EventRingBuffer, OdinsEye, OscillatorConfig, OscillatorEvent, Position,
    StreamOrder, VerifyPolicy, load_coordinate, save_coordinate,
};

fn eye() -> OdinsEye {
    OdinsEye::new(OscillatorConfig::default()).expect("default config is valid")
}

#[test]
fn coordinate_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coord.json");
    let eye = eye();
    let data = vec![0_u8; 20];
    let coord = eye.encode(&data);

    save_coordinate(&path, &coord).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"anchor_mask\""));
    assert!(text.contains("\"format_version\": \"0.2.0\""));

    let loaded = load_coordinate(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded, coord);
    assert_eq!(eye.decode(&loaded).unwrap(), data);
}

#[test]
fn missing_coordinate_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_coordinate(path.to_str().unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!err.is_probe_miss());
}

#[test]
fn legacy_file_loads_with_canonical_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"{"start_mask": 50000, "end_mask": 49488, "prev_mask": 49744, "last_choice": 0, "length_bytes": 1}"#,
    )
    .unwrap();
    let coord = load_coordinate(path.to_str().unwrap()).unwrap();
    assert_eq!(coord.anchor_mask, 49_744);
    assert_eq!(coord.last_symbol, 0);
    assert_eq!(coord.format_version, "0.1.0");

    let strict = eye();
    assert_eq!(strict.decode(&coord).unwrap_err().kind(), ErrorKind::IntegrityMismatch);

    let lenient =
        OdinsEye::new(OscillatorConfig::default().with_verify(VerifyPolicy::AllowUnhashed))
            .unwrap();
    assert_eq!(lenient.decode(&coord).unwrap(), vec![0]);
}

#[test]
fn scan_returns_the_first_accepted_candidate() {
    let eye = eye();
    let mut corrupt = eye.encode(&[0_u8; 5]);
    corrupt.anchor_mask += 16;
    let undecodable = eye.encode(b"mail");
    let plain = eye.encode(&[0_u8; 6]);
    let longer = eye.encode(&[0_u8; 9]);

    let hit = eye
        .scan(
            vec![corrupt, undecodable, plain.clone(), longer.clone()],
            |bytes| bytes.len() >= 6,
        )
        .expect("a candidate matches");
    assert_eq!(hit.index, 2);
    assert_eq!(hit.coordinate, plain);
    assert_eq!(hit.bytes, vec![0_u8; 6]);

    let hit = eye
        .scan(vec![plain, longer.clone()], |bytes| bytes.len() == 9)
        .expect("second candidate matches");
    assert_eq!(hit.index, 1);
    assert_eq!(hit.coordinate, longer);

    assert!(eye.scan(Vec::new(), |_| true).is_none());
}

#[test]
fn probe_swallows_decode_failures() {
    let eye = eye();
    assert!(eye.probe(&eye.encode(b"not recoverable")).is_none());
    assert_eq!(eye.probe(&eye.encode(&[0_u8; 3])), Some(vec![0_u8; 3]));

    let snapshot = eye.metrics();
    assert_eq!(snapshot.encodes_total, 2);
    assert_eq!(snapshot.decodes_total, 1);
    assert_eq!(snapshot.decode_failures_total, 1);
    assert_eq!(snapshot.probe_misses_total, 1);
}

#[test]
fn observer_receives_every_event_kind() {
    let ring = Arc::new(EventRingBuffer::new(16));
    let eye = OdinsEye::with_observer(
        OscillatorConfig::default().with_stream_chunk_bytes(4),
        ring.clone(),
    )
    .unwrap();

    let good = eye.encode(&[0_u8; 10]);
    let bad = eye.encode(b"odin");
    eye.decode(&good).unwrap();
    eye.decode(&bad).unwrap_err();
    let streamed: Vec<u8> = eye
        .decode_stream(&good)
        .collect::<odin::Result<Vec<Vec<u8>>>>()
        .unwrap()
        .concat();
    assert_eq!(streamed, vec![0_u8; 10]);

    let kinds: Vec<&str> = ring.drain().iter().map(OscillatorEvent::kind_str).collect();
    assert_eq!(
        kinds,
        vec!["encoded", "encoded", "decoded", "decode_failed", "stream_finished"]
    );
    assert_eq!(eye.metrics().streams_total, 1);
}

#[test]
fn stream_order_follows_configuration() {
    let eye = OdinsEye::new(OscillatorConfig::default().with_stream_order(StreamOrder::Resolution))
        .unwrap();
    let coord = eye.encode_at(&[0x82, 0x08, 0x3F], Position::HIGH);
    let stream = eye.decode_stream(&coord);
    assert_eq!(stream.order(), StreamOrder::Resolution);
    let items: Vec<_> = stream.collect();
    assert_eq!(items.last().unwrap().as_ref().unwrap_err().kind(), ErrorKind::IntegrityMismatch);

    // The batch path is unaffected by the stream order.
    assert_eq!(eye.decode(&coord).unwrap(), vec![0x82, 0x08, 0x3F]);
}
