use hintbox::boxes::{FourCC, HintBox, RtpHintSampleEntry, SampleDescription};
use hintbox::cursor::ByteCursor;
use hintbox::parser::{DecodeError, DecodeOptions, decode_box};

fn init_logger() {
    // Ignore errors initializing the logger if tests race to configure it
    let _ignore = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .is_test(true)
        .try_init();
}

/// `rtp ` entry with declared size `declared`: zeroed reserved bytes,
/// data_reference_index=1, version=1, compatible=1, max packet size 1400.
fn rtp_entry(declared: u32, children: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&declared.to_be_bytes());
    v.extend_from_slice(b"rtp ");
    v.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // reserved
    v.extend_from_slice(&1u16.to_be_bytes()); // data_reference_index
    v.extend_from_slice(&1u16.to_be_bytes()); // hint_track_version
    v.extend_from_slice(&1u16.to_be_bytes()); // highest_compatible_version
    v.extend_from_slice(&1400u32.to_be_bytes()); // max_packet_size
    v.extend_from_slice(children);
    v
}

fn child(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = (8 + payload.len() as u32).to_be_bytes().to_vec();
    v.extend_from_slice(tag);
    v.extend_from_slice(payload);
    v
}

fn decode(data: &[u8], opts: DecodeOptions) -> Result<(RtpHintSampleEntry, u64), DecodeError> {
    let mut src: &[u8] = data;
    let mut cur = ByteCursor::new(&mut src);
    decode_box::<RtpHintSampleEntry>(&mut cur, &opts)
}

#[test]
fn minimal_entry_without_additional_data() {
    let data = vec![
        0x00, 0x00, 0x00, 0x18, // length = 24
        0x72, 0x74, 0x70, 0x20, // "rtp "
        0, 0, 0, 0, 0, 0, 0, 0, // sample entry header
        0x00, 0x01, // hint_track_version
        0x00, 0x01, // highest_compatible_version
        0x00, 0x00, 0x05, 0x78, // max_packet_size = 1400
    ];

    let (entry, consumed) = decode(&data, DecodeOptions::default()).unwrap();

    assert_eq!(consumed, 24);
    assert_eq!(entry.size, 24);
    assert_eq!(entry.header.data_reference_index, 0);
    assert_eq!(entry.hint_track_version, 1);
    assert_eq!(entry.highest_compatible_version, 1);
    assert_eq!(entry.max_packet_size, 1400);
    assert!(entry.additional_boxes.is_empty());
}

#[test]
fn one_empty_child_reaches_declared_size() {
    let data = rtp_entry(32, &child(b"tims", &[]));

    let (entry, consumed) = decode(&data, DecodeOptions::default()).unwrap();

    assert_eq!(consumed, 32);
    assert_eq!(entry.header.data_reference_index, 1);
    assert_eq!(entry.additional_boxes.len(), 1);
    match &entry.additional_boxes[0] {
        HintBox::TimeScale(t) => {
            assert_eq!(t.size, 8);
            assert_eq!(t.timescale, None);
        }
        other => panic!("expected tims, got {:?}", other),
    }
}

#[test]
fn unregistered_child_tag_fails_the_whole_entry() {
    let data = rtp_entry(32, &child(b"xyzw", &[]));

    let err = decode(&data, DecodeOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        DecodeError::UnknownBoxType { tag, parent }
            if tag == FourCC(*b"xyzw") && parent == FourCC::RTP
    ));
    assert_eq!(err.to_string(), "unknown box `xyzw` in `rtp `");
}

#[test]
fn unknown_tag_after_valid_children_still_fails() {
    let mut kids = child(b"tims", &90000u32.to_be_bytes());
    kids.extend(child(b"pmax", &[0, 0, 0, 1]));
    let data = rtp_entry(24 + kids.len() as u32, &kids);

    assert!(matches!(
        decode(&data, DecodeOptions::default()),
        Err(DecodeError::UnknownBoxType { .. })
    ));
}

#[test]
fn children_keep_stream_order_and_repeats() {
    let mut kids = Vec::new();
    kids.extend(child(b"tims", &90000u32.to_be_bytes()));
    kids.extend(child(b"snro", &(-5i32).to_be_bytes()));
    kids.extend(child(b"tims", &8000u32.to_be_bytes()));
    kids.extend(child(b"tsro", &100i32.to_be_bytes()));
    let data = rtp_entry(24 + kids.len() as u32, &kids);

    let (entry, consumed) = decode(&data, DecodeOptions::default()).unwrap();

    assert_eq!(consumed, data.len() as u64);
    let tags: Vec<FourCC> = entry.additional_boxes.iter().map(HintBox::tag).collect();
    assert_eq!(tags, vec![FourCC::TIMS, FourCC::SNRO, FourCC::TIMS, FourCC::TSRO]);

    assert!(matches!(&entry.additional_boxes[0], HintBox::TimeScale(t) if t.timescale == Some(90000)));
    assert!(matches!(&entry.additional_boxes[1], HintBox::SequenceOffset(s) if s.offset == Some(-5)));
    assert!(matches!(&entry.additional_boxes[2], HintBox::TimeScale(t) if t.timescale == Some(8000)));
    assert!(matches!(&entry.additional_boxes[3], HintBox::TimeOffset(t) if t.offset == Some(100)));
}

#[test]
fn truncation_is_reported_at_the_field_boundary() {
    let data = rtp_entry(24, &[]);

    // (bytes available, offset of the field that cannot be read, its width)
    let cases = [(2, 0, 4), (6, 4, 4), (13, 8, 6), (17, 16, 2), (19, 18, 2), (23, 20, 4)];
    for (len, offset, needed) in cases {
        let err = decode(&data[..len], DecodeOptions::default()).unwrap_err();
        assert!(
            matches!(err, DecodeError::TruncatedInput { offset: o, needed: n } if o == offset && n == needed),
            "cut at {len}: {err:?}"
        );
    }
}

#[test]
fn truncated_child_payload() {
    // tims claims a 4 byte payload that never arrives
    let mut data = rtp_entry(36, &[]);
    data.extend_from_slice(&12u32.to_be_bytes());
    data.extend_from_slice(b"tims");

    let err = decode(&data, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput { offset: 32, needed: 4 }));
}

#[test]
fn child_overrunning_parent_is_rejected_before_its_payload() {
    let data = rtp_entry(32, &child(b"tims", &90000u32.to_be_bytes()));

    let err = decode(&data, DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::SizeAccounting { parent, declared: 32, consumed: 36 } if parent == FourCC::RTP
    ));
}

#[test]
fn lenient_policy_accepts_overshoot() {
    init_logger();
    let data = rtp_entry(32, &child(b"tims", &90000u32.to_be_bytes()));

    let (entry, consumed) = decode(&data, DecodeOptions::lenient()).unwrap();

    assert_eq!(consumed, 36);
    assert_eq!(entry.size, 32);
    assert_eq!(entry.additional_boxes.len(), 1);
}

#[test]
fn declared_size_below_fixed_fields() {
    let data = rtp_entry(20, &[]);

    let err = decode(&data, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::SizeAccounting { declared: 20, consumed: 24, .. }));
}

#[test]
fn child_length_below_header_size() {
    let mut data = rtp_entry(32, &[]);
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(b"tims");

    let err = decode(&data, DecodeOptions::lenient()).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidSize { tag, size: 4 } if tag == FourCC::TIMS));
}

#[test]
fn leaf_payload_too_short_for_its_word() {
    let data = rtp_entry(34, &child(b"tsro", &[0, 1]));

    let err = decode(&data, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidPayload { tag, len: 2 } if tag == FourCC::TSRO));
}

#[test]
fn leaf_trailing_bytes_are_consumed_and_kept() {
    let data = rtp_entry(40, &child(b"tims", &[0, 0, 0x1f, 0x40, 0xde, 0xad, 0xbe, 0xef]));

    let (entry, consumed) = decode(&data, DecodeOptions::default()).unwrap();

    assert_eq!(consumed, 40);
    match &entry.additional_boxes[0] {
        HintBox::TimeScale(t) => {
            assert_eq!(t.timescale, Some(8000));
            assert_eq!(t.trailing, vec![0xde, 0xad, 0xbe, 0xef]);
        }
        other => panic!("expected tims, got {:?}", other),
    }
}

#[test]
fn wrong_box_type_is_rejected() {
    let mut data = rtp_entry(24, &[]);
    data[4..8].copy_from_slice(b"stsd");

    let err = decode(&data, DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnexpectedBoxType { expected, found }
            if expected == FourCC::RTP && found == FourCC::STSD
    ));

    let mut src: &[u8] = &data[..];
    let mut cur = ByteCursor::new(&mut src);
    assert!(decode_box::<SampleDescription>(&mut cur, &DecodeOptions::default()).is_err());
}

#[test]
fn decoding_twice_gives_equal_results() {
    let mut kids = child(b"tims", &90000u32.to_be_bytes());
    kids.extend(child(b"tsro", &[]));
    let data = rtp_entry(24 + kids.len() as u32, &kids);

    let first = decode(&data, DecodeOptions::default()).unwrap();
    let second = decode(&data, DecodeOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn parallel_decodes_share_the_registry() {
    let mut kids = child(b"snro", &7i32.to_be_bytes());
    kids.extend(child(b"tims", &90000u32.to_be_bytes()));
    let data = rtp_entry(24 + kids.len() as u32, &kids);
    let expected = decode(&data, DecodeOptions::default()).unwrap().0;

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| decode(&data, DecodeOptions::default()).unwrap().0))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn tail_too_short_for_a_child_header_at_end_of_input() {
    let data = rtp_entry(28, &[0, 0, 0, 0x0c]);
    let mut src: &[u8] = &data;
    let mut cur = ByteCursor::new(&mut src);

    let err = decode_box::<RtpHintSampleEntry>(&mut cur, &DecodeOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        DecodeError::SizeAccounting { parent, declared: 28, consumed: 32 } if parent == FourCC::RTP
    ));
    assert_eq!(cur.consumed(), 24);
}

#[test]
fn tail_too_short_for_a_child_header_before_next_box() {
    let mut data = rtp_entry(28, &[0, 0, 0, 0]);
    data.extend_from_slice(&8u32.to_be_bytes());
    data.extend_from_slice(b"free");
    let mut src: &[u8] = &data;
    let mut cur = ByteCursor::new(&mut src);

    let err = decode_box::<RtpHintSampleEntry>(&mut cur, &DecodeOptions::default()).unwrap_err();

    assert!(matches!(err, DecodeError::SizeAccounting { declared: 28, consumed: 32, .. }));
    // the tail and the following box are left unread
    assert_eq!(cur.consumed(), 24);
}
