// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use proptest::{
    collection::vec,
    prelude::*,
};
use structwire::{
    decode,
    decode_record,
    encode,
    shape_of,
    wire_record,
    BinaryMarshaller,
    Record,
    WireError,
    WireType,
    WireValue,
};

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Peer {
        id: i16,
        host: String,
    }
}

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Frame {
        kind: u8,
        flags: bool,
        seq: i64,
        window: [u16; 4],
        name: String,
        payload: Vec<u8>,
        sizes: Vec<u32>,
        peers: Vec<Peer>,
        origin: Peer,
    }
}

prop_compose! {
    fn peer()(id in any::<i16>(), host in ".{0,12}") -> Peer {
        Peer { id, host }
    }
}

prop_compose! {
    fn frame()(
        kind in any::<u8>(),
        flags in any::<bool>(),
        seq in any::<i64>(),
        window in any::<[u16; 4]>(),
        name in ".{0,24}",
        payload in vec(any::<u8>(), 0..64),
        sizes in vec(any::<u32>(), 0..8),
        peers in vec(peer(), 0..4),
        origin in peer(),
    ) -> Frame {
        Frame { kind, flags, seq, window, name, payload, sizes, peers, origin }
    }
}

fn scalar() -> impl Strategy<Value = (WireType, WireValue)> {
    prop_oneof![
        any::<bool>().prop_map(|v| (WireType::Bool, WireValue::Bool(v))),
        any::<i8>().prop_map(|v| (WireType::I8, WireValue::I8(v))),
        any::<i16>().prop_map(|v| (WireType::I16, WireValue::I16(v))),
        any::<i32>().prop_map(|v| (WireType::I32, WireValue::I32(v))),
        any::<i64>().prop_map(|v| (WireType::I64, WireValue::I64(v))),
        any::<u8>().prop_map(|v| (WireType::U8, WireValue::U8(v))),
        any::<u16>().prop_map(|v| (WireType::U16, WireValue::U16(v))),
        any::<u32>().prop_map(|v| (WireType::U32, WireValue::U32(v))),
        any::<u64>().prop_map(|v| (WireType::U64, WireValue::U64(v))),
    ]
}

fn field() -> impl Strategy<Value = (WireType, WireValue)> {
    prop_oneof![
        4 => scalar(),
        1 => ".{0,16}".prop_map(|s| (WireType::String, WireValue::String(s))),
        1 => vec(any::<u8>(), 0..32)
            .prop_map(|b| (WireType::sequence(WireType::U8), WireValue::from(b))),
        1 => vec(any::<u8>(), 6)
            .prop_map(|b| (WireType::fixed_array(WireType::U8, 6), WireValue::from(b))),
        1 => vec(any::<u16>(), 0..8).prop_map(|v| (
            WireType::sequence(WireType::U16),
            WireValue::List(v.into_iter().map(WireValue::U16).collect()),
        )),
        1 => vec(any::<i32>(), 3).prop_map(|v| (
            WireType::fixed_array(WireType::I32, 3),
            WireValue::List(v.into_iter().map(WireValue::I32).collect()),
        )),
        1 => vec(".{0,4}", 0..4).prop_map(|v| (
            WireType::sequence(WireType::String),
            WireValue::List(v.into_iter().map(WireValue::String).collect()),
        )),
    ]
}

fn build(fields: Vec<(WireType, WireValue)>) -> Record {
    fields
        .into_iter()
        .enumerate()
        .fold(Record::builder(), |builder, (idx, (ty, value))| {
            builder.field(format!("f{idx}"), ty, value)
        })
        .build()
}

fn record() -> impl Strategy<Value = Record> {
    (vec(field(), 0..8), vec(field(), 0..4), any::<bool>()).prop_map(|(outer, inner, nest)| {
        let mut record = build(outer);
        if nest {
            let inner = build(inner);
            let mut builder = Record::builder();
            for f in record.fields() {
                builder = builder.field(f.name().clone(), f.ty().clone(), f.value().clone());
            }
            record = builder.record("inner", inner).build();
        }
        record
    })
}

proptest! {
    #[test]
    fn test_static_round_trip(value in frame()) {
        let bytes = encode(&value).unwrap();
        prop_assert_eq!(bytes.len(), value.encoded_size().unwrap());
        prop_assert_eq!(decode::<Frame>(&bytes).unwrap(), value);
    }

    #[test]
    fn test_static_trailing_bytes_ignored(value in frame(), tail in vec(any::<u8>(), 1..16)) {
        let mut bytes = encode(&value).unwrap().to_vec();
        bytes.extend_from_slice(&tail);
        prop_assert_eq!(decode::<Frame>(&bytes).unwrap(), value);
    }

    #[test]
    fn test_static_truncation_fails(value in frame(), cut in any::<prop::sample::Index>()) {
        let bytes = encode(&value).unwrap();
        let cut = cut.index(bytes.len());
        let err = decode::<Frame>(&bytes[..cut]).unwrap_err();
        prop_assert!(matches!(err, WireError::InsufficientInput { .. }), "{}", err);
    }

    #[test]
    fn test_dynamic_round_trip(record in record()) {
        let bytes = record.encode().unwrap();
        prop_assert_eq!(bytes.len(), record.encoded_len().unwrap());
        prop_assert_eq!(decode_record(&bytes, &record.shape()).unwrap(), record);
    }

    #[test]
    fn test_dynamic_truncation_fails(record in record(), cut in any::<prop::sample::Index>()) {
        let bytes = record.encode().unwrap();
        prop_assume!(!bytes.is_empty());
        let cut = cut.index(bytes.len());
        let err = decode_record(&bytes[..cut], &record.shape()).unwrap_err();
        prop_assert!(matches!(err, WireError::InsufficientInput { .. }), "{}", err);
    }

    #[test]
    fn test_static_and_dynamic_agree(value in frame()) {
        let WireType::Record(shape) = shape_of::<Frame>() else {
            panic!("records map onto record shapes");
        };
        let bytes = encode(&value).unwrap();
        let record = decode_record(&bytes, &shape).unwrap();

        prop_assert_eq!(record.shape(), shape);
        prop_assert_eq!(record.encode().unwrap(), bytes.clone());
        prop_assert_eq!(decode::<Frame>(&record.encode().unwrap()).unwrap(), value);
    }
}
