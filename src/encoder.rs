// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use bytes::Bytes;
use tracing::instrument;

use crate::{
    config::Config,
    cursor::WriteCursor,
    errs::Result,
    size::{
        collection_len,
        mismatch,
        record_len,
    },
    value::{
        Field,
        Record,
        WireValue,
    },
    wire_type::WireType,
};

impl Record {
    /// Encode the record's fields, in order, into a freshly sized buffer.
    pub fn encode(&self) -> Result<Bytes> {
        encode_record(self)
    }
}

pub fn encode_record(record: &Record) -> Result<Bytes> {
    encode_record_with(record, Config::default())
}

/// Sizes the record, allocates once, then writes every field. Any value the
/// encoder can't represent is rejected by the sizing pass, before a single
/// byte is written.
#[instrument(level = "trace", skip_all, fields(fields = record.len()))]
pub fn encode_record_with(record: &Record, config: Config) -> Result<Bytes> {
    let len = record_len(record, &config)?;
    tracing::trace!(len, "sized record");

    let mut dst = WriteCursor::with_config(len, config);
    encode_fields(record.fields(), &mut dst)?;
    debug_assert_eq!(dst.remaining(), 0, "sizing and encoding disagree");

    Ok(dst.finish())
}

/// Write `fields` at the cursor's current position. Callers composing their
/// own frames are responsible for having sized the cursor.
pub fn encode_fields(fields: &[Field], dst: &mut WriteCursor) -> Result<()> {
    for field in fields {
        encode_value(field.ty(), field.value(), dst).map_err(|e| e.in_field(field.name()))?;
    }
    Ok(())
}

fn encode_value(ty: &WireType, value: &WireValue, dst: &mut WriteCursor) -> Result<()> {
    match (ty, value) {
        | (WireType::Bool, WireValue::Bool(v)) => dst.put_bool(*v),
        | (WireType::I8, WireValue::I8(v)) => dst.put_i8(*v),
        | (WireType::I16, WireValue::I16(v)) => dst.put_i16(*v),
        | (WireType::I32, WireValue::I32(v)) => dst.put_i32(*v),
        | (WireType::I64, WireValue::I64(v)) => dst.put_i64(*v),
        | (WireType::U8, WireValue::U8(v)) => dst.put_u8(*v),
        | (WireType::U16, WireValue::U16(v)) => dst.put_u16(*v),
        | (WireType::U32, WireValue::U32(v)) => dst.put_u32(*v),
        | (WireType::U64, WireValue::U64(v)) => dst.put_u64(*v),
        | (WireType::String, WireValue::String(v)) => dst.put_string(v),
        | (WireType::FixedArray(elem, _), _) => encode_elements(elem, value, dst),
        | (WireType::Sequence(elem), _) => {
            dst.put_length(collection_len(ty, elem, value)?)?;
            encode_elements(elem, value, dst)
        },
        | (WireType::Record(_), WireValue::Record(record)) => encode_fields(record.fields(), dst),
        | _ => Err(mismatch(ty, value)),
    }
}

fn encode_elements(elem: &WireType, value: &WireValue, dst: &mut WriteCursor) -> Result<()> {
    match value {
        | WireValue::Bytes(bytes) if *elem == WireType::U8 => dst.put_slice(bytes),
        | WireValue::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                encode_value(elem, item, dst).map_err(|e| e.at_index(idx))?;
            }
            Ok(())
        },
        | _ => Err(mismatch(elem, value)),
    }
}
