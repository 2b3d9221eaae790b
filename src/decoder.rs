// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use bytes::Bytes;
use tracing::{
    debug,
    instrument,
};

use crate::{
    config::Config,
    cursor::ReadCursor,
    errs::Result,
    value::{
        Field,
        Record,
        RecordBuilder,
        WireValue,
    },
    wire_type::{
        Shape,
        WireType,
    },
};

impl Record {
    /// Decode a record of the given shape from the front of `src`. Bytes
    /// after the last field are ignored.
    pub fn decode(src: &[u8], shape: &Shape) -> Result<Record> {
        decode_record(src, shape)
    }
}

pub fn decode_record(src: &[u8], shape: &Shape) -> Result<Record> {
    decode_record_with(src, shape, Config::default())
}

#[instrument(level = "trace", skip_all, fields(len = src.len(), fields = shape.len()))]
pub fn decode_record_with(src: &[u8], shape: &Shape, config: Config) -> Result<Record> {
    let mut cursor = ReadCursor::with_config(src, config);
    decode_from(shape, &mut cursor).inspect_err(|err| debug!(%err, "record decode failed"))
}

/// Decode a record of `shape` at the cursor's position, leaving the cursor
/// just past it. Either the whole record is produced or nothing is: on
/// failure the cursor is back where it started.
pub fn decode_from(shape: &Shape, src: &mut ReadCursor<'_>) -> Result<Record> {
    shape.validate()?;
    src.rewind_on_error(|src| read_fields(shape, src))
}

fn read_fields(shape: &Shape, src: &mut ReadCursor<'_>) -> Result<Record> {
    let mut builder = RecordBuilder::with_capacity(shape.len());
    for field in shape.fields() {
        let value = read_value(field.ty(), src).map_err(|e| e.in_field(field.name()))?;
        builder.push(Field::new(field.name().clone(), field.ty().clone(), value));
    }
    Ok(builder.build())
}

fn read_value(ty: &WireType, src: &mut ReadCursor<'_>) -> Result<WireValue> {
    match ty {
        | WireType::Bool => src.read_bool().map(WireValue::Bool),
        | WireType::I8 => src.read_i8().map(WireValue::I8),
        | WireType::I16 => src.read_i16().map(WireValue::I16),
        | WireType::I32 => src.read_i32().map(WireValue::I32),
        | WireType::I64 => src.read_i64().map(WireValue::I64),
        | WireType::U8 => src.read_u8().map(WireValue::U8),
        | WireType::U16 => src.read_u16().map(WireValue::U16),
        | WireType::U32 => src.read_u32().map(WireValue::U32),
        | WireType::U64 => src.read_u64().map(WireValue::U64),
        | WireType::String => src.read_string().map(WireValue::String),
        | WireType::FixedArray(elem, len) => {
            // the count comes from the shape, not the stream
            src.ensure_elements(*len, elem.min_encoded_size(), src.position())?;
            read_elements(elem, *len, src)
        },
        | WireType::Sequence(elem) => {
            let prefix_offset = src.position();
            let count = src.read_length()?;
            src.ensure_elements(count, elem.min_encoded_size(), prefix_offset)?;
            read_elements(elem, count, src)
        },
        | WireType::Record(shape) => read_fields(shape, src).map(WireValue::Record),
    }
}

fn read_elements(elem: &WireType, count: usize, src: &mut ReadCursor<'_>) -> Result<WireValue> {
    if *elem == WireType::U8 {
        let run = src.read_fixed_bytes(count)?;
        return Ok(WireValue::Bytes(Bytes::copy_from_slice(run)));
    }

    // never trust the count for the allocation, only for the loop
    let hint = count.min(src.remaining() / elem.min_encoded_size().max(1));
    let mut items = Vec::with_capacity(hint);
    for idx in 0..count {
        items.push(read_value(elem, src).map_err(|e| e.at_index(idx))?);
    }
    Ok(WireValue::List(items))
}
