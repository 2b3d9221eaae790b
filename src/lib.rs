// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! Encoding of plain structured records to and from a fixed, big-endian
//! binary wire format, as used by many application level binary protocols.
//!
//! | Wire element        | Encoding                                             |
//! |---------------------|------------------------------------------------------|
//! | integer (w bits)    | w/8 bytes, big-endian, two's complement when signed  |
//! | bool                | 1 byte, 0 is false, anything else is true            |
//! | string              | 4-byte length L, then L raw bytes                    |
//! | fixed array (T, N)  | N elements of T back-to-back, no prefix              |
//! | sequence (T)        | 4-byte count C, then C elements of T                 |
//! | record              | fields inlined in declaration order, no delimiter    |
//!
//! There are two ways in. Types known at compile time implement
//! [`BinaryMarshaller`], usually through [`wire_record!`]:
//!
//! ```
//! structwire::wire_record! {
//!     #[derive(Debug, PartialEq)]
//!     pub struct PtyRequest {
//!         pub term: String,
//!         pub width: u32,
//!         pub height: u32,
//!     }
//! }
//!
//! let req = PtyRequest { term: "xterm".into(), width: 80, height: 24 };
//! let bytes = structwire::encode(&req).unwrap();
//! assert_eq!(structwire::decode::<PtyRequest>(&bytes).unwrap(), req);
//! ```
//!
//! Records whose layout is only known at runtime are built as a [`Record`]
//! and read back against a [`Shape`]:
//!
//! ```
//! use structwire::{Record, WireType};
//!
//! let inner = Record::builder().u16("b1", 13).u16("b2", 15).build();
//! let record = Record::builder().u16("a", 17).record("b", inner).u16("c", 21).build();
//!
//! let bytes = record.encode().unwrap();
//! assert_eq!(&bytes[..], &[0, 17, 0, 13, 0, 15, 0, 21]);
//! assert_eq!(Record::decode(&bytes, &record.shape()).unwrap(), record);
//! ```

/// Encode and decode limits.
pub mod config;
/// Position-tracked reads and writes over byte buffers.
pub mod cursor;
pub mod decoder;
pub mod encoder;
/// Compile-time marshalling for plain Rust types.
pub mod encoding;
pub mod errs;
pub mod size;
/// Runtime records and their values.
pub mod value;
/// The closed set of wire types.
pub mod wire_type;

pub use config::Config;
pub use cursor::{
    new_cursor,
    ReadCursor,
    WriteCursor,
};
pub use decoder::{
    decode_record,
    decode_record_with,
};
pub use encoder::{
    encode_record,
    encode_record_with,
};
pub use encoding::{
    decode,
    decode_with,
    encode,
    encode_with,
    shape_of,
    BinaryMarshaller,
};
pub use errs::{
    FieldPath,
    Result,
    WireError,
};
pub use value::{
    Field,
    Record,
    RecordBuilder,
    WireValue,
};
pub use wire_type::{
    FieldShape,
    Shape,
    WireType,
};
