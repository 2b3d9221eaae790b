// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use bytes::Bytes;
use tracing::{
    debug,
    instrument,
};

use crate::{
    config::{
        Config,
        LENGTH_PREFIX_SIZE,
    },
    cursor::{
        check_length,
        ReadCursor,
        WriteCursor,
    },
    errs::{
        Result,
        WireError,
    },
    wire_type::WireType,
};

/// A shared trait for encoding and decoding data in and out of the binary
/// wire format. The traversal for each type is fixed at compile time; plain
/// structs get theirs from [`wire_record!`](crate::wire_record).
pub trait BinaryMarshaller: Sized {
    /// Whether this type is a fixed array or sequence. Collections of
    /// collections are rejected.
    const COLLECTION: bool = false;

    /// The fewest bytes any value of this type encodes to.
    const MIN_ENCODED_SIZE: usize;

    /// The wire type this type maps onto.
    fn wire_type() -> WireType;

    /// The size of the encoded structure in bytes, checking string lengths
    /// and sequence counts against `config`.
    fn encoded_size_with(&self, config: &Config) -> Result<usize>;

    /// The size of the encoded structure in bytes.
    fn encoded_size(&self) -> Result<usize> {
        self.encoded_size_with(&Config::default())
    }

    /// Encode the data structure at the cursor's position.
    fn encode_to(&self, dst: &mut WriteCursor) -> Result<()>;

    /// Decode the target type from the cursor's position. On failure the
    /// cursor is left where it was.
    fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self>;

    /// Size of a run of values, used by arrays and vectors.
    fn encoded_size_of_slice(items: &[Self], config: &Config) -> Result<usize> {
        items.iter().enumerate().try_fold(0usize, |acc, (idx, item)| {
            add_size(acc, item.encoded_size_with(config).map_err(|e| e.at_index(idx))?)
        })
    }

    fn encode_slice(items: &[Self], dst: &mut WriteCursor) -> Result<()> {
        for (idx, item) in items.iter().enumerate() {
            item.encode_to(dst).map_err(|e| e.at_index(idx))?;
        }
        Ok(())
    }

    fn decode_vec(count: usize, src: &mut ReadCursor<'_>) -> Result<Vec<Self>> {
        let hint = count.min(src.remaining() / Self::MIN_ENCODED_SIZE.max(1));
        let mut items = Vec::with_capacity(hint);
        for idx in 0..count {
            items.push(Self::decode_from(src).map_err(|e| e.at_index(idx))?);
        }
        Ok(items)
    }
}

/// Checked size accumulation for generated record impls.
#[doc(hidden)]
pub fn add_size(acc: usize, len: usize) -> Result<usize> {
    acc.checked_add(len)
        .ok_or_else(|| WireError::size_overflow(acc, len))
}

/// Encode `value` into a buffer allocated once at its exact size.
pub fn encode<T: BinaryMarshaller>(value: &T) -> Result<Bytes> {
    encode_with(value, Config::default())
}

#[instrument(level = "trace", skip_all)]
pub fn encode_with<T: BinaryMarshaller>(value: &T, config: Config) -> Result<Bytes> {
    let len = value.encoded_size_with(&config)?;
    tracing::trace!(len, "sized value");

    let mut dst = WriteCursor::with_config(len, config);
    value.encode_to(&mut dst)?;
    debug_assert_eq!(dst.remaining(), 0, "sizing and encoding disagree");

    Ok(dst.finish())
}

/// Decode a `T` from the front of `src`. Bytes after it are ignored.
pub fn decode<T: BinaryMarshaller>(src: &[u8]) -> Result<T> {
    decode_with(src, Config::default())
}

#[instrument(level = "trace", skip_all, fields(len = src.len()))]
pub fn decode_with<T: BinaryMarshaller>(src: &[u8], config: Config) -> Result<T> {
    let mut cursor = ReadCursor::with_config(src, config);
    T::decode_from(&mut cursor).inspect_err(|err| debug!(%err, "value decode failed"))
}

/// The wire type a decoder needs to read a `T`.
pub fn shape_of<T: BinaryMarshaller>() -> WireType {
    T::wire_type()
}

fn check_element<T: BinaryMarshaller>(counted: bool) -> Result<()> {
    if T::COLLECTION {
        return Err(WireError::unsupported(format!(
            "multidimensional collections are not supported ({} of {})",
            if counted { "sequence" } else { "fixed array" },
            T::wire_type().name()
        )));
    }
    if counted && T::MIN_ENCODED_SIZE == 0 {
        return Err(WireError::unsupported(
            "sequence elements must occupy at least one byte",
        ));
    }
    Ok(())
}

macro_rules! scalar_marshaller {
    ($($ty:ty => $wire:ident, $put:ident, $read:ident);* $(;)?) => {
        $(
            impl BinaryMarshaller for $ty {
                const MIN_ENCODED_SIZE: usize = size_of::<$ty>();

                fn wire_type() -> WireType {
                    WireType::$wire
                }

                #[inline]
                fn encoded_size_with(&self, _: &Config) -> Result<usize> {
                    Ok(size_of::<$ty>())
                }

                #[inline]
                fn encode_to(&self, dst: &mut WriteCursor) -> Result<()> {
                    dst.$put(*self)
                }

                #[inline]
                fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self> {
                    src.$read()
                }

                fn encoded_size_of_slice(items: &[Self], _: &Config) -> Result<usize> {
                    items
                        .len()
                        .checked_mul(size_of::<$ty>())
                        .ok_or_else(|| WireError::size_overflow(items.len(), size_of::<$ty>()))
                }
            }
        )*
    };
}

scalar_marshaller! {
    bool => Bool, put_bool, read_bool;
    i8 => I8, put_i8, read_i8;
    i16 => I16, put_i16, read_i16;
    i32 => I32, put_i32, read_i32;
    i64 => I64, put_i64, read_i64;
    u16 => U16, put_u16, read_u16;
    u32 => U32, put_u32, read_u32;
    u64 => U64, put_u64, read_u64;
}

/// Byte collections are moved as a single run rather than per element.
impl BinaryMarshaller for u8 {
    const MIN_ENCODED_SIZE: usize = 1;

    fn wire_type() -> WireType {
        WireType::U8
    }

    #[inline]
    fn encoded_size_with(&self, _: &Config) -> Result<usize> {
        Ok(1)
    }

    #[inline]
    fn encode_to(&self, dst: &mut WriteCursor) -> Result<()> {
        dst.put_u8(*self)
    }

    #[inline]
    fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self> {
        src.read_u8()
    }

    fn encoded_size_of_slice(items: &[Self], _: &Config) -> Result<usize> {
        Ok(items.len())
    }

    fn encode_slice(items: &[Self], dst: &mut WriteCursor) -> Result<()> {
        dst.put_slice(items)
    }

    fn decode_vec(count: usize, src: &mut ReadCursor<'_>) -> Result<Vec<Self>> {
        Ok(src.read_fixed_bytes(count)?.to_vec())
    }
}

impl BinaryMarshaller for String {
    const MIN_ENCODED_SIZE: usize = LENGTH_PREFIX_SIZE;

    fn wire_type() -> WireType {
        WireType::String
    }

    fn encoded_size_with(&self, config: &Config) -> Result<usize> {
        check_length(self.len(), config, None)?;
        add_size(LENGTH_PREFIX_SIZE, self.len())
    }

    fn encode_to(&self, dst: &mut WriteCursor) -> Result<()> {
        dst.put_string(self)
    }

    fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self> {
        src.read_string()
    }
}

/// A length prefixed byte sequence, decoded without per-byte work.
impl BinaryMarshaller for Bytes {
    const COLLECTION: bool = true;
    const MIN_ENCODED_SIZE: usize = LENGTH_PREFIX_SIZE;

    fn wire_type() -> WireType {
        WireType::sequence(WireType::U8)
    }

    fn encoded_size_with(&self, config: &Config) -> Result<usize> {
        check_length(self.len(), config, None)?;
        add_size(LENGTH_PREFIX_SIZE, self.len())
    }

    fn encode_to(&self, dst: &mut WriteCursor) -> Result<()> {
        dst.put_length(self.len())?;
        dst.put_slice(self)
    }

    fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self> {
        src.rewind_on_error(|src| {
            let len = src.read_length()?;
            Ok(Bytes::copy_from_slice(src.read_fixed_bytes(len)?))
        })
    }
}

impl<T: BinaryMarshaller, const N: usize> BinaryMarshaller for [T; N] {
    const COLLECTION: bool = true;
    const MIN_ENCODED_SIZE: usize = T::MIN_ENCODED_SIZE.saturating_mul(N);

    fn wire_type() -> WireType {
        WireType::fixed_array(T::wire_type(), N)
    }

    fn encoded_size_with(&self, config: &Config) -> Result<usize> {
        check_element::<T>(false)?;
        T::encoded_size_of_slice(self, config)
    }

    fn encode_to(&self, dst: &mut WriteCursor) -> Result<()> {
        check_element::<T>(false)?;
        T::encode_slice(self, dst)
    }

    fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self> {
        check_element::<T>(false)?;
        src.ensure_elements(N, T::MIN_ENCODED_SIZE, src.position())?;
        let items = src.rewind_on_error(|src| T::decode_vec(N, src))?;
        items
            .try_into()
            .map_err(|_| WireError::unsupported(format!("fixed array expects {} elements", N)))
    }
}

impl<T: BinaryMarshaller> BinaryMarshaller for Vec<T> {
    const COLLECTION: bool = true;
    const MIN_ENCODED_SIZE: usize = LENGTH_PREFIX_SIZE;

    fn wire_type() -> WireType {
        WireType::sequence(T::wire_type())
    }

    fn encoded_size_with(&self, config: &Config) -> Result<usize> {
        check_element::<T>(true)?;
        check_length(self.len(), config, None)?;
        add_size(LENGTH_PREFIX_SIZE, T::encoded_size_of_slice(self, config)?)
    }

    fn encode_to(&self, dst: &mut WriteCursor) -> Result<()> {
        check_element::<T>(true)?;
        dst.put_length(self.len())?;
        T::encode_slice(self, dst)
    }

    fn decode_from(src: &mut ReadCursor<'_>) -> Result<Self> {
        check_element::<T>(true)?;
        src.rewind_on_error(|src| {
            let prefix_offset = src.position();
            let count = src.read_length()?;
            src.ensure_elements(count, T::MIN_ENCODED_SIZE, prefix_offset)?;
            T::decode_vec(count, src)
        })
    }
}

/// Declares a plain struct and implements [`BinaryMarshaller`] for it. Fields
/// are encoded and decoded in declaration order, inlined with no delimiter,
/// and every field type must itself implement [`BinaryMarshaller`].
///
/// ```
/// structwire::wire_record! {
///     #[derive(Debug, PartialEq)]
///     pub struct WindowChange {
///         pub width: u32,
///         pub height: u32,
///     }
/// }
///
/// let msg = WindowChange { width: 80, height: 24 };
/// let bytes = structwire::encode(&msg).unwrap();
/// assert_eq!(&bytes[..], &[0, 0, 0, 80, 0, 0, 0, 24]);
/// assert_eq!(structwire::decode::<WindowChange>(&bytes).unwrap(), msg);
/// ```
#[macro_export]
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::BinaryMarshaller for $name {
            const MIN_ENCODED_SIZE: usize = 0usize
                $(.saturating_add(<$ty as $crate::BinaryMarshaller>::MIN_ENCODED_SIZE))*;

            fn wire_type() -> $crate::WireType {
                $crate::WireType::Record(
                    $crate::Shape::new()
                        $(.field(
                            stringify!($field),
                            <$ty as $crate::BinaryMarshaller>::wire_type(),
                        ))*
                )
            }

            #[allow(unused_mut, unused_variables)]
            fn encoded_size_with(&self, config: &$crate::Config) -> $crate::Result<usize> {
                let mut size = 0usize;
                $(
                    size = $crate::encoding::add_size(
                        size,
                        $crate::BinaryMarshaller::encoded_size_with(&self.$field, config)
                            .map_err(|e| e.in_field(stringify!($field)))?,
                    )?;
                )*
                Ok(size)
            }

            #[allow(unused_variables)]
            fn encode_to(&self, dst: &mut $crate::WriteCursor) -> $crate::Result<()> {
                $(
                    $crate::BinaryMarshaller::encode_to(&self.$field, dst)
                        .map_err(|e| e.in_field(stringify!($field)))?;
                )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn decode_from(src: &mut $crate::ReadCursor<'_>) -> $crate::Result<Self> {
                src.rewind_on_error(|src| {
                    $(
                        let $field = <$ty as $crate::BinaryMarshaller>::decode_from(src)
                            .map_err(|e| e.in_field(stringify!($field)))?;
                    )*
                    Ok($name { $($field),* })
                })
            }
        }
    };
}
