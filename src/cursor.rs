// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use bytes::{
    Buf,
    BufMut,
    Bytes,
    BytesMut,
};

use crate::{
    config::Config,
    errs::{
        FieldPath,
        Result,
        WireError,
    },
};

/// Start a streaming read over `src`, for callers that pull fields by hand
/// (e.g. a heterogeneous protocol header followed by a typed payload).
pub fn new_cursor(src: &[u8]) -> ReadCursor<'_> {
    ReadCursor::new(src)
}

/// Checks a string length or sequence count against the 4-byte prefix and
/// the configured maximum.
pub(crate) fn check_length(len: usize, config: &Config, offset: Option<usize>) -> Result<u32> {
    let limit = config.max_length();
    match u32::try_from(len) {
        | Ok(prefix) if prefix <= limit => Ok(prefix),
        | _ => Err(WireError::length_overflow(offset, len as u64, limit as u64)),
    }
}

/// A position-tracked, read-only view over a byte buffer. All reads are
/// bounds checked and advance the position by the width read.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    /// The unread tail of the input.
    buf: &'a [u8],
    /// Length of the original input, used to derive the position.
    total: usize,
    config: Config,
}

impl<'a> ReadCursor<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self::with_config(src, Config::default())
    }

    pub fn with_config(src: &'a [u8], config: Config) -> Self {
        ReadCursor {
            buf: src,
            total: src.len(),
            config,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.total - self.buf.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fails with [`WireError::InsufficientInput`] unless `needed` bytes
    /// remain.
    #[inline]
    pub fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.buf.len() {
            return Err(WireError::InsufficientInput {
                path: FieldPath::default(),
                offset: self.position(),
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Checks that `count` elements of at least `min_size` bytes each could
    /// still be present. `prefix_offset` is where the count was read from.
    pub(crate) fn ensure_elements(
        &self,
        count: usize,
        min_size: usize,
        prefix_offset: usize,
    ) -> Result<()> {
        let needed = count.checked_mul(min_size).ok_or_else(|| {
            WireError::length_overflow(
                Some(prefix_offset),
                count as u64,
                (usize::MAX / min_size.max(1)) as u64,
            )
        })?;
        self.ensure(needed)
    }

    /// Run `read` against this cursor, rewinding to where it started if it
    /// fails. A caller holding a short buffer can retry the same read once
    /// more bytes arrive.
    pub fn rewind_on_error<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.buf;
        read(self).inspect_err(|_| self.buf = start)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(size_of::<u8>())?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(size_of::<u16>())?;
        Ok(self.buf.get_u16())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(size_of::<u32>())?;
        Ok(self.buf.get_u32())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(size_of::<u64>())?;
        Ok(self.buf.get_u64())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(size_of::<i8>())?;
        Ok(self.buf.get_i8())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(size_of::<i16>())?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(size_of::<i32>())?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(size_of::<i64>())?;
        Ok(self.buf.get_i64())
    }

    /// Any nonzero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Borrow the next `len` bytes without copying them.
    pub fn read_fixed_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read a 4-byte big-endian length or count prefix.
    pub fn read_length(&mut self) -> Result<usize> {
        let offset = self.position();
        let declared = self.read_u32()?;

        let limit = self.config.max_length();
        if declared > limit {
            return Err(WireError::length_overflow(
                Some(offset),
                declared as u64,
                limit as u64,
            ));
        }

        usize::try_from(declared).map_err(|_| {
            WireError::length_overflow(Some(offset), declared as u64, usize::MAX as u64)
        })
    }

    /// Read a length prefixed string.
    pub fn read_string(&mut self) -> Result<String> {
        self.rewind_on_error(|src| {
            let len = src.read_length()?;
            let offset = src.position();
            let raw = src.read_fixed_bytes(len)?;
            std::str::from_utf8(raw)
                .map(str::to_owned)
                .map_err(|_| WireError::InvalidUtf8 {
                    path: FieldPath::default(),
                    offset,
                })
        })
    }
}

/// A write position over a buffer allocated once, at the exact size the
/// encoding will take. Writes past the limit are refused rather than grown.
#[derive(Debug)]
pub struct WriteCursor {
    buf: BytesMut,
    limit: usize,
    config: Config,
}

impl WriteCursor {
    pub fn with_limit(limit: usize) -> Self {
        Self::with_config(limit, Config::default())
    }

    pub fn with_config(limit: usize, config: Config) -> Self {
        WriteCursor {
            buf: BytesMut::with_capacity(limit),
            limit,
            config,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    fn reserve(&self, len: usize) -> Result<()> {
        if len > self.remaining() {
            return Err(WireError::length_overflow(
                Some(self.position()),
                (self.position() as u64).saturating_add(len as u64),
                self.limit as u64,
            ));
        }
        Ok(())
    }

    pub fn put_u8(&mut self, val: u8) -> Result<()> {
        self.reserve(size_of::<u8>())?;
        self.buf.put_u8(val);
        Ok(())
    }

    pub fn put_u16(&mut self, val: u16) -> Result<()> {
        self.reserve(size_of::<u16>())?;
        self.buf.put_u16(val);
        Ok(())
    }

    pub fn put_u32(&mut self, val: u32) -> Result<()> {
        self.reserve(size_of::<u32>())?;
        self.buf.put_u32(val);
        Ok(())
    }

    pub fn put_u64(&mut self, val: u64) -> Result<()> {
        self.reserve(size_of::<u64>())?;
        self.buf.put_u64(val);
        Ok(())
    }

    pub fn put_i8(&mut self, val: i8) -> Result<()> {
        self.reserve(size_of::<i8>())?;
        self.buf.put_i8(val);
        Ok(())
    }

    pub fn put_i16(&mut self, val: i16) -> Result<()> {
        self.reserve(size_of::<i16>())?;
        self.buf.put_i16(val);
        Ok(())
    }

    pub fn put_i32(&mut self, val: i32) -> Result<()> {
        self.reserve(size_of::<i32>())?;
        self.buf.put_i32(val);
        Ok(())
    }

    pub fn put_i64(&mut self, val: i64) -> Result<()> {
        self.reserve(size_of::<i64>())?;
        self.buf.put_i64(val);
        Ok(())
    }

    pub fn put_bool(&mut self, val: bool) -> Result<()> {
        self.put_u8(val as u8)
    }

    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        self.reserve(src.len())?;
        self.buf.put_slice(src);
        Ok(())
    }

    /// Write a 4-byte big-endian length or count prefix.
    pub fn put_length(&mut self, len: usize) -> Result<()> {
        let prefix = check_length(len, &self.config, Some(self.position()))?;
        self.put_u32(prefix)
    }

    /// Write a length prefixed string.
    pub fn put_string(&mut self, val: &str) -> Result<()> {
        self.put_length(val.len())?;
        self.put_slice(val.as_bytes())
    }

    /// Hand back everything written so far.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}
