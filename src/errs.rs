// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

/// Everything that can go wrong while sizing, encoding or decoding a record.
///
/// Cursor level errors are raised with an empty [`FieldPath`]; every
/// traversal level prepends its own segment while the error unwinds, so the
/// error a caller sees names the exact field that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Fewer bytes remain than the field requires.
    #[error("insufficient input at {path} (offset {offset}): need {needed} bytes, {remaining} remaining")]
    InsufficientInput {
        path: FieldPath,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// The field's shape is outside the closed wire type set, or the value
    /// does not match the declared shape.
    #[error("unsupported type at {path}: {reason}")]
    UnsupportedType { path: FieldPath, reason: String },

    /// A length prefix or element count can't be represented, or exceeds the
    /// configured maximum.
    #[error("length overflow at {path}{}: declared length {declared} exceeds limit {limit}", display_offset(.offset))]
    LengthOverflow {
        path: FieldPath,
        offset: Option<usize>,
        declared: u64,
        limit: u64,
    },

    /// A decoded string is not valid utf-8.
    #[error("invalid utf-8 string at {path} (offset {offset})")]
    InvalidUtf8 { path: FieldPath, offset: usize },
}

fn display_offset(offset: &Option<usize>) -> String {
    match offset {
        | Some(offset) => format!(" (offset {})", offset),
        | None => String::new(),
    }
}

impl WireError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        WireError::UnsupportedType {
            path: FieldPath::default(),
            reason: reason.into(),
        }
    }

    pub(crate) fn length_overflow(offset: Option<usize>, declared: u64, limit: u64) -> Self {
        WireError::LengthOverflow {
            path: FieldPath::default(),
            offset,
            declared,
            limit,
        }
    }

    /// Used when summing field sizes overflows `usize`.
    pub(crate) fn size_overflow(acc: usize, next: usize) -> Self {
        Self::length_overflow(
            None,
            (acc as u64).saturating_add(next as u64),
            usize::MAX as u64,
        )
    }

    /// Prefix the error's path with a named field.
    pub fn in_field(mut self, name: &str) -> Self {
        self.path_mut()
            .0
            .insert(0, PathSegment::Field(name.to_owned()));
        self
    }

    /// Prefix the error's path with a collection index.
    pub fn at_index(mut self, idx: usize) -> Self {
        self.path_mut().0.insert(0, PathSegment::Index(idx));
        self
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            | WireError::InsufficientInput { path, .. } |
            WireError::UnsupportedType { path, .. } |
            WireError::LengthOverflow { path, .. } |
            WireError::InvalidUtf8 { path, .. } => path,
        }
    }

    fn path_mut(&mut self) -> &mut FieldPath {
        match self {
            | WireError::InsufficientInput { path, .. } |
            WireError::UnsupportedType { path, .. } |
            WireError::LengthOverflow { path, .. } |
            WireError::InvalidUtf8 { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a field inside a (possibly nested) record, e.g.
/// `header.modes[3].opcode`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                | PathSegment::Field(name) if idx == 0 => f.write_str(name)?,
                | PathSegment::Field(name) => write!(f, ".{}", name)?,
                | PathSegment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        let err = WireError::unsupported("f32");
        assert!(err.path().is_root());
        assert_eq!(err.to_string(), "unsupported type at <root>: f32");
    }

    #[test]
    fn test_path_is_built_inside_out() {
        let err = WireError::InsufficientInput {
            path: FieldPath::default(),
            offset: 12,
            needed: 2,
            remaining: 1,
        }
        .in_field("opcode")
        .at_index(3)
        .in_field("modes")
        .in_field("header");

        assert_eq!(err.path().to_string(), "header.modes[3].opcode");
        assert_eq!(
            err.to_string(),
            "insufficient input at header.modes[3].opcode (offset 12): need 2 bytes, 1 remaining"
        );
    }

    #[test]
    fn test_length_overflow_offset_rendering() {
        let decode_side = WireError::length_overflow(Some(4), 10, 5).in_field("term");
        assert_eq!(
            decode_side.to_string(),
            "length overflow at term (offset 4): declared length 10 exceeds limit 5"
        );

        let encode_side = WireError::length_overflow(None, 10, 5).in_field("term");
        assert_eq!(
            encode_side.to_string(),
            "length overflow at term: declared length 10 exceeds limit 5"
        );
    }

    #[test]
    fn test_size_overflow_saturates() {
        let err = WireError::size_overflow(usize::MAX, 10);
        assert!(matches!(
            err,
            WireError::LengthOverflow { offset: None, .. }
        ));
    }
}
