// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use getset::CopyGetters;

/// The widest length the 4-byte prefix can carry.
pub const DEFAULT_MAX_LENGTH: u32 = u32::MAX;

/// Size of every string length and sequence count prefix on the wire.
pub const LENGTH_PREFIX_SIZE: usize = size_of::<u32>();

/// Limits applied while encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Config {
    /// Largest string byte length or sequence element count accepted on
    /// decode and produced on encode.
    max_length: u32,
}

impl Config {
    pub fn new() -> Self {
        Config {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_length(), DEFAULT_MAX_LENGTH);
        assert_eq!(LENGTH_PREFIX_SIZE, 4);
    }

    #[test]
    fn test_with_max_length() {
        let config = Config::new().with_max_length(64);
        assert_eq!(config.max_length(), 64);
    }
}
