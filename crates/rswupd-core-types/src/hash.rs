//! Fixed-width content digests
//!
//! A [`Hash`] names file content; equality is its only semantic operation.
//! The canonical lowercase-hex form doubles as the artifact's filename in
//! the staged content store, so `Display` must stay stable.

use thiserror::Error;

/// Width of a content digest in bytes.
pub const HASH_LEN: usize = 32;

/// Error produced when text is not a canonical digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    /// Input was not `2 * HASH_LEN` characters long
    #[error("digest must be {expected} hex characters, got {actual}")]
    BadLength { expected: usize, actual: usize },
    /// Input contained a non-hex character
    #[error("digest contains non-hex characters: {input:?}")]
    BadHex { input: String },
}

/// An opaque fixed-width content digest.
///
/// Two file records with equal hashes are interchangeable as content. The
/// all-zero hash is reserved for records that carry no content (deletions
/// and other contentless manifest entries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// The reserved contentless digest.
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    pub const fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the canonical lowercase-hex form. Uppercase hex is accepted
    /// on input; `Display` always emits lowercase.
    pub fn from_hex(text: &str) -> Result<Self, HashParseError> {
        if text.len() != 2 * HASH_LEN {
            return Err(HashParseError::BadLength {
                expected: 2 * HASH_LEN,
                actual: text.len(),
            });
        }
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(text, &mut bytes).map_err(|_| HashParseError::BadHex {
            input: text.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// The canonical lowercase-hex text form used as a staged filename.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// True for the reserved contentless digest.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
