//! Published snapshot versions and the protocol format generation
//!
//! Both types are strict-decimal newtypes over `u32`. Strictness matters:
//! version strings arrive from config files and from the network, and a
//! trailing junk byte must be a parse failure, not a silently truncated
//! number.

use thiserror::Error;

/// Error produced when a version or format string is not pure decimal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a decimal version: {input:?}")]
pub struct VersionParseError {
    /// The rejected input, as received (after whitespace trimming)
    pub input: String,
}

fn parse_decimal(text: &str) -> Result<u32, VersionParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError {
            input: trimmed.to_string(),
        });
    }
    trimmed.parse::<u32>().map_err(|_| VersionParseError {
        input: trimmed.to_string(),
    })
}

/// An unsigned 32-bit integer tagging a published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u32);

impl Version {
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    /// Parse a version from text. Leading/trailing whitespace is trimmed;
    /// anything other than ASCII digits afterwards is rejected.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        parse_decimal(text).map(Self)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The format generation gating protocol compatibility.
///
/// Updates are only attempted within the currently installed generation;
/// cross-generation updates are refused upstream of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Format(u32);

impl Format {
    pub const fn new(f: u32) -> Self {
        Self(f)
    }

    /// Parse a format generation with the same strict-decimal rule as
    /// [`Version::parse`].
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        parse_decimal(text).map(Self)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Format {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_decimal() {
        assert_eq!(Version::parse("30010").unwrap(), Version::new(30010));
        assert_eq!(Format::parse("29").unwrap(), Format::new(29));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        // Server "latest" bodies carry a trailing newline
        assert_eq!(Version::parse("30010\n").unwrap(), Version::new(30010));
        assert_eq!(Version::parse("  42  ").unwrap(), Version::new(42));
    }

    #[test]
    fn test_parse_rejects_non_decimal() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("30a10").is_err());
        assert!(Version::parse("-1").is_err());
        assert!(Version::parse("3.0").is_err());
        assert!(Version::parse("<html>busted mirror</html>").is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(Version::parse("4294967296").is_err());
        assert_eq!(
            Version::parse("4294967295").unwrap(),
            Version::new(u32::MAX)
        );
    }

    #[test]
    fn test_ordering_matches_numeric() {
        assert!(Version::new(29990) < Version::new(30010));
        assert!(Version::parse("9").unwrap() < Version::parse("10").unwrap());
    }

    #[test]
    fn test_display_roundtrip() {
        let v = Version::new(30010);
        assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
    }
}
