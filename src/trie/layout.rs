//! Trie layout versions.
//!
//! A layout decides how large a value may be before the trie stores its
//! digest instead of the bytes. `V0` always inlines, `V1` hashes values longer
//! than [`V1_MAX_INLINE_VALUE_SIZE`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Inline threshold of `V0`: every value is embedded in its node
pub const NO_MAX_INLINE_VALUE_SIZE: usize = usize::MAX;

/// Values longer than this are stored by digest under `V1`
pub const V1_MAX_INLINE_VALUE_SIZE: usize = 32;

/// Labels accepted by [`parse_version`], in tag order
const SUPPORTED_VERSIONS: [&str; 2] = ["v0", "v1"];

/// State trie layout version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "VersionInput", into = "String")]
#[repr(u8)]
pub enum TrieLayout {
    V0 = 0,
    V1 = 1,
}

impl TrieLayout {
    /// Every supported layout, in tag order
    pub const ALL: [TrieLayout; 2] = [TrieLayout::V0, TrieLayout::V1];

    /// Rebuild a layout from a tag this process produced itself.
    ///
    /// # Panics
    ///
    /// Panics with `unknown version <tag>` when the tag is not a supported
    /// version. Untrusted input goes through [`parse_version`] instead.
    #[track_caller]
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0 => TrieLayout::V0,
            1 => TrieLayout::V1,
            _ => panic!("unknown version {}", tag),
        }
    }

    /// Numeric tag of the layout
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Lowercase label, `"v0"` or `"v1"`
    pub fn as_str(self) -> &'static str {
        SUPPORTED_VERSIONS[self as usize]
    }

    /// Largest value length stored inline in a node
    pub fn max_inline_value(self) -> usize {
        match self {
            TrieLayout::V0 => NO_MAX_INLINE_VALUE_SIZE,
            TrieLayout::V1 => V1_MAX_INLINE_VALUE_SIZE,
        }
    }

    /// Whether a value must be replaced by its digest in the node encoding
    pub fn should_hash_value(self, value: &[u8]) -> bool {
        value.len() > self.max_inline_value()
    }
}

impl fmt::Display for TrieLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TrieLayout> for String {
    fn from(layout: TrieLayout) -> Self {
        layout.as_str().to_string()
    }
}

/// Raw version value from configuration, command line or RPC
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VersionInput {
    Number(u8),
    Label(String),
}

impl VersionInput {
    /// Form used for matching and in error messages; numbers render as `V<N>`
    fn normalized(&self) -> String {
        match self {
            VersionInput::Number(n) => format!("V{}", n),
            VersionInput::Label(label) => label.clone(),
        }
    }
}

impl From<u8> for VersionInput {
    fn from(n: u8) -> Self {
        VersionInput::Number(n)
    }
}

impl From<&str> for VersionInput {
    fn from(label: &str) -> Self {
        VersionInput::Label(label.to_string())
    }
}

impl From<String> for VersionInput {
    fn from(label: String) -> Self {
        VersionInput::Label(label)
    }
}

/// A version value outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing version failed: {input:?} must be one of [{}]", SUPPORTED_VERSIONS.join(", "))]
pub struct ParseVersionError {
    /// Normalized input that failed to parse
    pub input: String,
}

/// Parse an external version value into a [`TrieLayout`].
///
/// Labels match case-insensitively; numbers are compared as `V<N>`.
pub fn parse_version<V: Into<VersionInput>>(value: V) -> Result<TrieLayout, ParseVersionError> {
    let input = value.into().normalized();

    TrieLayout::ALL
        .into_iter()
        .find(|layout| input.eq_ignore_ascii_case(layout.as_str()))
        .ok_or(ParseVersionError { input })
}

/// Parse a version given as command line text.
///
/// Text that reads as a `u8` is treated as a version number, anything else as
/// a label, so `"1"` and `"v1"` both select [`TrieLayout::V1`].
pub fn parse_version_arg(s: &str) -> Result<TrieLayout, ParseVersionError> {
    match s.parse::<u8>() {
        Ok(n) => parse_version(n),
        Err(_) => parse_version(s),
    }
}

impl FromStr for TrieLayout {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}

impl TryFrom<u8> for TrieLayout {
    type Error = ParseVersionError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        parse_version(n)
    }
}

impl TryFrom<VersionInput> for TrieLayout {
    type Error = ParseVersionError;

    fn try_from(input: VersionInput) -> Result<Self, Self::Error> {
        parse_version(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        assert_eq!(TrieLayout::V0.to_string(), "v0");
        assert_eq!(TrieLayout::V1.to_string(), "v1");
    }

    #[test]
    #[should_panic(expected = "unknown version 99")]
    fn test_from_tag_unknown_panics() {
        let _ = TrieLayout::from_tag(99);
    }

    #[test]
    fn test_from_tag_roundtrip() {
        for layout in TrieLayout::ALL {
            assert_eq!(TrieLayout::from_tag(layout.tag()), layout);
        }
    }

    #[test]
    fn test_parse_version() {
        let cases: Vec<(VersionInput, TrieLayout)> = vec![
            ("v0".into(), TrieLayout::V0),
            ("V0".into(), TrieLayout::V0),
            (0u8.into(), TrieLayout::V0),
            ("v1".into(), TrieLayout::V1),
            ("V1".into(), TrieLayout::V1),
            (1u8.into(), TrieLayout::V1),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_version(input.clone()), Ok(expected), "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_version_invalid_label() {
        let err = parse_version("xyz").unwrap_err();
        assert_eq!(err.to_string(), "parsing version failed: \"xyz\" must be one of [v0, v1]");
    }

    #[test]
    fn test_parse_version_invalid_number() {
        let err = parse_version(99u8).unwrap_err();
        assert_eq!(err.to_string(), "parsing version failed: \"V99\" must be one of [v0, v1]");
    }

    #[test]
    fn test_from_str_does_not_accept_digits() {
        // Text goes through the label path, "1" is not a label
        assert!("1".parse::<TrieLayout>().is_err());
        assert_eq!("V1".parse::<TrieLayout>(), Ok(TrieLayout::V1));
        assert_eq!(TrieLayout::try_from(0u8), Ok(TrieLayout::V0));
    }

    #[test]
    fn test_parse_version_arg() {
        assert_eq!(parse_version_arg("0"), Ok(TrieLayout::V0));
        assert_eq!(parse_version_arg("1"), Ok(TrieLayout::V1));
        assert_eq!(parse_version_arg("v1"), Ok(TrieLayout::V1));
        assert_eq!(parse_version_arg("V0"), Ok(TrieLayout::V0));
        assert_eq!(
            parse_version_arg("99").unwrap_err().to_string(),
            "parsing version failed: \"V99\" must be one of [v0, v1]"
        );
        // Out of u8 range falls back to the label path
        assert_eq!(
            parse_version_arg("300").unwrap_err().to_string(),
            "parsing version failed: \"300\" must be one of [v0, v1]"
        );
    }

    #[test]
    fn test_string_roundtrip() {
        for layout in TrieLayout::ALL {
            assert_eq!(parse_version(layout.to_string()), Ok(layout));
        }
    }

    #[test]
    fn test_max_inline_value() {
        assert_eq!(TrieLayout::V0.max_inline_value(), NO_MAX_INLINE_VALUE_SIZE);
        assert_eq!(TrieLayout::V1.max_inline_value(), V1_MAX_INLINE_VALUE_SIZE);
    }

    #[test]
    fn test_should_hash_value_boundary() {
        let at_limit = vec![0u8; V1_MAX_INLINE_VALUE_SIZE];
        let over_limit = vec![0u8; V1_MAX_INLINE_VALUE_SIZE + 1];

        assert!(!TrieLayout::V1.should_hash_value(&at_limit));
        assert!(TrieLayout::V1.should_hash_value(&over_limit));
        assert!(!TrieLayout::V0.should_hash_value(&vec![0u8; 4096]));
    }

    #[test]
    fn test_serde_label_and_number() {
        assert_eq!(serde_json::from_str::<TrieLayout>("\"V1\"").unwrap(), TrieLayout::V1);
        assert_eq!(serde_json::from_str::<TrieLayout>("0").unwrap(), TrieLayout::V0);
        assert_eq!(serde_json::to_string(&TrieLayout::V1).unwrap(), "\"v1\"");

        let err = serde_json::from_str::<TrieLayout>("\"v9\"").unwrap_err();
        assert!(err.to_string().contains("must be one of [v0, v1]"));
    }
}
