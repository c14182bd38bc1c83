use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Length in bytes of every digest produced by this crate
pub const HASH_LENGTH: usize = 32;

/// Compute the BLAKE2b-256 hash of data
pub fn blake2b_256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A 32-byte BLAKE2b-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_LENGTH]);

impl Hash {
    /// Create a new hash from bytes
    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create a hash by hashing the provided data
    pub fn from_data(data: &[u8]) -> Self {
        Self(blake2b_256(data))
    }

    /// Parse a hash from a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; HASH_LENGTH];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get the hash as bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Hex encoding without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create a zero hash (all zeros)
    pub const fn zero() -> Self {
        Self([0u8; HASH_LENGTH])
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake2b_256() {
        // RFC 7693 style vector for the empty input, 256-bit output
        let expected =
            hex::decode("0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8")
                .unwrap();

        let result = blake2b_256(b"");
        assert_eq!(result.to_vec(), expected);
    }

    #[test]
    fn test_hash_struct() {
        let data = b"test data";
        let hash = Hash::from_data(data);

        // Hash should be deterministic
        let hash2 = Hash::from_data(data);
        assert_eq!(hash, hash2);

        // Different data should produce different hashes
        let hash3 = Hash::from_data(b"different data");
        assert_ne!(hash, hash3);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let hash = Hash::from_data(b"statetrie");

        assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
        assert_eq!(Hash::from_hex(&hash.to_string()).unwrap(), hash);
        assert!(Hash::from_hex("abcd").is_err());
    }
}
