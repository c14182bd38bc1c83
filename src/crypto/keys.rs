use ed25519_dalek::{PublicKey, SecretKey, SECRET_KEY_LENGTH, PUBLIC_KEY_LENGTH, KEYPAIR_LENGTH};
use log::{debug, info};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::NodeConfig;

/// File name of the node identity key inside the data directory
pub const NODE_KEY_FILE: &str = "node.key";

/// Errors raised while loading or generating the node key
#[derive(Debug, Error)]
pub enum KeyError {
    /// Reading or writing the key file failed
    #[error("node key io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The key file exists but does not hold ed25519 key material
    #[error("invalid node key: {0}")]
    InvalidKey(#[from] ed25519_dalek::SignatureError),

    /// The stored public half was not derived from the stored secret
    #[error("node key public half does not match its secret key")]
    PublicKeyMismatch,

    /// The key file has the wrong size
    #[error("invalid node key length {0} (expected {} or {} bytes)", SECRET_KEY_LENGTH, KEYPAIR_LENGTH)]
    InvalidLength(usize),
}

/// Ed25519 identity of a node
pub struct NodeKeypair {
    /// Public key, used as the node identity
    pub public: PublicKey,

    /// Secret key
    pub secret: SecretKey,
}

impl Clone for NodeKeypair {
    fn clone(&self) -> Self {
        // SecretKey is not Clone, rebuild it from its bytes
        let secret = SecretKey::from_bytes(self.secret.as_bytes())
            .expect("a valid secret key always round-trips through its bytes");
        let public = PublicKey::from(&secret);

        Self { public, secret }
    }
}

impl NodeKeypair {
    /// Generate a new random keypair from OS randomness
    pub fn generate() -> Self {
        Self::from_rng(&mut OsRng)
    }

    /// Deterministic keypair: the same seed always yields the same key
    pub fn from_seed(seed: u64) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed))
    }

    fn from_rng<R: RngCore>(rng: &mut R) -> Self {
        // ed25519-dalek 1.x pins an older rand_core, so derive from raw seed bytes
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut seed);
        let secret = SecretKey::from_bytes(&seed).expect("32 bytes is a valid secret key length");
        let public = PublicKey::from(&secret);

        Self { public, secret }
    }

    /// Create a keypair from either a 32-byte secret or a 64-byte secret || public
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            SECRET_KEY_LENGTH => {
                let secret = SecretKey::from_bytes(bytes)?;
                let public = PublicKey::from(&secret);
                Ok(Self { public, secret })
            }
            KEYPAIR_LENGTH => {
                let secret = SecretKey::from_bytes(&bytes[..SECRET_KEY_LENGTH])?;
                let public = PublicKey::from(&secret);
                // The stored public half must match the secret
                if public.as_bytes()[..] != bytes[SECRET_KEY_LENGTH..] {
                    return Err(KeyError::PublicKeyMismatch);
                }
                Ok(Self { public, secret })
            }
            len => Err(KeyError::InvalidLength(len)),
        }
    }

    /// Export as 64 bytes, secret followed by public
    pub fn to_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        let mut bytes = [0u8; KEYPAIR_LENGTH];
        bytes[..SECRET_KEY_LENGTH].copy_from_slice(self.secret.as_bytes());
        bytes[SECRET_KEY_LENGTH..].copy_from_slice(self.public.as_bytes());
        bytes
    }

    /// Export the public key as bytes
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        *self.public.as_bytes()
    }
}

impl fmt::Debug for NodeKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKeypair {{ public: {} }}", hex::encode(self.public.as_bytes()))
    }
}

/// Path of the key file for a data directory
pub fn node_key_path<P: AsRef<Path>>(data_dir: P) -> PathBuf {
    data_dir.as_ref().join(NODE_KEY_FILE)
}

/// Load the node key from the data directory.
///
/// A missing or unreadable file yields `Ok(None)` so the caller can generate
/// a fresh key; a file with malformed contents is an error.
pub fn load_node_key<P: AsRef<Path>>(data_dir: P) -> Result<Option<NodeKeypair>, KeyError> {
    let path = node_key_path(data_dir);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!("No node key at {:?}: {}", path, err);
            return Ok(None);
        }
    };

    NodeKeypair::from_bytes(&bytes).map(Some)
}

/// Generate a node key and write it to the data directory.
///
/// A zero seed draws from OS randomness, any other seed produces the same key
/// on every run.
pub fn generate_node_key<P: AsRef<Path>>(seed: u64, data_dir: P) -> Result<NodeKeypair, KeyError> {
    let keypair = if seed == 0 {
        NodeKeypair::generate()
    } else {
        NodeKeypair::from_seed(seed)
    };

    let path = node_key_path(&data_dir);
    write_key_file(&path, &keypair.to_bytes()).map_err(|source| KeyError::Io {
        path: path.clone(),
        source,
    })?;

    info!("Wrote node key to {:?}", path);
    Ok(keypair)
}

/// Load the configured node key, generating one when needed.
///
/// With `rand_seed == 0` an existing key is reused; with a non-zero seed the
/// deterministic key is always regenerated and the data directory is not read.
pub fn setup_node_key(config: &NodeConfig) -> Result<NodeKeypair, KeyError> {
    if config.rand_seed != 0 {
        return generate_node_key(config.rand_seed, &config.data_dir);
    }

    if let Some(keypair) = load_node_key(&config.data_dir)? {
        debug!("Loaded existing node key {}", hex::encode(keypair.public_bytes()));
        return Ok(keypair);
    }

    debug!("No existing node key, generating a new one");
    generate_node_key(0, &config.data_dir)
}

#[cfg(unix)]
fn write_key_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_key_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_keypair_bytes_roundtrip() {
        let keypair = NodeKeypair::generate();

        // Both the 64-byte and the 32-byte secret forms are accepted
        let full = NodeKeypair::from_bytes(&keypair.to_bytes()).unwrap();
        let secret_only = NodeKeypair::from_bytes(keypair.secret.as_bytes()).unwrap();

        assert_eq!(full.public_bytes(), keypair.public_bytes());
        assert_eq!(secret_only.public_bytes(), keypair.public_bytes());
    }

    #[test]
    fn test_keypair_rejects_bad_length() {
        let err = NodeKeypair::from_bytes(&[1u8; 10]).unwrap_err();
        assert!(matches!(err, KeyError::InvalidLength(10)));
    }

    #[test]
    fn test_keypair_rejects_mismatched_public() {
        let mut bytes = NodeKeypair::generate().to_bytes();
        bytes[KEYPAIR_LENGTH - 1] ^= 0xff;

        let err = NodeKeypair::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, KeyError::PublicKeyMismatch));
        assert_eq!(err.to_string(), "node key public half does not match its secret key");
    }

    #[test]
    fn test_seeded_keypair_is_deterministic() {
        let a = NodeKeypair::from_seed(42);
        let b = NodeKeypair::from_seed(42);
        let c = NodeKeypair::from_seed(43);

        assert_eq!(a.public_bytes(), b.public_bytes());
        assert_ne!(a.public_bytes(), c.public_bytes());
    }

    #[test]
    fn test_clone_preserves_key() {
        let keypair = NodeKeypair::from_seed(7);
        let cloned = keypair.clone();
        assert_eq!(keypair.to_bytes(), cloned.to_bytes());
    }

    #[test]
    fn test_load_missing_key() {
        let dir = tempdir().unwrap();
        assert!(load_node_key(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_malformed_key() {
        let dir = tempdir().unwrap();
        fs::write(node_key_path(dir.path()), b"not a key").unwrap();

        assert!(load_node_key(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        generate_node_key(0, dir.path()).unwrap();

        let mode = fs::metadata(node_key_path(dir.path())).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
