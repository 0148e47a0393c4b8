// src/hash.rs

//! SHA-256 digests for source archive integrity
//!
//! Recipes pin every primary archive to a SHA-256 digest. Archives are
//! verified after download and again when reused from the source cache.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Length of a SHA-256 digest in hex characters
const SHA256_HEX_LEN: usize = 64;

/// Buffer size for streaming file hashing (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// A validated, lowercase hex SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

/// Digest parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// Digest string has the wrong length
    InvalidLength { expected: usize, got: usize },
    /// Digest string contains non-hex characters
    InvalidHex(String),
}

impl fmt::Display for DigestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid digest length: expected {}, got {}", expected, got)
            }
            Self::InvalidHex(s) => write!(f, "invalid hex in digest: {}", s),
        }
    }
}

impl std::error::Error for DigestError {}

impl Sha256Digest {
    /// Validate and normalize a hex digest
    ///
    /// Accepts an optional `sha256:` prefix.
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let value = s.strip_prefix("sha256:").unwrap_or(s).trim();

        if value.len() != SHA256_HEX_LEN {
            return Err(DigestError::InvalidLength {
                expected: SHA256_HEX_LEN,
                got: value.len(),
            });
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidHex(value.to_string()));
        }

        Ok(Self(value.to_lowercase()))
    }

    /// Hex representation
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Compute the SHA-256 digest of a byte slice
pub fn sha256(data: &[u8]) -> Sha256Digest {
    Sha256Digest(hex::encode(Sha256::digest(data)))
}

/// Compute the SHA-256 digest of everything a reader yields
pub fn hash_reader<R: Read>(reader: &mut R) -> io::Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Sha256Digest(hex::encode(hasher.finalize())))
}

/// Compute the SHA-256 digest of a file without loading it into memory
pub fn hash_file(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = File::open(path)?;
    hash_reader(&mut file)
}
