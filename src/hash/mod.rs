//! Digest computation for scoped identifiers
//!
//! Digests are computed over `salt ++ content` with a configurable
//! algorithm, rendered in a configurable text encoding and truncated to a
//! requested length. The tiered mode keeps hashing with a 4-byte
//! little-endian tier index mixed in until enough identifier-safe
//! characters have accumulated.

pub mod encoding;

pub use encoding::DigestEncoding;

use crate::error::{ScopeError, ScopeResult};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md4,
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake3,
    Xxhash64,
}

impl HashAlgorithm {
    /// Hash the concatenation of `parts`
    pub fn compute(&self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            Self::Md4 => digest_parts::<md4::Md4>(parts),
            Self::Md5 => digest_parts::<md5::Md5>(parts),
            Self::Sha1 => digest_parts::<sha1::Sha1>(parts),
            Self::Sha256 => digest_parts::<sha2::Sha256>(parts),
            Self::Sha512 => digest_parts::<sha2::Sha512>(parts),
            Self::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().as_bytes().to_vec()
            }
            Self::Xxhash64 => {
                let mut hasher = xxhash_rust::xxh64::Xxh64::new(0);
                for part in parts {
                    hasher.update(part);
                }
                hasher.digest().to_be_bytes().to_vec()
            }
        }
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

impl FromStr for HashAlgorithm {
    type Err = ScopeError;

    fn from_str(s: &str) -> ScopeResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md4" => Ok(Self::Md4),
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            "xxhash64" => Ok(Self::Xxhash64),
            other => Err(ScopeError::config(format!(
                "unknown hash algorithm '{}' (expected md4, md5, sha1, sha256, sha512, blake3 or xxhash64)",
                other
            ))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Md4 => "md4",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
            Self::Xxhash64 => "xxhash64",
        };
        write!(f, "{}", name)
    }
}

/// Fully resolved digest parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashSpec {
    pub algorithm: HashAlgorithm,
    pub encoding: DigestEncoding,
    pub length: Option<usize>,
}

impl Default for HashSpec {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Md4,
            encoding: DigestEncoding::Hex,
            length: Some(20),
        }
    }
}

impl HashSpec {
    /// Single-pass digest of `salt ++ content`, truncated to `length`
    pub fn digest(&self, content: &[u8], salt: Option<&[u8]>) -> String {
        let raw = self.algorithm.compute(&[salt.unwrap_or_default(), content]);
        let mut encoded = self.encoding.encode(&raw);
        if let Some(len) = self.length {
            encoded.truncate(len);
        }
        encoded
    }

    /// Digest that is extended tier by tier until `length` identifier-safe
    /// characters are available.
    ///
    /// Leading digits are stripped, `/` becomes `_` and anything outside
    /// `[A-Za-z0-9_]` is dropped. Without a length a single tier is used.
    pub fn tiered_digest(&self, content: &[u8], salt: Option<&[u8]>) -> String {
        let salt = salt.unwrap_or_default();
        let mut accumulated = String::new();
        let mut tier: u32 = 0;

        loop {
            let tier_bytes = tier.to_le_bytes();
            let raw = self.algorithm.compute(&[salt, &tier_bytes[..], content]);
            accumulated.push_str(&self.encoding.encode(&raw));
            accumulated = identifier_safe(&accumulated);

            trace!(tier, len = accumulated.len(), "hash tier");

            match self.length {
                Some(len) if accumulated.len() >= len => {
                    accumulated.truncate(len);
                    return accumulated;
                }
                Some(_) => tier += 1,
                None => return accumulated,
            }
        }
    }
}

/// How a hash placeholder turns a [`HashSpec`] into identifier text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// Tiered digest, always exactly `length` identifier-safe characters
    #[default]
    Tiered,
    /// One digest pass; `+` and `/` become `_`, a leading digit becomes `_`
    Single,
}

impl HashMode {
    pub fn apply(&self, spec: &HashSpec, content: &[u8], salt: Option<&[u8]>) -> String {
        match self {
            Self::Tiered => spec.tiered_digest(content, salt),
            Self::Single => {
                let digest = spec.digest(content, salt).replace(&['+', '/'][..], "_");
                match digest.chars().next() {
                    Some(c) if c.is_ascii_digit() => format!("_{}", &digest[1..]),
                    _ => digest,
                }
            }
        }
    }
}

fn identifier_safe(digest: &str) -> String {
    digest
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .filter_map(|c| match c {
            '/' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}
