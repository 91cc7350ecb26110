//! Textual encodings for raw digest bytes

use crate::error::{ScopeError, ScopeResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

const BASE26: &str = "abcdefghijklmnopqrstuvwxyz";
// no 0lio
const BASE32: &str = "123456789abcdefghjkmnpqrstuvwxyz";
const BASE36: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
// no lIO
const BASE49: &str = "abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
const BASE52: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
// no 0lIO
const BASE58: &str = "123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
const BASE62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// How digest bytes are rendered as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestEncoding {
    /// Lowercase hexadecimal
    Hex,
    /// RFC 4648 base64 with padding
    Base64,
    /// RFC 4648 URL-safe base64 without padding
    Base64Url,
    /// Big-number encoding over a fixed alphabet (base26 .. base62)
    Base(u8),
}

impl DigestEncoding {
    /// Encode raw digest bytes
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(bytes),
            Self::Base64 => STANDARD.encode(bytes),
            Self::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
            Self::Base(base) => encode_big_number(bytes, alphabet(*base)),
        }
    }
}

fn alphabet(base: u8) -> &'static [u8] {
    match base {
        26 => BASE26.as_bytes(),
        32 => BASE32.as_bytes(),
        36 => BASE36.as_bytes(),
        49 => BASE49.as_bytes(),
        52 => BASE52.as_bytes(),
        58 => BASE58.as_bytes(),
        _ => BASE62.as_bytes(),
    }
}

/// Treat `bytes` as a little-endian unsigned integer and write it out in
/// the given alphabet, most significant digit first.
fn encode_big_number(bytes: &[u8], table: &[u8]) -> String {
    let base = table.len() as u32;
    let mut number: Vec<u8> = bytes.iter().rev().copied().skip_while(|b| *b == 0).collect();
    let mut digits = Vec::new();

    while !number.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(number.len());
        for byte in &number {
            let acc = (remainder << 8) | u32::from(*byte);
            let q = acc / base;
            remainder = acc % base;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q as u8);
            }
        }
        digits.push(table[remainder as usize]);
        number = quotient;
    }

    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

impl FromStr for DigestEncoding {
    type Err = ScopeError;

    fn from_str(s: &str) -> ScopeResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "base64" => Ok(Self::Base64),
            "base64url" => Ok(Self::Base64Url),
            "base26" => Ok(Self::Base(26)),
            "base32" => Ok(Self::Base(32)),
            "base36" => Ok(Self::Base(36)),
            "base49" => Ok(Self::Base(49)),
            "base52" => Ok(Self::Base(52)),
            "base58" => Ok(Self::Base(58)),
            "base62" => Ok(Self::Base(62)),
            other => Err(ScopeError::config(format!(
                "unknown digest encoding '{}' (expected hex, base64, base64url or base26..base62)",
                other
            ))),
        }
    }
}

impl fmt::Display for DigestEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => write!(f, "hex"),
            Self::Base64 => write!(f, "base64"),
            Self::Base64Url => write!(f, "base64url"),
            Self::Base(base) => write!(f, "base{}", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_encodings() {
        assert_eq!("hex".parse::<DigestEncoding>().unwrap(), DigestEncoding::Hex);
        assert_eq!("BASE64".parse::<DigestEncoding>().unwrap(), DigestEncoding::Base64);
        assert_eq!(
            "base52".parse::<DigestEncoding>().unwrap(),
            DigestEncoding::Base(52)
        );
    }

    #[test]
    fn rejects_unknown_encoding() {
        let err = "base7".parse::<DigestEncoding>().unwrap_err();
        assert!(err.to_string().contains("unknown digest encoding 'base7'"));
    }

    #[test]
    fn hex_and_base64() {
        assert_eq!(DigestEncoding::Hex.encode(&[0xde, 0xad]), "dead");
        assert_eq!(DigestEncoding::Base64.encode(&[0xfb, 0xff]), "+/8=");
        assert_eq!(DigestEncoding::Base64Url.encode(&[0xfb, 0xff]), "-_8");
    }

    #[test]
    fn big_number_is_little_endian() {
        // 0x0100 little-endian = 1
        assert_eq!(DigestEncoding::Base(36).encode(&[0x01, 0x00]), "1");
        // 256 = 7 * 36 + 4
        assert_eq!(DigestEncoding::Base(36).encode(&[0x00, 0x01]), "74");
        assert_eq!(DigestEncoding::Base(26).encode(&[25]), "z");
        assert_eq!(DigestEncoding::Base(26).encode(&[26]), "ba");
    }

    #[test]
    fn big_number_zero_is_empty() {
        assert_eq!(DigestEncoding::Base(62).encode(&[0, 0, 0]), "");
    }

    #[test]
    fn display_round_trips() {
        for name in ["hex", "base64", "base64url", "base26", "base58"] {
            let encoding: DigestEncoding = name.parse().unwrap();
            assert_eq!(encoding.to_string(), name);
        }
    }
}
