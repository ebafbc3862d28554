use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

pub const SHA256: &str = "sha256";

/// A content hash: algorithm identifier plus lowercase hex digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hash {
    algorithm: String,
    hex: String,
}

impl Hash {
    pub fn sha256_from_bytes(digest: &[u8]) -> Self {
        Self {
            algorithm: SHA256.to_string(),
            hex: hex::encode(digest),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Hash {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (algorithm, hex) = value
            .split_once(':')
            .ok_or_else(|| anyhow!("hash '{value}' is missing an algorithm prefix"))?;
        if algorithm != SHA256 {
            bail!("unsupported hash algorithm '{algorithm}'");
        }
        if hex.len() != 64 || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            bail!("'{hex}' is not a lowercase sha256 hex digest");
        }
        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_string(),
        })
    }
}

impl TryFrom<String> for Hash {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hash> for String {
    fn from(value: Hash) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn parses_and_displays_prefixed_digest() {
        let hash: Hash = format!("sha256:{EMPTY_SHA256}").parse().expect("parse");
        assert_eq!(hash.algorithm(), "sha256");
        assert_eq!(hash.hex(), EMPTY_SHA256);
        assert_eq!(hash.to_string(), format!("sha256:{EMPTY_SHA256}"));
    }

    #[test]
    fn rejects_uppercase_and_unknown_algorithms() {
        assert!(format!("sha256:{}", EMPTY_SHA256.to_uppercase())
            .parse::<Hash>()
            .is_err());
        assert!(format!("md5:{EMPTY_SHA256}").parse::<Hash>().is_err());
        assert!(EMPTY_SHA256.parse::<Hash>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let hash = Hash::sha256_from_bytes(&[0xab; 32]);
        let json = serde_json::to_string(&hash).expect("serialize");
        assert_eq!(json, format!("\"sha256:{}\"", "ab".repeat(32)));
        let back: Hash = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, hash);
    }
}
