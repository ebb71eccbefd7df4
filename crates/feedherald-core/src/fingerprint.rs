//! Content fingerprints
//!
//! A [`Fingerprint`] is the SHA-256 digest of an item body. Two bodies are
//! considered the same content iff their fingerprints are equal. The
//! persisted form is 64 lowercase hex characters.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Length of a fingerprint in bytes
pub const FINGERPRINT_LEN: usize = 32;

/// 256-bit digest of an item body
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex encoding, as stored in the history table
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Fingerprint an item body
///
/// Pure and infallible. The empty string is a valid body with its own
/// fingerprint, distinct from "no record".
pub fn fingerprint(body: &str) -> Fingerprint {
    let digest = Sha256::digest(body.as_bytes());
    Fingerprint(digest.into())
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != FINGERPRINT_LEN * 2 {
            return Err(Error::invalid_input(format!(
                "fingerprint must be {} hex characters, got {}",
                FINGERPRINT_LEN * 2,
                s.len()
            )));
        }

        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::invalid_input(format!("fingerprint is not hex: {}", e)))?;
        Ok(Self(bytes))
    }
}
