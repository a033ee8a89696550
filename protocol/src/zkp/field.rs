//! # Field Elements
//!
//! [`FieldElement`] is the protocol's view of a BN254 scalar: the type that
//! commitments, nullifiers, guardian secrets, and proof public inputs are
//! all made of.
//!
//! ## Encodings
//!
//! | from            | rule |
//! |-----------------|------|
//! | 32 bytes        | big-endian, must be `< r` (non-canonical input is rejected) |
//! | `Address`       | 12 zero bytes, then the 20 address bytes (address in the low-order bytes) |
//! | an English word | its UTF-8 bytes as one big-endian integer, reduced mod `r` |
//! | text            | `0x`-prefixed hex (canonical) or a decimal integer (reduced) |
//!
//! The address rule is a wire contract with the prover: both sides lift
//! owners into the field this way, bit for bit, or proofs stop verifying.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{ADDRESS_PADDING, FIELD_ELEMENT_LENGTH};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when decoding a field element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The encoded integer is not smaller than the field modulus.
    #[error("value is not a canonical BN254 scalar (>= modulus)")]
    NonCanonical,

    /// Hex input longer than a field element.
    #[error("field element too long: {len} bytes (max 32)")]
    TooLong {
        /// Decoded byte length.
        len: usize,
    },

    /// Hex input that failed to decode.
    #[error("invalid hex field element: {0}")]
    InvalidHex(String),

    /// Decimal input that failed to parse.
    #[error("invalid decimal field element")]
    InvalidDecimal,
}

// ---------------------------------------------------------------------------
// FieldElement
// ---------------------------------------------------------------------------

/// An element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The additive identity.
    pub fn zero() -> Self {
        Self(Fr::from(0u64))
    }

    /// Wrap an arkworks scalar.
    pub fn from_fr(value: Fr) -> Self {
        Self(value)
    }

    /// The underlying arkworks scalar.
    pub fn to_fr(&self) -> Fr {
        self.0
    }

    /// Small integer constant.
    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Decode 32 canonical big-endian bytes.
    pub fn from_bytes(bytes: &[u8; FIELD_ELEMENT_LENGTH]) -> Result<Self, FieldError> {
        let value = Fr::from_be_bytes_mod_order(bytes);
        let candidate = Self(value);
        if candidate.to_bytes() != *bytes {
            return Err(FieldError::NonCanonical);
        }
        Ok(candidate)
    }

    /// Interpret arbitrary bytes as a big-endian integer, reduced mod `r`.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// 32-byte big-endian encoding.
    pub fn to_bytes(&self) -> [u8; FIELD_ELEMENT_LENGTH] {
        let be = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; FIELD_ELEMENT_LENGTH];
        // BN254 scalars are exactly four 64-bit limbs; right-align anyway.
        out[FIELD_ELEMENT_LENGTH - be.len()..].copy_from_slice(&be);
        out
    }

    /// Lift an address: `0x000000000000000000000000 || address`.
    pub fn from_address(address: &Address) -> Self {
        let mut bytes = [0u8; FIELD_ELEMENT_LENGTH];
        bytes[ADDRESS_PADDING..].copy_from_slice(address.as_slice());
        Self(Fr::from_be_bytes_mod_order(&bytes))
    }

    /// Encode a word (e.g. a guardian's secret answer) as its UTF-8 bytes
    /// read as one big-endian integer, reduced mod `r`.
    pub fn from_word(word: &str) -> Self {
        Self(Fr::from_be_bytes_mod_order(word.as_bytes()))
    }

    /// As a `bytes32`, the shape commitments take in call data.
    pub fn to_b256(&self) -> B256 {
        B256::from(self.to_bytes())
    }

    /// From a `bytes32`, rejecting non-canonical values.
    pub fn from_b256(word: &B256) -> Result<Self, FieldError> {
        Self::from_bytes(&word.0)
    }

    /// `0x`-prefixed, zero-padded, lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            // Allow odd-length hex the way most tooling prints small values.
            let padded = if digits.len() % 2 == 1 {
                format!("0{}", digits)
            } else {
                digits.to_string()
            };
            let raw = hex::decode(&padded).map_err(|e| FieldError::InvalidHex(e.to_string()))?;
            if raw.len() > FIELD_ELEMENT_LENGTH {
                return Err(FieldError::TooLong { len: raw.len() });
            }
            let mut bytes = [0u8; FIELD_ELEMENT_LENGTH];
            bytes[FIELD_ELEMENT_LENGTH - raw.len()..].copy_from_slice(&raw);
            return Self::from_bytes(&bytes);
        }

        // Decimal input is reduced mod r, like any other integer literal.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::InvalidDecimal);
        }
        Fr::from_str(s)
            .map(Self)
            .map_err(|_| FieldError::InvalidDecimal)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
