//! # Recoverable Signatures
//!
//! Owners and guardians sign with secp256k1 ECDSA in the 65-byte
//! `r || s || v` form every Ethereum wallet produces. Verification never
//! compares public keys directly: we recover the signer's address from the
//! digest and signature and compare addresses, exactly like `ecrecover`.
//!
//! `v` is accepted both as a raw recovery id (0/1) and in the legacy
//! `27/28` form.

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use std::fmt;
use thiserror::Error;

use super::keys::address_from_verifying_key;
use crate::config::SIGNATURE_LENGTH;

/// Offset added to the recovery id by legacy wallets.
const LEGACY_V_OFFSET: u8 = 27;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing or checking a signature.
///
/// None of these carry key material; a failed check only ever says *that*
/// it failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The signature is not exactly 65 bytes.
    #[error("invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// The trailing `v` byte is not a valid recovery id.
    #[error("invalid recovery id byte: {0}")]
    InvalidRecoveryId(u8),

    /// `r || s` is not a valid ECDSA signature (zero or out-of-range scalar).
    #[error("malformed ECDSA signature")]
    Malformed,

    /// Public-key recovery failed for this digest.
    #[error("signer recovery failed")]
    RecoveryFailed,

    /// The secret key bytes do not form a valid secp256k1 scalar.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Signing itself failed (should not happen with a valid key).
    #[error("signing failed")]
    SigningFailed,
}

// ---------------------------------------------------------------------------
// RecoverableSignature
// ---------------------------------------------------------------------------

/// A 65-byte `r || s || v` signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LENGTH]);

impl RecoverableSignature {
    /// Assemble from an ECDSA signature and its recovery id.
    pub(crate) fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte() + LEGACY_V_OFFSET;
        Self(bytes)
    }

    /// Parse from a byte slice, checking only the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let arr: [u8; SIGNATURE_LENGTH] =
            bytes.try_into().map_err(|_| SignatureError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// The raw 65 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Owned copy of the raw bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Recover the address that produced this signature over `digest`.
    pub fn recover(&self, digest: &B256) -> Result<Address, SignatureError> {
        let v = self.0[64];
        let raw_id = if v >= LEGACY_V_OFFSET { v - LEGACY_V_OFFSET } else { v };
        let recovery_id =
            RecoveryId::from_byte(raw_id).ok_or(SignatureError::InvalidRecoveryId(v))?;
        let signature =
            Signature::from_slice(&self.0[..64]).map_err(|_| SignatureError::Malformed)?;

        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        Ok(address_from_verifying_key(&key))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature(0x{})", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Convenience Functions
// ---------------------------------------------------------------------------

/// Recover the signer of `digest` from raw signature bytes.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address, SignatureError> {
    RecoverableSignature::from_slice(signature)?.recover(digest)
}

/// Returns `true` only if `signature` over `digest` was produced by
/// `expected`. Malformed input is simply `false`.
pub fn is_signed_by(digest: &B256, signature: &[u8], expected: &Address) -> bool {
    matches!(recover_signer(digest, signature), Ok(signer) if signer == *expected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;
    use alloy_primitives::keccak256;

    #[test]
    fn sign_then_recover() {
        let kp = Keypair::from_seed(b"signer").unwrap();
        let digest = keccak256(b"message");
        let sig = kp.sign_prehash(&digest).unwrap();

        assert_eq!(sig.recover(&digest).unwrap(), kp.address());
        assert!(is_signed_by(&digest, sig.as_bytes(), &kp.address()));
    }

    #[test]
    fn other_digest_recovers_other_address() {
        let kp = Keypair::from_seed(b"signer").unwrap();
        let sig = kp.sign_prehash(&keccak256(b"one")).unwrap();
        assert!(!is_signed_by(&keccak256(b"two"), sig.as_bytes(), &kp.address()));
    }

    #[test]
    fn accepts_raw_recovery_id() {
        let kp = Keypair::from_seed(b"raw-v").unwrap();
        let digest = keccak256(b"payload");
        let mut bytes = *kp.sign_prehash(&digest).unwrap().as_bytes();
        bytes[64] -= LEGACY_V_OFFSET;
        assert_eq!(recover_signer(&digest, &bytes).unwrap(), kp.address());
    }

    #[test]
    fn wrong_length_rejected() {
        let err = recover_signer(&B256::ZERO, &[0u8; 64]).unwrap_err();
        assert_eq!(
            err,
            SignatureError::InvalidLength {
                expected: 65,
                actual: 64
            }
        );
    }

    #[test]
    fn zero_signature_is_malformed() {
        let mut bytes = [0u8; 65];
        bytes[64] = 27;
        assert_eq!(
            recover_signer(&B256::ZERO, &bytes).unwrap_err(),
            SignatureError::Malformed
        );
    }

    #[test]
    fn bad_recovery_id_rejected() {
        let kp = Keypair::from_seed(b"bad-v").unwrap();
        let digest = keccak256(b"x");
        let mut bytes = *kp.sign_prehash(&digest).unwrap().as_bytes();
        bytes[64] = 99;
        assert_eq!(
            recover_signer(&digest, &bytes).unwrap_err(),
            SignatureError::InvalidRecoveryId(99)
        );
    }
}
