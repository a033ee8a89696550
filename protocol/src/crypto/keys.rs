//! # Key Management
//!
//! secp256k1 keypairs for account owners and signature-mode guardians.
//!
//! A key is known to the rest of the system only by its **address**: the
//! last 20 bytes of `keccak256` over the uncompressed public key (without
//! the `0x04` tag). That's what accounts store as `owner`, what guardians
//! are registered as, and what signature checks compare against.
//!
//! ## Security considerations
//!
//! - Key generation uses the OS RNG (`OsRng`).
//! - Secret key bytes never appear in `Debug` output or logs.
//! - `from_seed` exists for tests and reproducible fixtures. A seed that
//!   anyone can guess is a key anyone can use.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use std::fmt;

use super::hash::eth_signed_message_hash;
use super::signatures::{RecoverableSignature, SignatureError};
use crate::config::{ADDRESS_LENGTH, FIELD_ELEMENT_LENGTH};

/// Derive the account-style address of a public key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag.
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[FIELD_ELEMENT_LENGTH - ADDRESS_LENGTH..])
}

/// A secp256k1 signing keypair.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Deterministic keypair whose secret is `keccak256(seed)`.
    pub fn from_seed(seed: &[u8]) -> Result<Self, SignatureError> {
        Self::from_secret_bytes(keccak256(seed).as_slice())
    }

    /// Restore from 32 secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Restore from a hex-encoded secret (optional `0x` prefix).
    pub fn from_hex(hex_str: &str) -> Result<Self, SignatureError> {
        let trimmed = hex_str.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidSecretKey)?;
        Self::from_secret_bytes(&bytes)
    }

    /// Raw secret key bytes. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// The public verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing_key.verifying_key()
    }

    /// The address this key controls.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest as-is (EIP-712 style: the caller already did
    /// all the hashing).
    pub fn sign_prehash(&self, digest: &B256) -> Result<RecoverableSignature, SignatureError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|_| SignatureError::SigningFailed)?;
        Ok(RecoverableSignature::from_parts(&signature, recovery_id))
    }

    /// `personal_sign` over a 32-byte value: sign the EIP-191 digest of
    /// `hash`. This is how owners sign user-operation hashes.
    pub fn sign_message_hash(&self, hash: &B256) -> Result<RecoverableSignature, SignatureError> {
        self.sign_prehash(&eth_signed_message_hash(hash))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Keypair {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_address_for_hardhat_account_zero() {
        // Hardhat/Anvil default account #0.
        let kp = Keypair::from_hex(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            kp.address(),
            alloy_primitives::address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn seeded_keys_are_deterministic() {
        let a = Keypair::from_seed(b"guardian").unwrap();
        let b = Keypair::from_seed(b"guardian").unwrap();
        let c = Keypair::from_seed(b"owner").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.address(), c.address());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(Keypair::generate().address(), Keypair::generate().address());
    }

    #[test]
    fn secret_bytes_round_trip() {
        let kp = Keypair::generate();
        let restored = Keypair::from_secret_bytes(&kp.secret_key_bytes()).unwrap();
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn zero_secret_rejected() {
        assert!(Keypair::from_secret_bytes(&[0u8; 32]).is_err());
        assert!(Keypair::from_hex("not hex").is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_seed(b"debug").unwrap();
        let rendered = format!("{:?}", kp);
        assert!(!rendered.contains(&hex::encode(kp.secret_key_bytes())));
        assert!(rendered.contains("address"));
    }

    #[test]
    fn personal_sign_recovers_through_prefix() {
        let kp = Keypair::from_seed(b"personal").unwrap();
        let hash = keccak256(b"op");
        let sig = kp.sign_message_hash(&hash).unwrap();
        assert_eq!(sig.recover(&eth_signed_message_hash(&hash)).unwrap(), kp.address());
        assert_ne!(sig.recover(&hash).ok(), Some(kp.address()));
    }
}
