//! # secp256k1 Signer Recovery
//!
//! Recovers the Ethereum address that produced a 65-byte `r ‖ s ‖ v`
//! signature over a 32-byte digest.
//!
//! ## Security Notes
//!
//! - r and s must lie in `[1, n-1]`.
//! - s must be strictly below `n/2` (EIP-2), so each message has exactly one
//!   accepted signature per key.
//! - Scalar comparisons run in constant time via `subtle`.

use crate::domain::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shared_types::{keccak256, Address, Hash};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n / 2, rounded down.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

pub const SIGNATURE_LENGTH: usize = 65;

/// Ethereum-style recoverable signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery id: 0, 1, 27 or 28.
    pub v: u8,
}

impl RecoverableSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Parse `0x`-prefixed (or bare) hex.
    pub fn parse_hex(input: &str) -> Result<Self, SignatureError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

/// Recover the signer address after validating the scalars.
pub fn recover_signer(digest: &Hash, signature: &RecoverableSignature) -> Result<Address, SignatureError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidScalar);
    }
    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SignatureError::InvalidScalar)?;

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_pubkey(&key))
}

/// Ethereum address of a public key: last 20 bytes of `keccak256(x ‖ y)`.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}

/// Sign a digest, normalized to low-s with `v` in {27, 28}.
pub fn sign_digest(key: &SigningKey, digest: &Hash) -> Result<RecoverableSignature, SignatureError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|_| SignatureError::SigningFailed)?;

    let sig_bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    let parity = recid.to_byte() & 1;
    let (s, parity) = if is_low_s(&s) {
        (s, parity)
    } else {
        // Negating s flips the y-parity of R.
        (invert_s(&s), parity ^ 1)
    };

    Ok(RecoverableSignature { r, s, v: 27 + parity })
}

/// `s < n/2`, constant time.
fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER).into()
}

/// `0 < scalar < n`, constant time.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }
    (!is_zero & ct_less_than(scalar, &SECP256K1_ORDER)).into()
}

/// Big-endian `a < b` without early exit.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let undecided = !(less | greater);
        less |= undecided & Choice::from((a[i] < b[i]) as u8);
        greater |= undecided & Choice::from((a[i] > b[i]) as u8);
    }
    less
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// `n - s`.
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }
    result
}
