//! Download authorization messages.
//!
//! The buyer's wallet signs the 32-byte payload
//! `keccak256(address ‖ catalog_key ‖ nonce)` as an EIP-191 personal message.
//! The address is hashed exactly as the client sent it, so a checksummed and
//! a lowercase address produce different payloads.

use shared_types::{keccak256, Hash};

/// EIP-191 prefix for a 32-byte message.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Payload the wallet is asked to sign.
pub fn download_payload(address: &str, catalog_key: &str, nonce: &str) -> Hash {
    let mut message = Vec::with_capacity(address.len() + catalog_key.len() + nonce.len());
    message.extend_from_slice(address.as_bytes());
    message.extend_from_slice(catalog_key.as_bytes());
    message.extend_from_slice(nonce.as_bytes());
    keccak256(&message)
}

/// `keccak256(prefix ‖ payload)`: the digest a personal-sign wallet signs.
pub fn personal_message_digest(payload: &Hash) -> Hash {
    let mut message = [0u8; PERSONAL_MESSAGE_PREFIX.len() + 32];
    message[..PERSONAL_MESSAGE_PREFIX.len()].copy_from_slice(PERSONAL_MESSAGE_PREFIX);
    message[PERSONAL_MESSAGE_PREFIX.len()..].copy_from_slice(payload);
    keccak256(&message)
}

pub fn download_digest(address: &str, catalog_key: &str, nonce: &str) -> Hash {
    personal_message_digest(&download_payload(address, catalog_key, nonce))
}
