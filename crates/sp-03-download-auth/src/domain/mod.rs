//! # Domain Layer
//!
//! Signature recovery, personal-message hashing and nonce bookkeeping.

pub mod ecdsa;
pub mod errors;
pub mod message;
pub mod nonce;

pub use ecdsa::{address_from_pubkey, recover_signer, sign_digest, RecoverableSignature};
pub use errors::{AuthError, SignatureError};
pub use message::{download_digest, download_payload, personal_message_digest};
pub use nonce::{NonceRegistry, MAX_NONCE_LENGTH};
