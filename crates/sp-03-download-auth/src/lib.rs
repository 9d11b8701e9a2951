//! # SP-03 Download Authorization
//!
//! Verifies that a download request was signed by the wallet that paid for
//! the item, then releases the content.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Signed message
//!
//! ```text
//! payload = keccak256(utf8(address ‖ catalog_key ‖ nonce))
//! digest  = keccak256("\x19Ethereum Signed Message:\n32" ‖ payload)
//! ```
//!
//! This is what `personal_sign` produces when a wallet signs the raw
//! 32-byte payload.
//!
//! ## Ports
//!
//! | Port | Direction | Purpose |
//! |------|-----------|---------|
//! | [`DownloadAuthorizationApi`] | inbound | authorize a signed request |
//! | [`ContentProvider`] | outbound | load item content |
//!
//! Catalog and payment lookups go through the `sp-01-payment-store` ports.

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::FsContentProvider;
pub use domain::{
    address_from_pubkey, download_digest, download_payload, personal_message_digest,
    recover_signer, sign_digest, AuthError, NonceRegistry, RecoverableSignature, SignatureError,
    MAX_NONCE_LENGTH,
};
pub use ports::{
    AuthorizedDownload, ContentProvider, DownloadAuthorizationApi, DownloadRequest,
    InMemoryContentProvider,
};
pub use service::DownloadAuthorizer;
