//! Warden Core
//!
//! Encrypted custody of wallet key material.
//!
//! # Key Derivation
//!
//! From a single BIP-39 seed, one secp256k1 key per BIP-44 path
//! (`m/44'/118'/0'/0/0` for Cosmos Hub). Imported raw private keys are
//! supported as single-key keyrings.
//!
//! # Encrypted Storage
//!
//! Secrets are encrypted at rest using Argon2id + AES-256-GCM and kept in an
//! mlocked, zeroize-on-drop buffer while unlocked.

pub mod crypto;
pub mod keyring;
pub mod keys;
pub mod memory;
pub mod seed;
pub mod store;

pub use crypto::{CryptoError, KdfParams};
pub use keyring::{KeyKind, KeyRing, KeyRingError, KeyRingState, PreparedKey, SealedKey};
pub use keys::{Bip44, KeyEntry, KeyError, KEY_ALGO};
pub use store::{FileKeyStore, KeyStore, MemoryKeyStore, StoreError};
