//! Key derivation, signing and address encoding
//!
//! Keys come either from a BIP-39 seed walked down a BIP-44 path, or from a
//! single imported secp256k1 secret. Addresses are the Cosmos-style
//! `RIPEMD160(SHA256(compressed_pubkey))`, rendered as bech32 with a
//! chain-specific prefix.

use bech32::{Bech32, Hrp};
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::hashes::{hash160, sha256, Hash};
use bitcoin::Network;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Signature algorithm tag reported alongside every key
pub const KEY_ALGO: &str = "secp256k1";

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Derivation failed: {0}")]
    DerivationFailed(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid bech32 prefix: {0}")]
    InvalidPrefix(String),
}

/// A BIP-44 path template: `m/purpose'/coin_type'/account'/change/index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bip44 {
    #[serde(default = "default_purpose")]
    pub purpose: u32,
    pub coin_type: u32,
    #[serde(default)]
    pub change: u32,
}

fn default_purpose() -> u32 {
    44
}

impl Bip44 {
    pub fn new(purpose: u32, coin_type: u32, change: u32) -> Self {
        Self {
            purpose,
            coin_type,
            change,
        }
    }

    /// Render the full path for one account/index pair.
    pub fn path_string(&self, account: u32, index: u32) -> String {
        format!(
            "m/{}'/{}'/{}'/{}/{}",
            self.purpose, self.coin_type, account, self.change, index
        )
    }
}

/// Public half of a derived key. Never carries secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Path the key was derived at; empty for imported private keys
    pub path: String,
    /// Compressed SEC1 public key (33 bytes)
    pub pub_key: Vec<u8>,
    /// Raw 20-byte address
    pub address: Vec<u8>,
}

impl KeyEntry {
    pub fn from_public_key(path: impl Into<String>, public_key: &PublicKey) -> Self {
        let pub_key = public_key.serialize().to_vec();
        let address = address_from_pub_key(&pub_key);
        Self {
            path: path.into(),
            pub_key,
            address,
        }
    }

    /// Bech32 rendering of the address under `prefix`
    pub fn bech32_address(&self, prefix: &str) -> Result<String, KeyError> {
        encode_bech32(prefix, &self.address)
    }
}

/// `RIPEMD160(SHA256(pub_key))`
pub fn address_from_pub_key(pub_key: &[u8]) -> Vec<u8> {
    hash160::Hash::hash(pub_key).to_byte_array().to_vec()
}

/// Encode raw address bytes as bech32 with the given human-readable prefix.
pub fn encode_bech32(prefix: &str, address: &[u8]) -> Result<String, KeyError> {
    let hrp = Hrp::parse(prefix).map_err(|e| KeyError::InvalidPrefix(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, address).map_err(|e| KeyError::InvalidPrefix(e.to_string()))
}

/// Walk `path` down from the master key of `seed`.
pub fn derive_secret_key(seed: &[u8], path: &str) -> Result<SecretKey, KeyError> {
    let master = Xpriv::new_master(Network::Bitcoin, seed)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    let path = DerivationPath::from_str(path)
        .map_err(|e: bitcoin::bip32::Error| KeyError::InvalidPath(e.to_string()))?;

    let derived = master
        .derive_priv(&Secp256k1::new(), &path)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    Ok(derived.private_key)
}

/// Interpret raw bytes as a secp256k1 secret key.
pub fn secret_key_from_bytes(bytes: &[u8]) -> Result<SecretKey, KeyError> {
    SecretKey::from_slice(bytes).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}

pub fn public_key(secret: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(&Secp256k1::signing_only(), secret)
}

/// ECDSA over `SHA256(message)`, 64-byte compact `r || s`, low-S.
pub fn sign_message(secret: &SecretKey, message: &[u8]) -> Vec<u8> {
    let digest = sha256::Hash::hash(message).to_byte_array();
    let msg = Message::from_digest(digest);
    let mut signature = Secp256k1::signing_only().sign_ecdsa(&msg, secret);
    signature.normalize_s();
    signature.serialize_compact().to_vec()
}
