//! Password-based encryption of keyring secrets
//!
//! Argon2id derives a 256-bit key from the user's password, AES-256-GCM seals
//! the secret under it.
//!
//! # Security Notes
//!
//! - Argon2id is memory-hard (resistant to GPU/ASIC attacks)
//! - AES-256-GCM tag verification is constant-time, so a wrong password and a
//!   tampered blob are indistinguishable to the caller
//! - Each encryption uses a fresh random salt and nonce
//! - Password is never stored

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// 256 bits for AES-256
const KEY_LEN: usize = 32;

/// Salt length for Argon2
const SALT_LEN: usize = 16;

/// Nonce length for AES-256-GCM
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length
const TAG_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Invalid password or corrupted data")]
    AuthenticationFailed,
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
    #[error("Invalid ciphertext format")]
    InvalidFormat,
}

/// Argon2id cost parameters.
///
/// The default follows the OWASP recommendation for 2024+:
/// 64 MiB memory, 3 iterations, 4 lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    #[serde(default = "default_m_cost")]
    pub m_cost: u32,
    /// Iterations
    #[serde(default = "default_t_cost")]
    pub t_cost: u32,
    /// Parallel lanes
    #[serde(default = "default_p_cost")]
    pub p_cost: u32,
}

fn default_m_cost() -> u32 {
    65536 // 64 MiB
}

fn default_t_cost() -> u32 {
    3
}

fn default_p_cost() -> u32 {
    4
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: default_m_cost(),
            t_cost: default_t_cost(),
            p_cost: default_p_cost(),
        }
    }
}

impl KdfParams {
    /// Cheapest parameters Argon2 accepts. Only for tests.
    pub fn insecure_for_tests() -> Self {
        Self {
            m_cost: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

/// Encrypted secret format:
/// [salt (16 bytes)][nonce (12 bytes)][ciphertext + tag (len + 16 bytes)]
///
/// The Argon2 costs are not part of the blob; the keyring stores them next to it.
pub struct EncryptedSecret {
    /// Salt used for Argon2id key derivation
    salt: [u8; SALT_LEN],
    /// Nonce used for AES-256-GCM
    nonce: [u8; NONCE_LEN],
    /// Encrypted secret + authentication tag
    ciphertext: Vec<u8>,
}

impl EncryptedSecret {
    /// Serialize to bytes: salt || nonce || ciphertext
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        // salt + nonce + at least 1 byte ciphertext + tag
        if bytes.len() < SALT_LEN + NONCE_LEN + 1 + TAG_LEN {
            return Err(CryptoError::InvalidFormat);
        }

        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];

        salt.copy_from_slice(&bytes[0..SALT_LEN]);
        nonce.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + NONCE_LEN]);
        let ciphertext = bytes[SALT_LEN + NONCE_LEN..].to_vec();

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }
}

fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(KEY_LEN))
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    Ok(key)
}

/// Encrypt a secret with a password.
///
/// Each call generates a new random salt and nonce, so encrypting the same
/// secret twice yields different blobs.
pub fn encrypt_secret(
    secret: &[u8],
    password: &str,
    kdf: &KdfParams,
) -> Result<EncryptedSecret, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::EncryptionFailed("empty secret".to_string()));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let nonce_arr = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&nonce_arr);

    let key = derive_key(password, &salt, kdf)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), secret)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedSecret {
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt an encrypted secret with a password.
///
/// # Errors
/// `AuthenticationFailed` if the password is wrong or the blob was tampered with.
pub fn decrypt_secret(
    encrypted: &EncryptedSecret,
    password: &str,
    kdf: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let key = derive_key(password, &encrypted.salt, kdf)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    cipher
        .decrypt(
            Nonce::from_slice(&encrypted.nonce),
            encrypted.ciphertext.as_slice(),
        )
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
