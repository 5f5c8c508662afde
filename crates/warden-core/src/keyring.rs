//! The keyring: encrypted custody of one master secret and its lock state
//!
//! # State machine
//!
//! | From      | Event        | To               | Guard                    |
//! |-----------|--------------|------------------|--------------------------|
//! | Empty     | create       | Unlocked         | valid mnemonic/key       |
//! | NotLoaded | restore      | Locked or Empty  | ciphertext present?      |
//! | Locked    | unlock(pw)   | Unlocked         | password matches         |
//! | Unlocked  | lock         | Locked           | always                   |
//! | any       | clear        | Empty            | destructive              |
//!
//! A failed operation never changes the state. The decrypted secret exists
//! only while `Unlocked` and every read re-checks the state first.

use crate::crypto::{decrypt_secret, encrypt_secret, CryptoError, EncryptedSecret, KdfParams};
use crate::keys::{self, KeyEntry, KeyError};
use crate::memory::SecretBuffer;
use crate::seed::{derive_seed, parse_mnemonic};
use crate::store::{KeyStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

/// On-disk format version
const STORE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum KeyRingError {
    #[error("Key doesn't exist")]
    KeyDoesNotExist,
    #[error("Key already exists, clear the keyring first")]
    AlreadyExists,
    #[error("Keyring is locked")]
    Locked,
    #[error("Path not set")]
    PathNotSet,
    #[error("Invalid password")]
    AuthenticationFailed,
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("Stored keyring is corrupted: {0}")]
    Corrupted(String),
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("Key store error: {0}")]
    Store(#[from] StoreError),
    #[error("Keyring changed while the password was being checked")]
    Changed,
}

impl From<CryptoError> for KeyRingError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => Self::AuthenticationFailed,
            CryptoError::InvalidFormat => Self::Corrupted(e.to_string()),
            CryptoError::EncryptionFailed(msg) | CryptoError::KeyDerivationFailed(msg) => {
                Self::Encryption(msg)
            }
        }
    }
}

/// Lock state of the keyring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRingState {
    /// No stored key material
    Empty,
    /// Store not read yet
    NotLoaded,
    /// Ciphertext loaded, no plaintext in memory
    Locked,
    /// Decrypted secret resident in memory
    Unlocked,
}

impl fmt::Display for KeyRingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::NotLoaded => "not_loaded",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        };
        f.write_str(s)
    }
}

/// What the encrypted secret is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// 64-byte BIP-39 seed; keys are derived per path
    Mnemonic,
    /// A single 32-byte secp256k1 secret; the path is ignored
    PrivateKey,
}

/// Persisted representation, serialized as JSON into the key store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredKeyRing {
    version: u32,
    kind: KeyKind,
    /// Argon2 costs used when this blob was sealed
    kdf: KdfParams,
    /// hex(salt || nonce || ciphertext)
    crypto: String,
}

impl StoredKeyRing {
    fn seal(
        kind: KeyKind,
        secret: &[u8],
        password: &str,
        kdf: KdfParams,
    ) -> Result<Self, KeyRingError> {
        let encrypted = encrypt_secret(secret, password, &kdf)?;
        Ok(Self {
            version: STORE_VERSION,
            kind,
            kdf,
            crypto: hex::encode(encrypted.to_bytes()),
        })
    }

    fn open(&self, password: &str) -> Result<Zeroizing<Vec<u8>>, KeyRingError> {
        let bytes =
            hex::decode(&self.crypto).map_err(|e| KeyRingError::Corrupted(e.to_string()))?;
        let encrypted = EncryptedSecret::from_bytes(&bytes)?;
        Ok(decrypt_secret(&encrypted, password, &self.kdf)?)
    }

    fn from_blob(blob: &[u8]) -> Result<Self, KeyRingError> {
        let stored: Self =
            serde_json::from_slice(blob).map_err(|e| KeyRingError::Corrupted(e.to_string()))?;
        if stored.version != STORE_VERSION {
            return Err(KeyRingError::Corrupted(format!(
                "unsupported keyring version {}",
                stored.version
            )));
        }
        Ok(stored)
    }

    fn to_blob(&self) -> Result<Vec<u8>, KeyRingError> {
        serde_json::to_vec(self).map_err(|e| KeyRingError::Corrupted(e.to_string()))
    }
}

/// The stored ciphertext, detached from the keyring so the password can be
/// checked without holding it.
#[derive(Debug, Clone)]
pub struct SealedKey {
    stored: StoredKeyRing,
}

impl SealedKey {
    /// Run the KDF and decrypt. Slow by construction.
    pub fn open(self, password: &str) -> Result<PreparedKey, KeyRingError> {
        let secret = self.stored.open(password)?;
        Ok(PreparedKey {
            stored: self.stored,
            secret,
        })
    }
}

/// A secret together with its sealed form, ready to be installed.
pub struct PreparedKey {
    stored: StoredKeyRing,
    secret: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for PreparedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedKey")
            .field("kind", &self.stored.kind)
            .finish_non_exhaustive()
    }
}

impl PreparedKey {
    /// Validate `mnemonic` and seal its seed under `password`.
    pub fn from_mnemonic(
        mnemonic: &str,
        password: &str,
        kdf: KdfParams,
    ) -> Result<Self, KeyRingError> {
        let mnemonic =
            parse_mnemonic(mnemonic).map_err(|e| KeyRingError::InvalidMnemonic(e.to_string()))?;
        let seed = derive_seed(&mnemonic, "");
        Self::seal(KeyKind::Mnemonic, &seed[..], password, kdf)
    }

    /// Validate a raw 32-byte secp256k1 secret and seal it under `password`.
    pub fn from_private_key(
        private_key: &[u8],
        password: &str,
        kdf: KdfParams,
    ) -> Result<Self, KeyRingError> {
        keys::secret_key_from_bytes(private_key)
            .map_err(|e| KeyRingError::InvalidPrivateKey(e.to_string()))?;
        Self::seal(KeyKind::PrivateKey, private_key, password, kdf)
    }

    fn seal(
        kind: KeyKind,
        secret: &[u8],
        password: &str,
        kdf: KdfParams,
    ) -> Result<Self, KeyRingError> {
        Ok(Self {
            stored: StoredKeyRing::seal(kind, secret, password, kdf)?,
            secret: Zeroizing::new(secret.to_vec()),
        })
    }
}

/// Encrypted custody of one master secret.
pub struct KeyRing {
    store: Arc<dyn KeyStore>,
    kdf: KdfParams,
    state: KeyRingState,
    stored: Option<StoredKeyRing>,
    secret: Option<SecretBuffer>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("state", &self.state)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

impl KeyRing {
    /// A keyring over `store` that has not read it yet.
    ///
    /// `kdf` applies to keys created from now on; existing blobs carry their own.
    pub fn new(store: Arc<dyn KeyStore>, kdf: KdfParams) -> Self {
        Self {
            store,
            kdf,
            state: KeyRingState::NotLoaded,
            stored: None,
            secret: None,
        }
    }

    pub fn state(&self) -> KeyRingState {
        self.state
    }

    /// Kind of the loaded key, if any
    pub fn kind(&self) -> Option<KeyKind> {
        self.stored.as_ref().map(|s| s.kind)
    }

    /// Argon2 costs for keys created by this keyring
    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    /// Create a keyring from a BIP-39 mnemonic. `Empty -> Unlocked`.
    pub fn create_mnemonic_key(
        &mut self,
        mnemonic: &str,
        password: &str,
    ) -> Result<KeyRingState, KeyRingError> {
        self.ensure_empty()?;
        let prepared = PreparedKey::from_mnemonic(mnemonic, password, self.kdf)?;
        self.install(prepared)
    }

    /// Create a keyring from a raw 32-byte secp256k1 secret. `Empty -> Unlocked`.
    pub fn create_private_key(
        &mut self,
        private_key: &[u8],
        password: &str,
    ) -> Result<KeyRingState, KeyRingError> {
        self.ensure_empty()?;
        let prepared = PreparedKey::from_private_key(private_key, password, self.kdf)?;
        self.install(prepared)
    }

    /// Fail with `AlreadyExists` unless there is no key, reading the store if needed.
    pub fn ensure_empty(&mut self) -> Result<(), KeyRingError> {
        if self.state == KeyRingState::NotLoaded {
            self.restore()?;
        }
        if self.state != KeyRingState::Empty {
            return Err(KeyRingError::AlreadyExists);
        }
        Ok(())
    }

    /// Persist a freshly sealed key. `Empty -> Unlocked`.
    pub fn install(&mut self, prepared: PreparedKey) -> Result<KeyRingState, KeyRingError> {
        self.ensure_empty()?;
        self.store.save(&prepared.stored.to_blob()?)?;

        let kind = prepared.stored.kind;
        self.secret = Some(SecretBuffer::from_slice(&prepared.secret));
        self.stored = Some(prepared.stored);
        self.state = KeyRingState::Unlocked;
        log::info!("Created {:?} keyring", kind);
        Ok(self.state)
    }

    /// Read the store. `NotLoaded -> Locked | Empty`; no-op in any other state.
    pub fn restore(&mut self) -> Result<KeyRingState, KeyRingError> {
        if self.state != KeyRingState::NotLoaded {
            return Ok(self.state);
        }

        match self.store.load()? {
            Some(blob) => {
                let stored = StoredKeyRing::from_blob(&blob)?;
                log::debug!("Restored {:?} keyring from store", stored.kind);
                self.stored = Some(stored);
                self.state = KeyRingState::Locked;
            }
            None => {
                self.state = KeyRingState::Empty;
            }
        }
        Ok(self.state)
    }

    /// Decrypt the secret. `Locked -> Unlocked`.
    ///
    /// From `NotLoaded` the store is read first. In `Unlocked` the password is
    /// still verified. A wrong password leaves the state untouched.
    pub fn unlock(&mut self, password: &str) -> Result<KeyRingState, KeyRingError> {
        let opened = self.sealed()?.open(password)?;
        self.accept(opened)
    }

    /// The stored ciphertext, for `SealedKey::open` outside any lock.
    pub fn sealed(&mut self) -> Result<SealedKey, KeyRingError> {
        if self.state == KeyRingState::NotLoaded {
            self.restore()?;
        }

        match (&self.state, &self.stored) {
            (KeyRingState::Empty, _) | (_, None) => Err(KeyRingError::KeyDoesNotExist),
            (_, Some(stored)) => Ok(SealedKey {
                stored: stored.clone(),
            }),
        }
    }

    /// Finish an unlock started with `sealed`. `Locked -> Unlocked`.
    ///
    /// Refused with `Changed` if the key was cleared or replaced meanwhile.
    pub fn accept(&mut self, opened: PreparedKey) -> Result<KeyRingState, KeyRingError> {
        let current = match (&self.state, &self.stored) {
            (KeyRingState::Empty, _) | (_, None) => return Err(KeyRingError::KeyDoesNotExist),
            (_, Some(stored)) => stored,
        };
        if current.crypto != opened.stored.crypto {
            return Err(KeyRingError::Changed);
        }

        self.secret = Some(SecretBuffer::from_slice(&opened.secret));
        self.state = KeyRingState::Unlocked;
        Ok(self.state)
    }

    /// Drop the decrypted secret. `Unlocked -> Locked`; no-op otherwise.
    pub fn lock(&mut self) -> KeyRingState {
        if self.state == KeyRingState::Unlocked {
            self.secret = None;
            self.state = KeyRingState::Locked;
        }
        self.state
    }

    /// Erase the persisted ciphertext and forget everything. `* -> Empty`.
    ///
    /// Destructive and irreversible: without a mnemonic backup the key is gone.
    /// Meant for reset and test flows.
    pub fn clear(&mut self) -> Result<KeyRingState, KeyRingError> {
        self.store.clear()?;
        self.secret = None;
        self.stored = None;
        self.state = KeyRingState::Empty;
        log::warn!("Keyring cleared");
        Ok(self.state)
    }

    /// Public key and address at `path`.
    pub fn get_key(&self, path: Option<&str>) -> Result<KeyEntry, KeyRingError> {
        let (path, secret) = self.secret_key(path)?;
        Ok(KeyEntry::from_public_key(path, &keys::public_key(&secret)))
    }

    /// Sign `message` with the key at `path`.
    pub fn sign(&self, path: Option<&str>, message: &[u8]) -> Result<Vec<u8>, KeyRingError> {
        let (_, secret) = self.secret_key(path)?;
        Ok(keys::sign_message(&secret, message))
    }

    fn secret_key(
        &self,
        path: Option<&str>,
    ) -> Result<(String, secp256k1::SecretKey), KeyRingError> {
        let secret = match (self.state, &self.secret) {
            (KeyRingState::Unlocked, Some(secret)) => secret,
            (KeyRingState::Empty, _) => return Err(KeyRingError::KeyDoesNotExist),
            _ => return Err(KeyRingError::Locked),
        };
        let path = path.ok_or(KeyRingError::PathNotSet)?;

        match self.kind() {
            Some(KeyKind::Mnemonic) => Ok((
                path.to_string(),
                keys::derive_secret_key(secret.as_slice(), path)?,
            )),
            Some(KeyKind::PrivateKey) => Ok((
                String::new(),
                keys::secret_key_from_bytes(secret.as_slice())?,
            )),
            None => Err(KeyRingError::KeyDoesNotExist),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyStore;
    use rand::{Rng, SeedableRng};

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const COSMOS_PATH: &str = "m/44'/118'/0'/0/0";

    fn keyring_with(store: Arc<MemoryKeyStore>) -> KeyRing {
        KeyRing::new(store, KdfParams::insecure_for_tests())
    }

    fn unlocked_keyring() -> (KeyRing, Arc<MemoryKeyStore>) {
        let store = Arc::new(MemoryKeyStore::new());
        let mut keyring = keyring_with(store.clone());
        keyring.create_mnemonic_key(ABANDON, "pw1").unwrap();
        (keyring, store)
    }

    #[test]
    fn test_starts_not_loaded_then_empty() {
        let mut keyring = keyring_with(Arc::new(MemoryKeyStore::new()));
        assert_eq!(keyring.state(), KeyRingState::NotLoaded);
        assert_eq!(keyring.restore().unwrap(), KeyRingState::Empty);
    }

    #[test]
    fn test_create_unlocks_and_persists() {
        let (keyring, store) = unlocked_keyring();
        assert_eq!(keyring.state(), KeyRingState::Unlocked);
        assert_eq!(keyring.kind(), Some(KeyKind::Mnemonic));

        let blob = store.load().unwrap().unwrap();
        let text = String::from_utf8(blob).unwrap();
        assert!(!text.contains("abandon"));
    }

    #[test]
    fn test_create_rejects_bad_checksum() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut keyring = keyring_with(store.clone());
        let bad = ABANDON.replace("about", "abandon");

        assert!(matches!(
            keyring.create_mnemonic_key(&bad, "pw"),
            Err(KeyRingError::InvalidMnemonic(_))
        ));
        assert_eq!(keyring.state(), KeyRingState::Empty);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let (mut keyring, _) = unlocked_keyring();
        assert!(matches!(
            keyring.create_mnemonic_key(ABANDON, "pw2"),
            Err(KeyRingError::AlreadyExists)
        ));
        assert_eq!(keyring.state(), KeyRingState::Unlocked);
    }

    #[test]
    fn test_restore_then_unlock() {
        let (_, store) = unlocked_keyring();

        let mut fresh = keyring_with(store);
        assert_eq!(fresh.restore().unwrap(), KeyRingState::Locked);
        assert!(matches!(
            fresh.get_key(Some(COSMOS_PATH)),
            Err(KeyRingError::Locked)
        ));
        assert_eq!(fresh.unlock("pw1").unwrap(), KeyRingState::Unlocked);
        assert!(fresh.get_key(Some(COSMOS_PATH)).is_ok());
    }

    #[test]
    fn test_unlock_from_not_loaded_restores_first() {
        let (_, store) = unlocked_keyring();
        let mut fresh = keyring_with(store);
        assert_eq!(fresh.unlock("pw1").unwrap(), KeyRingState::Unlocked);
    }

    #[test]
    fn test_wrong_password_keeps_locked() {
        let (mut keyring, _) = unlocked_keyring();
        keyring.lock();

        assert!(matches!(
            keyring.unlock("wrong"),
            Err(KeyRingError::AuthenticationFailed)
        ));
        assert_eq!(keyring.state(), KeyRingState::Locked);
        assert!(keyring.sign(Some(COSMOS_PATH), b"msg").is_err());
    }

    #[test]
    fn test_wrong_password_while_unlocked_keeps_unlocked() {
        let (mut keyring, _) = unlocked_keyring();
        assert!(keyring.unlock("wrong").is_err());
        assert_eq!(keyring.state(), KeyRingState::Unlocked);
    }

    #[test]
    fn test_unlock_empty_fails() {
        let mut keyring = keyring_with(Arc::new(MemoryKeyStore::new()));
        assert!(matches!(
            keyring.unlock("pw"),
            Err(KeyRingError::KeyDoesNotExist)
        ));
        assert_eq!(keyring.state(), KeyRingState::Empty);
    }

    #[test]
    fn test_path_required() {
        let (keyring, _) = unlocked_keyring();
        assert!(matches!(
            keyring.get_key(None),
            Err(KeyRingError::PathNotSet)
        ));
        assert!(matches!(
            keyring.sign(None, b"msg"),
            Err(KeyRingError::PathNotSet)
        ));
    }

    #[test]
    fn test_deterministic_key() {
        let (a, _) = unlocked_keyring();
        let (b, _) = unlocked_keyring();
        let key_a = a.get_key(Some(COSMOS_PATH)).unwrap();
        let key_b = b.get_key(Some(COSMOS_PATH)).unwrap();

        assert_eq!(key_a, key_b);
        assert_eq!(key_a.path, COSMOS_PATH);
        assert_eq!(
            key_a.bech32_address("cosmos").unwrap(),
            "cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0auqdal4"
        );
    }

    #[test]
    fn test_private_key_ignores_path() {
        let mut keyring = keyring_with(Arc::new(MemoryKeyStore::new()));
        keyring.create_private_key(&[0x11; 32], "pw").unwrap();
        assert_eq!(keyring.kind(), Some(KeyKind::PrivateKey));

        let a = keyring.get_key(Some("m/44'/118'/0'/0/0")).unwrap();
        let b = keyring.get_key(Some("m/44'/330'/0'/0/9")).unwrap();
        assert_eq!(a.address, b.address);
        assert!(a.path.is_empty());
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let mut keyring = keyring_with(Arc::new(MemoryKeyStore::new()));
        assert!(matches!(
            keyring.create_private_key(&[0u8; 32], "pw"),
            Err(KeyRingError::InvalidPrivateKey(_))
        ));
        assert_eq!(keyring.state(), KeyRingState::Empty);
    }

    #[test]
    fn test_clear_erases_store() {
        let (mut keyring, store) = unlocked_keyring();
        assert_eq!(keyring.clear().unwrap(), KeyRingState::Empty);
        assert!(store.load().unwrap().is_none());
        assert!(matches!(
            keyring.get_key(Some(COSMOS_PATH)),
            Err(KeyRingError::KeyDoesNotExist)
        ));

        // Can be recreated after a clear
        keyring.create_mnemonic_key(ABANDON, "pw3").unwrap();
        assert_eq!(keyring.state(), KeyRingState::Unlocked);
    }

    #[test]
    fn test_sealed_unlock_in_two_steps() {
        let (mut keyring, _) = unlocked_keyring();
        keyring.lock();

        let opened = keyring.sealed().unwrap().open("pw1").unwrap();
        assert_eq!(keyring.state(), KeyRingState::Locked);
        assert_eq!(keyring.accept(opened).unwrap(), KeyRingState::Unlocked);
    }

    #[test]
    fn test_accept_refused_after_key_replaced() {
        let (mut keyring, _) = unlocked_keyring();
        keyring.lock();
        let opened = keyring.sealed().unwrap().open("pw1").unwrap();

        keyring.clear().unwrap();
        assert!(matches!(
            keyring.accept(opened),
            Err(KeyRingError::KeyDoesNotExist)
        ));

        keyring.create_mnemonic_key(ABANDON, "pw2").unwrap();
        keyring.lock();
        let opened_old = {
            let (mut other, _) = unlocked_keyring();
            other.lock();
            other.sealed().unwrap().open("pw1").unwrap()
        };
        assert!(matches!(keyring.accept(opened_old), Err(KeyRingError::Changed)));
        assert_eq!(keyring.state(), KeyRingState::Locked);
    }

    #[test]
    fn test_install_refuses_existing_key() {
        let (mut keyring, _) = unlocked_keyring();
        let prepared =
            PreparedKey::from_private_key(&[0x11; 32], "pw", KdfParams::insecure_for_tests())
                .unwrap();
        assert!(matches!(
            keyring.install(prepared),
            Err(KeyRingError::AlreadyExists)
        ));
        assert_eq!(keyring.kind(), Some(KeyKind::Mnemonic));
    }

    #[test]
    fn test_corrupted_blob_keeps_not_loaded() {
        let store = Arc::new(MemoryKeyStore::with_blob(b"not json".to_vec()));
        let mut keyring = keyring_with(store);
        assert!(matches!(
            keyring.restore(),
            Err(KeyRingError::Corrupted(_))
        ));
        assert_eq!(keyring.state(), KeyRingState::NotLoaded);
    }

    #[test]
    fn test_blob_carries_kdf_params() {
        let (_, store) = unlocked_keyring();
        // A keyring configured with different costs still opens the old blob
        let mut fresh = KeyRing::new(store, KdfParams::default());
        assert_eq!(fresh.unlock("pw1").unwrap(), KeyRingState::Unlocked);
    }

    #[test]
    fn test_random_lock_unlock_clear_sequences() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        for _ in 0..10 {
            let (mut keyring, _) = unlocked_keyring();
            for _ in 0..12 {
                let before = keyring.state();
                let after = match rng.gen_range(0..4) {
                    0 => keyring.lock(),
                    1 => keyring.unlock("pw1").unwrap_or(keyring.state()),
                    2 => keyring.unlock("nope").unwrap_or(keyring.state()),
                    _ => keyring.clear().unwrap(),
                };

                let legal = match (before, after) {
                    (a, b) if a == b => true,
                    (KeyRingState::Unlocked, KeyRingState::Locked) => true,
                    (KeyRingState::Locked, KeyRingState::Unlocked) => true,
                    (_, KeyRingState::Empty) => true,
                    _ => false,
                };
                assert!(legal, "illegal transition {:?} -> {:?}", before, after);

                if after != KeyRingState::Unlocked {
                    assert!(keyring.get_key(Some(COSMOS_PATH)).is_err());
                    assert!(keyring.sign(Some(COSMOS_PATH), b"m").is_err());
                }
            }
        }
    }
}
