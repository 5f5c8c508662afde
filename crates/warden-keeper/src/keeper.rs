//! The keeper: one keyring, the active path, and every pending approval.
//!
//! Untrusted callers reach sensitive operations only through the approval
//! queues here. Nothing is signed and no key is exposed to a locked session
//! until the matching approval resolves.

use crate::access::AccessPolicy;
use crate::approver::AsyncApprover;
use crate::chain::{ChainCatalog, ChainInfo};
use crate::config::{ApprovalMode, KeeperConfig};
use crate::error::KeeperError;
use crate::surface::{self, ApprovalSurface};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use warden_core::{KdfParams, KeyEntry, KeyRing, KeyRingError, KeyRingState, KeyStore, PreparedKey};
use zeroize::Zeroizing;

type Result<T> = std::result::Result<T, KeeperError>;

const UNLOCK_REQUEST_ID: &str = "unlock";

/// Fee, gas and memo proposed for a transaction on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxConfig {
    pub chain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    pub gas: u64,
    #[serde(default)]
    pub memo: String,
    /// Fee in coin notation, e.g. `"5000uatom"`
    pub fee: String,
}

/// A message waiting for the user's signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignRequest {
    pub chain_id: String,
    pub message: Vec<u8>,
}

pub struct KeyRingKeeper {
    keyring: Mutex<KeyRing>,
    path: Mutex<Option<String>>,
    chains: Arc<dyn ChainCatalog>,
    access: AccessPolicy,
    surface: Arc<dyn ApprovalSurface>,

    unlock_approver: AsyncApprover<()>,

    tx_config_approver: AsyncApprover<Option<TxConfig>>,
    requested_tx_configs: Mutex<HashMap<String, TxConfig>>,

    sign_approver: AsyncApprover<()>,
    requested_messages: Mutex<HashMap<String, PendingSignRequest>>,
}

impl KeyRingKeeper {
    /// Interactive approvals, no expiry.
    pub fn new(
        keyring: KeyRing,
        chains: Arc<dyn ChainCatalog>,
        access: AccessPolicy,
        surface: Arc<dyn ApprovalSurface>,
    ) -> Self {
        Self {
            keyring: Mutex::new(keyring),
            path: Mutex::new(None),
            chains,
            access,
            surface,
            unlock_approver: AsyncApprover::new("unlock"),
            tx_config_approver: AsyncApprover::new("tx-config"),
            requested_tx_configs: Mutex::new(HashMap::new()),
            sign_approver: AsyncApprover::new("sign"),
            requested_messages: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        config: &KeeperConfig,
        store: Arc<dyn KeyStore>,
        surface: Arc<dyn ApprovalSurface>,
    ) -> Self {
        let keyring = KeyRing::new(store, config.kdf);
        Self::new(
            keyring,
            Arc::new(config.chain_catalog()),
            config.access_policy(),
            surface,
        )
        .with_approval_timeout(config.approval_timeout())
        .with_sign_mode(config.approvals.sign)
    }

    pub fn with_approval_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unlock_approver = AsyncApprover::new("unlock").with_timeout(timeout);
        self.tx_config_approver = AsyncApprover::new("tx-config").with_timeout(timeout);
        self.sign_approver = if self.sign_approver.is_always_approve() {
            AsyncApprover::always_approve("sign", ())
        } else {
            AsyncApprover::new("sign").with_timeout(timeout)
        };
        self
    }

    pub fn with_sign_mode(mut self, mode: ApprovalMode) -> Self {
        if mode == ApprovalMode::Always {
            self.sign_approver = AsyncApprover::always_approve("sign", ());
        }
        self
    }

    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    pub fn chain_info(&self, chain_id: &str) -> Result<ChainInfo> {
        self.chains
            .chain_info(chain_id)
            .ok_or_else(|| KeeperError::InvalidInput(format!("There is no chain info for {}", chain_id)))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn status(&self) -> KeyRingState {
        self.keyring().state()
    }

    /// Load persisted state. Only acts from `NotLoaded`.
    pub fn restore(&self) -> Result<KeyRingState> {
        Ok(self.keyring().restore()?)
    }

    pub async fn create_mnemonic_key(&self, mnemonic: &str, password: &str) -> Result<KeyRingState> {
        let kdf = self.kdf_for_new_key()?;
        let mnemonic = Zeroizing::new(mnemonic.to_string());
        let password = Zeroizing::new(password.to_string());
        let prepared =
            run_kdf(move || PreparedKey::from_mnemonic(&mnemonic, &password, kdf)).await?;
        Ok(self.keyring().install(prepared)?)
    }

    pub async fn create_private_key(
        &self,
        private_key: &[u8],
        password: &str,
    ) -> Result<KeyRingState> {
        let kdf = self.kdf_for_new_key()?;
        let private_key = Zeroizing::new(private_key.to_vec());
        let password = Zeroizing::new(password.to_string());
        let prepared =
            run_kdf(move || PreparedKey::from_private_key(&private_key, &password, kdf)).await?;
        Ok(self.keyring().install(prepared)?)
    }

    /// Check up front so an existing key never costs a KDF run.
    fn kdf_for_new_key(&self) -> Result<KdfParams> {
        let mut keyring = self.keyring();
        keyring.ensure_empty()?;
        Ok(keyring.kdf())
    }

    pub fn lock(&self) -> KeyRingState {
        self.keyring().lock()
    }

    /// Unlock, then release everyone waiting in `enable`.
    ///
    /// A wrong password leaves the keyring locked and the waiters waiting.
    pub async fn unlock(&self, password: &str) -> Result<KeyRingState> {
        let sealed = self.keyring().sealed()?;
        let password = Zeroizing::new(password.to_string());
        let opened = run_kdf(move || sealed.open(&password)).await?;
        let state = self.keyring().accept(opened)?;
        self.unlock_approver.approve(UNLOCK_REQUEST_ID, ());
        Ok(state)
    }

    /// Erase the stored keyring and forget the active path.
    pub fn clear(&self) -> Result<KeyRingState> {
        let state = self.keyring().clear()?;
        *self.path() = None;
        Ok(state)
    }

    /// Make the keyring usable for `chain_id`, asking the user to unlock if needed.
    ///
    /// `origin` is `None` for trusted in-process callers.
    pub async fn enable(&self, chain_id: &str, origin: Option<&str>) -> Result<KeyRingState> {
        if let Some(origin) = origin {
            self.check_access_origin(chain_id, origin)?;
        }

        let state = {
            let mut keyring = self.keyring();
            if keyring.state() == KeyRingState::NotLoaded {
                keyring.restore()?;
            }
            keyring.state()
        };

        match state {
            KeyRingState::Unlocked => Ok(state),
            KeyRingState::Empty | KeyRingState::NotLoaded => Err(KeeperError::KeyDoesNotExist),
            KeyRingState::Locked => {
                let ticket = self.unlock_approver.enqueue(UNLOCK_REQUEST_ID, || {
                    self.surface.open(surface::UNLOCK_PATH)
                });
                // An unlock may have landed between the state read and enqueue
                if self.status() == KeyRingState::Unlocked {
                    self.unlock_approver.approve(UNLOCK_REQUEST_ID, ());
                }
                ticket.wait().await?;
                Ok(self.status())
            }
        }
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Select the BIP-44 account/index used by `get_key` and signing.
    pub fn set_path(&self, chain_id: &str, account: u32, index: u32) -> Result<String> {
        let info = self.chain_info(chain_id)?;
        let path = info.bip44.path_string(account, index);
        log::debug!("Active path for {} set to {}", chain_id, path);
        *self.path() = Some(path.clone());
        Ok(path)
    }

    pub fn get_key(&self, chain_id: &str, origin: Option<&str>) -> Result<KeyEntry> {
        if let Some(origin) = origin {
            self.check_access_origin(chain_id, origin)?;
        }
        let path = self.path().clone();
        Ok(self.keyring().get_key(path.as_deref())?)
    }

    /// Bech32 rendering of `key` under the chain's prefix.
    pub fn bech32_address(&self, chain_id: &str, key: &KeyEntry) -> Result<String> {
        let info = self.chain_info(chain_id)?;
        key.bech32_address(&info.bech32_prefix)
            .map_err(|e| KeeperError::InvalidInput(e.to_string()))
    }

    pub fn check_access_origin(&self, chain_id: &str, origin: &str) -> Result<()> {
        if self.access.is_allowed(chain_id, origin) {
            Ok(())
        } else {
            log::warn!("Denied {} access to {}", origin, chain_id);
            Err(KeeperError::AccessDenied(origin.to_string()))
        }
    }

    /// Fail unless `address` is the active key's address on `chain_id`.
    pub fn check_bech32_address(&self, chain_id: &str, address: &str) -> Result<()> {
        let key = self.get_key(chain_id, None)?;
        let expected = self.bech32_address(chain_id, &key)?;
        if expected != address {
            return Err(KeeperError::InvalidAddress(address.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transaction config approval
    // ------------------------------------------------------------------

    /// Park `config` for review and wait for the user's version of it.
    ///
    /// A second request for the same chain replaces the displayed config and
    /// joins the wait; both callers get the same approved config.
    pub async fn request_tx_builder_config(
        &self,
        config: TxConfig,
        open_popup: bool,
    ) -> Result<TxConfig> {
        let chain_id = config.chain_id.clone();
        self.tx_configs().insert(chain_id.clone(), config);
        let parked = ParkedTxConfig {
            keeper: self,
            chain_id: &chain_id,
        };

        let ticket = self.tx_config_approver.enqueue(&chain_id, || {});
        if open_popup {
            // Fresh nonce on each open so the page reloads the replaced config
            self.surface
                .open(&surface::fee_path(&chain_id, &random_hex(8)));
        }

        let outcome = ticket.wait().await;
        drop(parked);

        outcome?.ok_or(KeeperError::ConfigApprovedButEmpty)
    }

    pub fn get_requested_tx_config(&self, chain_id: &str) -> Result<TxConfig> {
        self.tx_configs()
            .get(chain_id)
            .cloned()
            .ok_or_else(|| KeeperError::UnknownRequest(chain_id.to_string()))
    }

    pub fn approve_tx_builder_config(&self, chain_id: &str, config: TxConfig) {
        if self.tx_config_approver.approve(chain_id, Some(config)) {
            self.tx_configs().remove(chain_id);
        }
    }

    pub fn reject_tx_builder_config(&self, chain_id: &str, reason: Option<String>) {
        if self.tx_config_approver.reject(chain_id, reason) {
            self.tx_configs().remove(chain_id);
        }
    }

    // ------------------------------------------------------------------
    // Signing
    // ------------------------------------------------------------------

    /// Queue `message` for approval and sign it once approved.
    ///
    /// The signed bytes are exactly those passed here. An id already waiting
    /// is refused, so one approval can never cover two different messages.
    pub async fn request_sign(
        &self,
        chain_id: &str,
        message: Vec<u8>,
        id: Option<String>,
        open_popup: bool,
    ) -> Result<Vec<u8>> {
        self.chain_info(chain_id)?;
        let id = id.unwrap_or_else(|| random_hex(16));
        if !surface::is_route_segment(&id) {
            return Err(KeeperError::InvalidInput(format!("bad sign request id {:?}", id)));
        }

        {
            let mut messages = self.messages();
            if messages.contains_key(&id) {
                return Err(KeeperError::InvalidInput(format!(
                    "sign request {} is already pending",
                    id
                )));
            }
            messages.insert(
                id.clone(),
                PendingSignRequest {
                    chain_id: chain_id.to_string(),
                    message: message.clone(),
                },
            );
        }
        let parked = ParkedSign {
            keeper: self,
            id: &id,
        };

        let ticket = self.sign_approver.enqueue(&id, || {});
        if open_popup && !self.sign_approver.is_always_approve() {
            self.surface.open(&surface::sign_path(&id));
        }

        let outcome = ticket.wait().await;
        drop(parked);
        outcome?;

        let path = self.path().clone();
        let signature = self.keyring().sign(path.as_deref(), &message)?;
        log::info!("Signed request {} on {}", id, chain_id);
        Ok(signature)
    }

    pub fn get_requested_message(&self, id: &str) -> Result<PendingSignRequest> {
        self.messages()
            .get(id)
            .cloned()
            .ok_or_else(|| KeeperError::UnknownRequest(id.to_string()))
    }

    pub fn approve_sign(&self, id: &str) {
        self.sign_approver.approve(id, ());
    }

    pub fn reject_sign(&self, id: &str, reason: Option<String>) {
        if self.sign_approver.reject(id, reason) {
            self.messages().remove(id);
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn keyring(&self) -> MutexGuard<'_, KeyRing> {
        self.keyring.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn path(&self) -> MutexGuard<'_, Option<String>> {
        self.path.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tx_configs(&self) -> MutexGuard<'_, HashMap<String, TxConfig>> {
        self.requested_tx_configs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn messages(&self) -> MutexGuard<'_, HashMap<String, PendingSignRequest>> {
        self.requested_messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Parked sign payload; gone as soon as its request stops waiting.
///
/// A newer request that reused the id after ours resolved keeps its entry.
struct ParkedSign<'a> {
    keeper: &'a KeyRingKeeper,
    id: &'a str,
}

impl Drop for ParkedSign<'_> {
    fn drop(&mut self) {
        if !self.keeper.sign_approver.is_pending(self.id) {
            self.keeper.messages().remove(self.id);
        }
    }
}

/// Parked tx config; kept while another request for the chain still waits.
struct ParkedTxConfig<'a> {
    keeper: &'a KeyRingKeeper,
    chain_id: &'a str,
}

impl Drop for ParkedTxConfig<'_> {
    fn drop(&mut self) {
        if !self.keeper.tx_config_approver.is_pending(self.chain_id) {
            self.keeper.tx_configs().remove(self.chain_id);
        }
    }
}

/// Argon2 belongs on the blocking pool, not on an async worker.
async fn run_kdf<T, F>(step: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, KeyRingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(step)
        .await
        .map_err(|e| KeeperError::Internal(format!("key derivation task failed: {}", e)))?
        .map_err(KeeperError::from)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
