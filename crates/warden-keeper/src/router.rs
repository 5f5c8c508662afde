//! Dispatch of typed envelopes to keeper operations
//!
//! Order per request: shape validation, privilege/origin check, then the
//! keeper call. Sign requests also prove the caller knows the active
//! address before anything is queued.

use crate::error::KeeperError;
use crate::keeper::KeyRingKeeper;
use crate::messages::{Envelope, ErrorBody, Reply, Request, Response};
use std::sync::Arc;
use warden_core::KEY_ALGO;

#[derive(Clone)]
pub struct Router {
    keeper: Arc<KeyRingKeeper>,
}

impl Router {
    pub fn new(keeper: Arc<KeyRingKeeper>) -> Self {
        Self { keeper }
    }

    pub fn keeper(&self) -> &Arc<KeyRingKeeper> {
        &self.keeper
    }

    /// Handle one JSON-encoded envelope and return the JSON reply.
    pub async fn handle_json(&self, line: &str) -> String {
        let reply = match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => self.handle(envelope).await,
            Err(e) => {
                log::debug!("Unparseable envelope: {}", e);
                Reply::from_result(
                    None,
                    Err(KeeperError::InvalidInput(format!("malformed envelope: {}", e))),
                )
            }
        };

        serde_json::to_string(&reply).unwrap_or_else(|e| {
            log::error!("Failed to encode reply: {}", e);
            let fallback = Reply {
                seq: reply.seq,
                ok: None,
                error: Some(ErrorBody::from(&KeeperError::InvalidInput(e.to_string()))),
            };
            serde_json::to_string(&fallback).unwrap_or_default()
        })
    }

    pub async fn handle(&self, envelope: Envelope) -> Reply {
        let name = envelope.request.name();
        log::debug!("{} from {}", name, envelope.origin);

        let result = self.dispatch(&envelope.origin, envelope.request).await;
        if let Err(e) = &result {
            log::debug!("{} from {} failed: {}", name, envelope.origin, e);
        }
        Reply::from_result(envelope.seq, result)
    }

    async fn dispatch(&self, origin: &str, request: Request) -> Result<Response, KeeperError> {
        request.validate_basic()?;

        let internal = self.keeper.access().is_internal(origin);
        if request.is_privileged() && !internal {
            log::warn!("Denied privileged {} from {}", request.name(), origin);
            return Err(KeeperError::AccessDenied(origin.to_string()));
        }
        // The UI is trusted on every chain; anyone else must be on the chain's list
        let external = if internal { None } else { Some(origin) };

        let keeper = &self.keeper;
        match request {
            Request::Enable { chain_id } => {
                let state = keeper.enable(&chain_id, external).await?;
                Ok(Response::State { state })
            }
            Request::Status => Ok(Response::State {
                state: keeper.status(),
            }),
            Request::Restore => Ok(Response::State {
                state: keeper.restore()?,
            }),
            Request::Clear => Ok(Response::State {
                state: keeper.clear()?,
            }),
            Request::CreateMnemonicKey { mnemonic, password } => Ok(Response::State {
                state: keeper.create_mnemonic_key(&mnemonic, &password).await?,
            }),
            Request::CreatePrivateKey {
                private_key_hex,
                password,
            } => {
                let private_key = zeroize::Zeroizing::new(decode_hex("private key", &private_key_hex)?);
                Ok(Response::State {
                    state: keeper.create_private_key(&private_key, &password).await?,
                })
            }
            Request::Lock => Ok(Response::State {
                state: keeper.lock(),
            }),
            Request::Unlock { password } => Ok(Response::State {
                state: keeper.unlock(&password).await?,
            }),
            Request::SetPath {
                chain_id,
                account,
                index,
            } => {
                if let Some(origin) = external {
                    keeper.check_access_origin(&chain_id, origin)?;
                }
                Ok(Response::Path {
                    path: keeper.set_path(&chain_id, account, index)?,
                })
            }
            Request::GetKey { chain_id } => {
                let key = keeper.get_key(&chain_id, external)?;
                Ok(Response::Key {
                    algo: KEY_ALGO.to_string(),
                    pub_key_hex: hex::encode(&key.pub_key),
                    address_hex: hex::encode(&key.address),
                    bech32_address: keeper.bech32_address(&chain_id, &key)?,
                })
            }
            Request::RequestTxConfig { config, open_popup } => {
                if let Some(origin) = external {
                    keeper.check_access_origin(&config.chain_id, origin)?;
                }
                let config = keeper.request_tx_builder_config(config, open_popup).await?;
                Ok(Response::TxConfig { config })
            }
            Request::GetRequestedTxConfig { chain_id } => Ok(Response::TxConfig {
                config: keeper.get_requested_tx_config(&chain_id)?,
            }),
            Request::ApproveTxConfig { chain_id, config } => {
                keeper.approve_tx_builder_config(&chain_id, config);
                Ok(Response::Ack)
            }
            Request::RejectTxConfig { chain_id, reason } => {
                keeper.reject_tx_builder_config(&chain_id, reason);
                Ok(Response::Ack)
            }
            Request::RequestSign {
                chain_id,
                bech32_address,
                message_hex,
                id,
                open_popup,
            } => {
                if let Some(origin) = external {
                    keeper.check_access_origin(&chain_id, origin)?;
                }
                let message = decode_hex("message", &message_hex)?;
                keeper.check_bech32_address(&chain_id, &bech32_address)?;

                let signature = keeper
                    .request_sign(&chain_id, message, id, open_popup)
                    .await?;
                Ok(Response::Signature {
                    signature_hex: hex::encode(signature),
                })
            }
            Request::GetRequestedMessage { id } => {
                let pending = keeper.get_requested_message(&id)?;
                Ok(Response::SignMessage {
                    chain_id: pending.chain_id,
                    message_hex: hex::encode(pending.message),
                })
            }
            Request::ApproveSign { id } => {
                keeper.approve_sign(&id);
                Ok(Response::Ack)
            }
            Request::RejectSign { id, reason } => {
                keeper.reject_sign(&id, reason);
                Ok(Response::Ack)
            }
        }
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, KeeperError> {
    let bytes = hex::decode(value)
        .map_err(|e| KeeperError::InvalidInput(format!("{} is not hex: {}", field, e)))?;
    if bytes.is_empty() {
        return Err(KeeperError::InvalidInput(format!("{} is empty", field)));
    }
    Ok(bytes)
}
