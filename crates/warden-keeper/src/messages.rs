//! Wire envelopes exchanged with the router
//!
//! Every request names the origin it came from. Binary payloads travel as hex.

use crate::error::{ErrorKind, KeeperError};
use crate::keeper::TxConfig;
use crate::surface;
use serde::{Deserialize, Serialize};
use warden_core::KeyRingState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Echoed in the reply so callers can match concurrent requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    pub origin: String,
    pub request: Request,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Enable {
        chain_id: String,
    },
    Status,
    Restore,
    Clear,
    CreateMnemonicKey {
        mnemonic: String,
        password: String,
    },
    CreatePrivateKey {
        private_key_hex: String,
        password: String,
    },
    Lock,
    Unlock {
        password: String,
    },
    SetPath {
        chain_id: String,
        account: u32,
        index: u32,
    },
    GetKey {
        chain_id: String,
    },
    RequestTxConfig {
        config: TxConfig,
        #[serde(default = "default_true")]
        open_popup: bool,
    },
    GetRequestedTxConfig {
        chain_id: String,
    },
    ApproveTxConfig {
        chain_id: String,
        config: TxConfig,
    },
    RejectTxConfig {
        chain_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    RequestSign {
        chain_id: String,
        bech32_address: String,
        message_hex: String,
        #[serde(default)]
        id: Option<String>,
        #[serde(default = "default_true")]
        open_popup: bool,
    },
    GetRequestedMessage {
        id: String,
    },
    ApproveSign {
        id: String,
    },
    RejectSign {
        id: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enable { .. } => "enable",
            Self::Status => "status",
            Self::Restore => "restore",
            Self::Clear => "clear",
            Self::CreateMnemonicKey { .. } => "create_mnemonic_key",
            Self::CreatePrivateKey { .. } => "create_private_key",
            Self::Lock => "lock",
            Self::Unlock { .. } => "unlock",
            Self::SetPath { .. } => "set_path",
            Self::GetKey { .. } => "get_key",
            Self::RequestTxConfig { .. } => "request_tx_config",
            Self::GetRequestedTxConfig { .. } => "get_requested_tx_config",
            Self::ApproveTxConfig { .. } => "approve_tx_config",
            Self::RejectTxConfig { .. } => "reject_tx_config",
            Self::RequestSign { .. } => "request_sign",
            Self::GetRequestedMessage { .. } => "get_requested_message",
            Self::ApproveSign { .. } => "approve_sign",
            Self::RejectSign { .. } => "reject_sign",
        }
    }

    /// Requests only the approval UI may send.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Self::Restore
                | Self::Clear
                | Self::CreateMnemonicKey { .. }
                | Self::CreatePrivateKey { .. }
                | Self::Lock
                | Self::Unlock { .. }
                | Self::GetRequestedTxConfig { .. }
                | Self::ApproveTxConfig { .. }
                | Self::RejectTxConfig { .. }
                | Self::GetRequestedMessage { .. }
                | Self::ApproveSign { .. }
                | Self::RejectSign { .. }
        )
    }

    /// Shape checks that need no keeper state.
    pub fn validate_basic(&self) -> Result<(), KeeperError> {
        fn required(field: &str, value: &str) -> Result<(), KeeperError> {
            if value.is_empty() {
                Err(KeeperError::InvalidInput(format!("{} is empty", field)))
            } else {
                Ok(())
            }
        }

        // Ids end up in approval UI routes
        fn request_id(id: &str) -> Result<(), KeeperError> {
            required("id", id)?;
            if !surface::is_route_segment(id) {
                return Err(KeeperError::InvalidInput(format!(
                    "id {:?} may only use letters, digits, '-' and '_'",
                    id
                )));
            }
            Ok(())
        }

        fn tx_config(config: &TxConfig) -> Result<(), KeeperError> {
            required("chain id", &config.chain_id)?;
            required("fee", &config.fee)
        }

        match self {
            Self::Status | Self::Restore | Self::Clear | Self::Lock => Ok(()),
            Self::Enable { chain_id }
            | Self::GetKey { chain_id }
            | Self::SetPath { chain_id, .. }
            | Self::GetRequestedTxConfig { chain_id }
            | Self::RejectTxConfig { chain_id, .. } => required("chain id", chain_id),
            Self::CreateMnemonicKey { mnemonic, password } => {
                required("mnemonic", mnemonic)?;
                required("password", password)
            }
            Self::CreatePrivateKey {
                private_key_hex,
                password,
            } => {
                required("private key", private_key_hex)?;
                required("password", password)
            }
            Self::Unlock { password } => required("password", password),
            Self::RequestTxConfig { config, .. } => tx_config(config),
            Self::ApproveTxConfig { chain_id, config } => {
                required("chain id", chain_id)?;
                tx_config(config)?;
                if &config.chain_id != chain_id {
                    return Err(KeeperError::InvalidInput(format!(
                        "config is for {}, not {}",
                        config.chain_id, chain_id
                    )));
                }
                Ok(())
            }
            Self::RequestSign {
                chain_id,
                bech32_address,
                message_hex,
                id,
                ..
            } => {
                required("chain id", chain_id)?;
                required("bech32 address", bech32_address)?;
                required("message", message_hex)?;
                match id {
                    Some(id) => request_id(id),
                    None => Ok(()),
                }
            }
            Self::GetRequestedMessage { id }
            | Self::ApproveSign { id }
            | Self::RejectSign { id, .. } => request_id(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    State {
        state: KeyRingState,
    },
    Path {
        path: String,
    },
    Key {
        algo: String,
        pub_key_hex: String,
        address_hex: String,
        bech32_address: String,
    },
    TxConfig {
        config: TxConfig,
    },
    Signature {
        signature_hex: String,
    },
    SignMessage {
        chain_id: String,
        message_hex: String,
    },
    Ack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&KeeperError> for ErrorBody {
    fn from(e: &KeeperError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Exactly one of `ok` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    pub fn from_result(seq: Option<u64>, result: Result<Response, KeeperError>) -> Self {
        match result {
            Ok(response) => Self {
                seq,
                ok: Some(response),
                error: None,
            },
            Err(e) => Self {
                seq,
                ok: None,
                error: Some(ErrorBody::from(&e)),
            },
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_sign() {
        let json = r#"{
            "seq": 4,
            "origin": "http://localhost:8081",
            "request": {
                "type": "request_sign",
                "chain_id": "cosmoshub-2",
                "bech32_address": "cosmos1xyz",
                "message_hex": "7b7d"
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.seq, Some(4));
        match &envelope.request {
            Request::RequestSign { id, open_popup, .. } => {
                assert!(id.is_none());
                assert!(*open_popup);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!envelope.request.is_privileged());
        envelope.request.validate_basic().unwrap();
    }

    #[test]
    fn test_missing_origin_rejected() {
        let json = r#"{"request": {"type": "status"}}"#;
        assert!(serde_json::from_str::<Envelope>(json).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"origin": "x", "request": {"type": "export_mnemonic"}}"#;
        assert!(serde_json::from_str::<Envelope>(json).is_err());
    }

    #[test]
    fn test_validate_basic() {
        let empty_chain = Request::Enable {
            chain_id: String::new(),
        };
        assert!(matches!(
            empty_chain.validate_basic(),
            Err(KeeperError::InvalidInput(_))
        ));

        let mismatched = Request::ApproveTxConfig {
            chain_id: "cosmoshub-2".into(),
            config: TxConfig {
                chain_id: "columbus-2".into(),
                account_number: None,
                sequence: None,
                gas: 1,
                memo: String::new(),
                fee: "1uluna".into(),
            },
        };
        assert!(mismatched.validate_basic().is_err());
    }

    #[test]
    fn test_sign_ids_cannot_escape_route() {
        let sign = |id: &str| Request::RequestSign {
            chain_id: "cosmoshub-2".into(),
            bech32_address: "cosmos1x".into(),
            message_hex: "00".into(),
            id: Some(id.into()),
            open_popup: true,
        };
        assert!(sign("req_1-A").validate_basic().is_ok());
        for bad in ["../unlock", "x?a=b", "a/b", "a b", "%2e", ""] {
            assert!(
                matches!(sign(bad).validate_basic(), Err(KeeperError::InvalidInput(_))),
                "{:?} accepted",
                bad
            );
        }
        assert!(Request::ApproveSign { id: "../unlock".into() }
            .validate_basic()
            .is_err());
    }

    #[test]
    fn test_privileged_requests() {
        assert!(Request::Unlock {
            password: "pw".into()
        }
        .is_privileged());
        assert!(Request::ApproveSign { id: "1".into() }.is_privileged());
        assert!(!Request::Status.is_privileged());
        assert!(!Request::GetKey {
            chain_id: "cosmoshub-2".into()
        }
        .is_privileged());
    }

    #[test]
    fn test_reply_shape() {
        let ok = Reply::from_result(Some(1), Ok(Response::Ack));
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"seq":1,"ok":{"type":"ack"}}"#
        );

        let err = Reply::from_result(None, Err(KeeperError::PathNotSet));
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"error":{"kind":"path_not_set","message":"Path not set"}}"#
        );
        assert_eq!(err.error_kind(), Some(ErrorKind::PathNotSet));
    }
}
