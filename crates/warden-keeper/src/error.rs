use crate::approver::ApprovalError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_core::KeyRingError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeeperError {
    #[error("Key doesn't exist")]
    KeyDoesNotExist,
    #[error("Invalid password")]
    AuthenticationFailed,
    #[error("Keyring is locked")]
    Locked,
    #[error("This origin is not approved: {0}")]
    AccessDenied(String),
    #[error("Invalid bech32 address: {0}")]
    InvalidAddress(String),
    #[error("Path not set")]
    PathNotSet,
    #[error("Unknown request: {0}")]
    UnknownRequest(String),
    #[error("Request rejected{}", .0.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    Rejected(Option<String>),
    #[error("Approval request expired")]
    Expired,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Config is approved, but result config is null")]
    ConfigApprovedButEmpty,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire-level classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    KeyDoesNotExist,
    AuthenticationFailed,
    Locked,
    AccessDenied,
    InvalidAddress,
    PathNotSet,
    UnknownRequest,
    Rejected,
    Expired,
    InvalidInput,
    ConfigApprovedButEmpty,
    Storage,
    Internal,
}

impl KeeperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyDoesNotExist => ErrorKind::KeyDoesNotExist,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::Locked => ErrorKind::Locked,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::PathNotSet => ErrorKind::PathNotSet,
            Self::UnknownRequest(_) => ErrorKind::UnknownRequest,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::Expired => ErrorKind::Expired,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ConfigApprovedButEmpty => ErrorKind::ConfigApprovedButEmpty,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<KeyRingError> for KeeperError {
    fn from(e: KeyRingError) -> Self {
        match e {
            KeyRingError::KeyDoesNotExist => Self::KeyDoesNotExist,
            KeyRingError::AlreadyExists | KeyRingError::Changed => {
                Self::InvalidInput(e.to_string())
            }
            KeyRingError::Locked => Self::Locked,
            KeyRingError::PathNotSet => Self::PathNotSet,
            KeyRingError::AuthenticationFailed => Self::AuthenticationFailed,
            KeyRingError::InvalidMnemonic(_)
            | KeyRingError::InvalidPrivateKey(_)
            | KeyRingError::Key(_) => Self::InvalidInput(e.to_string()),
            KeyRingError::Corrupted(_)
            | KeyRingError::Encryption(_)
            | KeyRingError::Store(_) => Self::Storage(e.to_string()),
        }
    }
}

impl From<ApprovalError> for KeeperError {
    fn from(e: ApprovalError) -> Self {
        match e {
            ApprovalError::Rejected(reason) => Self::Rejected(reason),
            ApprovalError::Expired => Self::Expired,
            ApprovalError::Closed => Self::Rejected(Some("approver shut down".into())),
        }
    }
}
