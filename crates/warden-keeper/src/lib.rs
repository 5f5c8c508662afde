//! Warden Keeper
//!
//! Mediates every request that touches the keyring. External callers are
//! checked against per-chain origin lists; unlocking, fee selection and
//! signing wait on explicit user approval from the keeper's own UI.
//!
//! # Flow
//!
//! 1. A site sends `enable`; if the keyring is locked the unlock UI opens and
//!    the request waits until the user unlocks.
//! 2. `request_sign` verifies the caller's address, parks the message and
//!    waits on the sign approver.
//! 3. The UI reads the pending message, then approves or rejects it by id.

pub mod access;
pub mod approver;
pub mod chain;
pub mod config;
pub mod error;
pub mod keeper;
pub mod messages;
pub mod router;
pub mod surface;

pub use access::AccessPolicy;
pub use approver::{ApprovalError, AsyncApprover};
pub use chain::{ChainCatalog, ChainInfo, StaticChainCatalog};
pub use config::{ApprovalMode, KeeperConfig};
pub use error::{ErrorKind, KeeperError};
pub use keeper::{KeyRingKeeper, PendingSignRequest, TxConfig};
pub use messages::{Envelope, Reply, Request, Response};
pub use router::Router;
pub use surface::{ApprovalSurface, CommandSurface, LogSurface, RecordingSurface};
