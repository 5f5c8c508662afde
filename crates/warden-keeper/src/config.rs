//! Keeper configuration: chains, origin allow-lists, approval behaviour, KDF cost.

use crate::access::AccessPolicy;
use crate::chain::{native_chains, ChainInfo, StaticChainCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use warden_core::KdfParams;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid keeper configuration: {0}")]
pub struct ConfigError(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Origin the approval UI uses; only it may run privileged requests
    #[serde(default = "default_internal_origin")]
    pub internal_origin: String,

    #[serde(default = "native_chains")]
    pub chains: Vec<ChainInfo>,

    /// Origins admitted per chain
    #[serde(default = "default_access")]
    pub access: Vec<AccessEntry>,

    #[serde(default)]
    pub approvals: ApprovalSection,

    /// Argon2id cost for newly created keyrings
    #[serde(default)]
    pub kdf: KdfParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub chain_id: String,
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalSection {
    /// Seconds a request may stay pending; 0 waits forever
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How sign requests are approved
    #[serde(default)]
    pub sign: ApprovalMode,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            sign: ApprovalMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    #[default]
    Interactive,
    Always,
}

fn default_internal_origin() -> String {
    "warden://approval-ui".to_string()
}

fn default_access() -> Vec<AccessEntry> {
    native_chains()
        .into_iter()
        .map(|chain| AccessEntry {
            chain_id: chain.chain_id,
            origins: vec!["http://localhost:8081".to_string()],
        })
        .collect()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            internal_origin: default_internal_origin(),
            chains: native_chains(),
            access: default_access(),
            approvals: ApprovalSection::default(),
            kdf: KdfParams::default(),
        }
    }
}

impl KeeperConfig {
    pub fn approval_timeout(&self) -> Option<Duration> {
        match self.approvals.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn access_policy(&self) -> AccessPolicy {
        self.access
            .iter()
            .flat_map(|entry| entry.origins.iter().map(move |o| (&entry.chain_id, o)))
            .fold(
                AccessPolicy::new(self.internal_origin.clone()),
                |policy, (chain_id, origin)| policy.allow(chain_id.clone(), origin.clone()),
            )
    }

    pub fn chain_catalog(&self) -> StaticChainCatalog {
        StaticChainCatalog::new(self.chains.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError(msg));

        if self.internal_origin.is_empty() {
            return fail("internal_origin must not be empty".into());
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if chain.chain_id.is_empty() {
                return fail("chains[].chain_id must not be empty".into());
            }
            if !seen.insert(chain.chain_id.as_str()) {
                return fail(format!("duplicate chain {}", chain.chain_id));
            }
            if warden_core::keys::encode_bech32(&chain.bech32_prefix, &[0u8; 20]).is_err() {
                return fail(format!(
                    "chain {} has invalid bech32_prefix {:?}",
                    chain.chain_id, chain.bech32_prefix
                ));
            }
        }

        for entry in &self.access {
            if !seen.contains(entry.chain_id.as_str()) {
                return fail(format!("access entry for unknown chain {}", entry.chain_id));
            }
            if entry.origins.iter().any(|o| o == &self.internal_origin) {
                return fail(format!(
                    "internal origin must not be listed for chain {}",
                    entry.chain_id
                ));
            }
        }

        if self.kdf.t_cost == 0 || self.kdf.p_cost == 0 || self.kdf.m_cost < 8 * self.kdf.p_cost {
            return fail("kdf requires t_cost >= 1, p_cost >= 1, m_cost >= 8 * p_cost".into());
        }

        Ok(())
    }
}
