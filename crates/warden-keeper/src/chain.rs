//! Chain metadata the keeper needs: derivation template and address prefix

use serde::{Deserialize, Serialize};
use warden_core::Bip44;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub chain_name: String,
    pub bip44: Bip44,
    pub bech32_prefix: String,
}

impl ChainInfo {
    pub fn new(
        chain_id: impl Into<String>,
        chain_name: impl Into<String>,
        bip44: Bip44,
        bech32_prefix: impl Into<String>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            chain_name: chain_name.into(),
            bip44,
            bech32_prefix: bech32_prefix.into(),
        }
    }
}

/// Lookup of chain metadata by chain id.
pub trait ChainCatalog: Send + Sync {
    fn chain_info(&self, chain_id: &str) -> Option<ChainInfo>;
}

/// Fixed catalog, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticChainCatalog {
    chains: Vec<ChainInfo>,
}

impl StaticChainCatalog {
    pub fn new(chains: Vec<ChainInfo>) -> Self {
        Self { chains }
    }
}

impl ChainCatalog for StaticChainCatalog {
    fn chain_info(&self, chain_id: &str) -> Option<ChainInfo> {
        self.chains.iter().find(|c| c.chain_id == chain_id).cloned()
    }
}

/// The chains supported out of the box.
pub fn native_chains() -> Vec<ChainInfo> {
    vec![
        ChainInfo::new("cosmoshub-2", "Cosmos", Bip44::new(44, 118, 0), "cosmos"),
        ChainInfo::new("columbus-2", "Terra", Bip44::new(44, 330, 0), "terra"),
    ]
}
