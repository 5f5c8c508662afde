//! BIP-39 mnemonic handling
//!
//! Mnemonics are validated (word list + checksum) before anything is derived
//! from them. The keyring only ever keeps the 64-byte seed.

use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

/// Parse and checksum-validate a mnemonic.
///
/// Surrounding whitespace and repeated spaces between words are tolerated.
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, SeedError> {
    let normalized = words.split_whitespace().collect::<Vec<_>>().join(" ");
    Mnemonic::parse_in(Language::English, &normalized)
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Derive seed bytes from mnemonic (with optional passphrase)
pub fn derive_seed(mnemonic: &Mnemonic, passphrase: &str) -> Zeroizing<[u8; 64]> {
    Zeroizing::new(mnemonic.to_seed(passphrase))
}
