#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use warden_core::{KdfParams, KeyRing, KeyRingState, MemoryKeyStore};

fuzz_target!(|data: &[u8]| {
    // A tampered keyring file must be refused, never half-loaded
    let store = Arc::new(MemoryKeyStore::with_blob(data.to_vec()));
    let mut keyring = KeyRing::new(store, KdfParams::insecure_for_tests());
    match keyring.restore() {
        Ok(state) => {
            assert!(matches!(state, KeyRingState::Locked | KeyRingState::Empty));
            assert!(keyring.get_key(Some("m/44'/118'/0'/0/0")).is_err());
        }
        Err(_) => assert_eq!(keyring.state(), KeyRingState::NotLoaded),
    }
});
