#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_core::crypto::EncryptedSecret;

fuzz_target!(|data: &[u8]| {
    if let Ok(secret) = EncryptedSecret::from_bytes(data) {
        let bytes = secret.to_bytes();
        assert_eq!(bytes, data);
    }
});
