#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_core::seed::parse_mnemonic;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must parse or fail, never panic
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(mnemonic) = parse_mnemonic(s) {
            // Whatever parsed must reparse from its canonical form
            assert!(parse_mnemonic(&mnemonic.to_string()).is_ok());
        }
    }
});
