#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_keeper::Envelope;

fuzz_target!(|data: &[u8]| {
    // Envelopes come straight off the socket
    if let Ok(envelope) = serde_json::from_slice::<Envelope>(data) {
        let _ = envelope.request.validate_basic();
        let _ = envelope.request.is_privileged();
        let _ = serde_json::to_vec(&envelope);
    }
});
