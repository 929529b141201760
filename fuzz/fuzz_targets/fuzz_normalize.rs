#![no_main]
use honeypot::gateway::InboundMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let message = InboundMessage::from_bytes(data, "tester-session");
    assert!(!message.session_id.is_empty());
});
