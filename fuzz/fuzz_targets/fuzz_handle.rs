#![no_main]
use honeypot::config::PersonaConfig;
use honeypot::gateway::{decode_body, RequestProcessor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let processor = RequestProcessor::from_config(&PersonaConfig::default());
    let reply = processor.handle(&decode_body(data));
    assert_eq!(reply.status, "success");
    assert_eq!(reply.message_count, 1);
});
