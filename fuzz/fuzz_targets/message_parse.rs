#![no_main]

use libfuzzer_sys::fuzz_target;

use gptp::datastructures::messages::FuzzMessage;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = FuzzMessage::deserialize(data) {
        let mut buffer = [0u8; 1024];
        let _ = message.serialize(&mut buffer);
    }
});
