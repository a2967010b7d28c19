#![no_main]

use libfuzzer_sys::fuzz_target;
use rigstream_wire::{HandMessageDecoder, MAX_HAND_MESSAGE_SIZE};

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_HAND_MESSAGE_SIZE {
        return;
    }
    let _ = HandMessageDecoder.decode(data);
});
