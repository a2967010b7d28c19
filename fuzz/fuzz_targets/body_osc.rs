#![no_main]

use libfuzzer_sys::fuzz_target;
use rigstream_wire::decode_body_packet;

fuzz_target!(|data: &[u8]| {
    let _ = decode_body_packet(data);
});
