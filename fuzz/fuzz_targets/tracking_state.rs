#![no_main]

use libfuzzer_sys::fuzz_target;
use rigstream_wire::{ChannelLayout, TrackingStateDecoder, VersionPolicy};

fuzz_target!(|data: &[u8]| {
    for policy in [VersionPolicy::Lenient, VersionPolicy::Strict] {
        let decoder = TrackingStateDecoder::new(ChannelLayout::Studio2014).with_policy(policy);
        if let Ok(frame) = decoder.decode(data) {
            // Every decoded value must be addressable by name
            for (name, _) in frame.channels() {
                assert!(!name.is_empty());
            }
        }
    }
});
