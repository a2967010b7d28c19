#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rigstream_core::{EyeGaze, Quat};
use rigstream_wire::{TrackingStateBuilder, TrackingStateDecoder};

#[derive(Arbitrary, Debug)]
struct Input {
    timestamp: f64,
    tracking_ok: bool,
    shapes: Vec<f32>,
    head: Option<[f32; 4]>,
    eyes: Option<[f32; 4]>,
    /// Unknown block appended after the known ones
    extra: Option<(u16, u16, Vec<u8>)>,
}

fuzz_target!(|input: Input| {
    let mut builder = TrackingStateBuilder::new()
        .frame_info(input.timestamp, input.tracking_ok)
        .blend_shapes(&input.shapes);
    if let Some([x, y, z, w]) = input.head {
        builder = builder.head_pose(Quat::from_xyzw(x, y, z, w));
    }
    if let Some([left_theta, left_phi, right_theta, right_phi]) = input.eyes {
        builder = builder.eyes(EyeGaze {
            left_theta,
            left_phi,
            right_theta,
            right_phi,
        });
    }
    if let Some((block_id, version, payload)) = input.extra {
        // 101..=105 are the known inner blocks
        if !(101..=105).contains(&block_id) && payload.len() < 4096 {
            builder = builder.raw_block(block_id, version, payload);
        }
    }

    let message = builder.build();
    let frame = TrackingStateDecoder::default()
        .decode(&message)
        .expect("builder output must decode");
    assert_eq!(frame.tracking_ok, input.tracking_ok);
    assert_eq!(frame.blend_shapes.len(), input.shapes.len());
});
