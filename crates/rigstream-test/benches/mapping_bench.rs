//! Benchmarks for channel mapping and frame assembly

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rigstream_core::{StreamTime, Vec3};
use rigstream_map::{ChannelMapper, JawCalibration, ResponseCurve};
use rigstream_runtime::{AssemblerConfig, CycleInput, FrameAssembler};
use rigstream_test::{hand_frame_json, FaceSimConfig, FaceSimulator};
use rigstream_wire::{HandMessageDecoder, TrackingStateDecoder};

fn bench_facial_map(c: &mut Criterion) {
    let message = FaceSimulator::new(FaceSimConfig::default()).next_message();
    let frame = TrackingStateDecoder::default().decode(&message).unwrap();

    let mut group = c.benchmark_group("facial_map");
    let linear = ChannelMapper::facial()
        .unwrap()
        .with_jaw(Some(JawCalibration::default()));
    group.bench_function("linear", |b| {
        b.iter(|| black_box(linear.map(black_box(&frame).channels())))
    });

    let signed_log = ChannelMapper::facial()
        .unwrap()
        .with_jaw(Some(JawCalibration::default()))
        .with_curve(ResponseCurve::signed_log());
    group.bench_function("signed_log", |b| {
        b.iter(|| black_box(signed_log.map(black_box(&frame).channels())))
    });
    group.finish();
}

fn bench_eyelid_map(c: &mut Criterion) {
    let message = FaceSimulator::new(FaceSimConfig::default()).next_message();
    let frame = TrackingStateDecoder::default().decode(&message).unwrap();
    let eyelids = ChannelMapper::eyelids().unwrap();

    c.bench_function("eyelid_map", |b| {
        b.iter(|| black_box(eyelids.map(black_box(&frame).channels())))
    });
}

fn bench_assemble_cycle(c: &mut Criterion) {
    let face_message = FaceSimulator::new(FaceSimConfig::default()).next_message();
    let face = TrackingStateDecoder::default().decode(&face_message).unwrap();
    let hand_message = hand_frame_json(1, 0, 3, Vec3::new(0.0, 200.0, 0.0), 5).to_string();
    let mut hand = HandMessageDecoder.decode_str(&hand_message).unwrap();

    let mut assembler = FrameAssembler::new(AssemblerConfig::default()).unwrap();
    let mut frame_id = 0;

    c.bench_function("assemble_face_and_hand", |b| {
        b.iter(|| {
            frame_id += 1;
            hand.frame_id = Some(frame_id);
            let pose = assembler.assemble(
                CycleInput {
                    face: Some(&face),
                    hand: Some(&hand),
                    body: None,
                },
                StreamTime::from_millis(frame_id * 20),
            );
            black_box(pose)
        })
    });
}

criterion_group!(benches, bench_facial_map, bench_eyelid_map, bench_assemble_cycle);
criterion_main!(benches);
