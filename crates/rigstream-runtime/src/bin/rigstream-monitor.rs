//! rigstream monitor
//!
//! Runs the pipeline described by a TOML file and logs a pose summary at
//! every tick until Ctrl-C.
//!
//! Usage: `rigstream-monitor [config.toml]`

use std::env;
use std::ops::ControlFlow;

use tracing::{info, warn};

use rigstream_runtime::{init_tracing, Runtime, RuntimeConfig, Scheduler, TickReport};

fn log_report(report: &TickReport) {
    let pose = &report.pose;
    let peak = pose
        .target_displacements
        .iter()
        .map(|v| v.length())
        .fold(0.0f32, f32::max);

    info!(
        seq = pose.sequence,
        face_ts = ?pose.face_timestamp,
        peak_displacement = peak,
        jaw_yaw = pose.jaw_yaw_degrees,
        head = ?pose.head_rotation,
        gaze = ?pose.gaze_target,
        hand = ?pose.hand.as_ref().map(|h| h.hand_id),
        grabbing = pose.hand.as_ref().is_some_and(|h| h.grabbing),
        body_joints = pose.body.as_ref().map_or(0, |b| b.joints.len()),
        "pose"
    );
    if let Some(event) = &report.grab_event {
        info!(?event, "grab");
    }
    for failure in &report.failures {
        warn!(source = %failure.source, error = %failure.error, "source stopped, restart to reconnect");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match env::args().nth(1) {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    init_tracing(config.log_format)?;

    let mut runtime = Runtime::start(config.clone()).await?;
    let scheduler = Scheduler::new(config.tick_interval);

    let cancel = scheduler.cancel_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupted, shutting down");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    runtime
        .run(&scheduler, |report| {
            log_report(report);
            ControlFlow::Continue(())
        })
        .await;
    runtime.stop().await;

    let stats = runtime.stats();
    info!(
        ticks = stats.ticks,
        face_frames = stats.face_frames,
        face_untracked = stats.face_frames_untracked,
        hand_frames = stats.hand_frames,
        body_frames = stats.body_frames,
        grab_events = stats.grab_events,
        failures = stats.failures,
        "monitor finished"
    );
    Ok(())
}
