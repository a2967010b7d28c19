//! Hand forwarder
//!
//! Relays the hand tracker service's WebSocket feed to UDP datagrams, so
//! consumers can read it with a plain UDP hand source.
//!
//! Usage: `hand-forwarder [ws-url] [udp-target] [v1|v2]`

use std::env;
use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rigstream_core::RigError;
use rigstream_runtime::{init_tracing, LogFormat};
use rigstream_transport::{run_forwarder, ForwarderConfig, HandProtocol};

fn parse_args() -> Result<ForwarderConfig, RigError> {
    let mut config = ForwarderConfig::default();
    let mut args = env::args().skip(1);

    if let Some(url) = args.next() {
        config.websocket.url = url;
    }
    if let Some(target) = args.next() {
        config.target = target
            .parse::<SocketAddr>()
            .map_err(|e| RigError::Config(format!("bad UDP target '{}': {}", target, e)))?;
    }
    if let Some(protocol) = args.next() {
        config.websocket.protocol = match protocol.as_str() {
            "v1" => HandProtocol::V1,
            "v2" => HandProtocol::V2,
            other => return Err(RigError::Config(format!("unknown protocol '{}'", other))),
        };
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::Pretty)?;
    let config = parse_args()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_signal.cancel(),
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    let stats = run_forwarder(&config, cancel).await?;
    info!(
        received = stats.received,
        forwarded = stats.forwarded,
        skipped = stats.skipped_oversize,
        max_size = stats.max_size,
        "forwarder finished"
    );
    Ok(())
}
