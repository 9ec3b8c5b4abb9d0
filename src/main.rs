use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use roomcall::audio::{CaptureSource, ChunkerConfig, ScriptedCapture};
use roomcall::call::{
    CallNotice, LocalPeerTransport, PeerTransport, SessionSupervisor, SupervisorCommand,
};
use roomcall::{Config, SignalingChannel};

#[derive(Parser, Debug)]
#[command(name = "roomcall", about = "Two-party audio call client")]
struct Args {
    /// Room to join
    #[arg(long)]
    room: String,

    /// Display name in the room
    #[arg(long)]
    username: String,

    /// Room password
    #[arg(long, default_value = "")]
    password: String,

    /// Config file path (without extension)
    #[arg(long, default_value = "config/roomcall")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("roomcall v0.1.0");
    info!("Relay: {}", cfg.signaling.url);
    info!(
        "ICE: {} STUN servers, candidate pool {}",
        cfg.ice.stun_servers.len(),
        cfg.ice.candidate_pool_size
    );

    let channel = SignalingChannel::connect(&cfg.signaling.url).await?;

    let chunker_config = ChunkerConfig {
        silence_threshold: cfg.audio.silence_threshold,
        max_trailing_silence_frames: cfg.audio.max_trailing_silence_frames,
        gain: cfg.audio.gain,
    };

    let (mut supervisor, mut notices) = SessionSupervisor::new(
        args.room.clone(),
        args.username.clone(),
        chunker_config,
        Arc::new(channel.clone()),
        Box::new(|events| Box::new(LocalPeerTransport::new(events)) as Box<dyn PeerTransport>),
        Box::new(|| Box::new(ScriptedCapture::new(64)) as Box<dyn CaptureSource>),
    );

    supervisor.join(&channel, &args.password).await?;

    let (command_tx, command_rx) = mpsc::channel(4);
    let supervisor_task = tokio::spawn(supervisor.run(channel, command_rx));

    // Surface notices until Ctrl-C, then hang up
    loop {
        tokio::select! {
            Some(notice) = notices.recv() => match notice {
                CallNotice::Connected => info!("Call connected"),
                CallNotice::PeerJoined { peer_id } => info!("Peer joined: {}", peer_id),
                CallNotice::PeerLeft { peer_id } => info!("Peer left: {}", peer_id),
                CallNotice::Transcription { participant_id, text } => {
                    println!("{}: {}", participant_id, text);
                }
                CallNotice::RemoteEnded => {
                    info!("The other participant hung up");
                    break;
                }
                CallNotice::Failed { reason } => {
                    warn!("Call failed: {}", reason);
                    break;
                }
                CallNotice::RelayLost => {
                    warn!("Lost connection to the relay");
                    break;
                }
                CallNotice::Ended => break,
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Hanging up");
                let _ = command_tx.send(SupervisorCommand::HangUp).await;
            }
        }
    }

    let _ = command_tx.send(SupervisorCommand::Shutdown).await;
    let _ = supervisor_task.await;

    Ok(())
}
