use anyhow::Context;
use clap::Parser;
use p2p_bootstrap::{ClientConfig, TorrentDescriptor, TrackerClient, network, utils};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Maximum number of peers to try a handshake with.
const MAX_HANDSHAKE_ATTEMPTS: usize = 10;

/// Announce to a tracker and optionally handshake with the peers it returns.
#[derive(Debug, Parser)]
#[command(name = "p2p-bootstrap", version)]
struct Args {
    /// Tracker announce URL (http or https)
    announce: String,

    /// Info hash as 40 hex characters
    info_hash: String,

    /// Total content length in bytes
    length: u64,

    /// Port advertised to the tracker
    #[arg(short, long, default_value_t = p2p_bootstrap::config::DEFAULT_LISTEN_PORT)]
    port: u16,

    /// Tracker request timeout in seconds
    #[arg(long, default_value_t = 15)]
    tracker_timeout: u64,

    /// Peer connect timeout in seconds
    #[arg(long, default_value_t = 3)]
    connect_timeout: u64,

    /// Handshake with the returned peers
    #[arg(long)]
    handshake: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let descriptor = TorrentDescriptor::from_hex(&args.announce, &args.info_hash, args.length)
        .context("Invalid torrent descriptor")?;
    let config = ClientConfig::default()
        .with_listen_port(args.port)
        .with_tracker_timeout(Duration::from_secs(args.tracker_timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout));
    let peer_id = utils::generate_peer_id();

    info!("Info Hash: {}", hex::encode(descriptor.info_hash));
    info!("Peer ID:   {}", String::from_utf8_lossy(&peer_id));

    let client = TrackerClient::new(config).context("Failed to build HTTP client")?;
    let peers = client.find_peers(&descriptor, &peer_id).await;
    info!("Found {} peers.", peers.len());
    for peer in &peers {
        println!("{}", peer);
    }

    if !args.handshake {
        return Ok(());
    }

    for (i, peer) in peers.iter().enumerate().take(MAX_HANDSHAKE_ATTEMPTS) {
        info!(
            "Attempt {}/{}: handshaking with {}",
            i + 1,
            peers.len().min(MAX_HANDSHAKE_ATTEMPTS),
            peer
        );
        match network::connect_to_peer(*peer, descriptor.info_hash, peer_id, &config).await {
            Ok((_stream, remote)) => {
                println!("{} {}", peer, String::from_utf8_lossy(&remote.peer_id));
            }
            Err(e) => error!("{}: {}", peer, e),
        }
    }

    Ok(())
}
