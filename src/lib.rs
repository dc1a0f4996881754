//! Peer discovery and session bootstrap for BitTorrent.
//!
//! Two leaf pieces: the handshake codec in [`network::handshake`] and the
//! HTTP tracker client in [`torrent::tracker`]. A caller announces to the
//! tracker, then handshakes with the peers it gets back.

pub mod config;
pub mod error;
pub mod network;
pub mod torrent;
pub mod utils;

pub use config::ClientConfig;
pub use error::{BootstrapError, Result};
pub use network::handshake::Handshake;
pub use torrent::{PeerEndpoint, TorrentDescriptor, TrackerClient, TrackerResponse};
