pub mod handshake;

use crate::config::ClientConfig;
use crate::error::{BootstrapError, Result};
use crate::torrent::tracker::PeerEndpoint;
use handshake::Handshake;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

/// Sends our handshake, reads the peer's, and checks it is for the same torrent.
///
/// Any failure means the connection should be dropped by the caller.
pub async fn exchange_handshake<S>(
    stream: &mut S,
    info_hash: [u8; 20],
    peer_id: [u8; 20],
) -> Result<Handshake>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Handshake::new(info_hash, peer_id).write(stream).await?;

    let remote = Handshake::read(stream).await?;
    remote.validate(&info_hash)?;

    Ok(remote)
}

/// Opens a TCP connection to a peer and authenticates it with a handshake.
///
/// Only the connect is bounded by `connect_timeout`; the handshake itself
/// relies on the peer closing or answering.
pub async fn connect_to_peer(
    endpoint: PeerEndpoint,
    info_hash: [u8; 20],
    peer_id: [u8; 20],
    config: &ClientConfig,
) -> Result<(TcpStream, Handshake)> {
    debug!("Connecting to {}...", endpoint);

    let mut stream = timeout(config.connect_timeout, TcpStream::connect(endpoint.socket_addr()))
        .await
        .map_err(|_| BootstrapError::Timeout(config.connect_timeout))??;

    let remote = exchange_handshake(&mut stream, info_hash, peer_id).await?;
    info!(
        "{}: Handshake successful (peer id {})",
        endpoint,
        String::from_utf8_lossy(&remote.peer_id)
    );

    Ok((stream, remote))
}
