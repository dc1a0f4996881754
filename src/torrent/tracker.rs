use crate::config::ClientConfig;
use crate::error::{BootstrapError, Result};
use crate::torrent::descriptor::TorrentDescriptor;
use crate::utils::url_encode;
use byteorder::{BigEndian, ReadBytesExt};
use serde::Deserialize;
use serde_bytes::ByteBuf;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tracing::{debug, info, warn};
use url::Url;

/// Bytes per peer in the compact format: 4 for the IPv4 address, 2 for the port.
pub const COMPACT_PEER_LEN: usize = 6;

/// One candidate peer decoded from a compact tracker response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerEndpoint {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl PeerEndpoint {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.address, self.port))
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl From<PeerEndpoint> for SocketAddr {
    fn from(endpoint: PeerEndpoint) -> Self {
        endpoint.socket_addr()
    }
}

/// Represents the response structure from an HTTP tracker.
///
/// Only the compact peer format is supported: `peers` must be a byte string.
/// A dictionary-style peer list fails to decode.
#[derive(Debug, Deserialize)]
pub struct TrackerResponse {
    /// Interval in seconds that the client should wait before sending the next announce.
    pub interval: Option<i64>,

    /// Packed `[ip(4)][port(2)]` records.
    pub peers: Option<ByteBuf>,

    /// Set instead of `peers` when the tracker refuses the announce.
    #[serde(rename = "failure reason")]
    pub failure_reason: Option<String>,
}

impl TrackerResponse {
    /// Decodes a bencoded tracker body.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        Ok(serde_bencode::from_bytes(body)?)
    }

    /// Turns the response into peer endpoints.
    pub fn peer_endpoints(&self) -> Result<Vec<PeerEndpoint>> {
        if let Some(reason) = &self.failure_reason {
            return Err(BootstrapError::TrackerFailure(reason.clone()));
        }

        let peers = self
            .peers
            .as_ref()
            .ok_or_else(|| BootstrapError::MalformedResponse("missing peers".to_string()))?;

        decode_compact_peers(peers)
    }
}

/// Decodes a compact peer list.
///
/// The length must be a multiple of 6. A trailing partial record fails the
/// whole decode rather than yielding a corrupt peer.
pub fn decode_compact_peers(peers: &[u8]) -> Result<Vec<PeerEndpoint>> {
    if peers.len() % COMPACT_PEER_LEN != 0 {
        return Err(BootstrapError::MalformedResponse(format!(
            "peers length {} is not a multiple of {}",
            peers.len(),
            COMPACT_PEER_LEN
        )));
    }

    let mut endpoints = Vec::with_capacity(peers.len() / COMPACT_PEER_LEN);
    for mut record in peers.chunks_exact(COMPACT_PEER_LEN) {
        let address = Ipv4Addr::from(record.read_u32::<BigEndian>()?);
        let port = record.read_u16::<BigEndian>()?;
        endpoints.push(PeerEndpoint::new(address, port));
    }

    Ok(endpoints)
}

/// Builds the announce URL for `descriptor`.
///
/// `info_hash` and `peer_id` are percent-encoded raw bytes. Any query
/// already on the announce URL (e.g. a passkey) is kept in front.
pub fn build_announce_url(
    descriptor: &TorrentDescriptor,
    peer_id: &[u8; 20],
    port: u16,
) -> Result<Url> {
    let mut url = Url::parse(&descriptor.announce)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BootstrapError::Config(format!(
            "unsupported tracker scheme: {}",
            url.scheme()
        )));
    }

    let params = format!(
        "info_hash={}&peer_id={}&port={}&uploaded=0&downloaded=0&compact=1&left={}",
        url_encode(&descriptor.info_hash),
        url_encode(peer_id),
        port,
        descriptor.length
    );

    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{}&{}", existing, params),
        _ => params,
    };
    url.set_query(Some(&query));

    Ok(url)
}

/// Announces to HTTP trackers and decodes the compact peer list they return.
///
/// Holds one `reqwest::Client` whose timeout bounds every announce.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl TrackerClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.tracker_timeout)
            .build()?;

        Ok(Self::with_http_client(client, config))
    }

    /// Uses a caller-built HTTP client. Its own timeout applies.
    pub fn with_http_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a single announce and returns the decoded response.
    ///
    /// Every failure is surfaced. No retries. A non-2xx HTTP status is an
    /// `Http` error even if the body would decode, so a tracker answering
    /// `500` with a peer list yields no peers.
    pub async fn announce(
        &self,
        descriptor: &TorrentDescriptor,
        peer_id: &[u8; 20],
    ) -> Result<TrackerResponse> {
        let url = build_announce_url(descriptor, peer_id, self.config.listen_port)?;
        debug!("Announcing to {}", url);

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response = TrackerResponse::from_bytes(&body)?;
        debug!("Tracker interval: {:?}", response.interval);
        Ok(response)
    }

    /// Asks the tracker for peers, degrading every failure to an empty list.
    ///
    /// The reason is logged; whether and when to retry is up to the caller.
    /// Use [`TrackerClient::announce`] to tell failures apart.
    pub async fn find_peers(
        &self,
        descriptor: &TorrentDescriptor,
        peer_id: &[u8; 20],
    ) -> Vec<PeerEndpoint> {
        let result = self
            .announce(descriptor, peer_id)
            .await
            .and_then(|response| response.peer_endpoints());

        match result {
            Ok(peers) => {
                info!("{} returned {} peers.", descriptor.announce, peers.len());
                peers
            }
            Err(e) => {
                warn!("Announce to {} failed: {}", descriptor.announce, e);
                Vec::new()
            }
        }
    }
}
