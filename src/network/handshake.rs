use crate::error::{BootstrapError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Protocol identifier sent by every BitTorrent peer.
pub const PROTOCOL_STRING: &str = "BitTorrent protocol";

/// Capability bits between the label and the info hash. Always zero here.
pub const RESERVED_LEN: usize = 8;

/// Reserved bytes + info hash + peer id: everything after the label.
pub const HANDSHAKE_TAIL_LEN: usize = RESERVED_LEN + 20 + 20;

/// Represents the initial Handshake message exchanged between peers.
///
/// The handshake is the first message sent immediately after establishing a TCP connection.
/// It ensures that both peers are communicating via the BitTorrent protocol and are
/// interested in the same torrent (verified via the Info Hash).
///
/// Structure (`49 + label length` bytes, 68 for the standard label):
/// - 1 byte:  Length of the protocol identifier.
/// - N bytes: Protocol identifier string ("BitTorrent protocol").
/// - 8 bytes: Reserved bytes (zero on write, ignored on read).
/// - 20 bytes: Info Hash (SHA-1 hash of the metainfo file).
/// - 20 bytes: Peer ID (Unique identifier for the sending client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Raw label bytes as sent on the wire. Not required to be UTF-8.
    pub protocol: Vec<u8>,
    pub info_hash: [u8; 20],
    pub peer_id: [u8; 20],
}

impl Handshake {
    /// Creates a new Handshake instance for the specific torrent.
    pub fn new(info_hash: [u8; 20], peer_id: [u8; 20]) -> Self {
        Self {
            protocol: PROTOCOL_STRING.as_bytes().to_vec(),
            info_hash,
            peer_id,
        }
    }

    /// Size of the serialized frame.
    pub fn frame_len(&self) -> usize {
        1 + self.protocol.len() + HANDSHAKE_TAIL_LEN
    }

    /// The label for display; invalid UTF-8 is replaced.
    pub fn protocol_lossy(&self) -> String {
        String::from_utf8_lossy(&self.protocol).into_owned()
    }

    /// Serializes the Handshake struct into one contiguous frame.
    ///
    /// Fails with a protocol error if the label does not fit the single
    /// length byte (more than 255 bytes) or is empty.
    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        let prelen = u8::try_from(self.protocol.len()).map_err(|_| {
            BootstrapError::Protocol(format!(
                "handshake protocol label is {} bytes, at most 255 allowed",
                self.protocol.len()
            ))
        })?;
        if prelen == 0 {
            return Err(BootstrapError::Protocol(
                "handshake protocol label cannot be empty".to_string(),
            ));
        }

        let mut bytes = Vec::with_capacity(self.frame_len());
        bytes.push(prelen);
        bytes.extend_from_slice(&self.protocol);
        bytes.extend_from_slice(&[0u8; RESERVED_LEN]);
        bytes.extend_from_slice(&self.info_hash);
        bytes.extend_from_slice(&self.peer_id);

        Ok(bytes)
    }

    /// Writes the whole frame with a single `write_all` and returns its length.
    ///
    /// Nothing is written if the frame cannot be encoded. Write errors are
    /// returned unchanged; nothing is retried.
    pub async fn write<W: AsyncWrite + Unpin>(&self, sink: &mut W) -> Result<usize> {
        let bytes = self.as_bytes()?;
        sink.write_all(&bytes).await?;
        sink.flush().await?;
        trace!("Handshake written: {} bytes", bytes.len());
        Ok(bytes.len())
    }

    /// Reads one handshake from the start of `source`.
    ///
    /// Reads the length byte, then the rest of the frame in one bounded
    /// read. A zero label length is a protocol error; running out of bytes
    /// is an I/O error (`UnexpectedEof`). Reserved bytes are not checked.
    /// There is no timeout here: wrap the source if a deadline is needed.
    pub async fn read<R: AsyncRead + Unpin>(source: &mut R) -> Result<Self> {
        let prelen = source.read_u8().await? as usize;
        if prelen == 0 {
            return Err(BootstrapError::Protocol(
                "handshake protocol label length cannot be 0".to_string(),
            ));
        }

        let mut buf = vec![0u8; prelen + HANDSHAKE_TAIL_LEN];
        source.read_exact(&mut buf).await?;

        let hash_start = prelen + RESERVED_LEN;
        let mut info_hash = [0u8; 20];
        let mut peer_id = [0u8; 20];
        info_hash.copy_from_slice(&buf[hash_start..hash_start + 20]);
        peer_id.copy_from_slice(&buf[hash_start + 20..]);

        let handshake = Self {
            protocol: buf[..prelen].to_vec(),
            info_hash,
            peer_id,
        };
        debug!(
            "Handshake received: label={:?} info_hash={}",
            handshake.protocol_lossy(),
            hex::encode(handshake.info_hash)
        );

        Ok(handshake)
    }

    /// Checks the remote side is serving the torrent we asked for.
    pub fn validate(&self, expected_info_hash: &[u8; 20]) -> Result<()> {
        if &self.info_hash != expected_info_hash {
            return Err(BootstrapError::Protocol(format!(
                "info hash mismatch: expected {}, got {}",
                hex::encode(expected_info_hash),
                hex::encode(self.info_hash)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    fn sample() -> Handshake {
        let mut info_hash = [0u8; 20];
        let mut peer_id = [0u8; 20];
        for i in 0..20 {
            info_hash[i] = i as u8;
            peer_id[i] = 0xff - i as u8;
        }
        Handshake::new(info_hash, peer_id)
    }

    #[test]
    fn frame_layout_is_exact() {
        let hs = sample();
        let bytes = hs.as_bytes().unwrap();

        assert_eq!(bytes.len(), 68);
        assert_eq!(bytes.len(), hs.frame_len());
        assert_eq!(bytes[0], 19);
        assert_eq!(&bytes[1..20], PROTOCOL_STRING.as_bytes());
        assert_eq!(&bytes[20..28], &[0u8; 8]);
        assert_eq!(&bytes[28..48], &hs.info_hash);
        assert_eq!(&bytes[48..68], &hs.peer_id);
    }

    #[test]
    fn frame_length_follows_label_length() {
        let mut hs = sample();
        hs.protocol = vec![b'x'; 255];
        let bytes = hs.as_bytes().unwrap();
        assert_eq!(bytes.len(), 49 + 255);
        assert_eq!(bytes[0], 255);
        assert!(bytes[256..264].iter().all(|b| *b == 0));
    }

    #[test]
    fn encode_rejects_label_longer_than_length_byte() {
        let mut hs = sample();
        hs.protocol = vec![b'x'; 256];
        assert!(matches!(hs.as_bytes(), Err(BootstrapError::Protocol(_))));

        hs.protocol = vec![b'x'; 300];
        assert!(matches!(hs.as_bytes(), Err(BootstrapError::Protocol(_))));
    }

    #[test]
    fn encode_rejects_empty_label() {
        let mut hs = sample();
        hs.protocol.clear();
        assert!(matches!(hs.as_bytes(), Err(BootstrapError::Protocol(_))));
    }

    #[tokio::test]
    async fn write_sends_nothing_for_oversized_label() {
        let mut hs = sample();
        hs.protocol = vec![b'x'; 256];
        let mut sink = Vec::new();

        let err = hs.write(&mut sink).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Protocol(_)));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let hs = sample();
        let (mut client, mut server) = tokio::io::duplex(256);

        let written = hs.write(&mut client).await.unwrap();
        assert_eq!(written, 68);

        let received = Handshake::read(&mut server).await.unwrap();
        assert_eq!(received, hs);
    }

    #[tokio::test]
    async fn read_accepts_custom_labels() {
        let mut hs = sample();
        hs.protocol = b"custom".to_vec();
        let bytes = hs.as_bytes().unwrap();

        let received = Handshake::read(&mut bytes.as_slice()).await.unwrap();
        assert_eq!(received.protocol, b"custom");
        assert_eq!(received.info_hash, hs.info_hash);
        assert_eq!(received.peer_id, hs.peer_id);
    }

    #[tokio::test]
    async fn non_utf8_label_survives_read_and_reencode() {
        let mut bytes = vec![2u8, 0xff, 0xfe];
        bytes.extend_from_slice(&[0u8; RESERVED_LEN]);
        bytes.extend_from_slice(&[4u8; 20]);
        bytes.extend_from_slice(&[5u8; 20]);

        let received = Handshake::read(&mut bytes.as_slice()).await.unwrap();
        assert_eq!(received.protocol, vec![0xff, 0xfe]);
        assert_eq!(received.protocol_lossy(), "\u{fffd}\u{fffd}");
        assert_eq!(received.as_bytes().unwrap(), bytes);
    }

    #[tokio::test]
    async fn read_rejects_zero_label_length() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&[0u8; 48]);

        let err = Handshake::read(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Protocol(_)));
    }

    #[tokio::test]
    async fn read_fails_on_short_frame() {
        let bytes = sample().as_bytes().unwrap();
        let truncated = &bytes[..67];

        let err = Handshake::read(&mut &truncated[..]).await.unwrap_err();
        match err {
            BootstrapError::Io(e) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_fails_on_empty_source() {
        let empty: &[u8] = &[];
        let err = Handshake::read(&mut &empty[..]).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Io(_)));
    }

    #[tokio::test]
    async fn read_ignores_reserved_bytes() {
        let hs = sample();
        let mut bytes = hs.as_bytes().unwrap();
        bytes[20..28].copy_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x05]);

        let received = Handshake::read(&mut bytes.as_slice()).await.unwrap();
        assert_eq!(received, hs);
    }

    #[tokio::test]
    async fn read_leaves_trailing_bytes_unread() {
        let hs = sample();
        let mut bytes = hs.as_bytes().unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 1, 2]);

        let mut source = bytes.as_slice();
        Handshake::read(&mut source).await.unwrap();
        assert_eq!(source, &[0, 0, 0, 1, 2]);
    }

    #[tokio::test]
    async fn write_surfaces_sink_errors() {
        let (mut client, server) = tokio::io::duplex(8);
        drop(server);

        let err = sample().write(&mut client).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Io(_)));
    }

    #[test]
    fn validate_compares_info_hash() {
        let hs = sample();
        assert!(hs.validate(&hs.info_hash).is_ok());
        assert!(matches!(
            hs.validate(&[9u8; 20]),
            Err(BootstrapError::Protocol(_))
        ));
    }
}
