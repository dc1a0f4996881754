use crate::error::{BootstrapError, Result};

/// The slice of torrent metadata a tracker announce needs.
///
/// Parsing `.torrent` files is someone else's job; callers build this
/// from whatever metadata source they have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentDescriptor {
    /// The URL of the tracker to announce to.
    pub announce: String,

    /// SHA-1 of the bencoded `info` dictionary.
    pub info_hash: [u8; 20],

    /// Total content size in bytes. Sent as `left` since nothing is downloaded yet.
    pub length: u64,
}

impl TorrentDescriptor {
    pub fn new(announce: impl Into<String>, info_hash: [u8; 20], length: u64) -> Self {
        Self {
            announce: announce.into(),
            info_hash,
            length,
        }
    }

    /// Builds a descriptor from a 40-character hex info hash.
    pub fn from_hex(announce: impl Into<String>, info_hash_hex: &str, length: u64) -> Result<Self> {
        let bytes = hex::decode(info_hash_hex.trim())
            .map_err(|e| BootstrapError::Config(format!("invalid info hash hex: {}", e)))?;

        let info_hash: [u8; 20] = bytes.as_slice().try_into().map_err(|_| {
            BootstrapError::Config(format!(
                "info hash must be 20 bytes, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self::new(announce, info_hash, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_decodes_info_hash() {
        let descriptor = TorrentDescriptor::from_hex(
            "http://tracker.example/ann",
            "d69f91e6b2ae4c542468d1073a71d4ea13879a7f",
            1000,
        )
        .unwrap();

        assert_eq!(descriptor.announce, "http://tracker.example/ann");
        assert_eq!(descriptor.info_hash[0], 0xd6);
        assert_eq!(descriptor.info_hash[19], 0x7f);
        assert_eq!(descriptor.length, 1000);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = TorrentDescriptor::from_hex("http://t/ann", "abcd", 1).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        let err = TorrentDescriptor::from_hex("http://t/ann", &"zz".repeat(20), 1).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }
}
