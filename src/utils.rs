use rand::Rng;
use url::form_urlencoded;

/// Generates a unique 20-byte Peer ID for this client instance.
///
/// Following the Azureus-style convention:
/// - First 8 bytes: `-PB0100-` (Client ID 'PB' and Version '0100').
/// - Last 12 bytes: Random alphanumeric characters to ensure uniqueness in the swarm.
pub fn generate_peer_id() -> [u8; 20] {
    const PREFIX: &[u8; 8] = b"-PB0100-";
    const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    let mut rng = rand::thread_rng();
    let mut peer_id = [0u8; 20];

    peer_id[..8].copy_from_slice(PREFIX);
    for byte in peer_id[8..].iter_mut() {
        *byte = CHARSET[rng.gen_range(0..CHARSET.len())];
    }

    peer_id
}

/// Percent-encodes an opaque byte string for an HTTP query parameter.
///
/// `info_hash` and `peer_id` go to the tracker as raw bytes, never hex.
pub fn url_encode(data: &[u8]) -> String {
    form_urlencoded::byte_serialize(data).collect()
}
