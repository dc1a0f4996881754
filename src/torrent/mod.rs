pub mod descriptor;
pub mod tracker;

pub use descriptor::TorrentDescriptor;
pub use tracker::{PeerEndpoint, TrackerClient, TrackerResponse};
