use std::time::Duration;
use thiserror::Error;

/// Every failure the handshake codec and the tracker client can produce.
///
/// The codec hands these straight back to its caller. The tracker client's
/// `find_peers` logs them and degrades to an empty peer list instead.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Short read, closed connection or a failed write on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote side sent something no compliant peer would send.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Bad local input, e.g. an announce URL that does not parse.
    #[error("Config error: {0}")]
    Config(String),

    /// Connection failure or non-success status talking to the tracker.
    #[error("HTTP: {0}")]
    Http(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Tracker body could not be decoded into a usable peer list.
    #[error("Malformed tracker response: {0}")]
    MalformedResponse(String),

    /// Tracker answered, but with a `failure reason`.
    #[error("Tracker failure: {0}")]
    TrackerFailure(String),
}

impl From<reqwest::Error> for BootstrapError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<url::ParseError> for BootstrapError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid announce URL: {}", err))
    }
}

impl From<serde_bencode::Error> for BootstrapError {
    fn from(err: serde_bencode::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
