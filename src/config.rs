use std::time::Duration;

/// Port we advertise to trackers as our listening port.
pub const DEFAULT_LISTEN_PORT: u16 = 6666;

/// Hard cap on a single tracker announce, connect and body included.
pub const DEFAULT_TRACKER_TIMEOUT: Duration = Duration::from_secs(15);

/// How long to wait for a peer's TCP connect before giving up on it.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Settings shared by the tracker client and the peer connect helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub listen_port: u16,
    pub tracker_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            tracker_timeout: DEFAULT_TRACKER_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    pub fn with_tracker_timeout(mut self, timeout: Duration) -> Self {
        self.tracker_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
