//! Transport module - byte streams to the device.
//!
//! The client accepts any `AsyncRead + AsyncWrite + Unpin` stream. Two are
//! provided:
//! - USB serial port (feature `serial`)
//! - Publish/subscribe topic pair mirroring a serial line

#[cfg(feature = "serial")]
pub mod serial;
pub mod topic;

use crate::protocol::BAUD_RATE;

pub use topic::{topic_pair, TopicBridge, TopicEndpoint, TopicPublisher};

/// Default serial device of the board.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";

/// Default topic carrying client writes.
pub const SERIAL_WRITE_TOPIC: &str = "/serial_write";

/// Default topic carrying device output.
pub const SERIAL_READ_TOPIC: &str = "/serial_read";

/// Default per-direction queue depth of the topic bridge.
pub const DEFAULT_TOPIC_CAPACITY: usize = 64;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub port: String,
    /// Line speed. The firmware only speaks [`BAUD_RATE`].
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Settings for the given port at the firmware baud rate.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: BAUD_RATE,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERIAL_PORT)
    }
}

/// Topic names for the pub/sub bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    /// Topic the client's request bytes are published on.
    pub write_topic: String,
    /// Topic the device's response bytes arrive on.
    pub read_topic: String,
    /// Messages each direction may queue before senders wait.
    pub capacity: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            write_topic: SERIAL_WRITE_TOPIC.to_string(),
            read_topic: SERIAL_READ_TOPIC.to_string(),
            capacity: DEFAULT_TOPIC_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 115_200);
    }

    #[test]
    fn test_topic_config_defaults() {
        let config = TopicConfig::default();
        assert_eq!(config.write_topic, "/serial_write");
        assert_eq!(config.read_topic, "/serial_read");
        assert_eq!(config.capacity, 64);
    }
}
