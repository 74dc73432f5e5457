//! Direct USB serial transport.
//!
//! The firmware listens at a fixed 115200 baud, 8 data bits, no parity,
//! 1 stop bit. Opening the port resets the board, see
//! [`crate::ClientConfig::settle_delay`].
//!
//! # Example
//!
//! ```ignore
//! use mousebot_client::transport::{serial, SerialConfig};
//!
//! let stream = serial::open(&SerialConfig::new("/dev/ttyACM0"))?;
//! ```

use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};

pub use tokio_serial::SerialStream;

use super::SerialConfig;
use crate::error::Result;

/// Open and configure a serial port.
///
/// # Errors
///
/// Returns [`crate::MousebotError::Serial`] if the port does not exist, is
/// busy, or rejects the line settings.
pub fn open(config: &SerialConfig) -> Result<SerialStream> {
    let stream = tokio_serial::new(config.port.as_str(), config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()?;

    tracing::info!(
        port = %config.port,
        baud = config.baud_rate,
        "Opened serial port"
    );

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MousebotError;

    #[tokio::test]
    async fn test_open_missing_port_fails() {
        let config = SerialConfig::new("/dev/mousebot-does-not-exist");

        let err = open(&config).unwrap_err();
        assert!(matches!(err, MousebotError::Serial(_)));
        assert!(err.is_transport());
    }
}
