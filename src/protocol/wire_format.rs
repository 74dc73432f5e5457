//! Wire format constants.
//!
//! Every message on the link, in both directions, is framed as:
//! ```text
//! ┌─────────────────────────────┬──────┐
//! │ protobuf-encoded message    │ 0x1E │
//! │ N bytes, never contains 0x1E│ RS   │
//! └─────────────────────────────┴──────┘
//! ```

use std::fmt;
use std::time::Duration;

/// Frame terminator (ASCII record separator).
pub const TERM_CHAR: u8 = 0x1E;

/// Fixed serial line speed of the device firmware.
pub const BAUD_RATE: u32 = 115_200;

/// Default wait for a response frame.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default wait after opening a serial port; the board resets on connect.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Operation codes understood by the device.
///
/// Monitor operations sit in the 1xx range, commands in 2xx, errors in 4xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OpCode {
    /// Feature list. Not yet answered by the firmware.
    MspIdent = 100,
    /// Raw IMU reading: orientation, angular velocity, linear acceleration.
    MspRawImu = 102,
    /// Set or monitor motors.
    MspMotor = 104,
    /// Range sensors.
    MspRawSensors = 105,
    /// Set motors.
    MspSetRawRc = 200,
    /// Response op code of a device-reported error.
    BadRequest = 400,
}

impl OpCode {
    /// Numeric value as carried in the `op` field.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a known op code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            100 => Some(OpCode::MspIdent),
            102 => Some(OpCode::MspRawImu),
            104 => Some(OpCode::MspMotor),
            105 => Some(OpCode::MspRawSensors),
            200 => Some(OpCode::MspSetRawRc),
            400 => Some(OpCode::BadRequest),
            _ => None,
        }
    }

    /// Constant-style name, as used in firmware docs.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::MspIdent => "MSP_IDENT",
            OpCode::MspRawImu => "MSP_RAW_IMU",
            OpCode::MspMotor => "MSP_MOTOR",
            OpCode::MspRawSensors => "MSP_RAW_SENSORS",
            OpCode::MspSetRawRc => "MSP_SET_RAW_RC",
            OpCode::BadRequest => "BAD_REQUEST",
        }
    }
}

impl From<OpCode> for i32 {
    fn from(op: OpCode) -> Self {
        op.code()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
