//! Protobuf messages exchanged with the device.
//!
//! Defines the message types using prost derive macros, mirroring the
//! `org.ryderrobots.ros2.serial` schema the firmware is built against.
//! Field tags follow declaration order in that schema.

use std::fmt;

use prost::Message;
use serde::Serialize;

use crate::protocol::OpCode;

/// Request sent to the device.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct Request {
    /// Operation code, see [`OpCode`].
    #[prost(int32, tag = "1")]
    pub op: i32,

    /// Operation-specific body.
    #[prost(oneof = "request::Data", tags = "2")]
    pub data: Option<request::Data>,
}

/// Nested types for [`Request`].
pub mod request {
    use serde::Serialize;

    /// Request body.
    #[derive(Clone, PartialEq, prost::Oneof, Serialize)]
    pub enum Data {
        /// One-shot monitor query.
        #[prost(message, tag = "2")]
        Monitor(super::Monitor),
    }
}

/// Monitor body: query the current value instead of subscribing.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct Monitor {
    #[prost(bool, tag = "1")]
    pub is_request: bool,
}

impl Request {
    /// Build a one-shot monitor request for any op code.
    pub fn monitor(op: impl Into<i32>) -> Self {
        Self {
            op: op.into(),
            data: Some(request::Data::Monitor(Monitor { is_request: true })),
        }
    }

    /// Request a raw IMU reading.
    pub fn raw_imu() -> Self {
        Self::monitor(OpCode::MspRawImu)
    }

    /// Request the device feature list.
    pub fn features() -> Self {
        Self::monitor(OpCode::MspIdent)
    }

    /// Whether this is a one-shot monitor query.
    pub fn is_monitor_request(&self) -> bool {
        matches!(
            self.data,
            Some(request::Data::Monitor(Monitor { is_request: true }))
        )
    }
}

/// Response returned by the device.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct Response {
    /// Op code of the answered operation, or 400 for a device error.
    #[prost(int32, tag = "1")]
    pub op: i32,

    /// Operation-specific payload.
    #[prost(oneof = "response::Data", tags = "2, 3")]
    pub data: Option<response::Data>,
}

/// Nested types for [`Response`].
pub mod response {
    use serde::Serialize;

    /// Response payload.
    #[derive(Clone, PartialEq, prost::Oneof, Serialize)]
    pub enum Data {
        #[prost(message, tag = "2")]
        MspRawImu(super::MspRawImu),
        #[prost(message, tag = "3")]
        BadRequest(super::BadRequest),
    }
}

/// IMU reading.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct MspRawImu {
    #[prost(message, optional, tag = "1")]
    pub orientation: Option<Quaternion>,
    /// rad/s
    #[prost(message, optional, tag = "2")]
    pub angular_velocity: Option<Vector3>,
    /// g
    #[prost(message, optional, tag = "3")]
    pub linear_acceleration: Option<Vector3>,
}

#[derive(Clone, Copy, PartialEq, Message, Serialize)]
pub struct Quaternion {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, tag = "2")]
    pub y: f32,
    #[prost(float, tag = "3")]
    pub z: f32,
    #[prost(float, tag = "4")]
    pub w: f32,
}

#[derive(Clone, Copy, PartialEq, Message, Serialize)]
pub struct Vector3 {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, tag = "2")]
    pub y: f32,
    #[prost(float, tag = "3")]
    pub z: f32,
}

/// Device-reported error payload.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct BadRequest {
    #[prost(enumeration = "ErrorType", tag = "1")]
    pub etype: i32,
}

/// Error kinds the firmware reports.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[repr(i32)]
pub enum ErrorType {
    EtUnknown = 0,
    EtMaxLenExceed = 1,
    EtServiceUnavailable = 2,
    EtUnknownOperation = 3,
    EtInvalidRequest = 4,
    EtSerialFailure = 5,
}

/// Device component status.
///
/// Mirrors the firmware enum; no message in this protocol carries it yet.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[repr(i32)]
pub enum Status {
    Unknown = 0,
    Ready = 1,
    NotAvailable = 2,
}

/// Device error kind, keeping codes this client does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Known(ErrorType),
    Other(i32),
}

impl ErrorKind {
    /// Map a raw `etype` value.
    pub fn from_code(code: i32) -> Self {
        match ErrorType::try_from(code) {
            Ok(etype) => ErrorKind::Known(etype),
            Err(_) => ErrorKind::Other(code),
        }
    }

    /// Raw `etype` value.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Known(etype) => etype as i32,
            ErrorKind::Other(code) => code,
        }
    }

    /// Schema constant name, `UNKNOWN` for unlisted codes.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Known(ErrorType::EtUnknown) => "ET_UNKNOWN",
            ErrorKind::Known(ErrorType::EtMaxLenExceed) => "ET_MAX_LEN_EXCEED",
            ErrorKind::Known(ErrorType::EtServiceUnavailable) => "ET_SERVICE_UNAVAILABLE",
            ErrorKind::Known(ErrorType::EtUnknownOperation) => "ET_UNKNOWN_OPERATION",
            ErrorKind::Known(ErrorType::EtInvalidRequest) => "ET_INVALID_REQUEST",
            ErrorKind::Known(ErrorType::EtSerialFailure) => "ET_SERIAL_FAILURE",
            ErrorKind::Other(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Typed view of a decoded response.
///
/// A device error is data carried by a successful call, never a
/// [`crate::MousebotError`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply<'a> {
    /// IMU reading.
    RawImu(&'a MspRawImu),
    /// The device rejected the request.
    DeviceError(ErrorKind),
    /// Decoded, but no payload present.
    Empty,
}

impl Response {
    /// Build a response carrying an IMU reading.
    pub fn raw_imu(imu: MspRawImu) -> Self {
        Self {
            op: OpCode::MspRawImu.code(),
            data: Some(response::Data::MspRawImu(imu)),
        }
    }

    /// Build a device error response.
    pub fn bad_request(etype: ErrorType) -> Self {
        Self {
            op: OpCode::BadRequest.code(),
            data: Some(response::Data::BadRequest(BadRequest {
                etype: etype as i32,
            })),
        }
    }

    /// Typed view of the payload.
    pub fn reply(&self) -> Reply<'_> {
        match &self.data {
            Some(response::Data::MspRawImu(imu)) => Reply::RawImu(imu),
            Some(response::Data::BadRequest(bad)) => {
                Reply::DeviceError(ErrorKind::from_code(bad.etype))
            }
            None => Reply::Empty,
        }
    }

    /// Device error kind, if the device rejected the request.
    pub fn device_error(&self) -> Option<ErrorKind> {
        match self.reply() {
            Reply::DeviceError(kind) => Some(kind),
            _ => None,
        }
    }

    /// Known op code of this response.
    pub fn op_code(&self) -> Option<OpCode> {
        OpCode::from_code(self.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_imu() -> MspRawImu {
        MspRawImu {
            orientation: Some(Quaternion {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                w: 1.0,
            }),
            angular_velocity: Some(Vector3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }),
            linear_acceleration: Some(Vector3 {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            }),
        }
    }

    #[test]
    fn test_status_codes_match_firmware() {
        assert_eq!(Status::try_from(1).ok(), Some(Status::Ready));
        assert_eq!(Status::NotAvailable as i32, 2);
        assert!(Status::try_from(3).is_err());
    }

    #[test]
    fn test_raw_imu_request_round_trip() {
        let request = Request::raw_imu();
        assert_eq!(request.op, 102);
        assert!(request.is_monitor_request());

        let decoded = Request::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_raw_opcode_request_round_trip() {
        let request = Request::monitor(105);

        let decoded = Request::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.op, 105);
    }

    #[test]
    fn test_reply_raw_imu() {
        let response = Response::raw_imu(level_imu());

        match response.reply() {
            Reply::RawImu(imu) => {
                assert_eq!(imu.orientation.unwrap().w, 1.0);
                assert_eq!(imu.linear_acceleration.unwrap().z, 1.0);
            }
            other => panic!("expected IMU reply, got {other:?}"),
        }
        assert_eq!(response.op_code(), Some(OpCode::MspRawImu));
        assert_eq!(response.device_error(), None);
    }

    #[test]
    fn test_reply_device_error() {
        let response = Response::bad_request(ErrorType::EtUnknownOperation);

        assert_eq!(response.op, 400);
        let kind = response.device_error().unwrap();
        assert_eq!(kind.code(), 3);
        assert_eq!(kind.name(), "ET_UNKNOWN_OPERATION");
    }

    #[test]
    fn test_reply_empty() {
        let response = Response {
            op: 102,
            data: None,
        };
        assert_eq!(response.reply(), Reply::Empty);
    }

    #[test]
    fn test_error_kind_keeps_unknown_codes() {
        let kind = ErrorKind::from_code(42);
        assert_eq!(kind, ErrorKind::Other(42));
        assert_eq!(kind.to_string(), "UNKNOWN (42)");

        assert_eq!(
            ErrorKind::from_code(5),
            ErrorKind::Known(ErrorType::EtSerialFailure)
        );
    }

    #[test]
    fn test_default_response_is_empty() {
        let response = Response::decode(&b""[..]).unwrap();
        assert_eq!(response.op, 0);
        assert_eq!(response.reply(), Reply::Empty);
    }
}
