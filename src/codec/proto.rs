//! Protobuf codec using `prost`.
//!
//! Encoded payloads are checked against the frame terminator: the link has
//! no escaping, so a payload containing [`TERM_CHAR`] would be split by the
//! device and cannot be sent.
//!
//! # Example
//!
//! ```
//! use mousebot_client::codec::ProtoCodec;
//! use mousebot_client::schema::Request;
//!
//! let request = Request::raw_imu();
//! let encoded = ProtoCodec::encode_request(&request).unwrap();
//! let decoded: Request = ProtoCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, request);
//! ```

use bytes::Bytes;
use prost::Message;

use crate::error::{MousebotError, Result};
use crate::protocol::TERM_CHAR;
use crate::schema::{Request, Response};

/// Protobuf codec for device messages.
pub struct ProtoCodec;

impl ProtoCodec {
    /// Encode a message to protobuf bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MousebotError::Encoding`] if the encoding contains the
    /// frame terminator.
    pub fn encode<M: Message>(message: &M) -> Result<Bytes> {
        let encoded = message.encode_to_vec();

        if let Some(pos) = encoded.iter().position(|&b| b == TERM_CHAR) {
            return Err(MousebotError::Encoding(format!(
                "payload contains terminator 0x{TERM_CHAR:02X} at offset {pos}"
            )));
        }

        Ok(Bytes::from(encoded))
    }

    /// Validate and encode a request descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MousebotError::Encoding`] for a non-positive op code or an
    /// encoding that contains the terminator.
    pub fn encode_request(request: &Request) -> Result<Bytes> {
        if request.op <= 0 {
            return Err(MousebotError::Encoding(format!(
                "invalid op code {}",
                request.op
            )));
        }
        Self::encode(request)
    }

    /// Decode protobuf bytes to a message.
    ///
    /// # Errors
    ///
    /// Returns [`MousebotError::Decoding`] carrying a copy of the input.
    pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M> {
        M::decode(bytes).map_err(|source| MousebotError::Decoding {
            source,
            raw: Bytes::copy_from_slice(bytes),
        })
    }

    /// Decode a response frame without copying on success.
    pub fn decode_response(frame: Bytes) -> Result<Response> {
        Response::decode(frame.clone())
            .map_err(|source| MousebotError::Decoding { source, raw: frame })
    }
}
