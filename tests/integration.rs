//! Integration tests for mousebot-client.
//!
//! A simulated board sits on the far end of an in-memory stream and speaks
//! the same framing as the firmware.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::Instant;

use mousebot_client::codec::ProtoCodec;
use mousebot_client::protocol::{Framer, TERM_CHAR};
use mousebot_client::schema::{MspRawImu, Quaternion, Vector3};
use mousebot_client::transport::TopicConfig;
use mousebot_client::{
    CallState, Client, ErrorKind, ErrorType, MousebotError, OpCode, Reply, Request, Response,
};

/// Board simulator on the device end of a duplex stream.
struct Device {
    stream: DuplexStream,
    framer: Framer,
}

impl Device {
    fn new(stream: DuplexStream) -> Self {
        Self {
            stream,
            framer: Framer::new(),
        }
    }

    /// Read until one request frame arrives and decode it.
    async fn expect_request(&mut self) -> Request {
        let mut buf = [0u8; 64];
        loop {
            if let Some(frame) = self.framer.next_frame().into_frame() {
                return ProtoCodec::decode(&frame).unwrap();
            }
            let n = self.stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "client hung up");
            self.framer.feed(&buf[..n]);
        }
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    async fn respond(&mut self, response: &Response) {
        let mut bytes = ProtoCodec::encode(response).unwrap().to_vec();
        bytes.push(TERM_CHAR);
        self.send_raw(&bytes).await;
    }
}

fn pair() -> (Client<DuplexStream>, Device) {
    let (client_end, device_end) = duplex(1024);
    (Client::new(client_end), Device::new(device_end))
}

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

/// IMU request answered with a level, stationary reading.
#[tokio::test]
async fn test_imu_request_scenario() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        let request = device.expect_request().await;
        assert_eq!(request.op, 102);
        assert!(request.is_monitor_request());
        device.respond(&Response::raw_imu(level_imu())).await;
        device
    });

    let response = client.call(&Request::raw_imu()).await.unwrap();
    board.await.unwrap();

    assert_eq!(response.op, 102);
    assert_eq!(response.op_code(), Some(OpCode::MspRawImu));
    match response.reply() {
        Reply::RawImu(imu) => assert_eq!(imu, &level_imu()),
        other => panic!("expected IMU reading, got {other:?}"),
    }
    assert_eq!(client.state(), CallState::Decoded);
}

/// Device error is a successful call carrying an error payload.
#[tokio::test]
async fn test_unknown_operation_scenario() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        let request = device.expect_request().await;
        assert_eq!(request.op, 999);
        device
            .respond(&Response::bad_request(ErrorType::EtUnknownOperation))
            .await;
        device
    });

    let response = client.call(&Request::monitor(999)).await.unwrap();
    board.await.unwrap();

    assert_eq!(response.op, 400);
    let kind = response.device_error().unwrap();
    assert_eq!(kind.code(), 3);
    assert_eq!(kind, ErrorKind::Known(ErrorType::EtUnknownOperation));
}

/// Unlisted error codes still surface with their number.
#[tokio::test]
async fn test_unlisted_device_error_code() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        device.expect_request().await;
        let mut response = Response::bad_request(ErrorType::EtUnknown);
        if let Some(mousebot_client::schema::response::Data::BadRequest(bad)) =
            response.data.as_mut()
        {
            bad.etype = 42;
        }
        device.respond(&response).await;
        device
    });

    let response = client.call(&Request::raw_imu()).await.unwrap();
    board.await.unwrap();

    assert_eq!(response.device_error(), Some(ErrorKind::Other(42)));
}

/// Silence ends the call at the deadline, not before and not much after.
#[tokio::test(start_paused = true)]
async fn test_timeout_bounds() {
    let (client_end, _device_end) = duplex(1024);
    let timeout = Duration::from_secs(2);
    let mut client = Client::builder().timeout(timeout).build(client_end).unwrap();

    let started = Instant::now();
    let err = client.call(&Request::raw_imu()).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, MousebotError::Timeout { timeout: t } if t == timeout));
    assert!(err.is_retryable());
    assert!(elapsed >= timeout, "returned early after {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_millis(10));
}

/// Partial frame followed by silence is a timeout; the next call starts clean.
#[tokio::test(start_paused = true)]
async fn test_partial_frame_then_timeout() {
    let (mut client, mut device) = pair();
    let fresh = Response::raw_imu(level_imu());

    let board = tokio::spawn(async move {
        device.expect_request().await;
        device.send_raw(&[0x08, 0x66]).await;

        device.expect_request().await;
        device.respond(&fresh).await;
        device
    });

    let err = client
        .call_with_timeout(&Request::raw_imu(), Duration::from_millis(300))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(client.buffered(), 2);
    assert_eq!(client.state(), CallState::TimedOut);

    let response = client.call(&Request::raw_imu()).await.unwrap();
    board.await.unwrap();

    assert_eq!(response, Response::raw_imu(level_imu()));
    assert_eq!(client.state(), CallState::Decoded);
}

/// A lone terminator is an empty response, distinct from a timeout.
#[tokio::test]
async fn test_empty_response() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        device.expect_request().await;
        device.send_raw(&[TERM_CHAR]).await;
        device
    });

    let err = client.call(&Request::raw_imu()).await.unwrap_err();
    board.await.unwrap();

    assert!(matches!(err, MousebotError::EmptyResponse));
    assert!(!err.is_timeout());
    assert!(!err.is_retryable());
    assert_eq!(client.state(), CallState::DecodeFailed);
}

/// Undecodable frames report the raw bytes.
#[tokio::test]
async fn test_garbage_frame_keeps_raw_bytes() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        device.expect_request().await;
        device.send_raw(&[0xFF, TERM_CHAR]).await;
        device
    });

    let err = client.call(&Request::raw_imu()).await.unwrap_err();
    board.await.unwrap();

    match err {
        MousebotError::Decoding { raw, .. } => assert_eq!(raw, Bytes::from_static(&[0xFF])),
        other => panic!("expected decoding error, got {other:?}"),
    }
    assert_eq!(client.state(), CallState::DecodeFailed);
}

/// Response trickling in one byte at a time.
#[tokio::test]
async fn test_chunked_response() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        device.expect_request().await;
        let mut bytes = ProtoCodec::encode(&Response::raw_imu(level_imu()))
            .unwrap()
            .to_vec();
        bytes.push(TERM_CHAR);
        for byte in bytes {
            device.send_raw(&[byte]).await;
            tokio::task::yield_now().await;
        }
        device
    });

    let response = client.call(&Request::raw_imu()).await.unwrap();
    board.await.unwrap();

    assert_eq!(response, Response::raw_imu(level_imu()));
}

/// Device hanging up mid-call is a transport failure.
#[tokio::test]
async fn test_device_disconnect() {
    let (mut client, mut device) = pair();

    let board = tokio::spawn(async move {
        device.expect_request().await;
        drop(device);
    });

    let err = client.call(&Request::raw_imu()).await.unwrap_err();
    board.await.unwrap();

    assert!(matches!(err, MousebotError::ConnectionClosed));
    assert!(err.is_transport());
    assert_eq!(client.state(), CallState::TransportFailed);
}

/// Op code that would encode the terminator is rejected before sending.
#[tokio::test]
async fn test_terminator_in_request_rejected() {
    let (mut client, _device) = pair();

    let err = client.call(&Request::monitor(30)).await.unwrap_err();
    assert!(matches!(err, MousebotError::Encoding(_)));
    assert_eq!(client.state(), CallState::Idle);
}

/// Same exchange over the pub/sub bridge, board on another task.
#[tokio::test]
async fn test_topic_bridge_round_trip() {
    let (mut client, mut endpoint) = Client::builder()
        .connect_topics(TopicConfig::default())
        .unwrap();
    let publisher = endpoint.publisher();

    let board = tokio::spawn(async move {
        let message = endpoint.next_published().await.unwrap();

        let mut framer = Framer::new();
        let frames = framer.push(&message);
        assert_eq!(frames.len(), 1);
        assert!(framer.is_empty());
        assert_eq!(*message.last().unwrap(), TERM_CHAR);

        let request: Request = ProtoCodec::decode(&frames[0]).unwrap();
        assert_eq!(request, Request::raw_imu());

        // Reply split across two topic messages
        let mut reply = ProtoCodec::encode(&Response::raw_imu(level_imu()))
            .unwrap()
            .to_vec();
        reply.push(TERM_CHAR);
        let tail = reply.split_off(3);
        publisher.publish(reply).await.unwrap();
        publisher.publish(tail).await.unwrap();

        endpoint
    });

    let response = client.call(&Request::raw_imu()).await.unwrap();
    let mut endpoint = board.await.unwrap();

    assert_eq!(response, Response::raw_imu(level_imu()));

    // Exactly one write per call
    let extra = tokio::time::timeout(Duration::from_millis(20), endpoint.next_published()).await;
    assert!(extra.is_err());
}
