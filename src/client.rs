//! Client builder and request/response cycle.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring timeouts and
//! connecting a transport. The [`Client`] runs one exchange at a time:
//! 1. Reset the framer (no carry-over between calls)
//! 2. Encode the request
//! 3. Write payload + terminator
//! 4. Read until a frame completes or the deadline passes
//! 5. Decode the frame
//!
//! # Example
//!
//! ```ignore
//! use mousebot_client::{Client, Request};
//! use mousebot_client::transport::SerialConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::builder()
//!         .timeout(std::time::Duration::from_secs(1))
//!         .connect_serial(&SerialConfig::new("/dev/ttyACM0"))
//!         .await?;
//!
//!     let response = client.call(&Request::raw_imu()).await?;
//!     println!("{:?}", response.reply());
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::codec::ProtoCodec;
use crate::error::{MousebotError, Result};
use crate::protocol::{FrameEvent, Framer, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT, TERM_CHAR};
use crate::schema::{Request, Response};
use crate::transport::{topic_pair, TopicBridge, TopicConfig, TopicEndpoint};

/// Default read buffer size.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 256;

/// Configuration for a client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long `call` waits for a terminator.
    pub timeout: Duration,
    /// Wait after opening a serial port before the first request.
    pub settle_delay: Duration,
    /// Size of the buffer each transport read fills.
    pub read_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl ClientConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(MousebotError::Config("timeout must be positive".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(MousebotError::Config(
                "read buffer size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Where the current or last call stands.
///
/// `Decoded`, `TimedOut`, `TransportFailed` and `DecodeFailed` are terminal;
/// the next call starts again from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Sending,
    AwaitingFrame,
    Decoded,
    TimedOut,
    TransportFailed,
    DecodeFailed,
}

impl CallState {
    /// Check if the call has finished.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallState::Decoded
                | CallState::TimedOut
                | CallState::TransportFailed
                | CallState::DecodeFailed
        )
    }

    fn after_error(err: &MousebotError) -> Self {
        match err {
            MousebotError::Timeout { .. } => CallState::TimedOut,
            MousebotError::EmptyResponse | MousebotError::Decoding { .. } => {
                CallState::DecodeFailed
            }
            _ => CallState::TransportFailed,
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Builder for configuring and creating a client.
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the response timeout.
    ///
    /// Default: 2 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the wait after opening a serial port.
    ///
    /// Default: 2 seconds
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Set the read buffer size.
    ///
    /// Default: 256
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Build a client over an already connected stream.
    pub fn build<S>(self, stream: S) -> Result<Client<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.config.validate()?;
        Ok(Client::with_config(stream, self.config))
    }

    /// Build a client over a new topic bridge.
    ///
    /// Returns the endpoint the pub/sub side uses.
    pub fn connect_topics(
        self,
        topics: TopicConfig,
    ) -> Result<(Client<TopicBridge>, TopicEndpoint)> {
        let (bridge, endpoint) = topic_pair(topics);
        Ok((self.build(bridge)?, endpoint))
    }

    /// Open a serial port, wait for the board to come up, and build.
    #[cfg(feature = "serial")]
    pub async fn connect_serial(
        self,
        serial: &crate::transport::SerialConfig,
    ) -> Result<Client<crate::transport::serial::SerialStream>> {
        self.config.validate()?;
        let stream = crate::transport::serial::open(serial)?;

        if !self.config.settle_delay.is_zero() {
            tracing::debug!(delay = ?self.config.settle_delay, "Waiting for board reset");
            tokio::time::sleep(self.config.settle_delay).await;
        }

        self.build(stream)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Request/response client over a byte stream.
///
/// Holds at most one outstanding request. The framer is private to the
/// client and only touched from `call`.
pub struct Client<S> {
    /// Underlying transport.
    stream: S,
    /// Inbound frame accumulator.
    framer: Framer,
    /// Scratch buffer for transport reads.
    read_buf: Vec<u8>,
    config: ClientConfig,
    state: CallState,
}

impl Client<()> {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a client with default configuration.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, ClientConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(stream: S, config: ClientConfig) -> Self {
        Self {
            stream,
            framer: Framer::new(),
            read_buf: vec![0u8; config.read_buffer_size.max(1)],
            config,
            state: CallState::Idle,
        }
    }

    /// Send a request and wait for its response, using the configured timeout.
    ///
    /// A device-reported error decodes as a successful `Response`; inspect
    /// [`Response::reply`].
    pub async fn call(&mut self, request: &Request) -> Result<Response> {
        let timeout = self.config.timeout;
        self.call_with_timeout(request, timeout).await
    }

    /// Send a request and wait at most `timeout` for its response.
    pub async fn call_with_timeout(
        &mut self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response> {
        self.set_state(CallState::Idle);

        let dropped = self.framer.reset();
        if dropped > 0 {
            tracing::warn!(dropped, "Discarded residual bytes from previous exchange");
        }

        let payload = ProtoCodec::encode_request(request)?;

        // None when the timeout is too large to represent: wait unbounded
        let deadline = Instant::now().checked_add(timeout);

        self.set_state(CallState::Sending);
        if let Err(e) = self.send_frame(&payload, deadline, timeout).await {
            self.set_state(CallState::after_error(&e));
            return Err(e);
        }
        tracing::debug!(op = request.op, bytes = payload.len(), "Sent request");

        self.set_state(CallState::AwaitingFrame);
        let result = self
            .await_frame(deadline, timeout)
            .await
            .and_then(|frame| {
                if frame.is_empty() {
                    return Err(MousebotError::EmptyResponse);
                }
                ProtoCodec::decode_response(frame)
            });

        match &result {
            Ok(response) => {
                tracing::debug!(op = response.op, "Decoded response");
                self.set_state(CallState::Decoded);
            }
            Err(e) => self.set_state(CallState::after_error(e)),
        }

        result
    }

    /// Write payload followed by exactly one terminator, as one write.
    async fn send_frame(
        &mut self,
        payload: &[u8],
        deadline: Option<Instant>,
        timeout: Duration,
    ) -> Result<()> {
        let mut frame = BytesMut::with_capacity(payload.len() + 1);
        frame.extend_from_slice(payload);
        frame.put_u8(TERM_CHAR);

        let stream = &mut self.stream;
        let write = async {
            stream.write_all(&frame).await?;
            stream.flush().await
        };
        match until(deadline, write).await {
            Some(result) => Ok(result?),
            None => Err(MousebotError::Timeout { timeout }),
        }
    }

    /// Read until the framer completes a frame or the deadline passes.
    async fn await_frame(&mut self, deadline: Option<Instant>, timeout: Duration) -> Result<Bytes> {
        loop {
            let n = match until(deadline, self.stream.read(&mut self.read_buf)).await {
                None => return Err(MousebotError::Timeout { timeout }),
                Some(Ok(0)) => return Err(MousebotError::ConnectionClosed),
                Some(Ok(n)) => n,
                Some(Err(e)) => return Err(MousebotError::Transport(e)),
            };
            tracing::trace!(bytes = n, "Received chunk");

            if let FrameEvent::Complete(frame) = self.framer.feed(&self.read_buf[..n]) {
                if !self.framer.is_empty() {
                    tracing::debug!(
                        trailing = self.framer.len(),
                        "Bytes after terminator held until next call"
                    );
                }
                return Ok(frame);
            }
        }
    }

    fn set_state(&mut self, state: CallState) {
        tracing::trace!(from = %self.state, to = %state, "Call state");
        self.state = state;
    }

    /// State of the current or last call.
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of inbound bytes buffered but not yet part of a returned frame.
    pub fn buffered(&self) -> usize {
        self.framer.len()
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consume the client and return the stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Run `fut` until `deadline`, or to completion when there is none.
///
/// Returns `None` if the deadline passed first.
async fn until<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}
