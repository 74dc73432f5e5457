//! Publish/subscribe bridge presented as a byte stream.
//!
//! Mirrors a serial line over two topics carrying raw byte arrays:
//! - writes from the client are published, one message per write, on the
//!   write topic (`/serial_write` by default)
//! - byte arrays arriving on the read topic (`/serial_read`) are delivered
//!   to the client's reads, in order, split across reads as needed
//!
//! The pub/sub side is a [`TopicEndpoint`]. It can live on another task:
//! only the channels are shared, the client's framer is not.
//!
//! Both directions are bounded to [`TopicConfig::capacity`] messages. A full
//! write topic makes client writes wait (the client's deadline still
//! applies); a full read topic makes [`TopicPublisher::publish`] wait and
//! [`TopicPublisher::try_publish`] fail with
//! [`MousebotError::QueueFull`].
//!
//! ```text
//! Client ─► TopicBridge ─► /serial_write ─► TopicEndpoint::next_published
//! Client ◄─ TopicBridge ◄─ /serial_read  ◄─ TopicPublisher::publish
//! ```

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;
use tokio_util::sync::PollSender;

use super::TopicConfig;
use crate::error::{MousebotError, Result};

/// Create a connected bridge and endpoint pair.
pub fn topic_pair(config: TopicConfig) -> (TopicBridge, TopicEndpoint) {
    let capacity = config.capacity.max(1);
    let (write_tx, write_rx) = mpsc::channel(capacity);
    let (read_tx, read_rx) = mpsc::channel(capacity);

    tracing::debug!(
        write_topic = %config.write_topic,
        read_topic = %config.read_topic,
        capacity,
        "Created topic bridge"
    );

    let bridge = TopicBridge {
        config: config.clone(),
        publisher: PollSender::new(write_tx),
        subscription: read_rx,
        pending: Bytes::new(),
    };
    let endpoint = TopicEndpoint {
        config,
        published: write_rx,
        publisher: TopicPublisher { tx: read_tx },
    };

    (bridge, endpoint)
}

/// Client side of the bridge. Implements `AsyncRead + AsyncWrite`.
pub struct TopicBridge {
    config: TopicConfig,
    /// Outbound messages (write topic).
    publisher: PollSender<Bytes>,
    /// Inbound messages (read topic).
    subscription: mpsc::Receiver<Bytes>,
    /// Unread remainder of the last inbound message.
    pending: Bytes,
}

impl TopicBridge {
    /// Topic names this bridge is attached to.
    pub fn config(&self) -> &TopicConfig {
        &self.config
    }
}

impl AsyncRead for TopicBridge {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        while this.pending.is_empty() {
            match ready!(this.subscription.poll_recv(cx)) {
                Some(message) => this.pending = message,
                // Endpoint dropped: end of stream
                None => return Poll::Ready(Ok(())),
            }
        }

        let n = buf.remaining().min(this.pending.len());
        buf.put_slice(&this.pending.split_to(n));
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for TopicBridge {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        let sent = match ready!(this.publisher.poll_reserve(cx)) {
            Ok(()) => this.publisher.send_item(Bytes::copy_from_slice(buf)).is_ok(),
            Err(_) => false,
        };
        if sent {
            Poll::Ready(Ok(buf.len()))
        } else {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("{} has no subscriber", this.config.write_topic),
            )))
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Pub/sub side of the bridge.
pub struct TopicEndpoint {
    config: TopicConfig,
    published: mpsc::Receiver<Bytes>,
    publisher: TopicPublisher,
}

impl TopicEndpoint {
    /// Wait for the next message the client published.
    ///
    /// Returns `None` once the bridge is dropped.
    pub async fn next_published(&mut self) -> Option<Bytes> {
        self.published.recv().await
    }

    /// Deliver a byte array on the read topic, waiting for queue space.
    pub async fn publish(&self, message: impl Into<Bytes>) -> Result<()> {
        self.publisher.publish(message).await
    }

    /// Deliver a byte array on the read topic without waiting.
    pub fn try_publish(&self, message: impl Into<Bytes>) -> Result<()> {
        self.publisher.try_publish(message)
    }

    /// Handle for delivering on the read topic from another task.
    pub fn publisher(&self) -> TopicPublisher {
        self.publisher.clone()
    }

    /// Topic names this endpoint is attached to.
    pub fn config(&self) -> &TopicConfig {
        &self.config
    }
}

/// Cloneable handle for the read topic.
#[derive(Clone)]
pub struct TopicPublisher {
    tx: mpsc::Sender<Bytes>,
}

impl TopicPublisher {
    /// Deliver a byte array to the client, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`MousebotError::ConnectionClosed`] if the bridge is gone.
    pub async fn publish(&self, message: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send(message.into())
            .await
            .map_err(|_| MousebotError::ConnectionClosed)
    }

    /// Deliver a byte array to the client without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`MousebotError::QueueFull`] when the client has not drained
    /// the read topic, or [`MousebotError::ConnectionClosed`] if the bridge
    /// is gone.
    pub fn try_publish(&self, message: impl Into<Bytes>) -> Result<()> {
        self.tx.try_send(message.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => MousebotError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => MousebotError::ConnectionClosed,
        })
    }
}
