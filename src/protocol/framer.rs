//! Terminator-delimited framer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management. Incoming bytes are
//! appended to a single buffer; a scan cursor remembers how far the buffer
//! has already been searched so every byte is inspected once.
//!
//! Bytes that follow a terminator in the same chunk are kept and belong to
//! the next frame. Call [`Framer::next_frame`] (or `feed` again) to consume
//! them, or [`Framer::reset`] to drop them.
//!
//! # Example
//!
//! ```
//! use mousebot_client::protocol::{FrameEvent, Framer, TERM_CHAR};
//!
//! let mut framer = Framer::new();
//!
//! assert_eq!(framer.feed(b"he"), FrameEvent::Incomplete);
//! match framer.feed(&[b'y', TERM_CHAR]) {
//!     FrameEvent::Complete(frame) => assert_eq!(&frame[..], b"hey"),
//!     FrameEvent::Incomplete => unreachable!(),
//! }
//! ```

use bytes::{Buf, Bytes, BytesMut};

use super::wire_format::TERM_CHAR;

/// Default initial buffer capacity. Device responses are small.
const DEFAULT_CAPACITY: usize = 256;

/// Outcome of feeding bytes to a [`Framer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// No terminator seen yet.
    Incomplete,
    /// A terminator was seen; the frame excludes the terminator itself.
    Complete(Bytes),
}

impl FrameEvent {
    /// Return the frame if complete.
    pub fn into_frame(self) -> Option<Bytes> {
        match self {
            FrameEvent::Complete(frame) => Some(frame),
            FrameEvent::Incomplete => None,
        }
    }

    /// Check whether a frame was completed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, FrameEvent::Complete(_))
    }
}

/// Buffer that splits a byte stream into frames on a single-byte terminator.
///
/// A frame never contains the terminator; the terminator is consumed.
pub struct Framer {
    /// Accumulated bytes: the current frame followed by any unscanned tail.
    buffer: BytesMut,
    /// Number of leading bytes known to be terminator-free.
    scanned: usize,
    /// Frame boundary byte.
    terminator: u8,
}

impl Framer {
    /// Create a framer splitting on [`TERM_CHAR`].
    pub fn new() -> Self {
        Self::with_terminator(TERM_CHAR)
    }

    /// Create a framer splitting on a custom terminator byte.
    pub fn with_terminator(terminator: u8) -> Self {
        Self {
            buffer: BytesMut::with_capacity(DEFAULT_CAPACITY),
            scanned: 0,
            terminator,
        }
    }

    /// Feed a chunk and return the first frame it completes, if any.
    ///
    /// Only one frame is returned per call. Bytes after that frame's
    /// terminator stay buffered for the next call.
    pub fn feed(&mut self, data: &[u8]) -> FrameEvent {
        self.buffer.extend_from_slice(data);
        self.next_frame()
    }

    /// Feed a single byte.
    #[inline]
    pub fn feed_byte(&mut self, byte: u8) -> FrameEvent {
        self.feed(&[byte])
    }

    /// Try to complete a frame from already buffered bytes.
    pub fn next_frame(&mut self) -> FrameEvent {
        let unscanned = &self.buffer[self.scanned..];
        match unscanned.iter().position(|&b| b == self.terminator) {
            Some(offset) => {
                let end = self.scanned + offset;
                let frame = self.buffer.split_to(end).freeze();
                self.buffer.advance(1);
                self.scanned = 0;
                FrameEvent::Complete(frame)
            }
            None => {
                self.scanned = self.buffer.len();
                FrameEvent::Incomplete
            }
        }
    }

    /// Feed a chunk and drain every frame it completes.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        let mut event = self.feed(data);
        while let FrameEvent::Complete(frame) = event {
            frames.push(frame);
            event = self.next_frame();
        }
        frames
    }

    /// Get the number of buffered bytes, tail included.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The terminator this framer splits on.
    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    /// Discard all buffered bytes. Returns how many were dropped.
    pub fn reset(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.scanned = 0;
        dropped
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}
