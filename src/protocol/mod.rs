//! Protocol module - wire constants and framing.
//!
//! This module implements the framing layer of the serial link:
//! - Terminator and line constants
//! - Operation codes
//! - Framer for accumulating partial reads into terminator-delimited frames

mod framer;
mod wire_format;

pub use framer::{FrameEvent, Framer};
pub use wire_format::{OpCode, BAUD_RATE, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT, TERM_CHAR};
