//! # mousebot-client
//!
//! Rust client for the Mousebot serial protocol.
//!
//! This crate lets an operator console query the Mousebot microcontroller
//! over a USB serial line, or over a publish/subscribe topic pair mirroring
//! one.
//!
//! ## Architecture
//!
//! - **Wire**: protobuf payloads delimited by a single `0x1E` terminator
//! - **Client**: one outstanding request; write, then wait for a frame
//!   until a deadline
//! - **Poller**: repeats one request at a fixed rate
//!
//! ## Example
//!
//! ```ignore
//! use mousebot_client::{Client, Reply, Request};
//! use mousebot_client::transport::SerialConfig;
//!
//! #[tokio::main]
//! async fn main() -> mousebot_client::Result<()> {
//!     let mut client = Client::builder()
//!         .connect_serial(&SerialConfig::default())
//!         .await?;
//!
//!     match client.call(&Request::raw_imu()).await?.reply() {
//!         Reply::RawImu(imu) => println!("{imu:?}"),
//!         Reply::DeviceError(kind) => println!("device said no: {kind}"),
//!         Reply::Empty => {}
//!     }
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod poller;
pub mod protocol;
pub mod report;
pub mod schema;
pub mod transport;

mod client;

pub use client::{CallState, Client, ClientBuilder, ClientConfig, DEFAULT_READ_BUFFER_SIZE};
pub use error::{MousebotError, Result};
pub use poller::{PollStats, Poller};
pub use protocol::OpCode;
pub use schema::{ErrorKind, ErrorType, Reply, Request, Response};
