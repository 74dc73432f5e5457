//! Codec module - serialization/deserialization for payloads.
//!
//! - [`ProtoCodec`] - protobuf using `prost`, terminator-safe
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects.
//! The client only ever hands the codec a typed message and gets bytes back
//! (or the reverse); schema details stay in [`crate::schema`].

mod proto;

pub use proto::ProtoCodec;
