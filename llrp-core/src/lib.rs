//! # llrp-core
//!
//! Core protocol implementation for the Low Level Reader Protocol (LLRP),
//! the binary TCP protocol spoken by RFID readers.
//!
//! This crate provides the low-level protocol primitives:
//! - Message framing and encoding/decoding
//! - TV/TLV parameter encoding/decoding, recursive over containers
//! - The message and parameter type registry
//! - Builders for the outbound messages of the basic inventory profile
//!
//! Everything here is pure and synchronous; the codecs hold no shared
//! state and may run concurrently for independent buffers.

pub mod commands;
pub mod error;
pub mod message;
pub mod parameter;
pub mod registry;

pub use error::{Error, Result};
pub use message::Message;
pub use parameter::Parameter;
pub use registry::MessageType;

/// Default LLRP reader port
pub const DEFAULT_PORT: u16 = 5084;

/// Message header size
pub const HEADER_SIZE: usize = message::HEADER_SIZE;
