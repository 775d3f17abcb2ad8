//! Transport layer for the LLRP client
//!
//! Owns the TCP connection to the reader and moves raw bytes; framing and
//! protocol logic live above this layer. Chunks are delivered in order and
//! without gaps, but a chunk boundary may fall in the middle of a message;
//! callers re-prepend the remainder the message codec reports.

pub mod error;
pub mod tcp;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::BytesMut;
use std::time::Duration;

/// Transport trait for reader connections
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the reader
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the reader
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive the next chunk of raw bytes, waiting at most `timeout`
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Get the remote address
    fn remote_addr(&self) -> String;
}
