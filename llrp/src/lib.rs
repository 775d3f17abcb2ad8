//! LLRP reader client
//!
//! An async client for RFID readers speaking the Low Level Reader Protocol
//! over TCP. It provisions a single RO spec on the reader, keeps the
//! connection alive, and surfaces tag observations as events:
//!
//! ```no_run
//! use llrp::{Reader, ReaderEvent, DEFAULT_PORT};
//!
//! #[tokio::main]
//! async fn main() -> llrp::Result<()> {
//!     let mut reader = Reader::new("192.168.0.30", DEFAULT_PORT);
//!     reader
//!         .start_session(|event| match event {
//!             ReaderEvent::TagRead(tag) => println!("{tag}"),
//!             other => println!("{other:?}"),
//!         })
//!         .await
//! }
//! ```
//!
//! The message and parameter codec lives in [`llrp_core`], the TCP plumbing
//! in [`llrp_transport`]; both are re-exported here for callers that need to
//! go below the session layer.

pub mod error;
pub mod reader;
pub mod session;

pub use error::{Error, Result};
pub use reader::Reader;
pub use session::{Output, Session};

pub use llrp_core::{DEFAULT_PORT, Message, MessageType, Parameter};
pub use llrp_transport::{TcpTransport, Transport};
pub use llrp_types::{ProtocolErrorKind, ReaderEvent, TagRead};
