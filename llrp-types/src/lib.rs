//! Type definitions for llrp

pub mod events;

pub use events::{ProtocolErrorKind, ReaderEvent, TagRead};
