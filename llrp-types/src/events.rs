//! Domain events surfaced to the application

use std::fmt;

use chrono::{DateTime, Utc};

/// One tag observation from an RO_ACCESS_REPORT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRead {
    /// EPC tag identifier, rendered as lowercase hex
    pub epc: String,

    /// Number of times the tag was singulated during the report interval
    pub seen_count: u16,

    /// First-seen timestamp, when the reader reports one
    pub first_seen: Option<DateTime<Utc>>,
}

impl fmt::Display for TagRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag[{}, seen {}x]", self.epc, self.seen_count)
    }
}

/// Classification of a surfaced protocol fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// The reader sent an ERROR_MESSAGE
    ReaderError,

    /// A message payload did not decode cleanly
    MalformedPayload,

    /// A message type outside this profile's handshake alphabet
    UnknownMessage,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReaderError => "reader error",
            Self::MalformedPayload => "malformed payload",
            Self::UnknownMessage => "unknown message",
        };
        f.write_str(name)
    }
}

/// Events delivered to the application over a reader connection's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// The connection is established and the handshake is underway
    Connected,

    /// A tag was observed
    TagRead(TagRead),

    /// The connection ended (remote close, timeout, or fatal error)
    Disconnected,

    /// A diagnostic worth surfacing without ending the session
    ProtocolError {
        kind: ProtocolErrorKind,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_read_display() {
        let tag = TagRead {
            epc: "3005fb63ac1f3681ec880468".to_string(),
            seen_count: 3,
            first_seen: None,
        };
        assert_eq!(tag.to_string(), "Tag[3005fb63ac1f3681ec880468, seen 3x]");
    }
}
