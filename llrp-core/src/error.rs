//! Error types for llrp-core

/// Result type alias for llrp codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Buffer ends before the declared message length
    ///
    /// Recoverable: the caller should wait for more bytes and retry.
    #[error("Truncated message: need {needed} bytes, have {available} bytes")]
    TruncatedMessage {
        needed: usize,
        available: usize,
    },

    /// Parameter region ends before the declared parameter length
    ///
    /// Recoverable in a stream context, corruption inside a framed message.
    #[error("Truncated parameter: need {needed} bytes, have {available} bytes")]
    TruncatedParameter {
        needed: usize,
        available: usize,
    },

    /// A length field is internally inconsistent
    ///
    /// Fatal for the connection: there is no reliable way to find the next
    /// message boundary after a corrupt length field.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Type code not present in the registry
    ///
    /// Non-fatal for TLV parameters (the value is kept opaque); fatal for a
    /// TV parameter, whose length is not self-describing.
    #[error("Unknown type code: {0}")]
    UnknownType(u16),
}

impl Error {
    /// Check if the caller may retry once more input has arrived
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TruncatedMessage { .. } | Self::TruncatedParameter { .. }
        )
    }

    /// Check if the connection must be closed
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidEncoding(_))
    }
}
