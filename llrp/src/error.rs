//! Client errors

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] llrp_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] llrp_transport::Error),

    #[error("Not connected")]
    NotConnected,
}
