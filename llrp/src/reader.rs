//! Reader client
//!
//! Ties the transport, the message codec and the session state machine
//! together into a single driver loop.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tracing::{debug, info, warn};

use llrp_core::Message;
use llrp_transport::{TcpTransport, Transport};
use llrp_types::{ProtocolErrorKind, ReaderEvent};

use crate::error::{Error, Result};
use crate::session::{Output, Session};

/// Readers are expected to send KEEPALIVE well inside this window; silence
/// this long means the link is dead.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// LLRP reader client
///
/// ```no_run
/// use llrp::{Reader, ReaderEvent, DEFAULT_PORT};
///
/// # async fn run() -> llrp::Result<()> {
/// let mut reader = Reader::new("192.168.0.30", DEFAULT_PORT);
/// reader
///     .start_session(|event| {
///         if let ReaderEvent::TagRead(tag) = event {
///             println!("{tag}");
///         }
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Reader {
    transport: Box<dyn Transport>,
    session: Session,
    buffer: BytesMut,
    read_timeout: Duration,
    rospec_id: u32,
}

impl Reader {
    /// Create a client for the reader at the given address
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(TcpTransport::new(addr, port)))
    }

    /// Create a client over an existing transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(),
            buffer: BytesMut::new(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            rospec_id: 1,
        }
    }

    /// Set how long silence on the wire is tolerated
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set the RO spec id the session provisions on the reader
    pub fn with_rospec_id(mut self, rospec_id: u32) -> Self {
        self.rospec_id = rospec_id;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect to the reader
    ///
    /// Always starts from a blank session; no handshake state or buffered
    /// bytes survive a reconnect.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to reader at {}", self.transport.remote_addr());
        self.transport.connect().await?;
        self.session = Session::with_rospec_id(self.rospec_id);
        self.buffer.clear();
        Ok(())
    }

    /// Disconnect from the reader
    pub async fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect().await?;
        Ok(())
    }

    /// Connect and drive the session until the connection ends
    pub async fn start_session<F>(&mut self, on_event: F) -> Result<()>
    where
        F: FnMut(ReaderEvent),
    {
        self.connect().await?;
        self.run(on_event).await
    }

    /// Drive an established session until the connection ends
    ///
    /// The reader leads the whole exchange, so this is a pure read loop:
    /// collect bytes, cut complete messages, let the session decide what to
    /// send back and which events to surface. A clean close by the reader
    /// (or a liveness timeout) returns `Ok`; unrecoverable protocol damage
    /// returns the error after the connection is torn down.
    pub async fn run<F>(&mut self, mut on_event: F) -> Result<()>
    where
        F: FnMut(ReaderEvent),
    {
        if !self.transport.is_connected() {
            return Err(Error::NotConnected);
        }
        on_event(ReaderEvent::Connected);

        loop {
            let chunk = match self.transport.receive(self.read_timeout).await {
                Ok(chunk) => chunk,
                Err(e) if e.is_disconnect() => {
                    warn!("Connection lost: {e}");
                    on_event(ReaderEvent::Disconnected);
                    let _ = self.transport.disconnect().await;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            self.buffer.extend_from_slice(&chunk);

            // Cut every complete message; a trailing partial one stays
            // buffered for the next chunk.
            let (messages, consumed) = match Message::decode_all(&self.buffer) {
                Ok(decoded) => decoded,
                Err(e) => return self.fail(e, &mut on_event).await,
            };
            self.buffer.advance(consumed);

            for message in messages {
                debug!(
                    ty = message.ty,
                    name = message.type_name().unwrap_or("UNKNOWN"),
                    id = message.id,
                    "Received message"
                );

                let outputs = match self.session.handle(&message) {
                    Ok(outputs) => outputs,
                    Err(e) => return self.fail(e, &mut on_event).await,
                };

                for output in outputs {
                    match output {
                        Output::Send(response) => {
                            debug!(
                                ty = response.ty,
                                name = response.type_name().unwrap_or("UNKNOWN"),
                                id = response.id,
                                "Sending message"
                            );
                            if let Err(e) = self.transport.send(&response.encode()).await {
                                warn!("Send failed: {e}");
                                on_event(ReaderEvent::Disconnected);
                                let _ = self.transport.disconnect().await;
                                return if e.is_disconnect() { Ok(()) } else { Err(e.into()) };
                            }
                        }
                        Output::Event(event) => on_event(event),
                    }
                }
            }
        }
    }

    /// Tear the connection down after unrecoverable protocol damage
    async fn fail<F>(&mut self, error: llrp_core::Error, on_event: &mut F) -> Result<()>
    where
        F: FnMut(ReaderEvent),
    {
        warn!("Closing connection: {error}");
        on_event(ReaderEvent::ProtocolError {
            kind: ProtocolErrorKind::MalformedPayload,
            detail: error.to_string(),
        });
        on_event(ReaderEvent::Disconnected);
        let _ = self.transport.disconnect().await;
        Err(error.into())
    }
}
