//! Session state machine for the basic inventory handshake
//!
//! The reader drives the handshake by announcing itself after connect:
//!
//! ```text
//! READER_EVENT_NOTIFICATION  -> SET_READER_CONFIG, ENABLE_EVENTS_AND_REPORTS
//! SET_READER_CONFIG_RESPONSE -> ADD_ROSPEC
//! ADD_ROSPEC_RESPONSE        -> ENABLE_ROSPEC
//! ENABLE_ROSPEC_RESPONSE     -> START_ROSPEC
//! RO_ACCESS_REPORT           -> tag-read events, next START_ROSPEC permitted
//! KEEPALIVE                  -> KEEPALIVE_ACK
//! ```
//!
//! The machine is pure: it consumes one decoded message at a time and
//! returns the messages to send and the events to surface, in order. One
//! session instance belongs to exactly one connection and is dropped with
//! it; nothing survives a reconnect.

use bytes::Bytes;
use chrono::DateTime;
use tracing::{debug, trace, warn};

use llrp_core::registry::param;
use llrp_core::{Error as CodecError, Message, MessageType, Parameter, commands};
use llrp_types::{ProtocolErrorKind, ReaderEvent, TagRead};

/// One ordered element of a transition's outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Message to write to the reader
    Send(Message),

    /// Event to surface to the application
    Event(ReaderEvent),
}

/// Per-connection handshake and liveness state
///
/// This profile assumes exactly one RO spec; supporting several would need
/// a per-spec pending/armed map instead of the two flags here.
#[derive(Debug)]
pub struct Session {
    /// Reader config sent and event reporting enabled
    configured: bool,

    /// A START_ROSPEC is outstanding and must not be duplicated
    start_pending: bool,

    rospec_id: u32,
    next_message_id: u32,
}

impl Session {
    /// Create a session using RO spec id 1
    pub fn new() -> Self {
        Self::with_rospec_id(1)
    }

    /// Create a session using the given RO spec id
    pub fn with_rospec_id(rospec_id: u32) -> Self {
        Self {
            configured: false,
            start_pending: false,
            rospec_id,
            next_message_id: 1,
        }
    }

    /// Check if the reader configuration handshake has run
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Check if a start command is outstanding
    pub fn start_pending(&self) -> bool {
        self.start_pending
    }

    /// Process one inbound message, in arrival order, to completion
    ///
    /// Returns the ordered outbound messages and application events the
    /// transition produced. `Err` means the payload was corrupt beyond
    /// recovery and the connection must be closed; recoverable payload
    /// problems degrade to a [`ReaderEvent::ProtocolError`] in the outputs.
    pub fn handle(&mut self, message: &Message) -> Result<Vec<Output>, CodecError> {
        let mut outputs = Vec::new();

        let Ok(ty) = MessageType::try_from(message.ty) else {
            debug!(ty = message.ty, "unregistered message type");
            outputs.push(Output::Event(ReaderEvent::ProtocolError {
                kind: ProtocolErrorKind::UnknownMessage,
                detail: format!("unregistered message type {} (id {})", message.ty, message.id),
            }));
            return Ok(outputs);
        };
        trace!(%ty, id = message.id, "handling message");

        match ty {
            MessageType::ReaderEventNotification => {
                match message.params() {
                    Ok(params) => {
                        if contains_end_of_rospec(&params) {
                            debug!("RO spec cycle complete");
                            self.start_pending = false;
                        }
                    }
                    Err(e) => self.surface_payload_error(e, &mut outputs)?,
                }

                if !self.configured {
                    debug!("reader announced itself, sending configuration");
                    outputs.push(Output::Send(commands::set_reader_config(self.next_id())?));
                    outputs.push(Output::Send(commands::enable_events_and_reports(
                        self.next_id(),
                    )));
                    self.configured = true;
                } else {
                    // Reader re-announced itself (e.g. reconnect on its
                    // side); configuration holds, go straight to a start.
                    self.request_start(&mut outputs);
                }
            }

            MessageType::SetReaderConfigResponse => {
                outputs.push(Output::Send(commands::add_rospec(
                    self.next_id(),
                    self.rospec_id,
                )?));
            }

            MessageType::AddRoSpecResponse => {
                outputs.push(Output::Send(commands::enable_rospec(
                    self.next_id(),
                    self.rospec_id,
                )));
            }

            MessageType::EnableRoSpecResponse => {
                self.request_start(&mut outputs);
            }

            MessageType::RoAccessReport => {
                // A report marks a cycle boundary; starting is permitted again
                self.start_pending = false;

                // Salvage every record in front of a damaged tail; one
                // malformed parameter must not swallow the valid reports
                // decoded before it.
                let (params, fault) = Parameter::decode_available(&message.payload);
                for report in params.iter().filter(|p| p.ty == param::TAG_REPORT_DATA) {
                    match extract_tag_read(report) {
                        Some(tag) => outputs.push(Output::Event(ReaderEvent::TagRead(tag))),
                        None => warn!("tag report data without an EPC, skipping"),
                    }
                }
                if let Some(e) = fault {
                    self.surface_payload_error(e, &mut outputs)?;
                }
            }

            MessageType::Keepalive => {
                // The reader enforces a liveness timeout; ack immediately
                outputs.push(Output::Send(commands::keepalive_ack(self.next_id())));
            }

            MessageType::ErrorMessage => {
                outputs.push(Output::Event(ReaderEvent::ProtocolError {
                    kind: ProtocolErrorKind::ReaderError,
                    detail: error_message_detail(message),
                }));
            }

            other => {
                debug!(%other, "no transition for message type");
            }
        }

        Ok(outputs)
    }

    /// Emit START_ROSPEC unless one is already outstanding
    fn request_start(&mut self, outputs: &mut Vec<Output>) {
        if self.start_pending {
            debug!("start already pending, suppressing duplicate START_ROSPEC");
            return;
        }
        self.start_pending = true;
        outputs.push(Output::Send(commands::start_rospec(
            self.next_id(),
            self.rospec_id,
        )));
    }

    fn surface_payload_error(
        &self,
        error: CodecError,
        outputs: &mut Vec<Output>,
    ) -> Result<(), CodecError> {
        if error.is_fatal() {
            return Err(error);
        }
        warn!(%error, "payload did not decode cleanly");
        outputs.push(Output::Event(ReaderEvent::ProtocolError {
            kind: ProtocolErrorKind::MalformedPayload,
            detail: error.to_string(),
        }));
        Ok(())
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);
        id
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Check for an end-of-RO-spec event inside a notification's parameters
fn contains_end_of_rospec(params: &[Parameter]) -> bool {
    params
        .iter()
        .filter(|p| p.ty == param::READER_EVENT_NOTIFICATION_DATA)
        .filter_map(|data| data.find_sub(param::RO_SPEC_EVENT))
        // first value octet is the event type; 1 = end of RO spec
        .any(|event| event.value.first() == Some(&1))
}

/// Pull one tag observation out of a TagReportData parameter
fn extract_tag_read(report: &Parameter) -> Option<TagRead> {
    let epc = report
        .find_sub(param::EPC_96)
        .map(|p| p.value.clone())
        .or_else(|| epc_data_bytes(report.find_sub(param::EPC_DATA)?))?;

    let seen_count = report
        .find_sub(param::TAG_SEEN_COUNT)
        .and_then(|p| p.value.get(..2).map(|b| u16::from_be_bytes([b[0], b[1]])))
        .unwrap_or(0);

    let first_seen = report
        .find_sub(param::FIRST_SEEN_TIMESTAMP_UTC)
        .and_then(|p| p.value.get(..8))
        .map(|b| {
            u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
        .and_then(|micros| DateTime::from_timestamp_micros(micros as i64));

    Some(TagRead {
        epc: hex::encode(&epc),
        seen_count,
        first_seen,
    })
}

/// EPCData carries a 16-bit EPC bit count followed by the EPC itself
fn epc_data_bytes(epc_data: &Parameter) -> Option<Bytes> {
    let value = &epc_data.value;
    let bits = u16::from_be_bytes([*value.first()?, *value.get(1)?]) as usize;
    let len = bits.div_ceil(8);
    value.get(2..2 + len).map(Bytes::copy_from_slice)
}

/// Render the LLRPStatus of an ERROR_MESSAGE for diagnostics
fn error_message_detail(message: &Message) -> String {
    let fallback = || format!("reader reported an error (message id {})", message.id);

    let Ok(params) = message.params() else {
        return fallback();
    };
    let Some(status) = params.iter().find(|p| p.ty == param::LLRP_STATUS) else {
        return fallback();
    };

    let code = status
        .value
        .get(..2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .unwrap_or(0);
    let text = status
        .value
        .get(4..)
        .map(String::from_utf8_lossy)
        .unwrap_or_default();

    format!("status {code}: {text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, Bytes, BytesMut};
    use pretty_assertions::assert_eq;

    fn message(ty: MessageType, payload: impl Into<Bytes>) -> Message {
        Message::new(ty, 0, payload)
    }

    fn reader_announcement() -> Message {
        let data = Parameter::container(
            param::READER_EVENT_NOTIFICATION_DATA,
            vec![
                Parameter::tlv(param::UTC_TIMESTAMP, vec![0u8; 8]),
                // ConnectionAttemptEvent: success
                Parameter::tlv(256, vec![0, 0]),
            ],
        );
        message(MessageType::ReaderEventNotification, data.encode().unwrap().freeze())
    }

    fn end_of_rospec_notification() -> Message {
        let mut event = BytesMut::new();
        event.put_u8(1); // end of RO spec
        event.put_u32(1); // RO spec id
        event.put_u32(0); // preempting id, unused
        let data = Parameter::container(
            param::READER_EVENT_NOTIFICATION_DATA,
            vec![
                Parameter::tlv(param::UTC_TIMESTAMP, vec![0u8; 8]),
                Parameter::tlv(param::RO_SPEC_EVENT, event.freeze()),
            ],
        );
        message(MessageType::ReaderEventNotification, data.encode().unwrap().freeze())
    }

    fn tag_report_data(epc_fill: u8, seen_count: u16) -> Parameter {
        Parameter::container(
            param::TAG_REPORT_DATA,
            vec![
                Parameter::tv(param::EPC_96, vec![epc_fill; 12]),
                Parameter::tv(param::TAG_SEEN_COUNT, seen_count.to_be_bytes().to_vec()),
            ],
        )
    }

    fn access_report(reports: Vec<Parameter>) -> Message {
        let mut payload = BytesMut::new();
        for report in reports {
            report.encode_into(&mut payload).unwrap();
        }
        message(MessageType::RoAccessReport, payload.freeze())
    }

    fn sent_types(outputs: &[Output]) -> Vec<u16> {
        outputs
            .iter()
            .filter_map(|o| match o {
                Output::Send(m) => Some(m.ty),
                Output::Event(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_handshake_sequence() {
        let mut session = Session::new();

        // Reader announces itself: configure and enable reports
        let outputs = session.handle(&reader_announcement()).unwrap();
        assert_eq!(
            sent_types(&outputs),
            vec![
                MessageType::SetReaderConfig as u16,
                MessageType::EnableEventsAndReports as u16,
            ]
        );
        assert!(session.is_configured());
        assert!(!session.start_pending());

        let outputs = session
            .handle(&message(MessageType::SetReaderConfigResponse, Bytes::new()))
            .unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::AddRoSpec as u16]);

        let outputs = session
            .handle(&message(MessageType::AddRoSpecResponse, Bytes::new()))
            .unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::EnableRoSpec as u16]);

        let outputs = session
            .handle(&message(MessageType::EnableRoSpecResponse, Bytes::new()))
            .unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::StartRoSpec as u16]);
        assert!(session.start_pending());
    }

    #[test]
    fn test_start_is_idempotent_while_pending() {
        let mut session = Session::new();
        session.handle(&reader_announcement()).unwrap();
        session
            .handle(&message(MessageType::EnableRoSpecResponse, Bytes::new()))
            .unwrap();
        assert!(session.start_pending());

        // A second enable response must not duplicate START_ROSPEC
        let outputs = session
            .handle(&message(MessageType::EnableRoSpecResponse, Bytes::new()))
            .unwrap();
        assert_eq!(sent_types(&outputs), vec![]);
    }

    #[test]
    fn test_tag_report_emits_events_in_order() {
        let mut session = Session::new();
        session.handle(&reader_announcement()).unwrap();
        session
            .handle(&message(MessageType::EnableRoSpecResponse, Bytes::new()))
            .unwrap();
        assert!(session.start_pending());

        let report = access_report(vec![tag_report_data(0x11, 3), tag_report_data(0x22, 7)]);
        let outputs = session.handle(&report).unwrap();

        let tags: Vec<&TagRead> = outputs
            .iter()
            .filter_map(|o| match o {
                Output::Event(ReaderEvent::TagRead(tag)) => Some(tag),
                _ => None,
            })
            .collect();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].epc, "11".repeat(12));
        assert_eq!(tags[0].seen_count, 3);
        assert_eq!(tags[1].epc, "22".repeat(12));
        assert_eq!(tags[1].seen_count, 7);
        assert!(!session.start_pending());
    }

    #[test]
    fn test_first_seen_timestamp_extraction() {
        let micros: u64 = 1_700_000_000_000_000;
        let report = Parameter::container(
            param::TAG_REPORT_DATA,
            vec![
                Parameter::tv(param::EPC_96, vec![0x33; 12]),
                Parameter::tv(param::FIRST_SEEN_TIMESTAMP_UTC, micros.to_be_bytes().to_vec()),
                Parameter::tv(param::TAG_SEEN_COUNT, 1u16.to_be_bytes().to_vec()),
            ],
        );

        let tag = extract_tag_read(&report).unwrap();
        assert_eq!(
            tag.first_seen,
            DateTime::from_timestamp_micros(micros as i64)
        );
    }

    #[test]
    fn test_epc_data_fallback() {
        // 96-bit EPC carried as variable-length EPCData instead of EPC96
        let mut value = BytesMut::new();
        value.put_u16(96);
        value.put_slice(&[0x44; 12]);
        let report = Parameter::container(
            param::TAG_REPORT_DATA,
            vec![
                Parameter::tlv(param::EPC_DATA, value.freeze()),
                Parameter::tv(param::TAG_SEEN_COUNT, 5u16.to_be_bytes().to_vec()),
            ],
        );

        let tag = extract_tag_read(&report).unwrap();
        assert_eq!(tag.epc, "44".repeat(12));
        assert_eq!(tag.seen_count, 5);
    }

    #[test]
    fn test_keepalive_always_acked() {
        let mut session = Session::new();

        // Before configuration
        let outputs = session
            .handle(&message(MessageType::Keepalive, Bytes::new()))
            .unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::KeepaliveAck as u16]);

        // And after
        session.handle(&reader_announcement()).unwrap();
        let outputs = session
            .handle(&message(MessageType::Keepalive, Bytes::new()))
            .unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::KeepaliveAck as u16]);
    }

    #[test]
    fn test_end_of_rospec_rearms_start() {
        let mut session = Session::new();
        session.handle(&reader_announcement()).unwrap();
        session
            .handle(&message(MessageType::EnableRoSpecResponse, Bytes::new()))
            .unwrap();
        assert!(session.start_pending());

        // Cycle finished: pending clears and, being configured, the session
        // immediately requests the next start.
        let outputs = session.handle(&end_of_rospec_notification()).unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::StartRoSpec as u16]);
        assert!(session.start_pending());
    }

    #[test]
    fn test_reannouncement_when_configured_requests_start() {
        let mut session = Session::new();
        session.handle(&reader_announcement()).unwrap();
        assert!(session.is_configured());

        let outputs = session.handle(&reader_announcement()).unwrap();
        assert_eq!(sent_types(&outputs), vec![MessageType::StartRoSpec as u16]);
    }

    #[test]
    fn test_error_message_surfaces_diagnostic() {
        let mut status = BytesMut::new();
        status.put_u16(101);
        status.put_u16(9);
        status.put_slice(b"bad spec!");
        let payload = Parameter::tlv(param::LLRP_STATUS, status.freeze()).encode().unwrap();

        let mut session = Session::new();
        let outputs = session
            .handle(&message(MessageType::ErrorMessage, payload.freeze()))
            .unwrap();

        assert_eq!(
            outputs,
            vec![Output::Event(ReaderEvent::ProtocolError {
                kind: ProtocolErrorKind::ReaderError,
                detail: "status 101: bad spec!".to_string(),
            })]
        );
    }

    #[test]
    fn test_truncated_report_payload_degrades_to_event() {
        // TLV declaring more bytes than the payload holds
        let payload = vec![0x00, 0xF0, 0x00, 0x20];
        let mut session = Session::new();

        let outputs = session
            .handle(&message(MessageType::RoAccessReport, payload))
            .unwrap();
        assert!(matches!(
            outputs.as_slice(),
            [Output::Event(ReaderEvent::ProtocolError {
                kind: ProtocolErrorKind::MalformedPayload,
                ..
            })]
        ));
    }

    #[test]
    fn test_corrupt_report_payload_is_fatal() {
        // TLV length below its own header cannot be resynchronized
        let payload = vec![0x00, 0xF0, 0x00, 0x03];
        let mut session = Session::new();

        let result = session.handle(&message(MessageType::RoAccessReport, payload));
        assert!(matches!(result, Err(CodecError::InvalidEncoding(_))));
    }

    #[test]
    fn test_valid_reports_survive_a_malformed_tail() {
        let mut session = Session::new();
        session.handle(&reader_announcement()).unwrap();
        session
            .handle(&message(MessageType::EnableRoSpecResponse, Bytes::new()))
            .unwrap();

        // One intact record followed by a TLV that declares more bytes
        // than the payload holds
        let mut payload = BytesMut::new();
        tag_report_data(0x11, 3).encode_into(&mut payload).unwrap();
        payload.put_slice(&[0x00, 0xF0, 0x00, 0x20]);

        let outputs = session
            .handle(&message(MessageType::RoAccessReport, payload.freeze()))
            .unwrap();

        // The intact record is delivered first, then the diagnostic
        assert_eq!(outputs.len(), 2);
        match &outputs[0] {
            Output::Event(ReaderEvent::TagRead(tag)) => {
                assert_eq!(tag.epc, "11".repeat(12));
                assert_eq!(tag.seen_count, 3);
            }
            other => panic!("expected a tag read first, got {other:?}"),
        }
        assert!(matches!(
            outputs[1],
            Output::Event(ReaderEvent::ProtocolError {
                kind: ProtocolErrorKind::MalformedPayload,
                ..
            })
        ));
        assert!(!session.start_pending());
    }

    #[test]
    fn test_registered_but_unhandled_types_are_noops() {
        let mut session = Session::new();
        let outputs = session
            .handle(&message(MessageType::GetRoSpecsResponse, Bytes::new()))
            .unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_unregistered_type_surfaces_diagnostic() {
        let mut session = Session::new();
        let outputs = session.handle(&Message::new(900u16, 0, Bytes::new())).unwrap();
        assert!(matches!(
            outputs.as_slice(),
            [Output::Event(ReaderEvent::ProtocolError {
                kind: ProtocolErrorKind::UnknownMessage,
                ..
            })]
        ));
    }

    #[test]
    fn test_outbound_message_ids_increment() {
        let mut session = Session::new();
        let outputs = session.handle(&reader_announcement()).unwrap();

        let ids: Vec<u32> = outputs
            .iter()
            .filter_map(|o| match o {
                Output::Send(m) => Some(m.id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
