//! Builders for the outbound messages of the basic inventory profile
//!
//! Each builder composes a parameter tree and defers to the codec's encode
//! path, so configuration changes keep working without touching any wire
//! arithmetic. The defaults reproduce a known-good Motorola/Zebra reader
//! configuration: one ROSpec with a null start trigger, a 1000 ms AISpec
//! duration trigger on all antennas, and reports carrying EPC, timestamps
//! and seen counts.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::message::Message;
use crate::parameter::Parameter;
use crate::registry::{MessageType, param};

/// AISpec inventory duration in milliseconds
const AISPEC_DURATION_MS: u32 = 1000;

/// Vendor id carried in the custom report parameter
const CUSTOM_VENDOR_ID: u32 = 26554;

/// SET_READER_CONFIG: keep factory state, hold events and reports until
/// ENABLE_EVENTS_AND_REPORTS arrives
pub fn set_reader_config(id: u32) -> Result<Message> {
    let events = Parameter::tlv(param::EVENTS_AND_REPORTS, vec![0x80]);

    // One raw octet (ResetToFactoryDefault flag, clear) precedes the
    // parameter sequence in this payload.
    let mut payload = BytesMut::with_capacity(1 + events.encoded_len());
    payload.put_u8(0x00);
    events.encode_into(&mut payload)?;

    Ok(Message::new(MessageType::SetReaderConfig, id, payload.freeze()))
}

/// ENABLE_EVENTS_AND_REPORTS: release held reports
pub fn enable_events_and_reports(id: u32) -> Message {
    Message::new(MessageType::EnableEventsAndReports, id, Bytes::new())
}

/// ADD_ROSPEC: define the single reader-operation spec this profile uses
pub fn add_rospec(id: u32, rospec_id: u32) -> Result<Message> {
    let boundary = Parameter::container(
        param::RO_BOUNDARY_SPEC,
        vec![
            // Null start trigger: started explicitly via START_ROSPEC
            Parameter::container_with_prefix(param::RO_SPEC_START_TRIGGER, vec![0x00], vec![]),
            // Null stop trigger, duration unused
            Parameter::container_with_prefix(
                param::RO_SPEC_STOP_TRIGGER,
                vec![0x00, 0, 0, 0, 0],
                vec![],
            ),
        ],
    );

    let mut ai_prefix = BytesMut::with_capacity(4);
    ai_prefix.put_u16(1); // one antenna entry
    ai_prefix.put_u16(0); // antenna id 0 = all antennas

    let mut stop_trigger = BytesMut::with_capacity(5);
    stop_trigger.put_u8(0x01); // duration trigger
    stop_trigger.put_u32(AISPEC_DURATION_MS);

    let mut inventory_prefix = BytesMut::with_capacity(3);
    inventory_prefix.put_u16(1); // InventoryParameterSpecID
    inventory_prefix.put_u8(0x01); // EPCGlobal Class-1 Gen-2

    let ai_spec = Parameter::container_with_prefix(
        param::AI_SPEC,
        ai_prefix.freeze(),
        vec![
            Parameter::container_with_prefix(
                param::AI_SPEC_STOP_TRIGGER,
                stop_trigger.freeze(),
                vec![],
            ),
            Parameter::container_with_prefix(
                param::INVENTORY_PARAMETER_SPEC,
                inventory_prefix.freeze(),
                vec![],
            ),
        ],
    );

    let report_spec = Parameter::container_with_prefix(
        param::RO_REPORT_SPEC,
        // Report upon N tags or end of AISpec, N = 0 (end of AISpec only)
        vec![0x01, 0x00, 0x00],
        vec![
            Parameter::container_with_prefix(
                param::TAG_REPORT_CONTENT_SELECTOR,
                // Enable every standard report field
                vec![0xFF, 0xC0],
                vec![Parameter::tlv(param::C1G2_EPC_MEMORY_SELECTOR, vec![0xC0])],
            ),
            custom_report_parameter(),
        ],
    );

    let mut rospec_prefix = BytesMut::with_capacity(6);
    rospec_prefix.put_u32(rospec_id);
    rospec_prefix.put_u8(0x00); // priority
    rospec_prefix.put_u8(0x00); // current state: disabled

    let rospec = Parameter::container_with_prefix(
        param::RO_SPEC,
        rospec_prefix.freeze(),
        vec![boundary, ai_spec, report_spec],
    );

    Ok(Message::new(
        MessageType::AddRoSpec,
        id,
        rospec.encode()?.freeze(),
    ))
}

/// Vendor extension enabling the reader's extended report content
fn custom_report_parameter() -> Parameter {
    let mut value = BytesMut::with_capacity(9);
    value.put_u32(CUSTOM_VENDOR_ID);
    value.put_u32(0x8E); // vendor parameter subtype
    value.put_u8(0x01);
    Parameter::tlv(param::CUSTOM, value.freeze())
}

/// ENABLE_ROSPEC for the given spec id
pub fn enable_rospec(id: u32, rospec_id: u32) -> Message {
    rospec_operation(MessageType::EnableRoSpec, id, rospec_id)
}

/// START_ROSPEC for the given spec id
pub fn start_rospec(id: u32, rospec_id: u32) -> Message {
    rospec_operation(MessageType::StartRoSpec, id, rospec_id)
}

/// STOP_ROSPEC for the given spec id
pub fn stop_rospec(id: u32, rospec_id: u32) -> Message {
    rospec_operation(MessageType::StopRoSpec, id, rospec_id)
}

/// DELETE_ROSPEC; spec id 0 deletes all specs
pub fn delete_rospec(id: u32, rospec_id: u32) -> Message {
    rospec_operation(MessageType::DeleteRoSpec, id, rospec_id)
}

/// KEEPALIVE_ACK, due immediately after every KEEPALIVE
pub fn keepalive_ack(id: u32) -> Message {
    Message::new(MessageType::KeepaliveAck, id, Bytes::new())
}

// The ROSpec lifecycle messages all carry a bare 32-bit spec id.
fn rospec_operation(ty: MessageType, id: u32, rospec_id: u32) -> Message {
    Message::new(ty, id, rospec_id.to_be_bytes().to_vec())
}
