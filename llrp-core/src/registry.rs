//! Type registry: message and parameter type codes and their metadata
//!
//! Both tables come from the LLRP 1.0.1 specification. They are built once
//! and never mutated, so lookups are safe from any thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// LLRP message type codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    // Capabilities
    GetReaderCapabilities = 1,
    GetReaderCapabilitiesResponse = 11,

    // Reader operations
    AddRoSpec = 20,
    AddRoSpecResponse = 30,
    DeleteRoSpec = 21,
    DeleteRoSpecResponse = 31,
    StartRoSpec = 22,
    StartRoSpecResponse = 32,
    StopRoSpec = 23,
    StopRoSpecResponse = 33,
    EnableRoSpec = 24,
    EnableRoSpecResponse = 34,
    DisableRoSpec = 25,
    DisableRoSpecResponse = 35,
    GetRoSpecs = 26,
    GetRoSpecsResponse = 36,

    // Access operations
    AddAccessSpec = 40,
    AddAccessSpecResponse = 50,
    DeleteAccessSpec = 41,
    DeleteAccessSpecResponse = 51,
    EnableAccessSpec = 42,
    EnableAccessSpecResponse = 52,
    DisableAccessSpec = 43,
    DisableAccessSpecResponse = 53,
    GetAccessSpecs = 44,
    GetAccessSpecsResponse = 54,
    ClientRequestOp = 45,
    ClientRequestOpResponse = 55,

    // Reports and liveness
    GetReport = 60,
    RoAccessReport = 61,
    Keepalive = 62,
    KeepaliveAck = 72,
    ReaderEventNotification = 63,
    EnableEventsAndReports = 64,
    ErrorMessage = 100,

    // Configuration
    GetReaderConfig = 2,
    GetReaderConfigResponse = 12,
    SetReaderConfig = 3,
    SetReaderConfigResponse = 13,
    CloseConnection = 14,
    CloseConnectionResponse = 4,

    CustomMessage = 1023,
}

impl MessageType {
    /// Get the symbolic LLRP message name
    pub fn name(self) -> &'static str {
        match self {
            Self::GetReaderCapabilities => "GET_READER_CAPABILITIES",
            Self::GetReaderCapabilitiesResponse => "GET_READER_CAPABILITIES_RESPONSE",
            Self::AddRoSpec => "ADD_ROSPEC",
            Self::AddRoSpecResponse => "ADD_ROSPEC_RESPONSE",
            Self::DeleteRoSpec => "DELETE_ROSPEC",
            Self::DeleteRoSpecResponse => "DELETE_ROSPEC_RESPONSE",
            Self::StartRoSpec => "START_ROSPEC",
            Self::StartRoSpecResponse => "START_ROSPEC_RESPONSE",
            Self::StopRoSpec => "STOP_ROSPEC",
            Self::StopRoSpecResponse => "STOP_ROSPEC_RESPONSE",
            Self::EnableRoSpec => "ENABLE_ROSPEC",
            Self::EnableRoSpecResponse => "ENABLE_ROSPEC_RESPONSE",
            Self::DisableRoSpec => "DISABLE_ROSPEC",
            Self::DisableRoSpecResponse => "DISABLE_ROSPEC_RESPONSE",
            Self::GetRoSpecs => "GET_ROSPECS",
            Self::GetRoSpecsResponse => "GET_ROSPECS_RESPONSE",
            Self::AddAccessSpec => "ADD_ACCESSSPEC",
            Self::AddAccessSpecResponse => "ADD_ACCESSSPEC_RESPONSE",
            Self::DeleteAccessSpec => "DELETE_ACCESSSPEC",
            Self::DeleteAccessSpecResponse => "DELETE_ACCESSSPEC_RESPONSE",
            Self::EnableAccessSpec => "ENABLE_ACCESSSPEC",
            Self::EnableAccessSpecResponse => "ENABLE_ACCESSSPEC_RESPONSE",
            Self::DisableAccessSpec => "DISABLE_ACCESSSPEC",
            Self::DisableAccessSpecResponse => "DISABLE_ACCESSSPEC_RESPONSE",
            Self::GetAccessSpecs => "GET_ACCESSSPECS",
            Self::GetAccessSpecsResponse => "GET_ACCESSSPECS_RESPONSE",
            Self::ClientRequestOp => "CLIENT_REQUEST_OP",
            Self::ClientRequestOpResponse => "CLIENT_REQUEST_OP_RESPONSE",
            Self::GetReport => "GET_REPORT",
            Self::RoAccessReport => "RO_ACCESS_REPORT",
            Self::Keepalive => "KEEPALIVE",
            Self::KeepaliveAck => "KEEPALIVE_ACK",
            Self::ReaderEventNotification => "READER_EVENT_NOTIFICATION",
            Self::EnableEventsAndReports => "ENABLE_EVENTS_AND_REPORTS",
            Self::ErrorMessage => "ERROR_MESSAGE",
            Self::GetReaderConfig => "GET_READER_CONFIG",
            Self::GetReaderConfigResponse => "GET_READER_CONFIG_RESPONSE",
            Self::SetReaderConfig => "SET_READER_CONFIG",
            Self::SetReaderConfigResponse => "SET_READER_CONFIG_RESPONSE",
            Self::CloseConnection => "CLOSE_CONNECTION",
            Self::CloseConnectionResponse => "CLOSE_CONNECTION_RESPONSE",
            Self::CustomMessage => "CUSTOM_MESSAGE",
        }
    }

    /// Check if this is a reader-initiated notification
    pub fn is_notification(self) -> bool {
        matches!(
            self,
            Self::RoAccessReport | Self::Keepalive | Self::ReaderEventNotification
        )
    }
}

impl From<MessageType> for u16 {
    fn from(ty: MessageType) -> u16 {
        ty as u16
    }
}

impl TryFrom<u16> for MessageType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            1 => Ok(Self::GetReaderCapabilities),
            11 => Ok(Self::GetReaderCapabilitiesResponse),
            20 => Ok(Self::AddRoSpec),
            30 => Ok(Self::AddRoSpecResponse),
            21 => Ok(Self::DeleteRoSpec),
            31 => Ok(Self::DeleteRoSpecResponse),
            22 => Ok(Self::StartRoSpec),
            32 => Ok(Self::StartRoSpecResponse),
            23 => Ok(Self::StopRoSpec),
            33 => Ok(Self::StopRoSpecResponse),
            24 => Ok(Self::EnableRoSpec),
            34 => Ok(Self::EnableRoSpecResponse),
            25 => Ok(Self::DisableRoSpec),
            35 => Ok(Self::DisableRoSpecResponse),
            26 => Ok(Self::GetRoSpecs),
            36 => Ok(Self::GetRoSpecsResponse),
            40 => Ok(Self::AddAccessSpec),
            50 => Ok(Self::AddAccessSpecResponse),
            41 => Ok(Self::DeleteAccessSpec),
            51 => Ok(Self::DeleteAccessSpecResponse),
            42 => Ok(Self::EnableAccessSpec),
            52 => Ok(Self::EnableAccessSpecResponse),
            43 => Ok(Self::DisableAccessSpec),
            53 => Ok(Self::DisableAccessSpecResponse),
            44 => Ok(Self::GetAccessSpecs),
            54 => Ok(Self::GetAccessSpecsResponse),
            45 => Ok(Self::ClientRequestOp),
            55 => Ok(Self::ClientRequestOpResponse),
            60 => Ok(Self::GetReport),
            61 => Ok(Self::RoAccessReport),
            62 => Ok(Self::Keepalive),
            72 => Ok(Self::KeepaliveAck),
            63 => Ok(Self::ReaderEventNotification),
            64 => Ok(Self::EnableEventsAndReports),
            100 => Ok(Self::ErrorMessage),
            2 => Ok(Self::GetReaderConfig),
            12 => Ok(Self::GetReaderConfigResponse),
            3 => Ok(Self::SetReaderConfig),
            13 => Ok(Self::SetReaderConfigResponse),
            14 => Ok(Self::CloseConnection),
            4 => Ok(Self::CloseConnectionResponse),
            1023 => Ok(Self::CustomMessage),
            _ => Err(Error::UnknownType(value)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u16)
    }
}

/// Parameter type codes referenced by name elsewhere in the crate
pub mod param {
    pub const UTC_TIMESTAMP: u16 = 128;
    pub const RO_SPEC: u16 = 177;
    pub const RO_BOUNDARY_SPEC: u16 = 178;
    pub const RO_SPEC_START_TRIGGER: u16 = 179;
    pub const RO_SPEC_STOP_TRIGGER: u16 = 182;
    pub const AI_SPEC: u16 = 183;
    pub const AI_SPEC_STOP_TRIGGER: u16 = 184;
    pub const INVENTORY_PARAMETER_SPEC: u16 = 186;
    pub const EVENTS_AND_REPORTS: u16 = 226;
    pub const RO_REPORT_SPEC: u16 = 237;
    pub const TAG_REPORT_CONTENT_SELECTOR: u16 = 238;
    pub const TAG_REPORT_DATA: u16 = 240;
    pub const EPC_DATA: u16 = 241;
    pub const READER_EVENT_NOTIFICATION_DATA: u16 = 246;
    pub const RO_SPEC_EVENT: u16 = 249;
    pub const LLRP_STATUS: u16 = 287;
    pub const C1G2_EPC_MEMORY_SELECTOR: u16 = 348;
    pub const CUSTOM: u16 = 1023;

    // TV-encoded report fields
    pub const ANTENNA_ID: u16 = 1;
    pub const FIRST_SEEN_TIMESTAMP_UTC: u16 = 2;
    pub const PEAK_RSSI: u16 = 6;
    pub const CHANNEL_INDEX: u16 = 7;
    pub const TAG_SEEN_COUNT: u16 = 8;
    pub const RO_SPEC_ID: u16 = 9;
    pub const EPC_96: u16 = 13;
}

/// Static metadata for one parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDef {
    /// Numeric type code
    pub code: u16,

    /// Symbolic LLRP parameter name
    pub name: &'static str,

    /// Whether the value region holds nested parameters
    pub has_sub_params: bool,

    /// Total TV-encoded length in bytes, 0 if the type cannot use TV
    pub tv_length: usize,

    /// Fixed-size prefix length before any variable tail or children
    pub static_length: usize,
}

const fn def(
    code: u16,
    name: &'static str,
    has_sub_params: bool,
    tv_length: usize,
    static_length: usize,
) -> ParamDef {
    ParamDef { code, name, has_sub_params, tv_length, static_length }
}

/// Declarative parameter table, straight from the LLRP 1.0.1 registry
static PARAM_DEFS: &[ParamDef] = &[
    // General parameters
    def(128, "UTCTimeStamp", false, 0, 12),
    def(129, "Uptime", false, 0, 12),
    // Reader device capabilities
    def(137, "GeneralDeviceCapabilities", true, 0, 18),
    def(139, "ReceiveSensitivityTableEntry", false, 0, 8),
    def(140, "PerAntennaAirProtocol", false, 0, 12),
    def(141, "GPIOCapabilities", false, 0, 8),
    def(142, "LLRPCapabilities", false, 0, 32),
    def(143, "RegulatoryCapabilities", true, 0, 8),
    def(144, "UHFBandCapabilities", true, 0, 4),
    def(145, "TransmitPowerLevelTableEntry", false, 0, 8),
    def(146, "FrequencyInformation", true, 0, 5),
    def(147, "FrequencyHopTable", false, 0, 8),
    def(148, "FixedFrequencyTable", false, 0, 6),
    def(149, "PerAntennaReceiveSensitivityRange", false, 0, 10),
    // Reader operations
    def(177, "ROSpec", true, 0, 10),
    def(178, "ROBoundarySpec", true, 0, 4),
    def(179, "ROSpecStartTrigger", true, 0, 5),
    def(180, "PeriodicTriggerValue", true, 0, 12),
    def(181, "GPITriggerValue", false, 0, 11),
    def(182, "ROSpecStopTrigger", true, 0, 9),
    def(183, "AISpec", true, 0, 6),
    def(184, "AISpecStopTrigger", true, 0, 9),
    def(185, "TagObservationTrigger", false, 0, 16),
    def(186, "InventoryParameterSpec", true, 0, 7),
    def(187, "RFSurveySpec", true, 0, 14),
    def(188, "RFSurveySpecStopTrigger", false, 0, 13),
    // Access operations
    def(207, "AccessSpec", true, 0, 16),
    def(208, "AccessSpecStopTrigger", false, 0, 8),
    def(209, "AccessCommand", true, 0, 4),
    def(210, "ClientRequestOpSpec", false, 0, 6),
    def(211, "ClientRequestResponse", true, 0, 8),
    // Configuration
    def(217, "LLRPConfigurationStateValue", false, 0, 8),
    def(218, "Identification", false, 0, 7),
    def(219, "GPOWriteData", false, 0, 8),
    def(220, "KeepaliveSpec", false, 0, 9),
    def(221, "AntennaProperties", false, 0, 9),
    def(222, "AntennaConfiguration", true, 0, 6),
    def(223, "RFReceiver", false, 0, 6),
    def(224, "RFTransmitter", false, 0, 10),
    def(225, "GPIPortCurrentState", false, 0, 8),
    def(226, "EventsAndReports", false, 0, 5),
    // Reporting
    def(237, "ROReportSpec", true, 0, 7),
    def(238, "TagReportContentSelector", true, 0, 6),
    def(239, "AccessReportSpec", false, 0, 6),
    def(240, "TagReportData", true, 0, 4),
    def(241, "EPCData", false, 0, 6),
    def(13, "EPC96", false, 13, 13),
    def(9, "ROSpecID", false, 5, 5),
    def(14, "SpecIndex", false, 3, 3),
    def(10, "InventoryParameterSpecID", false, 3, 3),
    def(1, "AntennaID", false, 3, 3),
    def(6, "PeakRSSI", false, 2, 2),
    def(7, "ChannelIndex", false, 3, 3),
    def(2, "FirstSeenTimestampUTC", false, 9, 9),
    def(3, "FirstSeenTimestampUptime", false, 9, 9),
    def(4, "LastSeenTimestampUTC", false, 9, 9),
    def(5, "LastSeenTimestampUptime", false, 9, 9),
    def(8, "TagSeenCount", false, 3, 3),
    def(15, "ClientRequestOpSpecResult", false, 3, 3),
    def(16, "AccessSpecID", false, 5, 5),
    def(242, "RFSurveyReportData", true, 0, 4),
    def(243, "FrequencyRSSILevelEntry", true, 0, 14),
    // Reader event notification
    def(244, "ReaderEventNotificationSpec", true, 0, 4),
    def(245, "EventNotificationState", false, 0, 7),
    def(246, "ReaderEventNotificationData", true, 0, 4),
    def(247, "HoppingEvent", false, 0, 8),
    def(248, "GPIEvent", false, 0, 7),
    def(249, "ROSpecEvent", false, 0, 13),
    def(250, "ReportBufferLevelWarningEvent", false, 0, 5),
    def(251, "ReportBufferOverflowErrorEvent", false, 0, 4),
    def(252, "ReaderExceptionEvent", true, 0, 6),
    def(17, "OpSpecID", false, 3, 3),
    def(253, "RFSurveyEvent", false, 0, 11),
    def(254, "AISpecEvent", true, 0, 11),
    def(255, "AntennaEvent", false, 0, 7),
    def(256, "ConnectionAttemptEvent", false, 0, 6),
    def(257, "ConnectionCloseEvent", false, 0, 4),
    // Errors
    def(287, "LLRPStatus", false, 0, 8),
    def(288, "FieldError", false, 0, 8),
    def(289, "ParameterError", true, 0, 8),
    def(1023, "Custom", false, 0, 12),
    // C1G2 air protocol: capabilities
    def(327, "C1G2LLRPCapabilities", false, 0, 7),
    def(328, "UHFC1G2RFModeTable", true, 0, 4),
    def(329, "UHFC1G2RFModeTableEntry", false, 0, 32),
    // C1G2 reader operations
    def(330, "C1G2InventoryCommand", true, 0, 5),
    def(331, "C1G2Filter", true, 0, 5),
    def(332, "C1G2TagInventoryMask", false, 0, 9),
    def(333, "C1G2TagInventoryStateAwareFilterAction", false, 0, 6),
    def(334, "C1G2TagInventoryStateUnawareFilterAction", false, 0, 5),
    def(335, "C1G2RFControl", false, 0, 8),
    def(336, "C1G2SingulationControl", true, 0, 11),
    def(337, "C1G2TagInventoryStateAwareSingulationAction", false, 0, 5),
    // C1G2 access operations
    def(338, "C1G2TagSpec", true, 0, 4),
    def(339, "C1G2TargetTag", false, 0, 9),
    def(341, "C1G2Read", false, 0, 15),
    def(342, "C1G2Write", false, 0, 15),
    def(343, "C1G2Kill", false, 0, 10),
    def(344, "C1G2Lock", true, 0, 10),
    def(345, "C1G2LockPayload", false, 0, 6),
    def(346, "C1G2BlockErase", false, 0, 15),
    def(347, "C1G2BlockWrite", false, 0, 15),
    // C1G2 reporting
    def(348, "C1G2EPCMemorySelector", false, 0, 5),
    def(12, "C1G2PC", false, 3, 3),
    def(11, "C1G2CRC", false, 3, 3),
    def(18, "C1G2SingulationDetails", false, 5, 5),
    // C1G2 op spec results
    def(349, "C1G2ReadOpSpecResult", false, 0, 9),
    def(350, "C1G2WriteOpSpecResult", false, 0, 9),
    def(351, "C1G2KillOpSpecResult", false, 0, 7),
    def(352, "C1G2LockOpSpecResult", false, 0, 7),
    def(353, "C1G2BlockEraseOpSpecResult", false, 0, 7),
    def(354, "C1G2BlockWriteOpSpecResult", false, 0, 9),
];

static BY_CODE: LazyLock<HashMap<u16, &'static ParamDef>> =
    LazyLock::new(|| PARAM_DEFS.iter().map(|d| (d.code, d)).collect());

static BY_NAME: LazyLock<HashMap<&'static str, &'static ParamDef>> =
    LazyLock::new(|| PARAM_DEFS.iter().map(|d| (d.name, d)).collect());

/// Look up parameter metadata by numeric type code
pub fn param_def(code: u16) -> Option<&'static ParamDef> {
    BY_CODE.get(&code).copied()
}

/// Look up a parameter type code by its symbolic name
pub fn param_code(name: &str) -> Option<u16> {
    BY_NAME.get(name).map(|d| d.code)
}

/// Look up a parameter name by numeric type code
pub fn param_name(code: u16) -> Option<&'static str> {
    BY_CODE.get(&code).map(|d| d.name)
}
