//! SIM Toolkit (TS 102.223)
//!
//! Proactive commands come in through [`StkSession::handle_proactive_command`]
//! and leave as typed [`CommandParams`]. Terminal responses, envelopes and
//! the terminal profile go out through the session's [`ParcelSink`].
//!
//! # Example
//! ```ignore
//! use ril_icc::buf::{Buf, Parcel};
//! use ril_icc::stk::{CommandParams, StkSession};
//!
//! let mut session = StkSession::new(Vec::<Parcel>::new());
//! let data = hex::decode("D00D81030103008202818284020114").unwrap();
//! let command = session
//!     .handle_proactive_command(&mut Buf::from_octets(data.clone()), data.len())
//!     .unwrap();
//! assert!(matches!(command.params, CommandParams::PollInterval(_)));
//! ```

mod command;
mod response;

pub use command::{
    create_param, Browser, CommandParams, Input, Menu, ProactiveCommand, SetUpCall, TextMessage,
    Timer, Tone,
};
pub use response::{
    cause_tlv, date_time_zone_tlv, imei_tlv, language_tlv, location_info_tlv, timer_value_tlv,
    Envelope, LocalInfo, LocationInfo, StkEvent, TerminalResponse, TimerInfo,
    DEFAULT_TERMINAL_PROFILE,
};

use log::{debug, error, warn};
use thiserror::Error;

use crate::buf::{request, Buf, Parcel, ParcelSink};
use crate::config::IccConfig;
use crate::tlv::value::CommandDetails;
use crate::tlv::{decode_ber, hexify, tags, ComprehensionTLV, ComprehensionValue, TLVError};

/// Errors raised while handling proactive commands
#[derive(Debug, Error, PartialEq)]
pub enum StkError {
    #[error(transparent)]
    Tlv(#[from] TLVError),

    #[error("Proactive command has no command details")]
    MissingCommandDetails,

    #[error("{command}: Required value missing : {value}")]
    RequiredValueMissing {
        command: &'static str,
        value: &'static str,
    },
}

/// Type of command (TS 102.223 section 9.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    Refresh = 0x01,
    MoreTime = 0x02,
    PollInterval = 0x03,
    PollOff = 0x04,
    SetUpEventList = 0x05,
    SetUpCall = 0x10,
    SendSs = 0x11,
    SendUssd = 0x12,
    SendSms = 0x13,
    SendDtmf = 0x14,
    LaunchBrowser = 0x15,
    PlayTone = 0x20,
    DisplayText = 0x21,
    GetInkey = 0x22,
    GetInput = 0x23,
    SelectItem = 0x24,
    SetUpMenu = 0x25,
    ProvideLocalInfo = 0x26,
    TimerManagement = 0x27,
    SetUpIdleModeText = 0x28,
    LanguageNotification = 0x35,
    OpenChannel = 0x40,
    CloseChannel = 0x41,
    ReceiveData = 0x42,
    SendData = 0x43,
}

impl CommandType {
    pub fn from_u8(value: u8) -> Option<Self> {
        let command = match value {
            0x01 => Self::Refresh,
            0x02 => Self::MoreTime,
            0x03 => Self::PollInterval,
            0x04 => Self::PollOff,
            0x05 => Self::SetUpEventList,
            0x10 => Self::SetUpCall,
            0x11 => Self::SendSs,
            0x12 => Self::SendUssd,
            0x13 => Self::SendSms,
            0x14 => Self::SendDtmf,
            0x15 => Self::LaunchBrowser,
            0x20 => Self::PlayTone,
            0x21 => Self::DisplayText,
            0x22 => Self::GetInkey,
            0x23 => Self::GetInput,
            0x24 => Self::SelectItem,
            0x25 => Self::SetUpMenu,
            0x26 => Self::ProvideLocalInfo,
            0x27 => Self::TimerManagement,
            0x28 => Self::SetUpIdleModeText,
            0x35 => Self::LanguageNotification,
            0x40 => Self::OpenChannel,
            0x41 => Self::CloseChannel,
            0x42 => Self::ReceiveData,
            0x43 => Self::SendData,
            _ => return None,
        };
        Some(command)
    }
}

/// General result codes (TS 102.223 section 8.12)
pub mod result {
    pub const OK: u8 = 0x00;
    pub const PRFRMD_WITH_PARTIAL_COMPREHENSION: u8 = 0x01;
    pub const PRFRMD_WITH_MISSING_INFO: u8 = 0x02;
    pub const PRFRMD_WITH_ADDITIONAL_EFS_READ: u8 = 0x03;
    pub const PRFRMD_ICON_NOT_DISPLAYED: u8 = 0x04;
    pub const PRFRMD_MODIFIED_BY_NAA: u8 = 0x05;
    pub const PRFRMD_LIMITED_SERVICE: u8 = 0x06;
    pub const PRFRMD_WITH_MODIFICATION: u8 = 0x07;
    pub const PRFRMD_NAA_NOT_ACTIVE: u8 = 0x08;
    pub const PRFRMD_TONE_NOT_PLAYED: u8 = 0x09;
    pub const UICC_SESSION_TERM_BY_USER: u8 = 0x10;
    pub const BACKWARD_MOVE_BY_USER: u8 = 0x11;
    pub const NO_RESPONSE_FROM_USER: u8 = 0x12;
    pub const HELP_INFO_REQUIRED: u8 = 0x13;
    pub const USSD_SS_SESSION_TERM_BY_USER: u8 = 0x14;
    pub const TERMINAL_CRNTLY_UNABLE_TO_PROCESS: u8 = 0x20;
    pub const NETWORK_CRNTLY_UNABLE_TO_PROCESS: u8 = 0x21;
    pub const USER_NOT_ACCEPT: u8 = 0x22;
    pub const USER_CLEAR_DOWN_CALL: u8 = 0x23;
    pub const ACTION_CONTRADICTION_TIMER_STATE: u8 = 0x24;
    pub const NAA_CALL_CONTROL_TEMPORARY: u8 = 0x25;
    pub const LAUNCH_BROWSER_ERROR: u8 = 0x26;
    pub const BEYOND_TERMINAL_CAPABILITY: u8 = 0x30;
    pub const CMD_TYPE_NOT_UNDERSTOOD: u8 = 0x31;
    pub const CMD_DATA_NOT_UNDERSTOOD: u8 = 0x32;
    pub const CMD_NUM_NOT_KNOWN: u8 = 0x33;
    pub const SS_RETURN_ERROR: u8 = 0x34;
    pub const SMS_RP_ERROR: u8 = 0x35;
    pub const REQUIRED_VALUES_MISSING: u8 = 0x36;
    pub const USSD_RETURN_ERROR: u8 = 0x37;
    pub const MULTI_CARDS_CMD_ERROR: u8 = 0x38;
    pub const USIM_CALL_CONTROL_PERMANENT: u8 = 0x39;
    pub const BIP_ERROR: u8 = 0x3A;
}

/// Device identities (TS 102.223 section 8.7)
pub mod device {
    pub const KEYPAD: u8 = 0x01;
    pub const DISPLAY: u8 = 0x02;
    pub const EARPIECE: u8 = 0x03;
    pub const SIM: u8 = 0x81;
    pub const ME: u8 = 0x82;
    pub const NETWORK: u8 = 0x83;
}

/// Event list entries (TS 102.223 section 8.25)
pub mod event {
    pub const MT_CALL: u8 = 0x00;
    pub const CALL_CONNECTED: u8 = 0x01;
    pub const CALL_DISCONNECTED: u8 = 0x02;
    pub const LOCATION_STATUS: u8 = 0x03;
    pub const USER_ACTIVITY: u8 = 0x04;
    pub const IDLE_SCREEN_AVAILABLE: u8 = 0x05;
    pub const CARD_READER_STATUS: u8 = 0x06;
    pub const LANGUAGE_SELECTION: u8 = 0x07;
    pub const BROWSER_TERMINATION: u8 = 0x08;
    pub const DATA_AVAILABLE: u8 = 0x09;
    pub const CHANNEL_STATUS: u8 = 0x0A;
}

/// Location status values
pub mod service_state {
    pub const NORMAL: u8 = 0x00;
    pub const LIMITED: u8 = 0x01;
    pub const UNAVAILABLE: u8 = 0x02;
}

pub mod time_unit {
    pub const MINUTE: u8 = 0x00;
    pub const SECOND: u8 = 0x01;
    pub const TENTH_SECOND: u8 = 0x02;
}

pub mod tone {
    pub const DIAL_TONE: u8 = 0x01;
    pub const CALLED_SUBSCRIBER_BUSY: u8 = 0x02;
    pub const CONGESTION: u8 = 0x03;
    pub const RADIO_PATH_ACK: u8 = 0x04;
    pub const RADIO_PATH_NOT_AVAILABLE: u8 = 0x05;
    pub const ERROR: u8 = 0x06;
    pub const CALL_WAITING_TONE: u8 = 0x07;
    pub const RINGING_TONE: u8 = 0x08;
    pub const GENERAL_BEEP: u8 = 0x10;
    pub const POSITIVE_ACK_TONE: u8 = 0x11;
    pub const NEGATIVE_ACK_TONE: u8 = 0x12;
}

/// PROVIDE LOCAL INFORMATION qualifiers
pub mod local_info {
    pub const LOCATION_INFO: u8 = 0x00;
    pub const IMEI: u8 = 0x01;
    pub const NMR: u8 = 0x02;
    pub const DATE_TIME_ZONE: u8 = 0x03;
    pub const LANGUAGE: u8 = 0x04;
}

/// TIMER MANAGEMENT qualifiers
pub mod timer_action {
    pub const START: u8 = 0x00;
    pub const DEACTIVATE: u8 = 0x01;
    pub const GET_CURRENT_VALUE: u8 = 0x02;
}

/// First node with tag `tag` (CR flag ignored)
pub fn search_for_tag(tag: u8, nodes: &[ComprehensionTLV]) -> Option<&ComprehensionTLV> {
    nodes.iter().find(|node| node.tag_id() == Some(tag))
}

/// Next node with tag `tag` from a shared iterator, for commands that carry
/// the same tag more than once
pub fn search_for_next_tag<'a, I>(tag: u8, iter: &mut I) -> Option<&'a ComprehensionTLV>
where
    I: Iterator<Item = &'a ComprehensionTLV>,
{
    iter.find(|node| node.tag_id() == Some(tag))
}

/// Proactive session state: outbound sink, token counter and settings
pub struct StkSession<S: ParcelSink> {
    sink: S,
    token: u32,
    config: IccConfig,
}

impl<S: ParcelSink> StkSession<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, IccConfig::default())
    }

    pub fn with_config(sink: S, config: IccConfig) -> Self {
        Self {
            sink,
            token: 0,
            config,
        }
    }

    pub fn config(&self) -> &IccConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn send(&mut self, request_type: u32, payload: Vec<u8>) {
        self.token = self.token.wrapping_add(1);
        if self.config.debug {
            debug!("Parcel {} token {}: {}", request_type, self.token, hexify(&payload));
        }
        self.sink.send_parcel(Parcel::new(request_type, self.token, payload));
    }

    /// Decode a proactive command and build its parameters.
    ///
    /// Commands that cannot be understood are answered here with a terminal
    /// response before the error is returned.
    pub fn handle_proactive_command(
        &mut self,
        buf: &mut Buf,
        data_len: usize,
    ) -> Result<ProactiveCommand, StkError> {
        let ber = match decode_ber(buf, data_len) {
            Ok(ber) => ber,
            Err(e) => {
                error!("Failed to decode proactive command: {}", e);
                let response = TerminalResponse::new(CommandDetails::default(), result::CMD_DATA_NOT_UNDERSTOOD);
                self.send_stk_terminal_response(&response);
                return Err(e.into());
            }
        };

        let details = match search_for_tag(tags::COMMAND_DETAILS, &ber.value).map(|node| &node.value) {
            Some(ComprehensionValue::CommandDetails(details)) => *details,
            _ => {
                error!("Proactive command without command details");
                let response = TerminalResponse::new(CommandDetails::default(), result::CMD_DATA_NOT_UNDERSTOOD);
                self.send_stk_terminal_response(&response);
                return Err(StkError::MissingCommandDetails);
            }
        };
        debug!(
            "Proactive command {:#04x} number {} qualifier {:#04x}",
            details.type_of_command, details.command_number, details.command_qualifier
        );

        match create_param(&details, &ber.value) {
            Ok(params) => {
                if let CommandParams::Unknown(command_type) = params {
                    warn!("Unknown proactive command type {:#04x}", command_type);
                }
                Ok(ProactiveCommand { details, params })
            }
            Err(e) => {
                error!("{}", e);
                if matches!(e, StkError::RequiredValueMissing { .. }) {
                    let response = TerminalResponse::new(details, result::REQUIRED_VALUES_MISSING);
                    self.send_stk_terminal_response(&response);
                }
                Err(e)
            }
        }
    }

    pub fn send_stk_terminal_response(&mut self, response: &TerminalResponse) {
        let payload = response.encode(self.config.language, self.config.language_shift);
        self.send(request::STK_SEND_TERMINAL_RESPONSE, payload);
    }

    pub fn send_stk_event_download(&mut self, event: &StkEvent) {
        self.send_icc_envelope_command(&Envelope::from_event(event));
    }

    pub fn send_stk_menu_selection(&mut self, item_identifier: u8, help_requested: bool) {
        self.send_icc_envelope_command(&Envelope::menu_selection(item_identifier, help_requested));
    }

    pub fn send_stk_timer_expiration(&mut self, timer_id: u8, timer_value: u32) {
        self.send_icc_envelope_command(&Envelope::timer_expiration(timer_id, timer_value));
    }

    pub fn send_icc_envelope_command(&mut self, envelope: &Envelope) {
        self.send(request::STK_SEND_ENVELOPE_COMMAND, envelope.encode());
    }

    /// Send `profile`, or the configured terminal profile when `None`
    pub fn send_stk_terminal_profile(&mut self, profile: Option<&[u8]>) {
        let profile = profile
            .map(<[u8]>::to_vec)
            .unwrap_or_else(|| self.config.terminal_profile.clone());
        self.send(request::STK_SET_PROFILE, profile);
    }
}
