//! Terminal responses, envelopes and the TLV writers they share

use chrono::{DateTime, FixedOffset};

use super::{device, event, result, service_state};
use crate::buf::Buf;
use crate::pdu::{self, bcd, NationalLanguage, Plmn};
use crate::tlv::value::{text_coding, write_timer_value, CommandDetails, DeviceIdentities};
use crate::tlv::{ber_tags, tags, TLVBuilder, TLVEncoder, FLAG_CR};

/// Terminal profile sent when nothing else is configured
/// (TS 102.223 section 5.2, one octet per facility group)
pub const DEFAULT_TERMINAL_PROFILE: [u8; 9] = [
    // Profile download, menu selection, timer expiration
    0x29,
    // Command result, UCS2 entry, UCS2 display
    0x61,
    // DISPLAY TEXT through REFRESH
    0xFF,
    // SELECT ITEM through PROVIDE LOCAL INFORMATION (location, IMEI)
    0x7F,
    // SET UP EVENT LIST, call and location events, idle screen
    0x7F,
    // Language selection, browser termination
    0x03,
    0x00,
    // Timers, date and time, GET INKEY, idle mode text, second alpha id
    0x57,
    // SEND DTMF, local language, language notification, LAUNCH BROWSER
    0x6A,
];

/// Location information as sent in envelopes and terminal responses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationInfo {
    pub plmn: Plmn,
    pub lac: u16,
    /// Cell ids above `0xFFFF` are written on four octets
    pub cell_id: u32,
}

/// Answers to PROVIDE LOCAL INFORMATION
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalInfo {
    pub location_info: Option<LocationInfo>,
    pub imei: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub language: Option<String>,
}

/// Answer to TIMER MANAGEMENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerInfo {
    pub timer_id: u8,
    /// Seconds
    pub timer_value: Option<u32>,
}

/// A TERMINAL RESPONSE to one proactive command
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerminalResponse {
    pub command: CommandDetails,
    pub result_code: u8,
    pub additional_information: Option<u8>,
    pub item_identifier: Option<u8>,
    /// Text entered by the user for GET INPUT or GET INKEY
    pub input: Option<String>,
    /// Answer to a yes/no GET INKEY
    pub is_yes_no: Option<bool>,
    /// Input coding requested by the command qualifier
    pub is_ucs2: bool,
    pub is_packed: bool,
    pub local_info: Option<LocalInfo>,
    pub timer: Option<TimerInfo>,
}

impl TerminalResponse {
    pub fn new(command: CommandDetails, result_code: u8) -> Self {
        Self {
            command,
            result_code,
            ..Self::default()
        }
    }

    /// Serialize the response; packed input uses the given language tables
    pub fn encode(&self, lang: NationalLanguage, shift: NationalLanguage) -> Vec<u8> {
        let details = [
            self.command.command_number,
            self.command.type_of_command,
            self.command.command_qualifier,
        ];
        let mut result_octets = vec![self.result_code];
        result_octets.extend(self.additional_information);

        // Objects with Min=N, the device identities included, go without CR
        let mut builder = TLVBuilder::new()
            .add(tags::COMMAND_DETAILS | FLAG_CR, &details)
            .add(tags::DEVICE_ID, &[device::ME, device::SIM])
            .add(tags::RESULT | FLAG_CR, &result_octets);

        if let Some(item) = self.item_identifier {
            builder = builder.add(tags::ITEM_ID | FLAG_CR, &[item]);
        }

        if self.result_code != result::HELP_INFO_REQUIRED {
            if let Some(yes) = self.is_yes_no {
                builder = builder.add(tags::TEXT_STRING | FLAG_CR, &[text_coding::GSM_8BIT, yes as u8]);
            } else if let Some(input) = self.input.as_deref().filter(|input| !input.is_empty()) {
                builder = builder.add_raw(&self.input_tlv(input, lang, shift));
            }
        }

        if let Some(info) = &self.local_info {
            if let Some(location) = &info.location_info {
                builder = builder.add_raw(&location_info_tlv(location));
            }
            if let Some(imei) = &info.imei {
                builder = builder.add_raw(&imei_tlv(imei));
            }
            if let Some(date) = &info.date {
                builder = builder.add_raw(&date_time_zone_tlv(date));
            }
            if let Some(language) = &info.language {
                builder = builder.add_raw(&language_tlv(language));
            }
        }

        if let Some(timer) = &self.timer {
            if timer.timer_id != 0 {
                builder = builder.add(tags::TIMER_IDENTIFIER, &[timer.timer_id]);
            }
            if let Some(seconds) = timer.timer_value {
                builder = builder.add_raw(&timer_value_tlv(seconds, false));
            }
        }

        builder.build()
    }

    fn input_tlv(&self, input: &str, lang: NationalLanguage, shift: NationalLanguage) -> Vec<u8> {
        let mut buf = Buf::new();
        if self.is_ucs2 {
            buf.write_u8(text_coding::UCS2);
            pdu::write_ucs2_string(&mut buf, input);
        } else if self.is_packed {
            buf.write_u8(text_coding::GSM_7BIT_PACKED);
            pdu::write_string_as_septets(&mut buf, input, 0, lang, shift);
        } else {
            buf.write_u8(text_coding::GSM_8BIT);
            pdu::write_string_to_8bit_unpacked(&mut buf, pdu::gsm_8bit_length(input), Some(input));
        }
        TLVEncoder::encode(tags::TEXT_STRING | FLAG_CR, buf.as_octets())
    }
}

/// Events reported with an EVENT DOWNLOAD envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StkEvent {
    MtCall {
        number: Option<String>,
    },
    CallConnected {
        is_issued_by_remote: bool,
    },
    CallDisconnected {
        is_issued_by_remote: bool,
        cause: Option<u8>,
    },
    /// Location information is only sent with normal service
    LocationStatus {
        location_status: u8,
        location_info: Option<LocationInfo>,
    },
    UserActivity,
    IdleScreenAvailable,
    LanguageSelection {
        language: String,
    },
    BrowserTermination {
        termination_cause: u8,
    },
}

impl StkEvent {
    pub fn event_type(&self) -> u8 {
        match self {
            Self::MtCall { .. } => event::MT_CALL,
            Self::CallConnected { .. } => event::CALL_CONNECTED,
            Self::CallDisconnected { .. } => event::CALL_DISCONNECTED,
            Self::LocationStatus { .. } => event::LOCATION_STATUS,
            Self::UserActivity => event::USER_ACTIVITY,
            Self::IdleScreenAvailable => event::IDLE_SCREEN_AVAILABLE,
            Self::LanguageSelection { .. } => event::LANGUAGE_SELECTION,
            Self::BrowserTermination { .. } => event::BROWSER_TERMINATION,
        }
    }
}

/// An ENVELOPE command; absent fields are left out of the encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub envelope_type: u8,
    pub device_id: DeviceIdentities,
    pub item_identifier: Option<u8>,
    pub help_requested: bool,
    pub event_list: Option<u8>,
    pub location_status: Option<u8>,
    pub location_info: Option<LocationInfo>,
    pub transaction_id: Option<u8>,
    pub address: Option<String>,
    pub cause: Option<u8>,
    pub timer_id: Option<u8>,
    pub timer_value: Option<u32>,
    pub language: Option<String>,
    pub termination_cause: Option<u8>,
}

impl Envelope {
    pub fn new(envelope_type: u8, source_id: u8, destination_id: u8) -> Self {
        Self {
            envelope_type,
            device_id: DeviceIdentities {
                source_id,
                destination_id,
            },
            item_identifier: None,
            help_requested: false,
            event_list: None,
            location_status: None,
            location_info: None,
            transaction_id: None,
            address: None,
            cause: None,
            timer_id: None,
            timer_value: None,
            language: None,
            termination_cause: None,
        }
    }

    /// MENU SELECTION from the keypad
    pub fn menu_selection(item_identifier: u8, help_requested: bool) -> Self {
        Self {
            item_identifier: Some(item_identifier),
            help_requested,
            ..Self::new(ber_tags::MENU_SELECTION, device::KEYPAD, device::SIM)
        }
    }

    pub fn timer_expiration(timer_id: u8, timer_value: u32) -> Self {
        Self {
            timer_id: Some(timer_id),
            timer_value: Some(timer_value),
            ..Self::new(ber_tags::TIMER_EXPIRATION, device::ME, device::SIM)
        }
    }

    /// EVENT DOWNLOAD for `event`
    pub fn from_event(event: &StkEvent) -> Self {
        let new = |source_id| Self {
            event_list: Some(event.event_type()),
            ..Self::new(ber_tags::EVENT_DOWNLOAD, source_id, device::SIM)
        };
        let remote_or_me = |remote: bool| if remote { device::NETWORK } else { device::ME };

        match event {
            StkEvent::MtCall { number } => Self {
                transaction_id: Some(0),
                address: number.clone(),
                ..new(device::NETWORK)
            },
            StkEvent::CallConnected { is_issued_by_remote } => Self {
                transaction_id: Some(0),
                ..new(remote_or_me(*is_issued_by_remote))
            },
            StkEvent::CallDisconnected {
                is_issued_by_remote,
                cause,
            } => Self {
                transaction_id: Some(0),
                cause: *cause,
                ..new(remote_or_me(*is_issued_by_remote))
            },
            StkEvent::LocationStatus {
                location_status,
                location_info,
            } => Self {
                location_status: Some(*location_status),
                location_info: location_info.clone().filter(|_| *location_status == service_state::NORMAL),
                ..new(device::ME)
            },
            StkEvent::UserActivity => new(device::ME),
            StkEvent::IdleScreenAvailable => new(device::DISPLAY),
            StkEvent::LanguageSelection { language } => Self {
                language: Some(language.clone()),
                ..new(device::ME)
            },
            StkEvent::BrowserTermination { termination_cause } => Self {
                termination_cause: Some(*termination_cause),
                ..new(device::ME)
            },
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut builder = TLVBuilder::new().add(
            tags::DEVICE_ID | FLAG_CR,
            &[self.device_id.source_id, self.device_id.destination_id],
        );
        if let Some(item) = self.item_identifier {
            builder = builder.add(tags::ITEM_ID | FLAG_CR, &[item]);
        }
        if self.help_requested {
            builder = builder.add(tags::HELP_REQUEST | FLAG_CR, &[]);
        }
        if let Some(event) = self.event_list {
            builder = builder.add(tags::EVENT_LIST | FLAG_CR, &[event]);
        }
        if let Some(status) = self.location_status {
            builder = builder.add(tags::LOCATION_STATUS | FLAG_CR, &[status]);
        }
        if let Some(location) = &self.location_info {
            builder = builder.add_raw(&location_info_tlv(location));
        }
        if let Some(id) = self.transaction_id {
            builder = builder.add(tags::TRANSACTION_ID | FLAG_CR, &[id]);
        }
        if let Some(number) = self.address.as_deref().filter(|number| !number.is_empty()) {
            let mut buf = Buf::new();
            pdu::write_dialling_number(&mut buf, number);
            builder = builder.add(tags::ADDRESS | FLAG_CR, buf.as_octets());
        }
        if let Some(cause) = self.cause {
            builder = builder.add_raw(&cause_tlv(cause));
        }
        if let Some(id) = self.timer_id {
            builder = builder.add(tags::TIMER_IDENTIFIER | FLAG_CR, &[id]);
        }
        if let Some(seconds) = self.timer_value {
            builder = builder.add_raw(&timer_value_tlv(seconds, true));
        }
        if let Some(language) = &self.language {
            builder = builder.add_raw(&language_tlv(language));
        }
        if let Some(cause) = self.termination_cause {
            builder = builder.add(tags::BROWSER_TERMINATION_CAUSE | FLAG_CR, &[cause]);
        }
        builder.wrap(self.envelope_type).build()
    }
}

/// LOCATION INFORMATION: PLMN, LAC and a two or four octet cell id
pub fn location_info_tlv(info: &LocationInfo) -> Vec<u8> {
    let mut buf = Buf::new();
    bcd::write_plmn(&mut buf, &info.plmn);
    buf.write_u16_be(info.lac);
    if info.cell_id > 0xFFFF {
        buf.write_u16_be((info.cell_id >> 16) as u16);
    }
    buf.write_u16_be(info.cell_id as u16);
    TLVEncoder::encode(tags::LOCATION_INFO | FLAG_CR, buf.as_octets())
}

/// CAUSE with the coding standard octet of TS 24.008 section 10.5.4.11
pub fn cause_tlv(cause: u8) -> Vec<u8> {
    TLVEncoder::encode(tags::CAUSE | FLAG_CR, &[0x60, 0x80 | cause])
}

pub fn timer_value_tlv(seconds: u32, cr: bool) -> Vec<u8> {
    let mut buf = Buf::new();
    write_timer_value(&mut buf, seconds);
    let tag = if cr { tags::TIMER_VALUE | FLAG_CR } else { tags::TIMER_VALUE };
    TLVEncoder::encode(tag, buf.as_octets())
}

pub fn date_time_zone_tlv(date: &DateTime<FixedOffset>) -> Vec<u8> {
    let mut buf = Buf::new();
    bcd::write_timestamp(&mut buf, date);
    TLVEncoder::encode(tags::DATE_TIME_ZONE, buf.as_octets())
}

/// LANGUAGE, a two letter ISO 639 code
pub fn language_tlv(language: &str) -> Vec<u8> {
    let mut buf = Buf::new();
    pdu::write_string_to_8bit_unpacked(&mut buf, 2, Some(language));
    TLVEncoder::encode(tags::LANGUAGE, buf.as_octets())
}

/// IMEI as a mobile identity (TS 24.008 section 10.5.1.4): odd indicator and
/// identity type in the first octet, then swapped BCD digits
pub fn imei_tlv(imei: &str) -> Vec<u8> {
    let mut digits: Vec<u8> = imei.chars().filter_map(|c| c.to_digit(10)).map(|d| d as u8).collect();
    digits.resize(15, 0);

    let mut octets = Vec::with_capacity(8);
    octets.push((digits[0] << 4) | 0x0A);
    for pair in digits[1..].chunks(2) {
        octets.push((pair[1] << 4) | pair[0]);
    }
    TLVEncoder::encode(tags::IMEI, &octets)
}
