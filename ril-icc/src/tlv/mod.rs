//! BER-TLV and COMPREHENSION-TLV handling (TS 101.220, TS 102.223)
//!
//! Proactive commands arrive as one BER-TLV (tag `0xD0`) wrapping a list of
//! COMPREHENSION-TLVs. Each COMPREHENSION-TLV carries a comprehension
//! required (CR) flag in bit 8 of its tag and a value interpreted according
//! to the tag.
//!
//! # Example
//! ```ignore
//! use ril_icc::buf::Buf;
//! use ril_icc::tlv::{decode_ber, tags};
//!
//! let data = vec![0xD0, 0x09, 0x81, 0x03, 0x01, 0x02, 0x00, 0x82, 0x02, 0x81, 0x82];
//! let mut buf = Buf::from_octets(data.clone());
//! let ber = decode_ber(&mut buf, data.len()).unwrap();
//! assert_eq!(ber.value[0].tag, tags::COMMAND_DETAILS as u16);
//! ```

mod encoder;
mod parser;
pub mod value;

pub use encoder::{size_of_length_octets, write_length, TLVBuilder, TLVEncoder};
pub use parser::{
    decode_ber, decode_chunks, decode_comprehension, decode_simple_blocks, BerTLV, ComprehensionTLV,
    SimpleTLV, TLVError,
};
pub use value::ComprehensionValue;

/// Comprehension required flag, bit 8 of a single-octet tag
pub const FLAG_CR: u8 = 0x80;

/// Marker octet of the three-octet tag format
pub const THREE_OCTET_TAG: u8 = 0x7F;

/// COMPREHENSION-TLV tag values, without the CR flag
pub mod tags {
    pub const COMMAND_DETAILS: u8 = 0x01;
    pub const DEVICE_ID: u8 = 0x02;
    pub const RESULT: u8 = 0x03;
    pub const DURATION: u8 = 0x04;
    pub const ALPHA_ID: u8 = 0x05;
    pub const ADDRESS: u8 = 0x06;
    pub const CAP_CONFIG_PARAM: u8 = 0x07;
    pub const SUBADDRESS: u8 = 0x08;
    pub const SS_STRING: u8 = 0x09;
    pub const USSD_STRING: u8 = 0x0A;
    pub const SMS_TPDU: u8 = 0x0B;
    pub const TEXT_STRING: u8 = 0x0D;
    pub const TONE: u8 = 0x0E;
    pub const ITEM: u8 = 0x0F;
    pub const ITEM_ID: u8 = 0x10;
    pub const RESPONSE_LENGTH: u8 = 0x11;
    pub const FILE_LIST: u8 = 0x12;
    pub const LOCATION_INFO: u8 = 0x13;
    pub const IMEI: u8 = 0x14;
    pub const HELP_REQUEST: u8 = 0x15;
    pub const NMR: u8 = 0x16;
    pub const DEFAULT_TEXT: u8 = 0x17;
    pub const NEXT_ACTION_IND: u8 = 0x18;
    pub const EVENT_LIST: u8 = 0x19;
    pub const CAUSE: u8 = 0x1A;
    pub const LOCATION_STATUS: u8 = 0x1B;
    pub const TRANSACTION_ID: u8 = 0x1C;
    pub const ICON_ID: u8 = 0x1E;
    pub const ITEM_ICON_ID_LIST: u8 = 0x1F;
    pub const TIMER_IDENTIFIER: u8 = 0x24;
    pub const TIMER_VALUE: u8 = 0x25;
    pub const DATE_TIME_ZONE: u8 = 0x26;
    pub const IMMEDIATE_RESPONSE: u8 = 0x2B;
    pub const DTMF_STRING: u8 = 0x2C;
    pub const LANGUAGE: u8 = 0x2D;
    pub const URL: u8 = 0x31;
    pub const BROWSER_TERMINATION_CAUSE: u8 = 0x34;
}

/// BER-TLV tags of proactive commands and envelopes
pub mod ber_tags {
    pub const PROACTIVE_COMMAND: u8 = 0xD0;
    pub const SMS_PP_DOWNLOAD: u8 = 0xD1;
    pub const CELL_BROADCAST_DOWNLOAD: u8 = 0xD2;
    pub const MENU_SELECTION: u8 = 0xD3;
    pub const CALL_CONTROL: u8 = 0xD4;
    pub const MO_SMS_CONTROL: u8 = 0xD5;
    pub const EVENT_DOWNLOAD: u8 = 0xD6;
    pub const TIMER_EXPIRATION: u8 = 0xD7;
}

/// Format bytes as space separated hex, for log lines
pub fn hexify(value: &[u8]) -> String {
    value.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}
