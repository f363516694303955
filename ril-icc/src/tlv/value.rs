//! Typed values of COMPREHENSION-TLVs (TS 102.223 section 8)
//!
//! [`ComprehensionValue::interpret`] is the tag-keyed interpreter table and
//! [`ComprehensionValue::encode`] its inverse. A value that fails to decode is
//! kept as [`ComprehensionValue::Raw`] so the surrounding command still parses.

use chrono::{DateTime, FixedOffset};
use log::debug;

use super::tags;
use crate::buf::Buf;
use crate::pdu::{self, bcd, NationalLanguage, PduError};

/// Data coding of TEXT STRING values, bits 3 and 4 of the coding octet
pub mod text_coding {
    pub const MASK: u8 = 0x0C;
    pub const GSM_7BIT_PACKED: u8 = 0x00;
    pub const GSM_8BIT: u8 = 0x04;
    pub const UCS2: u8 = 0x08;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandDetails {
    pub command_number: u8,
    pub type_of_command: u8,
    pub command_qualifier: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceIdentities {
    pub source_id: u8,
    pub destination_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultObject {
    pub general_result: u8,
    pub additional_information: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duration {
    pub time_unit: u8,
    pub time_interval: u8,
}

/// Dialling number with its TON/NPI octet; `number` has a leading `+` when
/// the type of number is international
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub ton_npi: u8,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextString {
    pub coding_scheme: u8,
    pub text: String,
}

impl TextString {
    pub fn new(coding_scheme: u8, text: impl Into<String>) -> Self {
        Self {
            coding_scheme,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Item {
    pub identifier: u8,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseLength {
    pub min_length: u8,
    pub max_length: u8,
}

/// Number of files and the concatenated full paths of a REFRESH
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileList {
    pub num_files: u8,
    pub paths: Vec<u8>,
}

impl FileList {
    /// Paths as uppercase hex, `3F002FE2` for EF_ICCID
    pub fn file_list(&self) -> String {
        self.paths.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IconId {
    pub qualifier: u8,
    pub identifier: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemIconIdList {
    pub qualifier: u8,
    pub identifiers: Vec<u8>,
}

/// Decoded value of a COMPREHENSION-TLV
#[derive(Debug, Clone, PartialEq)]
pub enum ComprehensionValue {
    CommandDetails(CommandDetails),
    DeviceId(DeviceIdentities),
    Result(ResultObject),
    Duration(Duration),
    AlphaId(String),
    Address(Address),
    /// TEXT STRING or DEFAULT TEXT; `None` for a null (zero length) string
    TextString(Option<TextString>),
    Tone(u8),
    /// `None` for a null item, which removes an existing menu
    Item(Option<Item>),
    ItemId(u8),
    ResponseLength(ResponseLength),
    FileList(FileList),
    LocationStatus(u8),
    HelpRequest,
    NextActionIndicator(Vec<u8>),
    /// `None` for an empty list, which removes the current event list
    EventList(Option<Vec<u8>>),
    IconId(IconId),
    ItemIconIdList(ItemIconIdList),
    TimerId(u8),
    /// Seconds
    TimerValue(u32),
    DateTimeZone(DateTime<FixedOffset>),
    ImmediateResponse,
    Language(String),
    /// An empty URL means the default one
    Url(String),
    Raw(Vec<u8>),
}

impl ComprehensionValue {
    /// Interpret the value octets of a node with single-octet tag `tag`
    pub fn interpret(tag: u8, octets: &[u8]) -> Self {
        let mut buf = Buf::from_octets(octets.to_vec());
        match Self::decode(tag, &mut buf, octets.len()) {
            Ok(Some(value)) => value,
            Ok(None) => Self::Raw(octets.to_vec()),
            Err(e) => {
                debug!("Keeping value of tag {:#04x} raw: {}", tag, e);
                Self::Raw(octets.to_vec())
            }
        }
    }

    fn decode(tag: u8, buf: &mut Buf, length: usize) -> Result<Option<Self>, PduError> {
        let value = match tag {
            tags::COMMAND_DETAILS => Self::CommandDetails(CommandDetails {
                command_number: buf.read_u8()?,
                type_of_command: buf.read_u8()?,
                command_qualifier: buf.read_u8()?,
            }),
            tags::DEVICE_ID => Self::DeviceId(DeviceIdentities {
                source_id: buf.read_u8()?,
                destination_id: buf.read_u8()?,
            }),
            tags::RESULT => {
                let general_result = buf.read_u8()?;
                Self::Result(ResultObject {
                    general_result,
                    additional_information: buf.read_octets(length - 1)?,
                })
            }
            tags::DURATION => Self::Duration(Duration {
                time_unit: buf.read_u8()?,
                time_interval: buf.read_u8()?,
            }),
            tags::ALPHA_ID => Self::AlphaId(pdu::read_alpha_identifier(buf, length)?),
            tags::ADDRESS => {
                if length == 0 {
                    return Ok(None);
                }
                let ton_npi = buf.peek_u8()?;
                Self::Address(Address {
                    ton_npi,
                    number: pdu::read_dialling_number(buf, length)?,
                })
            }
            tags::TEXT_STRING | tags::DEFAULT_TEXT => {
                if length == 0 {
                    return Ok(Some(Self::TextString(None)));
                }
                let coding_scheme = buf.read_u8()?;
                let remaining = length - 1;
                let text = match coding_scheme & text_coding::MASK {
                    text_coding::GSM_7BIT_PACKED => {
                        let lang = NationalLanguage::Default;
                        pdu::read_septets_to_string(buf, remaining * 8 / 7, 0, lang, lang)?
                    }
                    text_coding::GSM_8BIT => pdu::read_8bit_unpacked_to_string(buf, remaining)?,
                    text_coding::UCS2 => pdu::read_ucs2_string(buf, remaining)?,
                    _ => return Ok(None),
                };
                Self::TextString(Some(TextString { coding_scheme, text }))
            }
            tags::TONE => Self::Tone(buf.read_u8()?),
            tags::ITEM => {
                if length == 0 {
                    return Ok(Some(Self::Item(None)));
                }
                let identifier = buf.read_u8()?;
                let text = pdu::read_alpha_identifier(buf, length - 1)?;
                Self::Item(Some(Item { identifier, text }))
            }
            tags::ITEM_ID => Self::ItemId(buf.read_u8()?),
            tags::RESPONSE_LENGTH => Self::ResponseLength(ResponseLength {
                min_length: buf.read_u8()?,
                max_length: buf.read_u8()?,
            }),
            tags::FILE_LIST => {
                let num_files = buf.read_u8()?;
                Self::FileList(FileList {
                    num_files,
                    paths: buf.read_octets(length - 1)?,
                })
            }
            tags::LOCATION_STATUS => Self::LocationStatus(buf.read_u8()?),
            tags::HELP_REQUEST => Self::HelpRequest,
            tags::NEXT_ACTION_IND => Self::NextActionIndicator(buf.read_octets(length)?),
            tags::EVENT_LIST => {
                if length == 0 {
                    Self::EventList(None)
                } else {
                    Self::EventList(Some(buf.read_octets(length)?))
                }
            }
            tags::ICON_ID => Self::IconId(IconId {
                qualifier: buf.read_u8()?,
                identifier: buf.read_u8()?,
            }),
            tags::ITEM_ICON_ID_LIST => {
                let qualifier = buf.read_u8()?;
                Self::ItemIconIdList(ItemIconIdList {
                    qualifier,
                    identifiers: buf.read_octets(length - 1)?,
                })
            }
            tags::TIMER_IDENTIFIER => Self::TimerId(buf.read_u8()?),
            tags::TIMER_VALUE => {
                let hours = bcd::read_swapped_nibble_bcd_num(buf, 1)?;
                let minutes = bcd::read_swapped_nibble_bcd_num(buf, 1)?;
                let seconds = bcd::read_swapped_nibble_bcd_num(buf, 1)?;
                Self::TimerValue(hours * 60 * 60 + minutes * 60 + seconds)
            }
            tags::DATE_TIME_ZONE => Self::DateTimeZone(bcd::read_timestamp(buf)?),
            tags::IMMEDIATE_RESPONSE => Self::ImmediateResponse,
            tags::LANGUAGE => Self::Language(pdu::read_8bit_unpacked_to_string(buf, length)?),
            tags::URL => Self::Url(pdu::read_8bit_unpacked_to_string(buf, length)?),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Serialize the value octets (no tag, no length)
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Buf::new();
        match self {
            Self::CommandDetails(details) => buf.write_octets(&[
                details.command_number,
                details.type_of_command,
                details.command_qualifier,
            ]),
            Self::DeviceId(device) => buf.write_octets(&[device.source_id, device.destination_id]),
            Self::Result(result) => {
                buf.write_u8(result.general_result);
                buf.write_octets(&result.additional_information);
            }
            Self::Duration(duration) => buf.write_octets(&[duration.time_unit, duration.time_interval]),
            Self::AlphaId(text) => write_alpha_id(&mut buf, text),
            Self::Address(address) => {
                buf.write_u8(address.ton_npi);
                bcd::write_swapped_nibble_bcd(&mut buf, address.number.trim_start_matches('+'));
            }
            Self::TextString(None) => {}
            Self::TextString(Some(text)) => {
                buf.write_u8(text.coding_scheme);
                write_text(&mut buf, text.coding_scheme, &text.text);
            }
            Self::Tone(octet)
            | Self::ItemId(octet)
            | Self::LocationStatus(octet)
            | Self::TimerId(octet) => buf.write_u8(*octet),
            Self::Item(None) => {}
            Self::Item(Some(item)) => {
                buf.write_u8(item.identifier);
                write_alpha_id(&mut buf, &item.text);
            }
            Self::ResponseLength(response) => {
                buf.write_octets(&[response.min_length, response.max_length])
            }
            Self::FileList(list) => {
                buf.write_u8(list.num_files);
                buf.write_octets(&list.paths);
            }
            Self::HelpRequest | Self::ImmediateResponse | Self::EventList(None) => {}
            Self::NextActionIndicator(octets) | Self::EventList(Some(octets)) | Self::Raw(octets) => {
                buf.write_octets(octets)
            }
            Self::IconId(icon) => buf.write_octets(&[icon.qualifier, icon.identifier]),
            Self::ItemIconIdList(list) => {
                buf.write_u8(list.qualifier);
                buf.write_octets(&list.identifiers);
            }
            Self::TimerValue(seconds) => write_timer_value(&mut buf, *seconds),
            Self::DateTimeZone(date) => bcd::write_timestamp(&mut buf, date),
            Self::Language(text) | Self::Url(text) => {
                pdu::write_string_to_8bit_unpacked(&mut buf, pdu::gsm_8bit_length(text), Some(text.as_str()))
            }
        }
        buf.into_octets()
    }
}

/// GSM 8-bit when representable, UCS2 (scheme 0x80) otherwise
fn write_alpha_id(buf: &mut Buf, text: &str) {
    let octets = if pdu::is_gsm_8bit_alphabet(text) {
        pdu::gsm_8bit_length(text)
    } else {
        1 + text.encode_utf16().count() * 2
    };
    pdu::write_alpha_identifier(buf, octets, Some(text));
}

/// Write `text` in the alphabet selected by `coding_scheme`
pub(crate) fn write_text(buf: &mut Buf, coding_scheme: u8, text: &str) {
    match coding_scheme & text_coding::MASK {
        text_coding::GSM_7BIT_PACKED => {
            let lang = NationalLanguage::Default;
            pdu::write_string_as_septets(buf, text, 0, lang, lang);
        }
        text_coding::UCS2 => pdu::write_ucs2_string(buf, text),
        _ => pdu::write_string_to_8bit_unpacked(buf, pdu::gsm_8bit_length(text), Some(text)),
    }
}

/// Hours, minutes and seconds as three swapped-nibble octets
pub(crate) fn write_timer_value(buf: &mut Buf, seconds: u32) {
    let hours = (seconds / 3600).min(99);
    let minutes = (seconds % 3600) / 60;
    buf.write_u8(bcd::bcd_to_octet(hours as u8));
    buf.write_u8(bcd::bcd_to_octet(minutes as u8));
    buf.write_u8(bcd::bcd_to_octet((seconds % 60) as u8));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::{decode_ber, TLVEncoder};

    fn assert_reencodes(fixture: &str) {
        let data = hex::decode(fixture).unwrap();
        let mut buf = Buf::from_octets(data.clone());
        let ber = decode_ber(&mut buf, data.len()).unwrap();
        assert_eq!(TLVEncoder::encode_ber(&ber), data, "fixture {}", fixture);
    }

    #[test]
    fn test_play_tone_values() {
        let data = hex::decode("85094469616C20546F6E65").unwrap();
        assert_eq!(
            ComprehensionValue::interpret(tags::ALPHA_ID, &data[2..]),
            ComprehensionValue::AlphaId("Dial Tone".to_string())
        );
        assert_eq!(
            ComprehensionValue::interpret(tags::DURATION, &[0x01, 0x05]),
            ComprehensionValue::Duration(Duration { time_unit: 1, time_interval: 5 })
        );
    }

    #[test]
    fn test_packed_text_string() {
        let data = hex::decode("00D3309BFC06C95C301AA8E80259C3EC34B9AC07C9602F58ED159BB940").unwrap();
        match ComprehensionValue::interpret(tags::TEXT_STRING, &data) {
            ComprehensionValue::TextString(Some(text)) => {
                assert_eq!(text.coding_scheme, 0x00);
                assert_eq!(text.text, "Saldo 2.04 E. Validez 20/05/13. ");
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_null_values() {
        assert_eq!(
            ComprehensionValue::interpret(tags::TEXT_STRING, &[]),
            ComprehensionValue::TextString(None)
        );
        assert_eq!(
            ComprehensionValue::interpret(tags::ITEM, &[]),
            ComprehensionValue::Item(None)
        );
        assert_eq!(
            ComprehensionValue::interpret(tags::EVENT_LIST, &[]),
            ComprehensionValue::EventList(None)
        );
        assert_eq!(ComprehensionValue::interpret(tags::URL, &[]), ComprehensionValue::Url(String::new()));
    }

    #[test]
    fn test_short_value_is_raw() {
        assert_eq!(
            ComprehensionValue::interpret(tags::COMMAND_DETAILS, &[0x01, 0x02]),
            ComprehensionValue::Raw(vec![0x01, 0x02])
        );
        assert_eq!(
            ComprehensionValue::interpret(tags::TEXT_STRING, &[0x0C, 0x41]),
            ComprehensionValue::Raw(vec![0x0C, 0x41])
        );
    }

    #[test]
    fn test_address() {
        let data = hex::decode("811032042143651C2C").unwrap();
        let value = ComprehensionValue::interpret(tags::ADDRESS, &data);
        assert_eq!(
            value,
            ComprehensionValue::Address(Address {
                ton_npi: 0x81,
                number: "012340123456,1,2".to_string(),
            })
        );
        assert_eq!(value.encode(), data);

        let data = hex::decode("912143").unwrap();
        let value = ComprehensionValue::interpret(tags::ADDRESS, &data);
        assert!(matches!(&value, ComprehensionValue::Address(a) if a.number == "+1234"));
        assert_eq!(value.encode(), data);
    }

    #[test]
    fn test_timer_value() {
        let value = ComprehensionValue::interpret(tags::TIMER_VALUE, &[0x10, 0x20, 0x30]);
        assert_eq!(value, ComprehensionValue::TimerValue(3723));
        assert_eq!(value.encode(), vec![0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_alpha_id_ucs2_encode() {
        let value = ComprehensionValue::AlphaId("\u{694a}".to_string());
        assert_eq!(value.encode(), vec![0x80, 0x69, 0x4A]);
        assert_eq!(ComprehensionValue::interpret(tags::ALPHA_ID, &[0x80, 0x69, 0x4A]), value);
    }

    #[test]
    fn test_fixtures_reencode() {
        for fixture in [
            "D0108103010101820281829205013F002FE2",
            "D01B81030120008202810385094469616C20546F6E658E010184020105",
            "D00D81030103008202818284020114",
            "D0288103012180820281020D1D00D3309BFC06C95C301AA8E80259C3EC34B9AC07C9602F58ED159BB940",
            "D00F810301050082028182990400010203",
            "D01E810301238F820281828D0504546578749102011017080444656661756C74",
            "D0118103012300820281828D00910201101700",
            "D009810301020082028182",
            "D029810301100482028182050A446973636F6E6E6563748609811032042143651C2C05074D657373616765",
            "D011810301270082028182A40101A503102030",
            "D00C810301270182028182A40101",
            "D009810301260182028182",
            "D009810301260382028182",
        ] {
            assert_reencodes(fixture);
        }
    }
}
