//! Character and number codecs for SIM data
//!
//! Everything here reads from or writes to a [`Buf`]. Decoders always
//! consume exactly the number of octets they are given, even when the
//! payload ends early with `0xFF` filler, so the caller's position in a
//! record stays predictable.
//!
//! # Example
//! ```ignore
//! use ril_icc::buf::Buf;
//! use ril_icc::pdu;
//!
//! let mut buf = Buf::new();
//! pdu::write_alpha_identifier(&mut buf, 9, Some("Mozilla"));
//! assert_eq!(pdu::read_alpha_identifier(&mut buf, 9).unwrap(), "Mozilla");
//! ```

pub mod alphabet;
pub mod bcd;

pub use alphabet::{is_gsm_8bit_alphabet, NationalLanguage};
pub use bcd::Plmn;

use log::debug;
use thiserror::Error;

use crate::buf::{Buf, BufError};
use alphabet::{decode_septet, ESCAPE};

/// Errors raised while decoding SIM strings and numbers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PduError {
    #[error(transparent)]
    Buf(#[from] BufError),

    #[error("Invalid length of BCD number contents: {0}")]
    InvalidNumberLength(u8),

    #[error("Timestamp fields do not form a valid date")]
    InvalidTimestamp,
}

/// Type of number for numbers without a leading `+`
pub const TOA_UNKNOWN: u8 = 0x81;
/// Type of number for international numbers
pub const TOA_INTERNATIONAL: u8 = 0x91;

/// Octets of a number field after its length octet: TON/NPI plus 10 BCD
pub const ADN_MAX_BCD_NUMBER_BYTES: usize = 11;
pub const ADN_MAX_NUMBER_DIGITS: usize = 20;
/// Octets following the alpha identifier in an ADN-like record
pub const ADN_FOOTER_SIZE_BYTES: usize = 14;

/// UCS2 coding markers for alpha identifiers (TS 102.221 annex A)
pub mod ucs2 {
    pub const SCHEME_80: u8 = 0x80;
    pub const SCHEME_81: u8 = 0x81;
    pub const SCHEME_82: u8 = 0x82;
}

fn decode_units(units: &[u8], lang: NationalLanguage, shift: NationalLanguage) -> String {
    let mut text = String::with_capacity(units.len());
    let mut escaped = false;
    for &unit in units {
        if escaped {
            escaped = false;
            text.push(decode_septet(unit, true, lang, shift));
        } else if unit == ESCAPE {
            escaped = true;
        } else {
            text.push(decode_septet(unit, false, lang, shift));
        }
    }
    text
}

/// Encode `text` as default-alphabet units, escapes included.
///
/// Characters found in neither table are dropped.
fn encode_units(text: &str, lang: NationalLanguage, shift: NationalLanguage) -> Vec<u8> {
    let mut units = Vec::with_capacity(text.len());
    for ch in text.chars() {
        if let Some(septet) = lang.locking_septet(ch) {
            units.push(septet);
        } else if let Some(septet) = shift.shift_septet(ch) {
            units.push(ESCAPE);
            units.push(septet);
        } else {
            debug!("Dropping {:?}, not in the 7-bit alphabet", ch);
        }
    }
    units
}

/// Number of septets `text` takes when packed, escapes included
pub fn septet_length(text: &str, lang: NationalLanguage, shift: NationalLanguage) -> usize {
    encode_units(text, lang, shift).len()
}

/// Octets needed for `septets` packed septets after `padding_bits`
pub fn packed_octet_length(septets: usize, padding_bits: u8) -> usize {
    (septets * 7 + padding_bits as usize + 7) / 8
}

fn unpack_septets(octets: &[u8], count: usize, padding_bits: u8) -> Vec<u8> {
    let mut septets = Vec::with_capacity(count);
    let mut data: u32 = 0;
    let mut bits: u32 = 0;
    let mut skip = padding_bits as u32;
    for &octet in octets {
        data |= (octet as u32) << bits;
        bits += 8;
        if skip > 0 && bits >= skip {
            data >>= skip;
            bits -= skip;
            skip = 0;
        }
        while bits >= 7 && septets.len() < count {
            septets.push((data & 0x7F) as u8);
            data >>= 7;
            bits -= 7;
        }
    }
    septets
}

/// Read `septet_count` packed septets (escapes included) as text
pub fn read_septets_to_string(
    buf: &mut Buf,
    septet_count: usize,
    padding_bits: u8,
    lang: NationalLanguage,
    shift: NationalLanguage,
) -> Result<String, BufError> {
    let octets = buf.read_octets(packed_octet_length(septet_count, padding_bits))?;
    let septets = unpack_septets(&octets, septet_count, padding_bits);
    Ok(decode_units(&septets, lang, shift))
}

/// Pack `text` into septets after `padding_bits` zero bits
pub fn write_string_as_septets(
    buf: &mut Buf,
    text: &str,
    padding_bits: u8,
    lang: NationalLanguage,
    shift: NationalLanguage,
) {
    let mut data: u32 = 0;
    let mut bits = padding_bits as u32;
    for septet in encode_units(text, lang, shift) {
        data |= (septet as u32) << bits;
        bits += 7;
        while bits >= 8 {
            buf.write_u8(data as u8);
            data >>= 8;
            bits -= 8;
        }
    }
    if bits != 0 {
        buf.write_u8(data as u8);
    }
}

/// Read `num_octets` GSM 8-bit units, stopping at the first `0xFF`.
///
/// Units with bit 8 set carry no character and are skipped.
pub fn read_8bit_unpacked_to_string(buf: &mut Buf, num_octets: usize) -> Result<String, BufError> {
    let octets = buf.read_octets(num_octets)?;
    Ok(decode_8bit(&octets))
}

fn decode_8bit(octets: &[u8]) -> String {
    let end = octets.iter().position(|&b| b == 0xFF).unwrap_or(octets.len());
    let units: Vec<u8> = octets[..end].iter().copied().filter(|&b| b < 0x80).collect();
    let lang = NationalLanguage::Default;
    decode_units(&units, lang, lang)
}

/// Write `text` as GSM 8-bit units into exactly `num_octets` octets.
///
/// An extension character costs two octets and is never split; a character
/// outside both tables is written as a space. Unused octets are `0xFF`.
pub fn write_string_to_8bit_unpacked(buf: &mut Buf, num_octets: usize, text: Option<&str>) {
    let lang = NationalLanguage::Default;
    let mut written = 0;
    for ch in text.unwrap_or_default().chars() {
        let units: &[u8] = &match (lang.locking_septet(ch), lang.shift_septet(ch)) {
            (Some(septet), _) => vec![septet],
            (None, Some(septet)) => vec![ESCAPE, septet],
            (None, None) => vec![0x20],
        };
        if written + units.len() > num_octets {
            break;
        }
        buf.write_octets(units);
        written += units.len();
    }
    for _ in written..num_octets {
        buf.write_u8(0xFF);
    }
}

/// Octets `text` takes as GSM 8-bit units, as written by
/// [`write_string_to_8bit_unpacked`]
pub fn gsm_8bit_length(text: &str) -> usize {
    let lang = NationalLanguage::Default;
    text.chars()
        .map(|ch| match (lang.locking_septet(ch), lang.shift_septet(ch)) {
            (None, Some(_)) => 2,
            _ => 1,
        })
        .sum()
}

/// Read `num_octets` as raw big-endian UTF-16 code units
pub fn read_ucs2_string(buf: &mut Buf, num_octets: usize) -> Result<String, BufError> {
    let octets = buf.read_octets(num_octets)?;
    let units: Vec<u16> = octets
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

pub fn write_ucs2_string(buf: &mut Buf, text: &str) {
    for unit in text.encode_utf16() {
        buf.write_u16_be(unit);
    }
}

/// Decode an alpha identifier body already stripped of its scheme octet
pub fn read_icc_ucs2_string(buf: &mut Buf, scheme: u8, num_octets: usize) -> Result<String, BufError> {
    let octets = buf.read_octets(num_octets)?;
    Ok(decode_icc_ucs2(scheme, &octets))
}

fn decode_icc_ucs2(scheme: u8, octets: &[u8]) -> String {
    match scheme {
        ucs2::SCHEME_80 => {
            let units: Vec<u16> = octets
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .take_while(|&unit| unit != 0xFFFF)
                .collect();
            String::from_utf16_lossy(&units)
        }
        ucs2::SCHEME_81 | ucs2::SCHEME_82 => {
            let header = if scheme == ucs2::SCHEME_81 { 2 } else { 3 };
            if octets.len() < header {
                return String::new();
            }
            let len = octets[0] as usize;
            let base: u16 = if scheme == ucs2::SCHEME_81 {
                (octets[1] as u16) << 7
            } else {
                u16::from_be_bytes([octets[1], octets[2]])
            };
            let body = &octets[header..];
            let body = &body[..len.min(body.len())];

            let mut text = String::new();
            let mut run: Vec<u8> = Vec::new();
            for &unit in body {
                if unit & 0x80 != 0 {
                    text.push_str(&decode_8bit(&run));
                    run.clear();
                    let code = base.wrapping_add((unit & 0x7F) as u16);
                    text.extend(char::decode_utf16([code]).map(|c| c.unwrap_or('\u{FFFD}')));
                } else {
                    run.push(unit);
                }
            }
            text.push_str(&decode_8bit(&run));
            text
        }
        _ => {
            debug!("Unknown UCS2 scheme {:#04x}", scheme);
            String::new()
        }
    }
}

/// Read an alpha identifier of `num_octets` octets (TS 51.011 section 10.5.1)
pub fn read_alpha_identifier(buf: &mut Buf, num_octets: usize) -> Result<String, BufError> {
    if num_octets == 0 {
        return Ok(String::new());
    }
    let octets = buf.read_octets(num_octets)?;
    Ok(match octets[0] {
        scheme @ (ucs2::SCHEME_80 | ucs2::SCHEME_81 | ucs2::SCHEME_82) => {
            decode_icc_ucs2(scheme, &octets[1..])
        }
        _ => decode_8bit(&octets),
    })
}

/// Write an alpha identifier into exactly `num_octets` octets.
///
/// GSM 8-bit is used when every character is representable, otherwise
/// scheme 0x80 UCS2 truncated to whole characters.
pub fn write_alpha_identifier(buf: &mut Buf, num_octets: usize, alpha_id: Option<&str>) {
    if num_octets == 0 {
        return;
    }
    let alpha_id = alpha_id.unwrap_or_default();
    if alpha_id.is_empty() || is_gsm_8bit_alphabet(alpha_id) {
        write_string_to_8bit_unpacked(buf, num_octets, Some(alpha_id));
        return;
    }

    buf.write_u8(ucs2::SCHEME_80);
    let budget = num_octets - 1;
    let mut written = 0;
    for ch in alpha_id.chars() {
        let mut units = [0u16; 2];
        let units = ch.encode_utf16(&mut units);
        if written + units.len() * 2 > budget {
            break;
        }
        for unit in units.iter() {
            buf.write_u16_be(*unit);
        }
        written += units.len() * 2;
    }
    for _ in written..budget {
        buf.write_u8(0xFF);
    }
}

fn number_digits(number: &str) -> (bool, String) {
    let international = number.starts_with('+');
    let digits = number
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '*' | '#' | ','))
        .collect();
    (international, digits)
}

/// Write TON/NPI and the BCD digits of `number`
pub fn write_dialling_number(buf: &mut Buf, number: &str) {
    let (international, digits) = number_digits(number);
    buf.write_u8(if international { TOA_INTERNATIONAL } else { TOA_UNKNOWN });
    bcd::write_swapped_nibble_bcd(buf, &digits);
}

/// Read a dialling number of `len` octets, TON/NPI octet included
pub fn read_dialling_number(buf: &mut Buf, len: usize) -> Result<String, BufError> {
    if len == 0 {
        return Ok(String::new());
    }
    let toa = buf.read_u8()?;
    let mut number = String::new();
    if toa >> 4 == TOA_INTERNATIONAL >> 4 {
        number.push('+');
    }
    number.push_str(&bcd::read_swapped_nibble_bcd_string(buf, len - 1)?);
    Ok(number)
}

/// Read a length-prefixed number field (12 octets); `None` when unused
pub fn read_number_with_length(buf: &mut Buf) -> Result<Option<String>, PduError> {
    let len = buf.read_u8()?;
    if len == 0xFF {
        buf.skip(ADN_MAX_BCD_NUMBER_BYTES)?;
        return Ok(None);
    }
    if len as usize > ADN_MAX_BCD_NUMBER_BYTES {
        return Err(PduError::InvalidNumberLength(len));
    }
    let number = read_dialling_number(buf, len as usize)?;
    buf.skip(ADN_MAX_BCD_NUMBER_BYTES - len as usize)?;
    Ok(Some(number))
}

/// Write a length-prefixed number field, keeping at most 20 digits
pub fn write_number_with_length(buf: &mut Buf, number: Option<&str>) {
    let Some(number) = number.filter(|n| !n.is_empty()) else {
        for _ in 0..=ADN_MAX_BCD_NUMBER_BYTES {
            buf.write_u8(0xFF);
        }
        return;
    };

    let (international, mut digits) = number_digits(number);
    digits.truncate(ADN_MAX_NUMBER_DIGITS);
    let len = (digits.len() + 1) / 2 + 1;
    buf.write_u8(len as u8);
    buf.write_u8(if international { TOA_INTERNATIONAL } else { TOA_UNKNOWN });
    bcd::write_swapped_nibble_bcd(buf, &digits);
    for _ in len..ADN_MAX_BCD_NUMBER_BYTES {
        buf.write_u8(0xFF);
    }
}

/// Alpha identifier and number of an ADN-like record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlphaIdDiallingNumber {
    pub alpha_id: String,
    pub number: String,
}

/// Read an ADN-like record of `record_size` octets; `None` when empty
pub fn read_alpha_id_dialling_number(
    buf: &mut Buf,
    record_size: usize,
) -> Result<Option<AlphaIdDiallingNumber>, PduError> {
    let alpha_len = record_size.saturating_sub(ADN_FOOTER_SIZE_BYTES);
    let alpha_id = read_alpha_identifier(buf, alpha_len)?;
    let number = read_number_with_length(buf)?.unwrap_or_default();
    // CCP and extension record identifiers
    buf.skip(2)?;

    if alpha_id.is_empty() && number.is_empty() {
        return Ok(None);
    }
    Ok(Some(AlphaIdDiallingNumber { alpha_id, number }))
}

/// Write an ADN-like record; absent fields are erased with `0xFF`
pub fn write_alpha_id_dialling_number(
    buf: &mut Buf,
    record_size: usize,
    alpha_id: Option<&str>,
    number: Option<&str>,
) {
    let alpha_len = record_size.saturating_sub(ADN_FOOTER_SIZE_BYTES);
    write_alpha_identifier(buf, alpha_len, alpha_id);
    write_number_with_length(buf, number);
    buf.write_u8(0xFF);
    buf.write_u8(0xFF);
}

/// Read a network name information element body (TS 24.008 10.5.3.5a).
///
/// Returns `None` for an unknown coding; `num_octets` are consumed either way.
pub fn read_network_name(buf: &mut Buf, num_octets: usize) -> Result<Option<String>, BufError> {
    if num_octets == 0 {
        return Ok(None);
    }
    let octets = buf.read_octets(num_octets)?;
    let coding = octets[0];
    if coding & 0x80 == 0 {
        return Ok(None);
    }
    let spare_bits = (coding & 0x07) as usize;
    let body = &octets[1..];

    // The add-country-initials bit (bit 4) is ignored; the name is used as coded.
    let name = match (coding & 0x70) >> 4 {
        0 => {
            let septets = (body.len() * 8).saturating_sub(spare_bits) / 7;
            let lang = NationalLanguage::Default;
            Some(decode_units(&unpack_septets(body, septets, 0), lang, lang))
        }
        1 => {
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            Some(String::from_utf16_lossy(&units))
        }
        other => {
            debug!("Unsupported network name coding {}", other);
            None
        }
    };
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: NationalLanguage = NationalLanguage::Default;

    #[test]
    fn test_read_icc_ucs2_string() {
        let mut buf = Buf::new();
        write_ucs2_string(&mut buf, "TEST");
        buf.write_octets(&[0xFF, 0xFF]);
        assert_eq!(read_icc_ucs2_string(&mut buf, 0x80, 10).unwrap(), "TEST");

        let scheme_81 = hex::decode("08d24d6f7a696c6c61caffff").unwrap();
        let mut buf = Buf::from_octets(scheme_81.clone());
        assert_eq!(
            read_icc_ucs2_string(&mut buf, 0x81, scheme_81.len()).unwrap(),
            "Mozilla\u{694a}"
        );
        assert_eq!(buf.remaining(), 0);

        let scheme_82 = hex::decode("0869004d6f7a696c6c61caffff").unwrap();
        let mut buf = Buf::from_octets(scheme_82.clone());
        assert_eq!(
            read_icc_ucs2_string(&mut buf, 0x82, scheme_82.len()).unwrap(),
            "Mozilla\u{694a}"
        );
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_read_8bit_unpacked_escapes() {
        let mut buf = Buf::from_octets(hex::decode("41421B1B1B65FFFF").unwrap());
        assert_eq!(read_8bit_unpacked_to_string(&mut buf, 2).unwrap(), "AB");
        assert_eq!(read_8bit_unpacked_to_string(&mut buf, 2).unwrap(), " ");
        assert_eq!(read_8bit_unpacked_to_string(&mut buf, 4).unwrap(), "€");
        assert_eq!(buf.remaining(), 0);

        let mut buf = Buf::from_octets(vec![0x1B, 0x0D]);
        assert_eq!(read_8bit_unpacked_to_string(&mut buf, 2).unwrap(), " ");
    }

    #[test]
    fn test_write_string_to_8bit_unpacked() {
        let mut buf = Buf::new();
        write_string_to_8bit_unpacked(&mut buf, 5, Some("@£$"));
        assert_eq!(buf.as_octets(), &[0x00, 0x01, 0x02, 0xFF, 0xFF]);

        let mut buf = Buf::new();
        write_string_to_8bit_unpacked(&mut buf, 4, Some("\u{000c}\u{20ac}"));
        assert_eq!(read_8bit_unpacked_to_string(&mut buf, 4).unwrap(), "\u{000c}\u{20ac}");

        let mut buf = Buf::new();
        write_string_to_8bit_unpacked(&mut buf, 7, Some("\u{000c}\u{20ac}\u{00a3}"));
        assert_eq!(
            read_8bit_unpacked_to_string(&mut buf, 7).unwrap(),
            "\u{000c}\u{20ac}\u{00a3}"
        );
    }

    #[test]
    fn test_write_8bit_unpacked_with_max_octets() {
        let mut buf = Buf::new();
        write_string_to_8bit_unpacked(&mut buf, 3, Some("@£$¥"));
        assert_eq!(buf.as_octets(), &[0x00, 0x01, 0x02]);

        for text in ["\u{000c}\u{00a3}", "\u{00a3}\u{000c}"] {
            let mut buf = Buf::new();
            write_string_to_8bit_unpacked(&mut buf, 3, Some(text));
            assert_eq!(read_8bit_unpacked_to_string(&mut buf, 3).unwrap(), text);
        }

        // the second extension character does not fit and is not split
        let mut buf = Buf::new();
        write_string_to_8bit_unpacked(&mut buf, 3, Some("\u{000c}\u{000c}"));
        assert_eq!(buf.as_octets(), &[0x1B, 0x0A, 0xFF]);
    }

    #[test]
    fn test_gsm_8bit_length() {
        assert_eq!(gsm_8bit_length("Default"), 7);
        assert_eq!(gsm_8bit_length("a{€"), 5);
        assert_eq!(gsm_8bit_length("\u{694a}"), 1);
    }

    #[test]
    fn test_write_8bit_unrepresentable_is_space() {
        let mut buf = Buf::new();
        write_string_to_8bit_unpacked(&mut buf, 3, Some("a\u{694a}b"));
        assert_eq!(buf.as_octets(), &[0x61, 0x20, 0x62]);
    }

    #[test]
    fn test_septets_round_trip() {
        let mut buf = Buf::new();
        write_string_as_septets(&mut buf, "Mozilla", 0, DEFAULT, DEFAULT);
        assert_eq!(buf.len(), 7);
        assert_eq!(read_septets_to_string(&mut buf, 7, 0, DEFAULT, DEFAULT).unwrap(), "Mozilla");

        let mut buf = Buf::new();
        write_string_as_septets(&mut buf, "a{b", 3, DEFAULT, DEFAULT);
        assert_eq!(buf.len(), packed_octet_length(4, 3));
        assert_eq!(read_septets_to_string(&mut buf, 4, 3, DEFAULT, DEFAULT).unwrap(), "a{b");
    }

    #[test]
    fn test_septets_known_encoding() {
        // "hellohello" from TS 23.040 examples
        let mut buf = Buf::new();
        write_string_as_septets(&mut buf, "hellohello", 0, DEFAULT, DEFAULT);
        assert_eq!(buf.as_octets(), &hex::decode("E8329BFD4697D9EC37").unwrap()[..]);
    }

    #[test]
    fn test_septets_drop_unrepresentable() {
        let mut buf = Buf::new();
        write_string_as_septets(&mut buf, "a\u{694a}b", 0, DEFAULT, DEFAULT);
        assert_eq!(buf.len(), 2);
        assert_eq!(read_septets_to_string(&mut buf, 2, 0, DEFAULT, DEFAULT).unwrap(), "ab");
        assert_eq!(septet_length("a\u{694a}b{", DEFAULT, DEFAULT), 4);
    }

    #[test]
    fn test_write_alpha_identifier() {
        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 10, None);
        assert_eq!(read_alpha_identifier(&mut buf, 10).unwrap(), "");

        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 9, Some("Mozilla"));
        assert_eq!(read_alpha_identifier(&mut buf, 9).unwrap(), "Mozilla");

        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 18, Some("Mozilla\u{694a}"));
        assert_eq!(read_alpha_identifier(&mut buf, 18).unwrap(), "Mozilla\u{694a}");

        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 3, Some("\u{694a}"));
        assert_eq!(read_alpha_identifier(&mut buf, 3).unwrap(), "\u{694a}");

        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 4, Some("\u{694a}\u{694a}"));
        buf.write_u8(0xFF);
        assert_eq!(read_alpha_identifier(&mut buf, 5).unwrap(), "\u{694a}");

        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 0, Some("1"));
        buf.write_u8(0xFF);
        assert_eq!(read_alpha_identifier(&mut buf, 1).unwrap(), "");
    }

    #[test]
    fn test_alpha_identifier_keeps_surrogate_pairs() {
        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 4, Some("\u{1F600}"));
        assert_eq!(buf.as_octets(), &[0x80, 0xFF, 0xFF, 0xFF]);

        let mut buf = Buf::new();
        write_alpha_identifier(&mut buf, 5, Some("\u{1F600}"));
        assert_eq!(read_alpha_identifier(&mut buf, 5).unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_write_dialling_number() {
        for (number, len) in [("+123456", 4), ("987654", 4), ("9876543", 5)] {
            let mut buf = Buf::new();
            write_dialling_number(&mut buf, number);
            assert_eq!(buf.len(), len);
            assert_eq!(read_dialling_number(&mut buf, len).unwrap(), number);
        }
    }

    #[test]
    fn test_read_dialling_number_with_separators() {
        let mut buf = Buf::from_octets(hex::decode("811032042143651C2C").unwrap());
        assert_eq!(read_dialling_number(&mut buf, 9).unwrap(), "012340123456,1,2");
    }

    #[test]
    fn test_number_with_length_invalid() {
        let mut buf = Buf::from_octets(vec![0x0C; 12]);
        assert_eq!(
            read_number_with_length(&mut buf),
            Err(PduError::InvalidNumberLength(0x0C))
        );
    }

    #[test]
    fn test_write_alpha_id_dialling_number() {
        const RECORD_SIZE: usize = 32;

        let mut buf = Buf::new();
        write_alpha_id_dialling_number(&mut buf, RECORD_SIZE, Some("Mozilla"), Some("1234567890"));
        assert_eq!(buf.len(), RECORD_SIZE);
        let contact = read_alpha_id_dialling_number(&mut buf, RECORD_SIZE).unwrap().unwrap();
        assert_eq!(contact.alpha_id, "Mozilla");
        assert_eq!(contact.number, "1234567890");

        let mut buf = Buf::new();
        write_alpha_id_dialling_number(&mut buf, RECORD_SIZE, Some("火狐"), Some("+1234567890"));
        let contact = read_alpha_id_dialling_number(&mut buf, RECORD_SIZE).unwrap().unwrap();
        assert_eq!(contact.alpha_id, "火狐");
        assert_eq!(contact.number, "+1234567890");

        let mut buf = Buf::new();
        write_alpha_id_dialling_number(&mut buf, RECORD_SIZE, None, None);
        assert_eq!(buf.as_octets(), &[0xFF; RECORD_SIZE][..]);
        assert_eq!(read_alpha_id_dialling_number(&mut buf, RECORD_SIZE).unwrap(), None);
    }

    #[test]
    fn test_write_alpha_id_dialling_number_truncates() {
        const RECORD_SIZE: usize = 32;
        let alpha_id = "AAAAAAAAABBBBBBBBBCCCCCCCCC";

        let mut buf = Buf::new();
        write_alpha_id_dialling_number(
            &mut buf,
            RECORD_SIZE,
            Some(alpha_id),
            Some("123456789012345678901234567890"),
        );
        let contact = read_alpha_id_dialling_number(&mut buf, RECORD_SIZE).unwrap().unwrap();
        assert_eq!(contact.alpha_id, "AAAAAAAAABBBBBBBBB");
        assert_eq!(contact.number, "12345678901234567890");

        let mut buf = Buf::new();
        write_alpha_id_dialling_number(
            &mut buf,
            RECORD_SIZE,
            Some(alpha_id),
            Some("+123456789012345678901234567890"),
        );
        let contact = read_alpha_id_dialling_number(&mut buf, RECORD_SIZE).unwrap().unwrap();
        assert_eq!(contact.number, "+12345678901234567890");
    }

    #[test]
    fn test_read_network_name() {
        // GSM 7-bit, 5 spare bits: "Long1"
        let mut buf = Buf::from_octets(hex::decode("85CCB7FB1C03").unwrap());
        assert_eq!(read_network_name(&mut buf, 6).unwrap().as_deref(), Some("Long1"));

        // Same name with the add-country-initials bit set
        let mut buf = Buf::from_octets(hex::decode("8DCCB7FB1C03").unwrap());
        assert_eq!(read_network_name(&mut buf, 6).unwrap().as_deref(), Some("Long1"));

        // UCS2
        let mut buf = Buf::from_octets(hex::decode("900053004D005300FF").unwrap());
        assert_eq!(read_network_name(&mut buf, 7).unwrap().as_deref(), Some("SMS"));
        assert_eq!(buf.read_u8().unwrap(), 0x00);

        // bit 8 clear: not a valid coding, still consumed
        let mut buf = Buf::from_octets(hex::decode("0541AA").unwrap());
        assert_eq!(read_network_name(&mut buf, 2).unwrap(), None);
        assert_eq!(buf.read_u8().unwrap(), 0xAA);
    }
}
