//! Semi-octet (swapped nibble BCD) helpers
//!
//! SIM records store decimal digits two per octet with the first digit in
//! the low nibble. `0xF` fills an unused nibble.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};
use log::warn;
use serde::{Deserialize, Serialize};

use super::PduError;
use crate::buf::{Buf, BufError};

/// Digits a BCD nibble can carry, in nibble order
pub const BCD_CHARS: &str = "0123456789*#,";

/// Years in SIM timestamps are counted from this one
pub const TIMESTAMP_YEAR_OFFSET: i32 = 2000;

/// Swapped-nibble octet to its decimal value; nibbles above 9 count as 0
///
/// `0x23` reads as 32.
pub fn octet_to_bcd(octet: u8) -> u8 {
    let tens = octet & 0x0F;
    let units = octet >> 4;
    let tens = if tens <= 9 { tens * 10 } else { 0 };
    let units = if units <= 9 { units } else { 0 };
    tens + units
}

/// Inverse of [`octet_to_bcd`] for values 0..=99
pub fn bcd_to_octet(value: u8) -> u8 {
    ((value % 10) << 4) | ((value / 10) % 10)
}

fn bcd_char(nibble: u8) -> Option<char> {
    BCD_CHARS.chars().nth(nibble as usize)
}

fn bcd_nibble(ch: char) -> Option<u8> {
    match ch {
        'F' | 'f' => Some(0x0F),
        _ => BCD_CHARS.find(ch).map(|i| i as u8),
    }
}

/// Read `pairs` octets as a number; `0xFF` octets are filler
pub fn read_swapped_nibble_bcd_num(buf: &mut Buf, pairs: usize) -> Result<u32, BufError> {
    let mut number = 0u32;
    for _ in 0..pairs {
        let octet = buf.read_u8()?;
        if octet == 0xFF {
            continue;
        }
        if octet & 0xF0 == 0xF0 {
            number = number * 10 + (octet & 0x0F) as u32;
            continue;
        }
        number = number * 100 + octet_to_bcd(octet) as u32;
    }
    Ok(number)
}

/// Write `value` as `pairs` swapped-nibble octets, most significant pair first
pub fn write_swapped_nibble_bcd_num(buf: &mut Buf, value: u32, pairs: usize) {
    for i in (0..pairs).rev() {
        let pair = (value / 100u32.pow(i as u32)) % 100;
        buf.write_u8(bcd_to_octet(pair as u8));
    }
}

/// Read `pairs` octets as a digit string.
///
/// Decoding ends at the first filler in a low nibble, a filler in a high
/// nibble is skipped. All `pairs` octets are consumed either way.
pub fn read_swapped_nibble_bcd_string(buf: &mut Buf, pairs: usize) -> Result<String, BufError> {
    let octets = buf.read_octets(pairs)?;
    let mut digits = String::with_capacity(pairs * 2);
    for octet in octets {
        let low = octet & 0x0F;
        let high = octet >> 4;
        if low == 0x0F {
            break;
        }
        digits.extend(bcd_char(low));
        if high != 0x0F {
            digits.extend(bcd_char(high));
        }
    }
    Ok(digits)
}

/// Write a digit string as swapped nibbles, padding an odd length with `F`.
///
/// Characters outside [`BCD_CHARS`] are skipped.
pub fn write_swapped_nibble_bcd(buf: &mut Buf, digits: &str) {
    let nibbles: Vec<u8> = digits.chars().filter_map(bcd_nibble).collect();
    for pair in nibbles.chunks(2) {
        let low = pair[0];
        let high = pair.get(1).copied().unwrap_or(0x0F);
        buf.write_u8((high << 4) | low);
    }
}

/// Mobile country code and mobile network code, as decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Plmn {
    pub mcc: String,
    pub mnc: String,
}

impl Plmn {
    pub fn new(mcc: impl Into<String>, mnc: impl Into<String>) -> Self {
        Self {
            mcc: mcc.into(),
            mnc: mnc.into(),
        }
    }

    pub fn matches(&self, mcc: &str, mnc: &str) -> bool {
        self.mcc == mcc && self.mnc == mnc
    }

    /// Fits the three-octet layout: a three-digit MCC and up to three MNC digits
    pub fn is_encodable(&self) -> bool {
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        self.mcc.len() == 3 && (1..=3).contains(&self.mnc.len()) && digits(&self.mcc) && digits(&self.mnc)
    }
}

impl std::fmt::Display for Plmn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.mcc, self.mnc)
    }
}

fn digit_nibbles(digits: &str, width: usize) -> Vec<u8> {
    let mut nibbles: Vec<u8> = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as u8)
        .collect();
    while nibbles.len() < width {
        nibbles.insert(0, 0);
    }
    nibbles
}

/// Write a PLMN in the three-octet layout of TS 24.008 table 10.5.3:
/// `MCC2|MCC1`, `MNC3|MCC3`, `MNC2|MNC1`. A two-digit MNC puts `F` in the
/// MNC3 slot; a single digit MNC is zero padded to two. Digits beyond that
/// layout are dropped with a warning.
pub fn write_plmn(buf: &mut Buf, plmn: &Plmn) {
    if !plmn.is_encodable() {
        warn!("PLMN {}/{} does not fit three octets, writing it truncated", plmn.mcc, plmn.mnc);
    }
    let mcc = digit_nibbles(&plmn.mcc, 3);
    let mnc = digit_nibbles(&plmn.mnc, 2);
    let mnc3 = mnc.get(2).copied().unwrap_or(0x0F);
    buf.write_u8((mcc[1] << 4) | mcc[0]);
    buf.write_u8((mnc3 << 4) | mcc[2]);
    buf.write_u8((mnc[1] << 4) | mnc[0]);
}

/// Read a three-octet PLMN; `None` when the entry is unused (`FF....`)
pub fn read_plmn(buf: &mut Buf) -> Result<Option<Plmn>, BufError> {
    let octets = buf.read_octets(3)?;
    if octets[0] == 0xFF {
        return Ok(None);
    }
    let mut semi = [0u8; 6];
    for (i, octet) in octets.iter().enumerate() {
        semi[i * 2] = octet >> 4;
        semi[i * 2 + 1] = octet & 0x0F;
    }
    let ordered = [semi[1], semi[0], semi[3], semi[5], semi[4], semi[2]];
    let to_digits = |nibbles: &[u8]| -> String {
        nibbles
            .iter()
            .filter(|&&n| n != 0x0F)
            .filter_map(|&n| bcd_char(n))
            .collect()
    };
    Ok(Some(Plmn::new(to_digits(&ordered[..3]), to_digits(&ordered[3..]))))
}

/// Write a 7-octet service centre timestamp (TS 23.040 section 9.2.3.11)
///
/// The wall-clock fields are the local time of `date`; the offset is written
/// in quarter hours with bit `0x08` marking a negative offset.
pub fn write_timestamp(buf: &mut Buf, date: &DateTime<FixedOffset>) {
    let year = (date.year() - TIMESTAMP_YEAR_OFFSET).rem_euclid(100) as u8;
    buf.write_u8(bcd_to_octet(year));
    buf.write_u8(bcd_to_octet(date.month() as u8));
    buf.write_u8(bcd_to_octet(date.day() as u8));
    buf.write_u8(bcd_to_octet(date.hour() as u8));
    buf.write_u8(bcd_to_octet(date.minute() as u8));
    buf.write_u8(bcd_to_octet(date.second() as u8));

    let offset = date.offset().local_minus_utc();
    let quarters = (offset.unsigned_abs() / 900) as u8;
    let mut octet = bcd_to_octet(quarters);
    if offset < 0 {
        octet |= 0x08;
    }
    buf.write_u8(octet);
}

/// Inverse of [`write_timestamp`]
pub fn read_timestamp(buf: &mut Buf) -> Result<DateTime<FixedOffset>, PduError> {
    let year = read_swapped_nibble_bcd_num(buf, 1)? as i32 + TIMESTAMP_YEAR_OFFSET;
    let month = read_swapped_nibble_bcd_num(buf, 1)?;
    let day = read_swapped_nibble_bcd_num(buf, 1)?;
    let hour = read_swapped_nibble_bcd_num(buf, 1)?;
    let minute = read_swapped_nibble_bcd_num(buf, 1)?;
    let second = read_swapped_nibble_bcd_num(buf, 1)?;

    let tz = buf.read_u8()?;
    let quarters = octet_to_bcd(tz & !0x08) as i32;
    let mut offset = quarters * 15 * 60;
    if tz & 0x08 != 0 {
        offset = -offset;
    }

    FixedOffset::east_opt(offset)
        .and_then(|zone| {
            zone.with_ymd_and_hms(year, month, day, hour, minute, second)
                .single()
        })
        .ok_or(PduError::InvalidTimestamp)
}
