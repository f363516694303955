//! BER-TLV and COMPREHENSION-TLV parser
//!
//! Decodes from a [`Buf`] positioned at the first tag octet. Lengths use the
//! TS 101.220 rules: one octet below `0x80`, otherwise `0x81`/`0x82`/`0x83`
//! followed by one to three length octets.

use log::{debug, warn};
use thiserror::Error;

use super::value::ComprehensionValue;
use super::{ber_tags, TLVEncoder, FLAG_CR, THREE_OCTET_TAG};
use crate::buf::{Buf, BufError};

/// Errors that can occur during TLV parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TLVError {
    #[error(transparent)]
    Buf(#[from] BufError),

    #[error("Unknown BER tag {0:#04x}")]
    UnknownBerTag(u8),

    #[error("Invalid COMPREHENSION-TLV tag {0:#04x}")]
    InvalidTag(u8),

    #[error("Invalid length octet {0:#04x}")]
    InvalidLengthPrefix(u8),

    #[error("Length {length} is not in minimal form for prefix {prefix:#04x}")]
    InvalidLength { prefix: u8, length: usize },

    #[error("Value of {length} octet(s) exceeds the {available} octet(s) available")]
    ValueTooLong { length: usize, available: usize },
}

/// One COMPREHENSION-TLV node
///
/// `tag` holds the tag without the CR flag: 7 bits for the single-octet
/// format, 15 bits when `three_octet_tag` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionTLV {
    pub tag: u16,
    pub cr: bool,
    pub three_octet_tag: bool,
    /// Length as read from the wire; re-encoding uses the value's own size
    pub length: usize,
    pub value: ComprehensionValue,
}

impl ComprehensionTLV {
    /// Create a single-octet-tag node
    pub fn new(tag: u8, cr: bool, value: ComprehensionValue) -> Self {
        let length = value.encode().len();
        Self {
            tag: (tag & !FLAG_CR) as u16,
            cr,
            three_octet_tag: false,
            length,
            value,
        }
    }

    /// Single-octet tag id, `None` for the three-octet format
    pub fn tag_id(&self) -> Option<u8> {
        if self.three_octet_tag {
            None
        } else {
            Some(self.tag as u8)
        }
    }

    /// Serialize tag, length and value
    pub fn encode(&self) -> Vec<u8> {
        TLVEncoder::encode_comprehension(self)
    }
}

/// A BER-TLV wrapping a list of COMPREHENSION-TLVs
#[derive(Debug, Clone, PartialEq)]
pub struct BerTLV {
    pub tag: u8,
    pub length: usize,
    pub value: Vec<ComprehensionTLV>,
}

impl BerTLV {
    pub fn new(tag: u8, value: Vec<ComprehensionTLV>) -> Self {
        let length = value.iter().map(|node| node.encode().len()).sum();
        Self { tag, length, value }
    }

    pub fn encode(&self) -> Vec<u8> {
        TLVEncoder::encode_ber(self)
    }
}

/// A simple TLV as found in EF_PBR: one tag octet, one length octet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTLV {
    pub tag: u8,
    pub length: usize,
    pub value: Vec<u8>,
}

/// Read a length field; returns the length and the octets it took
fn read_length(buf: &mut Buf) -> Result<(usize, usize), TLVError> {
    let prefix = buf.read_u8()?;
    if prefix < 0x80 {
        return Ok((prefix as usize, 1));
    }

    let (octets, minimum) = match prefix {
        0x81 => (1, 0x80),
        0x82 => (2, 0x100),
        0x83 => (3, 0x10000),
        _ => return Err(TLVError::InvalidLengthPrefix(prefix)),
    };
    let mut length = 0usize;
    for _ in 0..octets {
        length = (length << 8) | buf.read_u8()? as usize;
    }
    if length < minimum {
        return Err(TLVError::InvalidLength { prefix, length });
    }
    Ok((length, 1 + octets))
}

/// Decode a proactive command BER-TLV out of `data_len` available octets
pub fn decode_ber(buf: &mut Buf, data_len: usize) -> Result<BerTLV, TLVError> {
    let tag = buf.read_u8()?;
    if tag != ber_tags::PROACTIVE_COMMAND {
        return Err(TLVError::UnknownBerTag(tag));
    }
    let (length, len_octets) = read_length(buf)?;
    let available = data_len.saturating_sub(1 + len_octets);
    if available < length {
        return Err(TLVError::ValueTooLong { length, available });
    }

    let value = decode_chunks(buf, length)?;
    Ok(BerTLV { tag, length, value })
}

/// Decode one COMPREHENSION-TLV node
pub fn decode_comprehension(buf: &mut Buf) -> Result<ComprehensionTLV, TLVError> {
    let first = buf.read_u8()?;
    let (tag, cr, three_octet_tag) = match first {
        0x00 | 0x80 | 0xFF => return Err(TLVError::InvalidTag(first)),
        THREE_OCTET_TAG => {
            let tag = buf.read_u16_be()?;
            warn!("Three-octet COMPREHENSION-TLV tag {:#06x} is not supported", tag & 0x7FFF);
            (tag & 0x7FFF, tag & 0x8000 != 0, true)
        }
        _ => ((first & !FLAG_CR) as u16, first & FLAG_CR != 0, false),
    };

    let (length, _) = read_length(buf)?;
    let octets = buf.read_octets(length)?;
    let value = if three_octet_tag {
        ComprehensionValue::Raw(octets)
    } else {
        ComprehensionValue::interpret(tag as u8, &octets)
    };

    Ok(ComprehensionTLV {
        tag,
        cr,
        three_octet_tag,
        length,
        value,
    })
}

/// Decode consecutive COMPREHENSION-TLVs spanning `chunk_len` octets.
///
/// A node that cannot be framed aborts the whole list.
pub fn decode_chunks(buf: &mut Buf, chunk_len: usize) -> Result<Vec<ComprehensionTLV>, TLVError> {
    let mut nodes = Vec::new();
    let mut index = 0;
    while index < chunk_len {
        let start = buf.read_index();
        let node = decode_comprehension(buf)?;
        index += buf.read_index() - start;
        nodes.push(node);
    }
    debug!("Decoded {} COMPREHENSION-TLV node(s)", nodes.len());
    Ok(nodes)
}

/// Decode simple TLVs spanning `data_len` octets
pub fn decode_simple_blocks(buf: &mut Buf, data_len: usize) -> Result<Vec<SimpleTLV>, TLVError> {
    let mut blocks = Vec::new();
    let mut index = 0;
    while index < data_len {
        let tag = buf.read_u8()?;
        let length = buf.read_u8()? as usize;
        let value = buf.read_octets(length)?;
        index += 2 + length;
        blocks.push(SimpleTLV { tag, length, value });
    }
    Ok(blocks)
}
