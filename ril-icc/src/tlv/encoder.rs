//! BER-TLV / COMPREHENSION-TLV encoder
//!
//! Values are serialized before their parent, so every length is known when
//! it is written.

use super::parser::{BerTLV, ComprehensionTLV};
use super::value::ComprehensionValue;
use super::{FLAG_CR, THREE_OCTET_TAG};
use crate::buf::Buf;

/// Octets taken by the length field for `length`
pub fn size_of_length_octets(length: usize) -> usize {
    if length < 0x80 {
        1
    } else if length < 0x100 {
        2
    } else if length < 0x10000 {
        3
    } else {
        4
    }
}

/// Write the length field for `length` into `buf`
pub fn write_length(buf: &mut Buf, length: usize) {
    buf.write_octets(&TLVEncoder::encode_length(length));
}

/// TLV Encoder for building COMPREHENSION-TLV and BER-TLV structures
pub struct TLVEncoder;

impl TLVEncoder {
    /// Encode a single-octet tag and value to bytes
    pub fn encode(tag: u8, value: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(1 + size_of_length_octets(value.len()) + value.len());
        result.push(tag);
        result.extend(Self::encode_length(value.len()));
        result.extend_from_slice(value);
        result
    }

    /// Encode just the length bytes.
    ///
    /// Lengths of `0x1000000` and above do not occur in STK; only the low 24
    /// bits are written.
    pub fn encode_length(length: usize) -> Vec<u8> {
        if length < 0x80 {
            vec![length as u8]
        } else if length < 0x100 {
            vec![0x81, length as u8]
        } else if length < 0x10000 {
            vec![0x82, (length >> 8) as u8, (length & 0xFF) as u8]
        } else {
            vec![
                0x83,
                ((length >> 16) & 0xFF) as u8,
                ((length >> 8) & 0xFF) as u8,
                (length & 0xFF) as u8,
            ]
        }
    }

    /// Encode the tag octet(s) of a node, CR flag included
    pub fn encode_tag(node: &ComprehensionTLV) -> Vec<u8> {
        if node.three_octet_tag {
            let tag = (node.tag & 0x7FFF) | if node.cr { 0x8000 } else { 0 };
            vec![THREE_OCTET_TAG, (tag >> 8) as u8, tag as u8]
        } else {
            let cr = if node.cr { FLAG_CR } else { 0 };
            vec![(node.tag as u8 & !FLAG_CR) | cr]
        }
    }

    pub fn encode_comprehension(node: &ComprehensionTLV) -> Vec<u8> {
        let value = node.value.encode();
        let mut result = Self::encode_tag(node);
        result.extend(Self::encode_length(value.len()));
        result.extend(value);
        result
    }

    pub fn encode_ber(ber: &BerTLV) -> Vec<u8> {
        let children: Vec<u8> = ber.value.iter().flat_map(Self::encode_comprehension).collect();
        Self::encode(ber.tag, &children)
    }
}

/// Builder for terminal responses and envelopes
///
/// # Example
/// ```ignore
/// let envelope = TLVBuilder::new()
///     .add(tags::DEVICE_ID | FLAG_CR, &[0x82, 0x81])
///     .add(tags::EVENT_LIST | FLAG_CR, &[0x05])
///     .wrap(ber_tags::EVENT_DOWNLOAD)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TLVBuilder {
    data: Vec<u8>,
}

impl TLVBuilder {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Add a primitive TLV; `tag` carries the CR flag if wanted
    pub fn add(mut self, tag: u8, value: &[u8]) -> Self {
        self.data.extend(TLVEncoder::encode(tag, value));
        self
    }

    /// Add a node built from a typed value
    pub fn add_value(self, tag: u8, cr: bool, value: ComprehensionValue) -> Self {
        self.add_node(&ComprehensionTLV::new(tag, cr, value))
    }

    pub fn add_node(mut self, node: &ComprehensionTLV) -> Self {
        self.data.extend(node.encode());
        self
    }

    /// Add raw bytes (pre-encoded TLV)
    pub fn add_raw(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    /// Wrap current content in a BER tag
    pub fn wrap(self, tag: u8) -> Self {
        Self {
            data: TLVEncoder::encode(tag, &self.data),
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
