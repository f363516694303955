//! SIM_IO requests and their responses
//!
//! # Example
//! ```ignore
//! use ril_icc::icc::{IccIoCommand, IccIoResponse};
//!
//! let command = IccIoCommand::read_record(0x6FC5, "3F007F20", 1, 27);
//! let response = IccIoResponse::success(vec![0xFF; 27]);
//! assert!(response.is_okay());
//! ```

use super::status::SW;
use crate::buf::{request, Buf, Parcel};

/// SIM_IO instruction codes (TS 51.011 section 9.2)
pub mod ins {
    pub const READ_BINARY: u8 = 0xB0;
    pub const READ_RECORD: u8 = 0xB2;
    pub const GET_RESPONSE: u8 = 0xC0;
    pub const UPDATE_BINARY: u8 = 0xD6;
    pub const UPDATE_RECORD: u8 = 0xDC;
    pub const SEEK: u8 = 0xA2;
    pub const SELECT: u8 = 0xA4;
}

/// READ RECORD / UPDATE RECORD modes (P2)
pub mod record_mode {
    pub const NEXT: u8 = 0x02;
    pub const PREVIOUS: u8 = 0x03;
    pub const ABSOLUTE: u8 = 0x04;
}

/// Length of the GET RESPONSE data for an EF
pub const GET_RESPONSE_EF_SIZE_BYTES: u8 = 15;

/// One SIM_IO request
///
/// # Fields
/// - `command`: instruction code, see [`ins`]
/// - `file_id`: EF identifier
/// - `path`: hex path of the parent DF, `3F007F20` for DF_GSM
/// - `p1`, `p2`, `p3`: instruction parameters
/// - `data`: octets to write, for the update instructions
/// - `pin2`: PIN2 for files protected by it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccIoCommand {
    pub command: u8,
    pub file_id: u16,
    pub path: String,
    pub p1: u8,
    pub p2: u8,
    pub p3: u8,
    pub data: Option<Vec<u8>>,
    pub pin2: Option<String>,
}

impl IccIoCommand {
    pub fn new(command: u8, file_id: u16, path: impl Into<String>) -> Self {
        Self {
            command,
            file_id,
            path: path.into(),
            p1: 0,
            p2: 0,
            p3: 0,
            data: None,
            pin2: None,
        }
    }

    pub fn get_response(file_id: u16, path: impl Into<String>) -> Self {
        Self {
            p3: GET_RESPONSE_EF_SIZE_BYTES,
            ..Self::new(ins::GET_RESPONSE, file_id, path)
        }
    }

    pub fn read_record(file_id: u16, path: impl Into<String>, record: u8, record_size: u8) -> Self {
        Self {
            p1: record,
            p2: record_mode::ABSOLUTE,
            p3: record_size,
            ..Self::new(ins::READ_RECORD, file_id, path)
        }
    }

    /// Most octets one READ BINARY can return
    pub const MAX_BINARY_CHUNK: usize = 0xFF;

    /// READ BINARY of `length` octets at `offset` (P1 high, P2 low)
    pub fn read_binary(file_id: u16, path: impl Into<String>, offset: u16, length: u8) -> Self {
        let [p1, p2] = offset.to_be_bytes();
        Self {
            p1,
            p2,
            p3: length,
            ..Self::new(ins::READ_BINARY, file_id, path)
        }
    }

    pub fn update_record(file_id: u16, path: impl Into<String>, record: u8, data: Vec<u8>) -> Self {
        Self {
            p1: record,
            p2: record_mode::ABSOLUTE,
            p3: data.len().min(0xFF) as u8,
            data: Some(data),
            ..Self::new(ins::UPDATE_RECORD, file_id, path)
        }
    }

    pub fn with_pin2(mut self, pin2: Option<String>) -> Self {
        self.pin2 = pin2;
        self
    }

    /// Serialize as command, file id, path, P1-P3, data and PIN2 with the
    /// string fields framed
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Buf::new();
        buf.write_u32(self.command as u32);
        buf.write_u32(self.file_id as u32);
        buf.write_framed(&hex_octets(&self.path));
        buf.write_u32(self.p1 as u32);
        buf.write_u32(self.p2 as u32);
        buf.write_u32(self.p3 as u32);
        buf.write_framed(self.data.as_deref().unwrap_or_default());
        buf.write_framed(self.pin2.as_deref().unwrap_or_default().as_bytes());
        buf.into_octets()
    }

    pub fn into_parcel(self, token: u32) -> Parcel {
        Parcel::new(request::SIM_IO, token, self.encode())
    }
}

/// Hex digit pairs to octets; a trailing odd digit is dropped
fn hex_octets(path: &str) -> Vec<u8> {
    let digits: Vec<u8> = path.chars().filter_map(|c| c.to_digit(16)).map(|d| d as u8).collect();
    digits.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]).collect()
}

/// A SIM_IO response: data plus SW1/SW2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccIoResponse {
    pub data: Vec<u8>,
    pub sw1: u8,
    pub sw2: u8,
}

impl IccIoResponse {
    pub fn new(data: Vec<u8>, sw: u16) -> Self {
        Self {
            data,
            sw1: (sw >> 8) as u8,
            sw2: sw as u8,
        }
    }

    /// Create a success response (0x9000) with data
    pub fn success(data: Vec<u8>) -> Self {
        Self::new(data, SW::SUCCESS)
    }

    pub fn error(sw: u16) -> Self {
        Self::new(Vec::new(), sw)
    }

    pub fn sw(&self) -> u16 {
        SW::from_parts(self.sw1, self.sw2)
    }

    pub fn is_okay(&self) -> bool {
        SW::is_success(self.sw())
    }
}
