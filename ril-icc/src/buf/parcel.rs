//! Outbound parcels
//!
//! A parcel is what gets handed to the modem transport: a request type, a
//! token, and the payload octets. Its size field counts hex digits, so a
//! payload of 22 octets reports 44.

use super::{Buf, BufError};

/// Radio request types carried by parcels built in this crate
pub mod request {
    pub const SIM_IO: u32 = 28;
    pub const STK_GET_PROFILE: u32 = 67;
    pub const STK_SET_PROFILE: u32 = 68;
    pub const STK_SEND_ENVELOPE_COMMAND: u32 = 69;
    pub const STK_SEND_TERMINAL_RESPONSE: u32 = 70;
}

/// An outbound request ready for the transport
///
/// # Example
/// ```ignore
/// let parcel = Parcel::new(request::STK_SET_PROFILE, 1, vec![0x01, 0x02]);
/// assert_eq!(parcel.payload_length(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parcel {
    pub request_type: u32,
    pub token: u32,
    pub payload: Vec<u8>,
}

impl Parcel {
    pub fn new(request_type: u32, token: u32, payload: Vec<u8>) -> Self {
        Self {
            request_type,
            token,
            payload,
        }
    }

    /// Payload size as the transport expects it: two hex digits per octet
    pub fn payload_length(&self) -> u32 {
        (self.payload.len() * 2) as u32
    }

    /// Serialize as type, token, framed payload
    pub fn write_to(&self, buf: &mut Buf) {
        buf.write_u32(self.request_type);
        buf.write_u32(self.token);
        buf.write_framed(&self.payload);
    }

    /// Inverse of [`Parcel::write_to`]
    pub fn read_from(buf: &mut Buf) -> Result<Self, BufError> {
        let request_type = buf.read_u32()?;
        let token = buf.read_u32()?;
        let size = buf.read_string_size()?;
        let payload = buf.read_octets(size / 2)?;
        buf.read_string_delimiter(size)?;
        Ok(Self::new(request_type, token, payload))
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// The transport side that accepts finished parcels
pub trait ParcelSink {
    fn send_parcel(&mut self, parcel: Parcel);
}

impl ParcelSink for Vec<Parcel> {
    fn send_parcel(&mut self, parcel: Parcel) {
        self.push(parcel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_length_counts_hex_digits() {
        let parcel = Parcel::new(request::STK_SEND_TERMINAL_RESPONSE, 7, vec![0; 22]);
        assert_eq!(parcel.payload_length(), 44);
        assert_eq!(parcel.len(), 22);
    }

    #[test]
    fn test_write_and_read_back() {
        let parcel = Parcel::new(request::STK_SET_PROFILE, 3, vec![0xFF, 0x01]);
        let mut buf = Buf::new();
        parcel.write_to(&mut buf);

        assert_eq!(buf.read_u32().unwrap(), request::STK_SET_PROFILE);
        buf.seek_incoming(-4).unwrap();
        assert_eq!(Parcel::read_from(&mut buf).unwrap(), parcel);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<Parcel> = Vec::new();
        sink.send_parcel(Parcel::new(request::SIM_IO, 1, Vec::new()));
        assert_eq!(sink.len(), 1);
        assert!(sink[0].is_empty());
    }
}
