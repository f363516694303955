//! SIM/USIM codecs and SIM Toolkit handling for a radio interface layer
//!
//! The crate turns the octets exchanged with a SIM card into typed values
//! and back:
//! - character, number and date codecs used inside SIM records ([`pdu`])
//! - BER-TLV and COMPREHENSION-TLV framing ([`tlv`])
//! - proactive commands, terminal responses and envelopes ([`stk`])
//! - elementary file readers and the decisions built on them ([`icc`])
//!
//! Everything runs synchronously over an in-memory [`buf::Buf`]. No logger is
//! installed; messages go through the `log` facade.

pub mod buf;
pub mod config;
pub mod icc;
pub mod pdu;
pub mod stk;
pub mod tlv;

pub use buf::{Buf, BufError, Parcel, ParcelSink};
pub use config::{ConfigError, IccConfig};
pub use icc::{AppType, IccError, IccIo, IccSession};
pub use pdu::{NationalLanguage, PduError, Plmn};
pub use stk::{ProactiveCommand, StkError, StkSession};
pub use tlv::TLVError;
