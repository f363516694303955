//! SIM/USIM record handling
//!
//! [`IccSession`] reads elementary files through an [`IccIo`] and keeps what
//! it learns: the public [`IccInfo`] snapshot and the [`IccRecords`] used
//! for network name and display decisions.
//!
//! # Example
//! ```ignore
//! use ril_icc::icc::{AppType, IccIoHelper, IccSession};
//!
//! let mut session = IccSession::new(IccIoHelper::new(modem, AppType::Usim), AppType::Usim);
//! session.read_pnn()?;
//! let name = session.get_network_name_from_icc("123", "456", 0x1000);
//! ```

mod command;
mod info;
mod io;
mod records;
mod status;
mod utils;

pub use command::{ins, record_mode, IccIoCommand, IccIoResponse, GET_RESPONSE_EF_SIZE_BYTES};
pub use info::{IccInfo, IccRecords, NetworkName, OplEntry, SpnInfo};
pub use io::{
    parse_get_response, structure, FileInfo, IccChannel, IccIo, IccIoError, IccIoHelper, LoadRequest, RecordInfo,
};
pub use records::Contact;
pub use status::SW;
pub use utils::{ef_path, parse_pbr_tlvs, pbr_tag, service_bit, IccService, Pbr, PbrFile, PbrTlv};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buf::BufError;
use crate::pdu::{PduError, Plmn};
use crate::tlv::TLVError;

/// Elementary file identifiers
pub mod ef {
    pub const ICCID: u16 = 0x2FE2;
    pub const IMSI: u16 = 0x6F07;
    pub const PLMN_SEL: u16 = 0x6F30;
    /// EF_SST on a SIM, EF_UST on a USIM
    pub const SST: u16 = 0x6F38;
    pub const ADN: u16 = 0x6F3A;
    pub const FDN: u16 = 0x6F3B;
    pub const MSISDN: u16 = 0x6F40;
    pub const CBMI: u16 = 0x6F45;
    pub const SPN: u16 = 0x6F46;
    pub const CBMID: u16 = 0x6F48;
    pub const SDN: u16 = 0x6F49;
    pub const CBMIR: u16 = 0x6F50;
    pub const AD: u16 = 0x6FAD;
    pub const PHASE: u16 = 0x6FAE;
    pub const PNN: u16 = 0x6FC5;
    pub const OPL: u16 = 0x6FC6;
    pub const MBDN: u16 = 0x6FC7;
    pub const SPDI: u16 = 0x6FCD;
    pub const PBR: u16 = 0x4F30;
}

/// Hex path fragments of the dedicated files
pub mod path {
    pub const MF_SIM: &str = "3F00";
    pub const DF_TELECOM: &str = "7F10";
    pub const DF_GSM: &str = "7F20";
    pub const ADF_USIM: &str = "7FFF";
    pub const DF_PHONEBOOK: &str = "5F3A";
}

/// Application on the card that holds the GSM/UMTS subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    #[default]
    Unknown,
    Sim,
    Usim,
    Ruim,
    Csim,
    Isim,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IccError {
    #[error(transparent)]
    Io(#[from] IccIoError),

    #[error(transparent)]
    Buf(#[from] BufError),

    #[error(transparent)]
    Pdu(#[from] PduError),

    #[error(transparent)]
    Tlv(#[from] TLVError),

    #[error("Phonebook reference record without EF_ADN")]
    MissingAdn,

    #[error("Contact has no record id")]
    MissingRecordId,
}

/// Card records state for one subscription
pub struct IccSession<I: IccIo> {
    io: I,
    app_type: AppType,
    info: IccInfo,
    records: IccRecords,
    /// Registered PLMN, compared against the home PLMN and EF_SPDI
    operator: Option<Plmn>,
}

impl<I: IccIo> IccSession<I> {
    pub fn new(io: I, app_type: AppType) -> Self {
        Self {
            io,
            app_type,
            info: IccInfo::default(),
            records: IccRecords::default(),
            operator: None,
        }
    }

    pub fn app_type(&self) -> AppType {
        self.app_type
    }

    pub fn info(&self) -> &IccInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut IccInfo {
        &mut self.info
    }

    pub fn records(&self) -> &IccRecords {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut IccRecords {
        &mut self.records
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn operator(&self) -> Option<&Plmn> {
        self.operator.as_ref()
    }

    /// Forget everything read from the card, for a new or removed card
    pub fn reset(&mut self) {
        self.info = IccInfo::default();
        self.records = IccRecords::default();
        self.operator = None;
    }

    /// Record the registered PLMN; returns whether the display condition
    /// changed
    pub fn set_operator(&mut self, operator: Option<Plmn>) -> bool {
        self.operator = operator;
        self.update_display_condition()
    }

    /// Home PLMN from EF_AD and the IMSI, once both are known
    pub fn home_plmn(&self) -> Option<Plmn> {
        match (&self.info.mcc, &self.info.mnc) {
            (Some(mcc), Some(mnc)) => Some(Plmn::new(mcc.clone(), mnc.clone())),
            _ => None,
        }
    }
}
