//! EF paths, service table lookups, PBR parsing, network name and display
//! decisions

use log::debug;

use super::info::NetworkName;
use super::io::IccIo;
use super::{ef, path, AppType, IccSession};
use crate::tlv::SimpleTLV;

/// Services looked up in EF_SST / EF_UST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IccService {
    Adn,
    Fdn,
    PlmnSel,
    Msisdn,
    Cbmi,
    Spn,
    Sdn,
    DataDownloadSmsCb,
    DataDownloadSmsPp,
    Cbmir,
    Bdn,
    GsmAccess,
    Pnn,
    Opl,
    Spdi,
}

impl IccService {
    /// Service number in the table of `app_type` (TS 51.011 10.3.7, TS
    /// 31.102 4.2.8)
    pub fn number(self, app_type: AppType) -> Option<u8> {
        use IccService::*;
        match app_type {
            AppType::Sim => match self {
                Adn => Some(2),
                Fdn => Some(3),
                PlmnSel => Some(7),
                Msisdn => Some(9),
                Cbmi => Some(14),
                Spn => Some(17),
                Sdn => Some(18),
                DataDownloadSmsCb => Some(25),
                DataDownloadSmsPp => Some(26),
                Cbmir => Some(30),
                Bdn => Some(31),
                Pnn => Some(51),
                Opl => Some(52),
                Spdi => Some(56),
                GsmAccess => None,
            },
            AppType::Usim => match self {
                Fdn => Some(2),
                Sdn => Some(4),
                Bdn => Some(6),
                Cbmi => Some(15),
                Cbmir => Some(16),
                Spn => Some(19),
                Msisdn => Some(21),
                GsmAccess => Some(27),
                DataDownloadSmsPp => Some(28),
                DataDownloadSmsCb => Some(29),
                Pnn => Some(45),
                Opl => Some(46),
                Spdi => Some(51),
                Adn | PlmnSel => None,
            },
            _ => None,
        }
    }
}

/// Octet index and bit mask of `service` in the service table.
///
/// A SIM spends two bits per service (allocated, activated) and the mask
/// selects the activated one. A USIM spends one bit per service.
pub fn service_bit(service: IccService, app_type: AppType) -> Option<(usize, u8)> {
    let n = service.number(app_type)? as usize - 1;
    match app_type {
        AppType::Sim => Some((n / 4, 2 << ((n % 4) * 2))),
        AppType::Usim => Some((n / 8, 1 << (n % 8))),
        _ => None,
    }
}

/// Parent DF path of `file_id` for the app type of the card
pub fn ef_path(file_id: u16, app_type: AppType) -> Option<String> {
    let telecom = format!("{}{}", path::MF_SIM, path::DF_TELECOM);
    match file_id {
        ef::ICCID => return Some(path::MF_SIM.to_string()),
        ef::ADN => return Some(telecom),
        ef::PBR => return Some(format!("{}{}", telecom, path::DF_PHONEBOOK)),
        _ => {}
    }

    match app_type {
        AppType::Sim => match file_id {
            ef::FDN | ef::MSISDN => Some(telecom),
            ef::AD | ef::MBDN | ef::PLMN_SEL | ef::SPN | ef::SPDI | ef::SST | ef::PHASE | ef::CBMI
            | ef::CBMID | ef::CBMIR | ef::OPL | ef::PNN | ef::IMSI => {
                Some(format!("{}{}", path::MF_SIM, path::DF_GSM))
            }
            _ => None,
        },
        AppType::Usim => match file_id {
            ef::AD | ef::FDN | ef::MBDN | ef::SST | ef::MSISDN | ef::SPN | ef::SPDI | ef::CBMI
            | ef::CBMID | ef::CBMIR | ef::OPL | ef::PNN | ef::IMSI => {
                Some(format!("{}{}", path::MF_SIM, path::ADF_USIM))
            }
            // Everything else lives in the USIM phonebook
            _ => Some(format!("{}{}", telecom, path::DF_PHONEBOOK)),
        },
        _ => None,
    }
}

/// EF_PBR tags (TS 31.102 section 4.4.2.1)
pub mod pbr_tag {
    pub const TYPE1: u8 = 0xA8;
    pub const TYPE2: u8 = 0xA9;
    pub const TYPE3: u8 = 0xAA;

    pub const ADN: u8 = 0xC0;
    pub const IAP: u8 = 0xC1;
    pub const EXT1: u8 = 0xC2;
    pub const SNE: u8 = 0xC3;
    pub const ANR: u8 = 0xC4;
    pub const PBC: u8 = 0xC5;
    pub const GRP: u8 = 0xC6;
    pub const AAS: u8 = 0xC7;
    pub const GAS: u8 = 0xC8;
    pub const UID: u8 = 0xC9;
    pub const EMAIL: u8 = 0xCA;
    pub const CCP1: u8 = 0xCB;
}

/// One constructed TLV of a PBR record with its simple TLV children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbrTlv {
    pub tag: u8,
    pub length: usize,
    pub value: Vec<SimpleTLV>,
}

/// A file referenced by EF_PBR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbrFile {
    /// [`pbr_tag::TYPE1`], [`pbr_tag::TYPE2`] or [`pbr_tag::TYPE3`]
    pub file_type: u8,
    pub file_id: u16,
    pub sfi: Option<u8>,
    /// Position in EF_IAP, for type 2 files
    pub index_in_iap: Option<usize>,
}

/// One EF_PBR record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pbr {
    pub adn: Option<PbrFile>,
    pub iap: Option<PbrFile>,
    pub ext1: Option<PbrFile>,
    pub sne: Option<PbrFile>,
    /// A record may reference several EF_ANR files
    pub anr: Vec<PbrFile>,
    pub pbc: Option<PbrFile>,
    pub grp: Option<PbrFile>,
    pub aas: Option<PbrFile>,
    pub gas: Option<PbrFile>,
    pub uid: Option<PbrFile>,
    pub email: Option<PbrFile>,
    pub ccp1: Option<PbrFile>,
}

/// Map the TLVs of a PBR record to the files they reference
pub fn parse_pbr_tlvs(tlvs: &[PbrTlv]) -> Pbr {
    let mut pbr = Pbr::default();
    for parent in tlvs {
        for (index, child) in parent.value.iter().enumerate() {
            if child.value.len() < 2 {
                debug!("PBR tag {:#04x} too short for a file id", child.tag);
                continue;
            }
            let file = PbrFile {
                file_type: parent.tag,
                file_id: ((child.value[0] as u16) << 8) | child.value[1] as u16,
                sfi: child.value.get(2).copied(),
                index_in_iap: (parent.tag == pbr_tag::TYPE2).then_some(index),
            };
            let slot = match child.tag {
                pbr_tag::ADN => &mut pbr.adn,
                pbr_tag::IAP => &mut pbr.iap,
                pbr_tag::EXT1 => &mut pbr.ext1,
                pbr_tag::SNE => &mut pbr.sne,
                pbr_tag::ANR => {
                    pbr.anr.push(file);
                    continue;
                }
                pbr_tag::PBC => &mut pbr.pbc,
                pbr_tag::GRP => &mut pbr.grp,
                pbr_tag::AAS => &mut pbr.aas,
                pbr_tag::GAS => &mut pbr.gas,
                pbr_tag::UID => &mut pbr.uid,
                pbr_tag::EMAIL => &mut pbr.email,
                pbr_tag::CCP1 => &mut pbr.ccp1,
                other => {
                    debug!("Ignoring PBR tag {:#04x}", other);
                    continue;
                }
            };
            *slot = Some(file);
        }
    }
    pbr
}

impl<I: IccIo> IccSession<I> {
    /// Whether the service table marks `service` as available
    pub fn is_icc_service_available(&self, service: IccService) -> bool {
        let (Some(table), Some((index, mask))) = (&self.records.service_table, service_bit(service, self.app_type))
        else {
            return false;
        };
        table.get(index).map_or(false, |octet| octet & mask != 0)
    }

    /// Network name for the PLMN and location area in use, from EF_PNN and
    /// EF_OPL
    pub fn get_network_name_from_icc(&self, mcc: &str, mnc: &str, lac: u16) -> Option<NetworkName> {
        let pnn = self.records.pnn.as_ref()?;

        let Some(opl) = &self.records.opl else {
            // Without EF_OPL the first PNN record names the home PLMN only
            let home = self.home_plmn()?;
            return if home.matches(mcc, mnc) { pnn.first().cloned() } else { None };
        };

        let entry = opl.iter().find(|entry| entry.plmn.matches(mcc, mnc) && entry.covers(lac))?;
        match entry.pnn_record_id {
            0 => None,
            id => pnn.get(id as usize - 1).cloned(),
        }
    }

    /// Re-evaluate whether the network name and the SPN are shown (TS 51.011
    /// 10.3.11, TS 22.101 A.4). Returns whether either flag changed.
    pub fn update_display_condition(&mut self) -> bool {
        let original = (
            self.info.is_display_network_name_required,
            self.info.is_display_spn_required,
        );

        let (network_name, spn) = match &self.records.spn {
            None => (true, false),
            Some(spn_info) => {
                let condition = spn_info.display_condition;
                if self.is_on_matching_plmn() {
                    (condition & 0x01 != 0, true)
                } else {
                    (false, condition & 0x02 == 0)
                }
            }
        };

        self.info.is_display_network_name_required = Some(network_name);
        self.info.is_display_spn_required = Some(spn);
        let changed = original != (Some(network_name), Some(spn));
        if changed {
            debug!("Display condition: network name {}, SPN {}", network_name, spn);
        }
        changed
    }

    /// The registered PLMN is the home PLMN or listed in EF_SPDI
    fn is_on_matching_plmn(&self) -> bool {
        let Some(operator) = &self.operator else {
            return false;
        };
        if self.home_plmn().as_ref() == Some(operator) {
            return true;
        }
        self.records
            .spdi
            .as_ref()
            .map_or(false, |spdi| spdi.iter().any(|plmn| plmn == operator))
    }
}
