//! Card information snapshot and cached records

use serde::{Deserialize, Serialize};

use super::utils::Pbr;
use crate::pdu::Plmn;

/// What the card tells the rest of the stack about the subscription.
///
/// Fields stay `None` until the corresponding EF has been read. The two
/// display flags stay `None` until the display condition has been evaluated
/// once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IccInfo {
    pub iccid: Option<String>,
    /// Home PLMN from EF_AD and the IMSI
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub spn: Option<String>,
    pub msisdn: Option<String>,
    pub is_display_network_name_required: Option<bool>,
    pub is_display_spn_required: Option<bool>,
}

impl IccInfo {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One EF_PNN record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkName {
    pub full_name: Option<String>,
    pub short_name: Option<String>,
}

impl NetworkName {
    pub fn new(full_name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            short_name: Some(short_name.into()),
        }
    }
}

/// One EF_OPL record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OplEntry {
    pub plmn: Plmn,
    pub lac_tac_start: u16,
    pub lac_tac_end: u16,
    /// 1-based EF_PNN record; 0 means the name comes from elsewhere
    pub pnn_record_id: u8,
}

impl OplEntry {
    /// Range covering every location area
    pub const ANY_LAC_END: u16 = 0xFFFE;

    pub fn covers(&self, lac: u16) -> bool {
        (self.lac_tac_start == 0 && self.lac_tac_end == Self::ANY_LAC_END)
            || (self.lac_tac_start <= lac && lac <= self.lac_tac_end)
    }
}

/// EF_SPN contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpnInfo {
    /// Bit 0: show the registered PLMN name on the home PLMN.
    /// Bit 1: hide the SPN when roaming.
    pub display_condition: u8,
    pub spn: String,
}

/// Records kept for network name and display decisions
#[derive(Debug, Clone, Default)]
pub struct IccRecords {
    pub pnn: Option<Vec<NetworkName>>,
    pub opl: Option<Vec<OplEntry>>,
    pub spn: Option<SpnInfo>,
    pub spdi: Option<Vec<Plmn>>,
    /// EF_SST or EF_UST, as read
    pub service_table: Option<Vec<u8>>,
    pub pbrs: Vec<Pbr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_json() {
        let info = IccInfo {
            iccid: Some("89014103211118510720".to_string()),
            mcc: Some("466".to_string()),
            mnc: Some("92".to_string()),
            spn: Some("Mozilla".to_string()),
            is_display_spn_required: Some(true),
            ..Default::default()
        };
        let json = info.to_json().unwrap();
        assert!(json.contains("\"mnc\":\"92\""));
        assert!(json.contains("\"is_display_network_name_required\":null"));
        assert_eq!(IccInfo::from_json(&json).unwrap(), info);
    }

    #[test]
    fn test_info_json_missing_fields() {
        let info = IccInfo::from_json(r#"{ "iccid": "8988" }"#).unwrap();
        assert_eq!(info.iccid.as_deref(), Some("8988"));
        assert_eq!(info.spn, None);
        assert_eq!(info.is_display_spn_required, None);
    }

    #[test]
    fn test_opl_covers() {
        let mut entry = OplEntry {
            plmn: Plmn::new("321", "654"),
            lac_tac_start: 0x0100,
            lac_tac_end: 0x1010,
            pnn_record_id: 2,
        };
        assert!(entry.covers(0x1000));
        assert!(entry.covers(0x0100));
        assert!(!entry.covers(0x0001));

        entry.lac_tac_start = 0;
        entry.lac_tac_end = OplEntry::ANY_LAC_END;
        assert!(entry.covers(0xFFFF));
    }
}
