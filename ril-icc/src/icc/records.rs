//! Elementary file readers
//!
//! Each reader loads its EF through the session's [`IccIo`], decodes it and
//! stores the result in the session's [`IccInfo`](super::IccInfo) or
//! [`IccRecords`](super::IccRecords).

use log::{debug, info, warn};

use super::io::{IccIo, LoadRequest, RecordInfo, MAX_RECORD_NUMBER};
use super::utils::{parse_pbr_tlvs, pbr_tag, IccService, Pbr, PbrTlv};
use super::{ef, IccError, IccSession, NetworkName, OplEntry, SpnInfo};
use crate::buf::Buf;
use crate::pdu::{self, bcd, Plmn};
use crate::tlv::decode_simple_blocks;

const PNN_IEI_FULL_NETWORK_NAME: u8 = 0x43;
const PNN_IEI_SHORT_NETWORK_NAME: u8 = 0x45;
const SPDI_TAG_SPDI: u8 = 0xA3;
const SPDI_TAG_PLMN_LIST: u8 = 0x80;
const UNUSED: u8 = 0xFF;

/// An ADN-like phonebook entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    /// Record number in the EF; `None` for a contact not yet stored
    pub record_id: Option<u8>,
    pub alpha_id: String,
    pub number: String,
}

/// Take the framed string at the read cursor as its own buffer
fn read_framed(buf: &mut Buf) -> Result<Buf, IccError> {
    let size = buf.read_string_size()?;
    let octets = buf.read_octets(size / 2)?;
    buf.read_string_delimiter(size)?;
    Ok(Buf::from_octets(octets))
}

fn parse_pnn_record(record: &mut Buf) -> Result<Option<NetworkName>, IccError> {
    let mut name: Option<NetworkName> = None;
    while record.remaining() > 0 {
        let tag = record.read_u8()?;
        if tag == UNUSED {
            break;
        }
        let name = name.get_or_insert_with(NetworkName::default);
        let len = record.read_u8()? as usize;
        match tag {
            PNN_IEI_FULL_NETWORK_NAME => name.full_name = pdu::read_network_name(record, len)?,
            PNN_IEI_SHORT_NETWORK_NAME => name.short_name = pdu::read_network_name(record, len)?,
            _ => record.skip(len)?,
        }
    }
    Ok(name)
}

impl<I: IccIo> IccSession<I> {
    /// Load every record of a linear fixed EF, handing each to `each` until
    /// it returns `false`. Records past [`MAX_RECORD_NUMBER`] are never read.
    fn for_each_record(
        &mut self,
        mut request: LoadRequest,
        mut each: impl FnMut(&mut Buf, RecordInfo, u8) -> Result<bool, IccError>,
    ) -> Result<(), IccError> {
        let mut buf = Buf::new();
        let mut info = self.io.load_linear_fixed_ef(&mut request, &mut buf)?;
        loop {
            let mut record = read_framed(&mut buf)?;
            if !each(&mut record, info, request.record_number)? {
                return Ok(());
            }
            let last = info.total_records.min(MAX_RECORD_NUMBER as usize);
            if request.record_number as usize >= last {
                return Ok(());
            }
            info = self.io.load_next_record(&mut request, &mut buf)?;
        }
    }

    fn load_transparent(&mut self, file_id: u16) -> Result<Buf, IccError> {
        let mut buf = Buf::new();
        self.io.load_transparent_ef(&LoadRequest::new(file_id), &mut buf)?;
        read_framed(&mut buf)
    }

    /// EF_ICCID
    pub fn read_iccid(&mut self) -> Result<&str, IccError> {
        let mut data = self.load_transparent(ef::ICCID)?;
        let len = data.len();
        let iccid = bcd::read_swapped_nibble_bcd_string(&mut data, len)?;
        debug!("ICCID: {}", iccid);
        Ok(self.info.iccid.insert(iccid).as_str())
    }

    /// EF_AD; with the IMSI this yields the home PLMN
    pub fn read_ad(&mut self, imsi: Option<&str>) -> Result<(), IccError> {
        let data = self.load_transparent(ef::AD)?.into_octets();
        let mnc_len = data.get(3).map_or(0, |octet| (octet & 0x0F) as usize);
        debug!("AD: {:02X?}, MNC length {}", data, mnc_len);

        let Some(imsi) = imsi else {
            return Ok(());
        };
        match (imsi.get(..3), imsi.get(3..3 + mnc_len)) {
            (Some(mcc), Some(mnc)) if mnc_len > 0 => {
                self.info.mcc = Some(mcc.to_string());
                self.info.mnc = Some(mnc.to_string());
                self.update_display_condition();
            }
            _ => warn!("Cannot take a {}-digit MNC from an IMSI of {} digits", mnc_len, imsi.len()),
        }
        Ok(())
    }

    /// EF_SST / EF_UST
    pub fn read_sst(&mut self) -> Result<(), IccError> {
        let table = self.load_transparent(ef::SST)?.into_octets();
        debug!("Service table: {:02X?}", table);
        self.records.service_table = Some(table);
        Ok(())
    }

    /// First record of EF_MSISDN
    pub fn read_msisdn(&mut self) -> Result<Option<&str>, IccError> {
        let mut buf = Buf::new();
        let mut request = LoadRequest::new(ef::MSISDN);
        let info = self.io.load_linear_fixed_ef(&mut request, &mut buf)?;
        let mut record = read_framed(&mut buf)?;
        let entry = pdu::read_alpha_id_dialling_number(&mut record, info.record_size)?;
        self.info.msisdn = entry.map(|entry| entry.number).filter(|number| !number.is_empty());
        Ok(self.info.msisdn.as_deref())
    }

    /// EF_SPN: display condition octet, then the name
    pub fn read_spn(&mut self) -> Result<SpnInfo, IccError> {
        let mut data = self.load_transparent(ef::SPN)?;
        let display_condition = data.read_u8()?;
        let len = data.remaining();
        let spn = pdu::read_alpha_identifier(&mut data, len)?;
        debug!("SPN: {}, display condition {:#04x}", spn, display_condition);

        let spn_info = SpnInfo { display_condition, spn };
        self.info.spn = Some(spn_info.spn.clone());
        self.records.spn = Some(spn_info.clone());
        self.update_display_condition();
        Ok(spn_info)
    }

    /// EF_SPDI: the PLMNs where the SPN is shown as on the home PLMN
    pub fn read_spdi(&mut self) -> Result<(), IccError> {
        let mut data = self.load_transparent(ef::SPDI)?;
        let mut spdi = None;
        while data.remaining() >= 2 {
            let tag = data.read_u8()?;
            let len = data.read_u8()? as usize;
            match tag {
                // Constructed; the PLMN list follows
                SPDI_TAG_SPDI => continue,
                SPDI_TAG_PLMN_LIST => {
                    let mut plmns = Vec::with_capacity(len / 3);
                    for _ in 0..len / 3 {
                        if let Some(plmn) = bcd::read_plmn(&mut data)? {
                            plmns.push(plmn);
                        }
                    }
                    spdi = Some(plmns);
                    break;
                }
                _ => break,
            }
        }
        debug!("SPDI: {:?}", spdi);
        self.records.spdi = spdi;
        self.update_display_condition();
        Ok(())
    }

    /// EF_PNN; reading stops at the first unused record
    pub fn read_pnn(&mut self) -> Result<&[NetworkName], IccError> {
        let mut pnn = Vec::new();
        self.for_each_record(LoadRequest::new(ef::PNN), |record, _, _| {
            Ok(match parse_pnn_record(record)? {
                Some(name) => {
                    pnn.push(name);
                    true
                }
                None => false,
            })
        })?;
        debug!("PNN: {} record(s)", pnn.len());
        Ok(self.records.pnn.insert(pnn).as_slice())
    }

    /// EF_OPL
    pub fn read_opl(&mut self) -> Result<&[OplEntry], IccError> {
        let mut opl = Vec::new();
        self.for_each_record(LoadRequest::new(ef::OPL), |record, _, _| {
            let Some(plmn) = bcd::read_plmn(record)? else {
                return Ok(true);
            };
            opl.push(OplEntry {
                plmn,
                lac_tac_start: record.read_u16_be()?,
                lac_tac_end: record.read_u16_be()?,
                pnn_record_id: record.read_u8()?,
            });
            Ok(true)
        })?;
        debug!("OPL: {} record(s)", opl.len());
        Ok(self.records.opl.insert(opl).as_slice())
    }

    /// EF_PBR of the USIM phonebook
    pub fn read_pbr(&mut self) -> Result<&[Pbr], IccError> {
        let mut pbrs = Vec::new();
        self.for_each_record(LoadRequest::new(ef::PBR), |record, _, _| {
            let mut tlvs = Vec::new();
            while record.remaining() > 0 {
                let tag = record.read_u8()?;
                if tag == UNUSED {
                    break;
                }
                let length = record.read_u8()? as usize;
                let value = decode_simple_blocks(record, length)?;
                tlvs.push(PbrTlv { tag, length, value });
            }
            if tlvs.is_empty() {
                return Ok(true);
            }
            let pbr = parse_pbr_tlvs(&tlvs);
            if pbr.adn.is_none() {
                return Err(IccError::MissingAdn);
            }
            pbrs.push(pbr);
            Ok(true)
        })?;
        self.records.pbrs = pbrs;
        Ok(self.records.pbrs.as_slice())
    }

    /// One EF_EMAIL record. A type 2 record ends with the ADN SFI and
    /// record identifier, which are not part of the address.
    pub fn read_email(&mut self, file_id: u16, file_type: u8, record_number: u8) -> Result<String, IccError> {
        let mut buf = Buf::new();
        self.io
            .load_linear_fixed_ef(&mut LoadRequest::record(file_id, record_number), &mut buf)?;
        let mut record = read_framed(&mut buf)?;
        let len = record.len();
        let email = if file_type == pbr_tag::TYPE1 {
            pdu::read_8bit_unpacked_to_string(&mut record, len)?
        } else {
            pdu::read_8bit_unpacked_to_string(&mut record, len.saturating_sub(2))?
        };
        Ok(email)
    }

    /// Every used record of an ADN-like EF (ADN, FDN, SDN, MBDN)
    pub fn read_adn_like(&mut self, file_id: u16) -> Result<Vec<Contact>, IccError> {
        let mut contacts = Vec::new();
        self.for_each_record(LoadRequest::new(file_id), |record, info, record_number| {
            if let Some(entry) = pdu::read_alpha_id_dialling_number(record, info.record_size)? {
                contacts.push(Contact {
                    record_id: Some(record_number),
                    alpha_id: entry.alpha_id,
                    number: entry.number,
                });
            }
            Ok(true)
        })?;
        debug!("EF {:#06x}: {} contact(s)", file_id, contacts.len());
        Ok(contacts)
    }

    /// Overwrite the record of `contact`; FDN updates need PIN2
    pub fn update_adn_like(&mut self, file_id: u16, contact: &Contact, pin2: Option<&str>) -> Result<(), IccError> {
        let record_id = contact.record_id.ok_or(IccError::MissingRecordId)?;
        let mut request = LoadRequest::record(file_id, record_id);
        request.pin2 = pin2.map(str::to_string);
        self.io.update_linear_fixed_ef(&mut request, &mut |record_size, buf| {
            pdu::write_alpha_id_dialling_number(
                buf,
                record_size,
                Some(contact.alpha_id.as_str()),
                Some(contact.number.as_str()),
            )
        })?;
        Ok(())
    }

    /// Read the records needed at SIM start-up. ICCID and AD failures are
    /// logged and skipped; the service table is required since it gates
    /// the remaining reads.
    pub fn fetch_sim_records(&mut self, imsi: Option<&str>) -> Result<(), IccError> {
        if let Err(e) = self.read_iccid() {
            warn!("Failed to read ICCID: {}", e);
        }
        if let Err(e) = self.read_ad(imsi) {
            warn!("Failed to read AD: {}", e);
        }
        self.read_sst()?;

        if self.is_icc_service_available(IccService::Msisdn) {
            if let Err(e) = self.read_msisdn() {
                warn!("Failed to read MSISDN: {}", e);
            }
        }
        if self.is_icc_service_available(IccService::Spn) {
            if let Err(e) = self.read_spn() {
                warn!("Failed to read SPN: {}", e);
            }
        }
        if self.is_icc_service_available(IccService::Spdi) {
            if let Err(e) = self.read_spdi() {
                warn!("Failed to read SPDI: {}", e);
            }
        }
        if self.is_icc_service_available(IccService::Pnn) {
            if let Err(e) = self.read_pnn() {
                warn!("Failed to read PNN: {}", e);
            }
        }
        if self.is_icc_service_available(IccService::Opl) {
            if let Err(e) = self.read_opl() {
                warn!("Failed to read OPL: {}", e);
            }
        }
        info!(
            "SIM records loaded, home PLMN {}",
            self.home_plmn().as_ref().map_or_else(|| "unknown".to_string(), Plmn::to_string)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::icc::io::IccIoError;
    use crate::icc::AppType;

    #[derive(Default)]
    struct FakeIo {
        records: HashMap<u16, Vec<Vec<u8>>>,
        binaries: HashMap<u16, Vec<u8>>,
        pin2: Option<String>,
    }

    impl IccIo for FakeIo {
        fn load_linear_fixed_ef(&mut self, request: &mut LoadRequest, buf: &mut Buf) -> Result<RecordInfo, IccIoError> {
            let records = self
                .records
                .get(&request.file_id)
                .ok_or(IccIoError::UnknownPath(request.file_id))?;
            let info = RecordInfo {
                record_size: records[0].len(),
                total_records: records.len(),
            };
            let record = records
                .get(request.record_number as usize - 1)
                .ok_or(IccIoError::RecordOutOfRange {
                    file_id: request.file_id,
                    record: request.record_number,
                    total: records.len(),
                })?;
            buf.write_framed(record);
            request.record_info = Some(info);
            Ok(info)
        }

        fn load_transparent_ef(&mut self, request: &LoadRequest, buf: &mut Buf) -> Result<(), IccIoError> {
            let data = self
                .binaries
                .get(&request.file_id)
                .ok_or(IccIoError::UnknownPath(request.file_id))?;
            buf.write_framed(data);
            Ok(())
        }

        fn update_linear_fixed_ef(
            &mut self,
            request: &mut LoadRequest,
            write: &mut dyn FnMut(usize, &mut Buf),
        ) -> Result<(), IccIoError> {
            let records = self
                .records
                .get_mut(&request.file_id)
                .ok_or(IccIoError::UnknownPath(request.file_id))?;
            let mut buf = Buf::new();
            write(records[0].len(), &mut buf);
            records[request.record_number as usize - 1] = buf.into_octets();
            self.pin2 = request.pin2.clone();
            Ok(())
        }
    }

    /// `hex` padded with unused octets to `size`
    fn record(hex: &str, size: usize) -> Vec<u8> {
        let mut octets = hex::decode(hex).unwrap();
        octets.resize(size, 0xFF);
        octets
    }

    fn session(io: FakeIo) -> IccSession<FakeIo> {
        IccSession::new(io, AppType::Sim)
    }

    #[test]
    fn test_read_pnn() {
        let mut io = FakeIo::default();
        io.records.insert(
            ef::PNN,
            vec![
                record("430685CCB7FB1C0345078653F45B4E8F01", 27),
                record("430685CCB7FB2C03", 27),
                record("", 27),
            ],
        );
        let mut s = session(io);

        let pnn = s.read_pnn().unwrap();
        assert_eq!(pnn.len(), 2);
        assert_eq!(pnn[0].full_name.as_deref(), Some("Long1"));
        assert_eq!(pnn[0].short_name.as_deref(), Some("Short1"));
        assert_eq!(pnn[1].full_name.as_deref(), Some("Long2"));
        assert_eq!(pnn[1].short_name, None);
    }

    #[test]
    fn test_read_pnn_skips_unknown_tags() {
        let mut io = FakeIo::default();
        io.records
            .insert(ef::PNN, vec![record("8002ABCD430685CCB7FB1C03", 20)]);
        let mut s = session(io);
        let pnn = s.read_pnn().unwrap();
        assert_eq!(pnn.len(), 1);
        assert_eq!(pnn[0].full_name.as_deref(), Some("Long1"));
        assert_eq!(pnn[0].short_name, None);
    }

    #[test]
    fn test_read_opl() {
        let mut io = FakeIo::default();
        io.records.insert(
            ef::OPL,
            vec![
                hex::decode("2163540000FFFE04").unwrap(),
                record("", 8),
                hex::decode("23F1450100101002").unwrap(),
            ],
        );
        let mut s = session(io);

        let opl = s.read_opl().unwrap();
        assert_eq!(opl.len(), 2);
        assert_eq!(opl[0].plmn, Plmn::new("123", "456"));
        assert_eq!(opl[0].lac_tac_start, 0);
        assert_eq!(opl[0].lac_tac_end, 0xFFFE);
        assert_eq!(opl[0].pnn_record_id, 4);
        assert_eq!(opl[1].plmn, Plmn::new("321", "54"));
        assert_eq!(opl[1].lac_tac_start, 0x0100);
        assert_eq!(opl[1].lac_tac_end, 0x1010);
        assert_eq!(opl[1].pnn_record_id, 2);
    }

    #[test]
    fn test_read_opl_stops_at_last_addressable_record() {
        let mut io = FakeIo::default();
        let mut records = vec![record("", 8); 300];
        records[253] = hex::decode("2163540000FFFE04").unwrap();
        records[254] = hex::decode("23F1450100101002").unwrap();
        io.records.insert(ef::OPL, records);
        let mut s = session(io);

        let opl = s.read_opl().unwrap();
        assert_eq!(opl.len(), 1);
        assert_eq!(opl[0].plmn, Plmn::new("123", "456"));
    }

    #[test]
    fn test_read_spn_and_spdi() {
        let mut io = FakeIo::default();
        io.binaries.insert(ef::SPN, record("024D6F7A696C6C61", 17));
        io.binaries
            .insert(ef::SPDI, record("A30B800921635432F451FFFFFF", 16));
        let mut s = session(io);
        s.info_mut().mcc = Some("123".to_string());
        s.info_mut().mnc = Some("456".to_string());
        s.set_operator(Some(Plmn::new("234", "15")));

        let spn = s.read_spn().unwrap();
        assert_eq!(spn.display_condition, 0x02);
        assert_eq!(spn.spn, "Mozilla");
        assert_eq!(s.info().spn.as_deref(), Some("Mozilla"));
        // Roaming with bit 1 set
        assert_eq!(s.info().is_display_spn_required, Some(false));

        s.read_spdi().unwrap();
        assert_eq!(
            s.records().spdi,
            Some(vec![Plmn::new("123", "456"), Plmn::new("234", "15")])
        );
        // The operator is listed in EF_SPDI
        assert_eq!(s.info().is_display_spn_required, Some(true));
        assert_eq!(s.info().is_display_network_name_required, Some(false));
    }

    #[test]
    fn test_read_spdi_without_plmn_list() {
        let mut io = FakeIo::default();
        io.binaries.insert(ef::SPDI, record("A302", 8));
        let mut s = session(io);
        s.read_spdi().unwrap();
        assert_eq!(s.records().spdi, None);
    }

    #[test]
    fn test_read_pbr() {
        let mut io = FakeIo::default();
        io.records.insert(
            ef::PBR,
            vec![record(
                "A80FC0034F3A02C1034F2501C5034F0904A905CA034F500BAA0ACB034F3D0AC2034F4A03",
                64,
            )],
        );
        let mut s = session(io);

        let pbrs = s.read_pbr().unwrap();
        assert_eq!(pbrs.len(), 1);
        assert_eq!(pbrs[0].adn.map(|f| f.file_id), Some(0x4F3A));
        assert_eq!(pbrs[0].email.map(|f| f.file_type), Some(pbr_tag::TYPE2));
        assert_eq!(pbrs[0].ext1.map(|f| f.sfi), Some(Some(0x03)));
    }

    #[test]
    fn test_read_pbr_without_adn() {
        let mut io = FakeIo::default();
        io.records
            .insert(ef::PBR, vec![record("A905CA034F500B", 32)]);
        let mut s = session(io);
        assert_eq!(s.read_pbr().unwrap_err(), IccError::MissingAdn);
    }

    #[test]
    fn test_read_email() {
        let mut io = FakeIo::default();
        io.records.insert(
            0x6A75,
            vec![hex::decode("656D61696C006D6F7A696C6C612E636F6D0223").unwrap()],
        );
        let mut s = session(io);

        assert_eq!(s.read_email(0x6A75, pbr_tag::TYPE1, 1).unwrap(), "email@mozilla.com$#");
        assert_eq!(s.read_email(0x6A75, pbr_tag::TYPE2, 1).unwrap(), "email@mozilla.com");
    }

    #[test]
    fn test_read_adn_like() {
        let mut io = FakeIo::default();
        io.records.insert(
            ef::ADN,
            vec![
                record("4D6F7A696C6C610481214365", 21),
                record("", 21),
                record("426F62FFFFFFFF03915155", 21),
            ],
        );
        let mut s = session(io);

        let contacts = s.read_adn_like(ef::ADN).unwrap();
        assert_eq!(
            contacts,
            vec![
                Contact {
                    record_id: Some(1),
                    alpha_id: "Mozilla".to_string(),
                    number: "123456".to_string(),
                },
                Contact {
                    record_id: Some(3),
                    alpha_id: "Bob".to_string(),
                    number: "+1555".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_update_adn_like() {
        let mut io = FakeIo::default();
        io.records.insert(ef::FDN, vec![record("", 21), record("", 21)]);
        let mut s = session(io);

        let contact = Contact {
            record_id: Some(2),
            alpha_id: "Ann".to_string(),
            number: "123".to_string(),
        };
        s.update_adn_like(ef::FDN, &contact, Some("0000")).unwrap();
        assert_eq!(
            s.io_mut().records[&ef::FDN][1],
            record("416E6EFFFFFFFF038121F3", 21)
        );
        assert_eq!(s.io_mut().pin2.as_deref(), Some("0000"));
        assert_eq!(s.read_adn_like(ef::FDN).unwrap(), vec![contact]);

        let unsaved = Contact::default();
        assert_eq!(s.update_adn_like(ef::FDN, &unsaved, None), Err(IccError::MissingRecordId));
    }

    #[test]
    fn test_fetch_sim_records() {
        let mut io = FakeIo::default();
        io.binaries
            .insert(ef::ICCID, hex::decode("98101430121181157002").unwrap());
        io.binaries.insert(ef::AD, hex::decode("00000002").unwrap());
        // ADN, MSISDN and SPN; the table is too short for PNN and OPL
        io.binaries.insert(ef::SST, hex::decode("0800020002").unwrap());
        io.binaries.insert(ef::SPN, record("014D6F7A696C6C61", 17));
        io.records.insert(
            ef::MSISDN,
            vec![record("FFFFFFFFFFFFFF06819055214365", 21)],
        );
        let mut s = session(io);
        s.set_operator(Some(Plmn::new("466", "92")));

        s.fetch_sim_records(Some("466923202422409")).unwrap();
        let info = s.info();
        assert_eq!(info.iccid.as_deref(), Some("89014103211118510720"));
        assert_eq!(info.mcc.as_deref(), Some("466"));
        assert_eq!(info.mnc.as_deref(), Some("92"));
        assert_eq!(info.msisdn.as_deref(), Some("0955123456"));
        assert_eq!(info.spn.as_deref(), Some("Mozilla"));
        assert_eq!(info.is_display_network_name_required, Some(true));
        assert_eq!(info.is_display_spn_required, Some(true));
        assert!(s.records().pnn.is_none());
    }

    #[test]
    fn test_fetch_sim_records_needs_service_table() {
        let mut s = session(FakeIo::default());
        assert_eq!(
            s.fetch_sim_records(None),
            Err(IccError::Io(IccIoError::UnknownPath(ef::SST)))
        );
    }
}
