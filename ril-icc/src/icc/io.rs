//! Record-fetch plumbing
//!
//! [`IccIo`] is what the record readers call. Every load writes the file or
//! record into the caller's [`Buf`] framed as a string: `u32` size in hex
//! digits, the octets, two zero octets. [`IccIoHelper`] implements it on top
//! of an [`IccChannel`] that executes single SIM_IO commands.

use log::{debug, error, warn};
use thiserror::Error;

use super::command::{IccIoCommand, IccIoResponse};
use super::status::SW;
use super::utils::ef_path;
use super::AppType;
use crate::buf::{Buf, BufError};

/// EF structure values in the GET RESPONSE data
pub mod structure {
    pub const TRANSPARENT: u8 = 0x00;
    pub const LINEAR_FIXED: u8 = 0x01;
    pub const CYCLIC: u8 = 0x03;
}

const TYPE_EF: u8 = 0x04;

/// Highest record number READ RECORD can address (ISO 7816-4)
pub const MAX_RECORD_NUMBER: u8 = 254;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IccIoError {
    #[error(transparent)]
    Buf(#[from] BufError),

    #[error("SIM_IO {command:#04x} on {file_id:#06x} failed with {sw:#06x}: {reason}")]
    Status {
        command: u8,
        file_id: u16,
        sw: u16,
        reason: &'static str,
    },

    #[error("File {0:#06x} is not an EF")]
    NotAnEf(u16),

    #[error("File {file_id:#06x} has structure {actual}, expected {expected}")]
    UnexpectedStructure { file_id: u16, expected: u8, actual: u8 },

    #[error("Record {record} is outside the {total} record(s) of {file_id:#06x}")]
    RecordOutOfRange { file_id: u16, record: u8, total: usize },

    #[error("No path known for file {0:#06x}")]
    UnknownPath(u16),

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Shape of a linear fixed EF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordInfo {
    pub record_size: usize,
    pub total_records: usize,
}

/// One load or update request
///
/// `record_info` is filled by the first load of a linear fixed EF and reused
/// by [`IccIo::load_next_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub file_id: u16,
    /// Parent DF path; derived from the file id and app type when `None`
    pub path: Option<String>,
    pub record_number: u8,
    pub pin2: Option<String>,
    pub record_info: Option<RecordInfo>,
}

impl LoadRequest {
    pub fn new(file_id: u16) -> Self {
        Self {
            file_id,
            path: None,
            record_number: 1,
            pin2: None,
            record_info: None,
        }
    }

    pub fn record(file_id: u16, record_number: u8) -> Self {
        Self {
            record_number,
            ..Self::new(file_id)
        }
    }

    /// There is a record after the current one
    pub fn has_next_record(&self) -> bool {
        self.record_info
            .map_or(false, |info| (self.record_number as usize) < info.total_records)
    }
}

/// Record-fetch collaborator
pub trait IccIo {
    /// Load record `request.record_number` of a linear fixed EF into `buf`
    fn load_linear_fixed_ef(&mut self, request: &mut LoadRequest, buf: &mut Buf) -> Result<RecordInfo, IccIoError>;

    fn load_next_record(&mut self, request: &mut LoadRequest, buf: &mut Buf) -> Result<RecordInfo, IccIoError> {
        let total = request.record_info.map_or(0, |info| info.total_records);
        request.record_number = request
            .record_number
            .checked_add(1)
            .filter(|&next| next <= MAX_RECORD_NUMBER)
            .ok_or(IccIoError::RecordOutOfRange {
                file_id: request.file_id,
                record: request.record_number,
                total,
            })?;
        self.load_linear_fixed_ef(request, buf)
    }

    /// Load a whole transparent EF into `buf`
    fn load_transparent_ef(&mut self, request: &LoadRequest, buf: &mut Buf) -> Result<(), IccIoError>;

    /// Write record `request.record_number`; `write` receives the record size
    /// and fills exactly that many octets
    fn update_linear_fixed_ef(
        &mut self,
        request: &mut LoadRequest,
        write: &mut dyn FnMut(usize, &mut Buf),
    ) -> Result<(), IccIoError>;
}

/// Executes one SIM_IO command against the card
pub trait IccChannel {
    fn icc_io(&mut self, command: &IccIoCommand) -> Result<IccIoResponse, IccIoError>;
}

/// EF description from GET RESPONSE (TS 51.011 section 9.2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub file_id: u16,
    pub file_size: usize,
    pub structure: u8,
    /// Zero for transparent EFs
    pub record_size: usize,
}

/// Parse the GET RESPONSE data of an EF
pub fn parse_get_response(data: &[u8]) -> Result<FileInfo, IccIoError> {
    let mut buf = Buf::from_octets(data.to_vec());
    // RFU
    buf.skip(2)?;
    let file_size = buf.read_u16_be()? as usize;
    let file_id = buf.read_u16_be()?;
    if buf.read_u8()? != TYPE_EF {
        return Err(IccIoError::NotAnEf(file_id));
    }
    // RFU, access conditions, file status, length of the following data
    buf.skip(6)?;
    let structure = buf.read_u8()?;
    let record_size = if structure == structure::TRANSPARENT {
        0
    } else {
        buf.read_u8()? as usize
    };
    Ok(FileInfo {
        file_id,
        file_size,
        structure,
        record_size,
    })
}

/// [`IccIo`] over an [`IccChannel`]
pub struct IccIoHelper<C: IccChannel> {
    channel: C,
    app_type: AppType,
}

impl<C: IccChannel> IccIoHelper<C> {
    pub fn new(channel: C, app_type: AppType) -> Self {
        Self { channel, app_type }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    fn path(&self, request: &LoadRequest) -> Result<String, IccIoError> {
        request
            .path
            .clone()
            .or_else(|| ef_path(request.file_id, self.app_type))
            .ok_or(IccIoError::UnknownPath(request.file_id))
    }

    fn transmit(&mut self, command: IccIoCommand) -> Result<Vec<u8>, IccIoError> {
        let response = self.channel.icc_io(&command)?;
        if !response.is_okay() {
            let sw = response.sw();
            error!(
                "SIM_IO {:#04x} on {:#06x} failed: {:#06x} {}",
                command.command,
                command.file_id,
                sw,
                SW::describe(sw)
            );
            return Err(IccIoError::Status {
                command: command.command,
                file_id: command.file_id,
                sw,
                reason: SW::describe(sw),
            });
        }
        Ok(response.data)
    }

    fn get_response(&mut self, file_id: u16, path: &str, expected: u8) -> Result<FileInfo, IccIoError> {
        let data = self.transmit(IccIoCommand::get_response(file_id, path))?;
        let info = parse_get_response(&data)?;
        if info.structure != expected {
            return Err(IccIoError::UnexpectedStructure {
                file_id,
                expected,
                actual: info.structure,
            });
        }
        Ok(info)
    }

    fn record_info(&mut self, request: &mut LoadRequest, path: &str) -> Result<RecordInfo, IccIoError> {
        if let Some(info) = request.record_info {
            return Ok(info);
        }
        let file = self.get_response(request.file_id, path, structure::LINEAR_FIXED)?;
        let mut total_records = file.file_size.checked_div(file.record_size).unwrap_or(0);
        if total_records > MAX_RECORD_NUMBER as usize {
            warn!(
                "EF {:#06x} reports {} records, only {} are addressable",
                request.file_id, total_records, MAX_RECORD_NUMBER
            );
            total_records = MAX_RECORD_NUMBER as usize;
        }
        let info = RecordInfo {
            record_size: file.record_size,
            total_records,
        };
        debug!(
            "EF {:#06x}: {} record(s) of {} octet(s)",
            request.file_id, info.total_records, info.record_size
        );
        request.record_info = Some(info);
        Ok(info)
    }

    fn check_record(request: &LoadRequest, info: &RecordInfo) -> Result<(), IccIoError> {
        if request.record_number == 0 || request.record_number as usize > info.total_records {
            return Err(IccIoError::RecordOutOfRange {
                file_id: request.file_id,
                record: request.record_number,
                total: info.total_records,
            });
        }
        Ok(())
    }
}

impl<C: IccChannel> IccIo for IccIoHelper<C> {
    fn load_linear_fixed_ef(&mut self, request: &mut LoadRequest, buf: &mut Buf) -> Result<RecordInfo, IccIoError> {
        let path = self.path(request)?;
        let info = self.record_info(request, &path)?;
        Self::check_record(request, &info)?;

        let command = IccIoCommand::read_record(
            request.file_id,
            path,
            request.record_number,
            info.record_size.min(0xFF) as u8,
        )
        .with_pin2(request.pin2.clone());
        let data = self.transmit(command)?;
        buf.write_framed(&data);
        Ok(info)
    }

    fn load_transparent_ef(&mut self, request: &LoadRequest, buf: &mut Buf) -> Result<(), IccIoError> {
        let path = self.path(request)?;
        let file = self.get_response(request.file_id, &path, structure::TRANSPARENT)?;
        let mut data = Vec::with_capacity(file.file_size);
        while data.len() < file.file_size {
            // GET RESPONSE carries the size in two octets
            let offset = data.len() as u16;
            let length = (file.file_size - data.len()).min(IccIoCommand::MAX_BINARY_CHUNK) as u8;
            let chunk = self.transmit(IccIoCommand::read_binary(request.file_id, path.clone(), offset, length))?;
            if chunk.is_empty() {
                warn!("EF {:#06x}: READ BINARY at {} returned no data", request.file_id, offset);
                break;
            }
            data.extend(chunk);
        }
        buf.write_framed(&data);
        Ok(())
    }

    fn update_linear_fixed_ef(
        &mut self,
        request: &mut LoadRequest,
        write: &mut dyn FnMut(usize, &mut Buf),
    ) -> Result<(), IccIoError> {
        let path = self.path(request)?;
        let info = self.record_info(request, &path)?;
        Self::check_record(request, &info)?;

        let mut buf = Buf::new();
        write(info.record_size, &mut buf);
        let mut data = buf.into_octets();
        data.resize(info.record_size, 0xFF);

        let command = IccIoCommand::update_record(request.file_id, path, request.record_number, data)
            .with_pin2(request.pin2.clone());
        self.transmit(command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::command::ins;
    use crate::icc::ef;

    /// Card with one linear fixed EF of three 4-octet records
    struct FakeCard {
        records: Vec<Vec<u8>>,
        commands: Vec<IccIoCommand>,
    }

    impl FakeCard {
        fn new() -> Self {
            Self::with_records(vec![vec![0x01; 4], vec![0x02; 4], vec![0x03; 4]])
        }

        fn with_records(records: Vec<Vec<u8>>) -> Self {
            Self {
                records,
                commands: Vec::new(),
            }
        }
    }

    fn get_response_data(structure: u8, file_size: u16, record_size: u8) -> Vec<u8> {
        let mut data = vec![0x00, 0x00];
        data.extend(file_size.to_be_bytes());
        data.extend([0x6F, 0xC5, TYPE_EF, 0x00, 0x11, 0x22, 0x33, 0x01, 0x02, structure, record_size]);
        data
    }

    impl IccChannel for FakeCard {
        fn icc_io(&mut self, command: &IccIoCommand) -> Result<IccIoResponse, IccIoError> {
            self.commands.push(command.clone());
            let response = match command.command {
                ins::GET_RESPONSE if command.file_id == ef::ICCID => {
                    IccIoResponse::success(get_response_data(structure::TRANSPARENT, 10, 0))
                }
                ins::GET_RESPONSE if command.file_id == ef::SPN => {
                    IccIoResponse::success(get_response_data(structure::TRANSPARENT, 300, 0))
                }
                ins::GET_RESPONSE => IccIoResponse::success(get_response_data(
                    structure::LINEAR_FIXED,
                    (self.records.len() * 4) as u16,
                    4,
                )),
                ins::READ_RECORD => IccIoResponse::success(self.records[command.p1 as usize - 1].clone()),
                ins::READ_BINARY => IccIoResponse::success(vec![0x98; command.p3 as usize]),
                ins::UPDATE_RECORD => {
                    self.records[command.p1 as usize - 1] = command.data.clone().unwrap_or_default();
                    IccIoResponse::success(Vec::new())
                }
                _ => IccIoResponse::error(SW::INS_NOT_SUPPORTED),
            };
            Ok(response)
        }
    }

    fn read_framed(buf: &mut Buf) -> Vec<u8> {
        let size = buf.read_string_size().unwrap();
        let octets = buf.read_octets(size / 2).unwrap();
        buf.read_string_delimiter(size).unwrap();
        octets
    }

    #[test]
    fn test_parse_get_response() {
        let info = parse_get_response(&get_response_data(structure::LINEAR_FIXED, 0x1B * 3, 0x1B)).unwrap();
        assert_eq!(info.file_id, 0x6FC5);
        assert_eq!(info.file_size, 81);
        assert_eq!(info.structure, structure::LINEAR_FIXED);
        assert_eq!(info.record_size, 0x1B);

        let mut data = get_response_data(structure::TRANSPARENT, 10, 0);
        data[6] = 0x02;
        assert_eq!(parse_get_response(&data), Err(IccIoError::NotAnEf(0x6FC5)));
        assert!(matches!(parse_get_response(&data[..5]), Err(IccIoError::Buf(_))));
    }

    #[test]
    fn test_load_records() {
        let mut io = IccIoHelper::new(FakeCard::new(), AppType::Sim);
        let mut request = LoadRequest::new(ef::PNN);
        let mut buf = Buf::new();

        let info = io.load_linear_fixed_ef(&mut request, &mut buf).unwrap();
        assert_eq!(info, RecordInfo { record_size: 4, total_records: 3 });
        assert_eq!(read_framed(&mut buf), vec![0x01; 4]);
        assert!(request.has_next_record());

        io.load_next_record(&mut request, &mut buf).unwrap();
        io.load_next_record(&mut request, &mut buf).unwrap();
        assert_eq!(read_framed(&mut buf), vec![0x02; 4]);
        assert_eq!(read_framed(&mut buf), vec![0x03; 4]);
        assert!(!request.has_next_record());

        assert_eq!(
            io.load_next_record(&mut request, &mut buf),
            Err(IccIoError::RecordOutOfRange {
                file_id: ef::PNN,
                record: 4,
                total: 3,
            })
        );

        let card = io.into_channel();
        // One GET RESPONSE, then only READ RECORDs
        let get_responses = card.commands.iter().filter(|c| c.command == ins::GET_RESPONSE).count();
        assert_eq!(get_responses, 1);
        assert_eq!(card.commands[1].path, "3F007F20");
    }

    #[test]
    fn test_record_count_capped_at_addressable_range() {
        let records = (0..300).map(|i| vec![i as u8; 4]).collect();
        let mut io = IccIoHelper::new(FakeCard::with_records(records), AppType::Sim);
        let mut request = LoadRequest::record(ef::OPL, MAX_RECORD_NUMBER);
        let mut buf = Buf::new();

        let info = io.load_linear_fixed_ef(&mut request, &mut buf).unwrap();
        assert_eq!(info.total_records, 254);
        assert_eq!(read_framed(&mut buf), vec![253; 4]);
        assert!(!request.has_next_record());

        assert_eq!(
            io.load_next_record(&mut request, &mut buf),
            Err(IccIoError::RecordOutOfRange {
                file_id: ef::OPL,
                record: MAX_RECORD_NUMBER,
                total: 254,
            })
        );
        // The failed step issues no READ RECORD
        let reads = io.channel().commands.iter().filter(|c| c.command == ins::READ_RECORD).count();
        assert_eq!(reads, 1);
    }

    #[test]
    fn test_load_transparent() {
        let mut io = IccIoHelper::new(FakeCard::new(), AppType::Usim);
        let mut buf = Buf::new();
        io.load_transparent_ef(&LoadRequest::new(ef::ICCID), &mut buf).unwrap();
        assert_eq!(read_framed(&mut buf), vec![0x98; 10]);
        assert_eq!(io.channel().commands[1].path, "3F00");
    }

    #[test]
    fn test_load_transparent_in_chunks() {
        let mut io = IccIoHelper::new(FakeCard::new(), AppType::Sim);
        let mut buf = Buf::new();
        io.load_transparent_ef(&LoadRequest::new(ef::SPN), &mut buf).unwrap();
        assert_eq!(read_framed(&mut buf), vec![0x98; 300]);

        let reads: Vec<_> = io
            .channel()
            .commands
            .iter()
            .filter(|c| c.command == ins::READ_BINARY)
            .map(|c| (c.p1, c.p2, c.p3))
            .collect();
        assert_eq!(reads, vec![(0x00, 0x00, 0xFF), (0x00, 0xFF, 45)]);
    }

    #[test]
    fn test_update_record_pads_to_record_size() {
        let mut io = IccIoHelper::new(FakeCard::new(), AppType::Sim);
        let mut request = LoadRequest::record(ef::ADN, 2);
        let mut seen = 0;
        io.update_linear_fixed_ef(&mut request, &mut |size, buf| {
            seen = size;
            buf.write_u8(0x41);
        })
        .unwrap();
        assert_eq!(seen, 4);
        assert_eq!(io.channel().records[1], vec![0x41, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_status_error() {
        let mut io = IccIoHelper::new(FakeCard::new(), AppType::Sim);
        let err = io.transmit(IccIoCommand::new(ins::SEEK, ef::ADN, "3F007F10")).unwrap_err();
        assert_eq!(
            err,
            IccIoError::Status {
                command: ins::SEEK,
                file_id: ef::ADN,
                sw: SW::INS_NOT_SUPPORTED,
                reason: "unknown instruction code",
            }
        );
    }

    #[test]
    fn test_unknown_path() {
        let mut io = IccIoHelper::new(FakeCard::new(), AppType::Unknown);
        let mut buf = Buf::new();
        assert_eq!(
            io.load_transparent_ef(&LoadRequest::new(ef::SPN), &mut buf),
            Err(IccIoError::UnknownPath(ef::SPN))
        );
    }
}
