use std::{fmt, io::Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use num_traits::FromPrimitive;

use crate::error::{BspError, LoadWarning};

use super::{
    consts::{LumpType, BSP_VERSION, HEADER_LUMPS, HEADER_SIZE},
    lump::{decode_records, BSPLump, Lump},
};

#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct BSPHeader {
    pub version: i32,                   // BSP file version
    pub lumps: [BSPLump; HEADER_LUMPS], // lump directory array
}

impl fmt::Debug for BSPHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BSPHeader")
            .field("version", &self.version)
            .finish()
    }
}

impl BSPHeader {
    /// Reads the version and lump directory from the start of `data`.
    pub fn read(data: &[u8]) -> Result<Self, BspError> {
        if data.len() < HEADER_SIZE {
            return Err(BspError::TooSmall {
                size: data.len(),
                expected: HEADER_SIZE,
            });
        }

        let mut reader = Cursor::new(data);
        let mut header = Self {
            version: reader.read_i32::<LittleEndian>()?,
            ..Default::default()
        };

        for (i, lump) in header.lumps.iter_mut().enumerate() {
            *lump = BSPLump::read(&mut reader)?;
            log::debug!(
                "{: <14} Offset = 0x{:>08x} | Size = 0x{:>08x}",
                LumpType::from_usize(i)
                    .map(|l| format!("{l:?}:"))
                    .unwrap_or_default(),
                lump.file_ofs,
                lump.file_len
            );
        }

        Ok(header)
    }

    /// A version other than 29 is reported but does not stop decoding.
    pub fn validate(&self) -> Option<LoadWarning> {
        (self.version != BSP_VERSION).then_some(LoadWarning::UnsupportedVersion {
            found: self.version,
            expected: BSP_VERSION,
        })
    }

    pub fn get_lump_header(&self, lump: LumpType) -> &BSPLump {
        &self.lumps[lump as usize]
    }

    pub fn lump_data<'a>(&self, lump: LumpType, data: &'a [u8]) -> Result<&'a [u8], BspError> {
        self.get_lump_header(lump).data(lump, data)
    }

    pub fn get_lump<T: Lump>(&self, data: &[u8]) -> Result<Vec<T>, BspError> {
        decode_records(self.lump_data(T::lump_type(), data)?)
    }
}
