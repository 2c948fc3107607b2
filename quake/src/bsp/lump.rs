use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::BspError;

use super::consts::LumpType;

/// A fixed-size record stored back to back inside one lump.
pub trait Lump
where
    Self: Sized,
{
    /// Engine limit on the number of records, only used for diagnostics.
    fn max() -> usize;
    fn lump_type() -> LumpType;
    /// Size of one record on disk, in bytes.
    fn record_size() -> usize;
    /// Reads one record, field by field, little-endian.
    fn read<R: Read>(reader: &mut R) -> io::Result<Self>;
}

// https://www.gamers.org/dEngine/quake/spec/quake-spec34/qkspec_4.htm
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BSPLump {
    pub file_ofs: i32, // offset into file (bytes)
    pub file_len: i32, // length of lump (bytes)
}

impl BSPLump {
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let file_ofs = reader.read_i32::<LittleEndian>()?;
        let file_len = reader.read_i32::<LittleEndian>()?;
        Ok(Self { file_ofs, file_len })
    }

    /// Resolves this lump to its bytes, checking it lies inside `data`.
    pub fn data<'a>(&self, lump: LumpType, data: &'a [u8]) -> Result<&'a [u8], BspError> {
        let out_of_bounds = || BspError::OutOfBounds {
            lump,
            offset: self.file_ofs as i64,
            size: self.file_len as i64,
            file_size: data.len(),
        };

        let start = usize::try_from(self.file_ofs).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(self.file_len).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;

        data.get(start..end).ok_or_else(out_of_bounds)
    }
}

/// Decodes every record of `T` in `bytes`.
///
/// A length that is not a whole number of records is [`BspError::MalformedLump`].
pub fn decode_records<T: Lump>(bytes: &[u8]) -> Result<Vec<T>, BspError> {
    let item_size = T::record_size();

    if bytes.len() % item_size != 0 {
        return Err(BspError::MalformedLump {
            lump: T::lump_type(),
            size: bytes.len(),
            record_size: item_size,
        });
    }

    let len = bytes.len() / item_size;
    if len > T::max() {
        log::warn!(
            "{:?} lump has {} records, more than the engine limit of {}",
            T::lump_type(),
            len,
            T::max()
        );
    }

    let mut reader = Cursor::new(bytes);
    let mut table = Vec::with_capacity(len);
    for _ in 0..len {
        table.push(T::read(&mut reader)?);
    }

    Ok(table)
}
