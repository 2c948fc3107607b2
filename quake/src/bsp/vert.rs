use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;

use super::{
    consts::{LumpType, MAX_MAP_VERTS},
    lump::Lump,
};

impl Lump for Vec3 {
    fn max() -> usize {
        MAX_MAP_VERTS
    }

    fn lump_type() -> LumpType {
        LumpType::Vertexes
    }

    fn record_size() -> usize {
        12
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        Ok(Vec3::new(x, y, z))
    }
}

/// Reads three little-endian floats, used by every record carrying a vector.
pub(crate) fn read_vec3<R: Read>(reader: &mut R) -> io::Result<Vec3> {
    <Vec3 as Lump>::read(reader)
}
