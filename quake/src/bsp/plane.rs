use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;

use super::{
    consts::{LumpType, MAX_MAP_PLANES},
    lump::Lump,
    vert::read_vec3,
};

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct BSPPlane {
    pub normal: Vec3,
    /// distance from the origin along the normal
    pub dist: f32,
    /// 0-2 for planes along an axis, 3-5 otherwise
    pub axis: i32,
}

impl BSPPlane {
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.dist
    }
}

impl Lump for BSPPlane {
    fn max() -> usize {
        MAX_MAP_PLANES
    }

    fn lump_type() -> LumpType {
        LumpType::Planes
    }

    fn record_size() -> usize {
        20
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            normal: read_vec3(reader)?,
            dist: reader.read_f32::<LittleEndian>()?,
            axis: reader.read_i32::<LittleEndian>()?,
        })
    }
}
