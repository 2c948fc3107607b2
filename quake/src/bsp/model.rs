use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;

use super::{
    consts::{LumpType, MAX_MAP_MODELS},
    lump::Lump,
    vert::read_vec3,
};

/// A brush model. Model 0 is the static world, the rest are doors, platforms and triggers.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct BSPModel {
    mins: Vec3,
    maxs: Vec3,
    origin: Vec3,
    headnode: [i32; 4],
    visleafs: i32,
    firstface: i32,
    numfaces: i32,
}

impl BSPModel {
    pub fn maxs(&self) -> Vec3 {
        self.maxs
    }

    pub fn mins(&self) -> Vec3 {
        self.mins
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn headnode(&self) -> [i32; 4] {
        self.headnode
    }

    pub fn visleafs(&self) -> i32 {
        self.visleafs
    }

    /// Range of faces owned by this model, empty if the record is corrupt.
    pub fn faces(&self) -> std::ops::Range<usize> {
        match (
            usize::try_from(self.firstface),
            usize::try_from(self.numfaces),
        ) {
            (Ok(first), Ok(count)) => first..first.saturating_add(count),
            _ => 0..0,
        }
    }
}

impl Lump for BSPModel {
    fn max() -> usize {
        MAX_MAP_MODELS
    }

    fn lump_type() -> LumpType {
        LumpType::Models
    }

    fn record_size() -> usize {
        64
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mins = read_vec3(reader)?;
        let maxs = read_vec3(reader)?;
        let origin = read_vec3(reader)?;
        let mut headnode = [0; 4];
        reader.read_i32_into::<LittleEndian>(&mut headnode)?;

        Ok(Self {
            mins,
            maxs,
            origin,
            headnode,
            visleafs: reader.read_i32::<LittleEndian>()?,
            firstface: reader.read_i32::<LittleEndian>()?,
            numfaces: reader.read_i32::<LittleEndian>()?,
        })
    }
}
