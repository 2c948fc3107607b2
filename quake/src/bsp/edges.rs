use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{
    consts::{LumpType, MAX_MAP_EDGES, MAX_MAP_SURFEDGES},
    lump::Lump,
};

/// A pair of indices into the vertex array.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BSPEdge {
    pub v0: u16,
    pub v1: u16,
}

impl Lump for BSPEdge {
    fn max() -> usize {
        MAX_MAP_EDGES
    }

    fn lump_type() -> LumpType {
        LumpType::Edges
    }

    fn record_size() -> usize {
        4
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            v0: reader.read_u16::<LittleEndian>()?,
            v1: reader.read_u16::<LittleEndian>()?,
        })
    }
}

/// Signed reference into the edge array. A negative value walks the edge backwards.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BSPSurfEdge {
    pub edge: i32,
}

impl BSPSurfEdge {
    /// Vertex index this surfedge starts at, or `None` if the edge is missing.
    pub fn get_vert(&self, edges: &[BSPEdge]) -> Option<usize> {
        let edge = edges.get(self.edge.unsigned_abs() as usize)?;
        let vert = if self.edge >= 0 { edge.v0 } else { edge.v1 };
        Some(vert as usize)
    }

    /// The edge in walking order, `(start, end)`.
    pub fn get_edge(&self, edges: &[BSPEdge]) -> Option<(u16, u16)> {
        let edge = edges.get(self.edge.unsigned_abs() as usize)?;
        Some(if self.edge >= 0 {
            (edge.v0, edge.v1)
        } else {
            (edge.v1, edge.v0)
        })
    }
}

impl Lump for BSPSurfEdge {
    fn max() -> usize {
        MAX_MAP_SURFEDGES
    }

    fn lump_type() -> LumpType {
        LumpType::SurfEdges
    }

    fn record_size() -> usize {
        4
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            edge: reader.read_i32::<LittleEndian>()?,
        })
    }
}

#[cfg(test)]
mod edge_tests {
    use super::*;

    const EDGES: [BSPEdge; 2] = [BSPEdge { v0: 0, v1: 0 }, BSPEdge { v0: 4, v1: 7 }];

    #[test]
    fn sign_picks_vertex() {
        assert_eq!(BSPSurfEdge { edge: 1 }.get_vert(&EDGES), Some(4));
        assert_eq!(BSPSurfEdge { edge: -1 }.get_vert(&EDGES), Some(7));
        assert_eq!(BSPSurfEdge { edge: -1 }.get_edge(&EDGES), Some((7, 4)));
    }

    #[test]
    fn missing_edge() {
        assert_eq!(BSPSurfEdge { edge: 2 }.get_vert(&EDGES), None);
        assert_eq!(BSPSurfEdge { edge: i32::MIN }.get_vert(&EDGES), None);
    }
}
