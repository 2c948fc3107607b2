use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{
    consts::{LumpType, MAX_MAP_FACES},
    edges::{BSPEdge, BSPSurfEdge},
    lump::Lump,
};

/// A convex polygon lying on one plane, described by a run of surfedges.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BSPFace {
    /// index into the plane array
    pub plane_num: i16,
    /// non-zero if the face points away from its plane's normal
    pub side: i16,
    /// Firstedge is an index into the surfedge array; this and the following num_edges entries
    /// trace the polygon. The vertices are referenced in clockwise order when looking towards the face.
    pub first_edge: i32,
    /// number of surfedges
    pub num_edges: i16,
    pub tex_info: i16,
    /// switchable lighting info, 255 for unused slots
    pub styles: [u8; 4],
    /// offset into the lighting lump, -1 if unlit
    pub light_ofs: i32,
}

impl BSPFace {
    /// Walks the face's surfedges into an ordered vertex loop.
    ///
    /// Returns the reason the loop could not be built when a surfedge or edge
    /// index falls outside its array.
    pub fn get_verts(
        &self,
        edges: &[BSPEdge],
        surfedges: &[BSPSurfEdge],
    ) -> Result<Vec<usize>, &'static str> {
        let first = usize::try_from(self.first_edge).map_err(|_| "negative first edge")?;
        let count = usize::try_from(self.num_edges).map_err(|_| "negative edge count")?;

        let run = first
            .checked_add(count)
            .and_then(|end| surfedges.get(first..end))
            .ok_or("surfedge range out of bounds")?;

        run.iter()
            .map(|surfedge| surfedge.get_vert(edges).ok_or("edge index out of bounds"))
            .collect()
    }

    /// True when the face samples the lighting lump.
    pub fn has_lightmap(&self, lighting: &[u8]) -> bool {
        self.light_ofs >= 0 && (self.light_ofs as usize) < lighting.len()
    }
}

impl Lump for BSPFace {
    fn max() -> usize {
        MAX_MAP_FACES
    }

    fn lump_type() -> LumpType {
        LumpType::Faces
    }

    fn record_size() -> usize {
        20
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let plane_num = reader.read_i16::<LittleEndian>()?;
        let side = reader.read_i16::<LittleEndian>()?;
        let first_edge = reader.read_i32::<LittleEndian>()?;
        let num_edges = reader.read_i16::<LittleEndian>()?;
        let tex_info = reader.read_i16::<LittleEndian>()?;
        let mut styles = [0; 4];
        reader.read_exact(&mut styles)?;
        let light_ofs = reader.read_i32::<LittleEndian>()?;

        Ok(Self {
            plane_num,
            side,
            first_edge,
            num_edges,
            tex_info,
            styles,
            light_ofs,
        })
    }
}

#[cfg(test)]
mod face_tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_fields_in_order() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3i16.to_le_bytes());
        bytes.extend_from_slice(&1i16.to_le_bytes());
        bytes.extend_from_slice(&40i32.to_le_bytes());
        bytes.extend_from_slice(&5i16.to_le_bytes());
        bytes.extend_from_slice(&2i16.to_le_bytes());
        bytes.extend_from_slice(&[0, 255, 255, 255]);
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(bytes.len(), BSPFace::record_size());

        let face = BSPFace::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(
            face,
            BSPFace {
                plane_num: 3,
                side: 1,
                first_edge: 40,
                num_edges: 5,
                tex_info: 2,
                styles: [0, 255, 255, 255],
                light_ofs: -1,
            }
        );
        assert!(!face.has_lightmap(&[0; 16]));
    }

    #[test]
    fn walks_loop() {
        let edges = [
            BSPEdge { v0: 0, v1: 0 },
            BSPEdge { v0: 0, v1: 1 },
            BSPEdge { v0: 1, v1: 2 },
            BSPEdge { v0: 0, v1: 2 },
        ];
        let surfedges = [1, 2, -3].map(|edge| BSPSurfEdge { edge });
        let face = BSPFace {
            num_edges: 3,
            ..Default::default()
        };
        assert_eq!(face.get_verts(&edges, &surfedges), Ok(vec![0, 1, 2]));

        let overrun = BSPFace {
            first_edge: 1,
            num_edges: 3,
            ..Default::default()
        };
        assert!(overrun.get_verts(&edges, &surfedges).is_err());
    }
}
