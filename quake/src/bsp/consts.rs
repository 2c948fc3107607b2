use flagset::flags;
use num_derive::FromPrimitive;

/// Quake 1 maps. Some derivative formats reuse the number.
pub const BSP_VERSION: i32 = 29;

pub const HEADER_LUMPS: usize = 15;
/// version + (offset, size) per lump
pub const HEADER_SIZE: usize = 4 + HEADER_LUMPS * 8;

// upper design bounds
pub const MAX_MAP_MODELS: usize = 256;
pub const MAX_MAP_PLANES: usize = 32767;
pub const MAX_MAP_VERTS: usize = 65535;
pub const MAX_MAP_FACES: usize = 65535;
pub const MAX_MAP_TEXINFO: usize = 4096;
pub const MAX_MAP_EDGES: usize = 256000;
pub const MAX_MAP_SURFEDGES: usize = 512000;
pub const MAX_MAP_MIPTEX: usize = 0x200000;
pub const MAX_MAP_LIGHTING: usize = 0x100000;

pub const TEXTURE_NAME_LENGTH: usize = 16;
pub const MIP_LEVELS: usize = 4;

/// Lightmaps are sampled every 16 texture-space units.
pub const LUXEL_SIZE: f32 = 16.0;

#[derive(Copy, Clone, PartialEq, Eq, FromPrimitive, Debug)]
pub enum LumpType {
    Entities = 0,
    Planes = 1,
    MipTex = 2,
    Vertexes = 3,
    Visibility = 4,
    Nodes = 5,
    TexInfo = 6,
    Faces = 7,
    Lighting = 8,
    ClipNodes = 9,
    Leafs = 10,
    MarkSurfaces = 11,
    Edges = 12,
    SurfEdges = 13,
    Models = 14,
}

impl LumpType {
    /// Lumps whose misalignment aborts a load; the rest degrade.
    pub fn is_geometry_critical(self) -> bool {
        matches!(
            self,
            LumpType::Vertexes
                | LumpType::Edges
                | LumpType::SurfEdges
                | LumpType::Faces
                | LumpType::TexInfo
        )
    }
}

flags! {
    pub enum TexFlags: i32 {
        // sky or liquid; never lightmapped, drawn warped
        Special = 0x1,
    }
}
