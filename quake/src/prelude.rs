pub use crate::bsp::{
    consts::{LumpType, TexFlags},
    edges::{BSPEdge, BSPSurfEdge},
    face::BSPFace,
    header::BSPHeader,
    loader::Map,
    lump::{BSPLump, Lump},
    model::BSPModel,
    plane::BSPPlane,
    textures::{BSPTexInfo, BSPTexture},
};
pub use crate::config::{LightmapConfig, LoaderConfig, PaletteConfig};
pub use crate::error::{BspError, ConfigError, LoadWarning, PaletteError, UnknownViewMode};
pub use crate::lightmap::{LightmapAtlas, LightmapRect, RectPacker, ShelfPacker};
pub use crate::meshes::{LightmappedVertex, Mesh, MeshVertices, TexturedVertex};
pub use crate::palette::Palette;
pub use crate::view::{RenderSettings, ViewMode};
