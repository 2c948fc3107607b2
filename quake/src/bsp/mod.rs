pub mod consts;
pub mod edges;
pub mod face;
pub mod header;
pub mod loader;
pub mod lump;
pub mod model;
pub mod plane;
pub mod textures;
pub mod vert;

pub use lump::Lump;
