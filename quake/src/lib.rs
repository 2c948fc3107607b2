//! Reader for Quake `.bsp` (version 29) maps: lump decoding, embedded
//! textures and palettes, per-face meshes and a packed lightmap atlas.

pub mod bsp;
pub mod config;
pub mod convert;
pub mod error;
pub mod lightmap;
pub mod meshes;
pub mod palette;
pub mod prelude;
pub mod view;
