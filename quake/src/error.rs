use std::io;

use thiserror::Error;

use crate::bsp::consts::LumpType;

/// Failures that abort a map load.
#[derive(Debug, Error)]
pub enum BspError {
    #[error("failed to read map file: {0}")]
    Io(#[from] io::Error),
    #[error("file is {size} bytes, smaller than the {expected} byte header")]
    TooSmall { size: usize, expected: usize },
    #[error("{lump:?} lump (offset {offset}, size {size}) exceeds file size {file_size}")]
    OutOfBounds {
        lump: LumpType,
        offset: i64,
        size: i64,
        file_size: usize,
    },
    #[error("{lump:?} lump size {size} is not a multiple of its {record_size} byte records")]
    MalformedLump {
        lump: LumpType,
        size: usize,
        record_size: usize,
    },
}

/// Problems that degrade a load without aborting it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadWarning {
    #[error("unsupported BSP version {found} (expected {expected}), decoding anyway")]
    UnsupportedVersion { found: i32, expected: i32 },
    #[error("face {face} is degenerate: {reason}")]
    DegenerateFace { face: usize, reason: &'static str },
    #[error("texture {index} ({name:?}) has no embedded pixels")]
    ExternalTextureReference { index: usize, name: String },
    #[error("lightmaps do not fit in a {width}x{height} atlas, drawing fullbright")]
    AtlasOverflow { width: u32, height: u32 },
    #[error("{meshes} meshes for {faces} faces, skipping lightmaps")]
    FaceMeshMismatch { faces: usize, meshes: usize },
    #[error("ignored {lump:?} lump: {reason}")]
    IgnoredLump { lump: LumpType, reason: String },
}

/// Palette file problems. Operations on in-memory palettes never fail.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("palette file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("palette is {size} bytes, expected 768")]
    BadSize { size: usize },
    #[error("bad JASC-PAL header on line {line}: {found:?}")]
    BadHeader { line: usize, found: String },
    #[error("bad or missing value for color {index}")]
    BadEntry { index: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o: {0}")]
    Io(#[from] io::Error),
    #[error("config syntax: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("[{section}] {key} = {value:?} is not a valid value")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view mode {0:?}")]
pub struct UnknownViewMode(pub String);
