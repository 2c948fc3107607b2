use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flagset::FlagSet;
use glam::{Vec2, Vec3, Vec4};

use crate::error::LoadWarning;

use super::{
    consts::{LumpType, TexFlags, MAX_MAP_TEXINFO, MIP_LEVELS, TEXTURE_NAME_LENGTH},
    lump::Lump,
};

/// Size of a miptex header: name, width, height and one offset per mip level.
const MIPTEX_HEADER_SIZE: usize = TEXTURE_NAME_LENGTH + 8 + MIP_LEVELS * 4;

/// Projects world positions into texture space for one or more faces.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct BSPTexInfo {
    /// s = tex_s.xyz · p + tex_s.w
    pub tex_s: Vec4,
    pub tex_t: Vec4,
    /// index into the miptex lump
    pub miptex: i32,
    pub flags: i32,
}

impl BSPTexInfo {
    pub fn flags(&self) -> FlagSet<TexFlags> {
        FlagSet::new_truncated(self.flags)
    }

    /// Texture-space (s, t) of a world position, in texels.
    pub fn project(&self, position: Vec3) -> Vec2 {
        let p = Vec4::from((position, 1.0));
        Vec2::new(self.tex_s.dot(p), self.tex_t.dot(p))
    }

    /// Index of the referenced texture, if it exists in a table of `count` textures.
    pub fn texture_index(&self, count: usize) -> Option<usize> {
        usize::try_from(self.miptex).ok().filter(|&i| i < count)
    }
}

impl Lump for BSPTexInfo {
    fn max() -> usize {
        MAX_MAP_TEXINFO
    }

    fn lump_type() -> LumpType {
        LumpType::TexInfo
    }

    fn record_size() -> usize {
        40
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut s = [0.0; 4];
        let mut t = [0.0; 4];
        reader.read_f32_into::<LittleEndian>(&mut s)?;
        reader.read_f32_into::<LittleEndian>(&mut t)?;

        Ok(Self {
            tex_s: Vec4::from_array(s),
            tex_t: Vec4::from_array(t),
            miptex: reader.read_i32::<LittleEndian>()?,
            flags: reader.read_i32::<LittleEndian>()?,
        })
    }
}

/// An embedded texture. Only the full resolution level is kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BSPTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// palette indices, `width * height` long, or empty if the pixels are not in the map
    pub indices: Vec<u8>,
}

impl BSPTexture {
    pub fn has_pixels(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Sky and liquid textures are named with a leading `sky` or `*`.
    pub fn is_special(&self) -> bool {
        self.name.starts_with('*') || self.name.starts_with("sky")
    }

    /// Dimensions used to normalise texture coordinates, never zero.
    pub fn uv_scale(&self) -> Vec2 {
        Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32)
    }
}

fn read_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Decodes the miptex lump into one entry per table slot.
///
/// Table slots that cannot be resolved become blank textures so that texinfo
/// indices stay aligned. Anything skipped is reported through the returned warnings.
pub fn decode_miptex(lump: &[u8]) -> (Vec<BSPTexture>, Vec<LoadWarning>) {
    let mut warnings = Vec::new();

    if lump.is_empty() {
        return (Vec::new(), warnings);
    }

    let mut reader = Cursor::new(lump);
    let count = match reader.read_i32::<LittleEndian>() {
        Ok(count) => count,
        Err(_) => {
            warnings.push(ignored(format!("{} bytes is too short for a count", lump.len())));
            return (Vec::new(), warnings);
        }
    };

    let Ok(count) = usize::try_from(count) else {
        warnings.push(ignored(format!("negative texture count {count}")));
        return (Vec::new(), warnings);
    };

    if count.saturating_mul(4).saturating_add(4) > lump.len() {
        warnings.push(ignored(format!(
            "offset table for {count} textures overruns {} byte lump",
            lump.len()
        )));
        return (Vec::new(), warnings);
    }

    let mut offsets = vec![0; count];
    if let Err(err) = reader.read_i32_into::<LittleEndian>(&mut offsets) {
        warnings.push(ignored(err.to_string()));
        return (Vec::new(), warnings);
    }

    let textures = offsets
        .iter()
        .enumerate()
        .map(|(index, &offset)| {
            let texture = read_texture(lump, offset).unwrap_or_default();
            if !texture.has_pixels() {
                warnings.push(LoadWarning::ExternalTextureReference {
                    index,
                    name: texture.name.clone(),
                });
            }
            texture
        })
        .collect();

    (textures, warnings)
}

fn ignored(reason: String) -> LoadWarning {
    LoadWarning::IgnoredLump {
        lump: LumpType::MipTex,
        reason,
    }
}

/// `None` when the header itself is missing, otherwise a texture with or without pixels.
fn read_texture(lump: &[u8], offset: i32) -> Option<BSPTexture> {
    let start = usize::try_from(offset).ok().filter(|&o| o > 0)?;
    let header = lump.get(start..start.checked_add(MIPTEX_HEADER_SIZE)?)?;

    let mut reader = Cursor::new(header);
    let mut name = [0; TEXTURE_NAME_LENGTH];
    reader.read_exact(&mut name).ok()?;
    let width = reader.read_u32::<LittleEndian>().ok()?;
    let height = reader.read_u32::<LittleEndian>().ok()?;
    let mut mips = [0; MIP_LEVELS];
    reader.read_u32_into::<LittleEndian>(&mut mips).ok()?;

    let mut texture = BSPTexture {
        name: read_name(&name),
        width,
        height,
        indices: Vec::new(),
    };

    let pixels = (width as usize).checked_mul(height as usize)?;
    if mips[0] != 0 && pixels != 0 {
        let first = start.checked_add(mips[0] as usize)?;
        if let Some(data) = first
            .checked_add(pixels)
            .and_then(|last| lump.get(first..last))
        {
            texture.indices = data.to_vec();
        }
    }

    Some(texture)
}
