use std::{fs, path::Path};

use ahash::AHashMap;
use glam::Vec3;

use crate::{
    config::{LightmapConfig, LoaderConfig},
    convert,
    error::{BspError, LoadWarning},
    lightmap::{self, LightmapAtlas},
    meshes::{self, Mesh},
    palette::Palette,
};

use super::{
    consts::LumpType,
    edges::{BSPEdge, BSPSurfEdge},
    face::BSPFace,
    header::BSPHeader,
    lump::Lump,
    model::BSPModel,
    plane::BSPPlane,
    textures::{decode_miptex, BSPTexInfo, BSPTexture},
};

/// Everything decoded from one map file.
///
/// Built once by [`Map::decode`], then post-processed once by
/// [`Map::build_meshes`] and [`Map::build_lightmaps`], in that order.
#[derive(Debug, Default, Clone)]
pub struct Map {
    pub version: i32,
    /// raw entity text, up to the first NUL
    pub entities: String,
    pub planes: Vec<BSPPlane>,
    pub textures: Vec<BSPTexture>,
    pub vertices: Vec<Vec3>,
    pub tex_info: Vec<BSPTexInfo>,
    pub faces: Vec<BSPFace>,
    pub lighting: Vec<u8>,
    pub edges: Vec<BSPEdge>,
    pub surf_edges: Vec<BSPSurfEdge>,
    pub models: Vec<BSPModel>,
    /// one per face once built
    pub meshes: Vec<Mesh>,
    pub lightmap_atlas: LightmapAtlas,
    pub palette: Option<Palette>,
    pub warnings: Vec<LoadWarning>,
    texture_lookup: AHashMap<String, usize>,
}

impl Map {
    fn warn(&mut self, warning: LoadWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Decodes a record lump. A misaligned lump that geometry does not depend on
    /// is skipped with a warning.
    fn read_lump<T: Lump>(
        &mut self,
        header: &BSPHeader,
        data: &[u8],
    ) -> Result<Vec<T>, BspError> {
        match header.get_lump(data) {
            Err(BspError::MalformedLump {
                lump,
                size,
                record_size,
            }) if !lump.is_geometry_critical() => {
                self.warn(LoadWarning::IgnoredLump {
                    lump,
                    reason: format!("size {size} is not a multiple of {record_size}"),
                });
                Ok(Vec::new())
            }
            result => result,
        }
    }

    /// Decodes every lump. Meshes and lightmaps are not built.
    pub fn decode(data: &[u8]) -> Result<Self, BspError> {
        let header = BSPHeader::read(data)?;
        let mut map = Map {
            version: header.version,
            ..Default::default()
        };

        if let Some(warning) = header.validate() {
            map.warn(warning);
        }

        let entities = header.lump_data(LumpType::Entities, data)?;
        let end = entities
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(entities.len());
        map.entities = String::from_utf8_lossy(&entities[..end]).into_owned();

        map.vertices = map.read_lump(&header, data)?;
        map.edges = map.read_lump(&header, data)?;
        map.surf_edges = map.read_lump(&header, data)?;
        map.faces = map.read_lump(&header, data)?;
        map.tex_info = map.read_lump(&header, data)?;
        map.planes = map.read_lump(&header, data)?;
        map.models = map.read_lump(&header, data)?;
        map.lighting = header.lump_data(LumpType::Lighting, data)?.to_vec();

        let (textures, warnings) = decode_miptex(header.lump_data(LumpType::MipTex, data)?);
        for warning in warnings {
            map.warn(warning);
        }
        map.set_textures(textures);

        log::info!(
            "Decoded map: {} vertices, {} faces, {} textures, {} bytes of lighting",
            map.vertices.len(),
            map.faces.len(),
            map.textures.len(),
            map.lighting.len()
        );

        Ok(map)
    }

    fn set_textures(&mut self, textures: Vec<BSPTexture>) {
        self.texture_lookup = textures
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.name.is_empty())
            .map(|(i, t)| (t.name.to_ascii_lowercase(), i))
            .collect();
        self.textures = textures;
    }

    /// Decodes `data` and runs both post-processing passes.
    pub fn from_bytes(data: &[u8], config: &LoaderConfig) -> Result<Self, BspError> {
        let mut map = Self::decode(data)?;
        map.build_meshes();
        map.build_lightmaps(&config.lightmap);
        Ok(map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BspError> {
        Self::load_with_config(path, &LoaderConfig::default())
    }

    /// Loads a map file and the palette named by `config`.
    ///
    /// A palette that fails to load is logged and left out; the map still loads.
    pub fn load_with_config(
        path: impl AsRef<Path>,
        config: &LoaderConfig,
    ) -> Result<Self, BspError> {
        let path = path.as_ref();
        log::info!("Loading map {}", path.display());

        let data = fs::read(path)?;
        let mut map = Self::from_bytes(&data, config)?;

        match config.palette.load_palette() {
            Ok(palette) => map.palette = palette,
            Err(err) => log::warn!("Palette not loaded: {err}"),
        }

        Ok(map)
    }

    pub fn build_meshes(&mut self) {
        let (meshes, warnings) = meshes::build_meshes(
            &self.faces,
            &self.vertices,
            &self.edges,
            &self.surf_edges,
            &self.tex_info,
            &self.textures,
        );
        self.meshes = meshes;
        for warning in warnings {
            self.warn(warning);
        }
    }

    pub fn build_lightmaps(&mut self, config: &LightmapConfig) {
        let (atlas, warnings) = lightmap::build_lightmaps(
            &self.faces,
            &self.tex_info,
            &self.lighting,
            &mut self.meshes,
            config,
        );
        self.lightmap_atlas = atlas;
        for warning in warnings {
            self.warn(warning);
        }
    }

    pub fn find_texture(&self, name: &str) -> Option<(usize, &BSPTexture)> {
        let i = *self.texture_lookup.get(&name.to_ascii_lowercase())?;
        Some((i, self.textures.get(i)?))
    }

    /// RGBA8 pixels for texture `index`, or a checkerboard when its pixels are not in the map.
    pub fn texture_rgba(&self, index: usize) -> Option<Vec<u8>> {
        let texture = self.textures.get(index)?;
        if !texture.has_pixels() {
            return Some(convert::checker_rgba(texture.width, texture.height, 8));
        }
        let palette = self.palette.as_ref().map(Palette::as_bytes).unwrap_or(&[]);
        Some(convert::to_rgba(texture, palette))
    }

    /// Model 0, the static level geometry.
    pub fn world_model(&self) -> Option<&BSPModel> {
        self.models.first()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}
