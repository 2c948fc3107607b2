use std::{fs, path::PathBuf, str::FromStr};

use ini::{Ini, Properties};

use crate::{
    error::{ConfigError, PaletteError},
    palette::{self, Palette},
    view::RenderSettings,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteConfig {
    /// `.pal` files are read as JASC-PAL, anything else as raw
    pub path: Option<PathBuf>,
    pub gamma: f32,
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            path: None,
            gamma: 1.0,
            brightness: 0.5,
            contrast: 0.5,
        }
    }
}

impl PaletteConfig {
    pub fn adjust(&self, palette: &mut Palette) {
        palette.apply_gamma(self.gamma);
        palette.apply_brightness_contrast(self.brightness, self.contrast);
    }

    /// Loads and adjusts the configured palette, if there is one.
    pub fn load_palette(&self) -> Result<Option<Palette>, PaletteError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let mut palette = palette::load(path)?;
        self.adjust(&mut palette);
        Ok(Some(palette))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightmapConfig {
    /// first square atlas size tried
    pub initial_size: u32,
    /// no atlas side may exceed this
    pub max_size: u32,
}

impl Default for LightmapConfig {
    fn default() -> Self {
        Self {
            initial_size: 1024,
            max_size: 8192,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderConfig {
    pub palette: PaletteConfig,
    pub lightmap: LightmapConfig,
    pub view: RenderSettings,
}

/// Typed lookup of `key` in `section`, keeping `default` when either is missing.
fn get<T: FromStr>(
    props: Option<&Properties>,
    section: &'static str,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match props.and_then(|p| p.get(key)) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            section,
            key,
            value: value.to_owned(),
        }),
    }
}

fn get_bool(
    props: Option<&Properties>,
    section: &'static str,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match props.and_then(|p| p.get(key)).map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(value) => Err(ConfigError::InvalidValue {
            section,
            key,
            value: value.to_owned(),
        }),
    }
}

impl LoaderConfig {
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let section = ini.section(Some("palette"));
        let defaults = PaletteConfig::default();
        let palette = PaletteConfig {
            path: section
                .and_then(|p| p.get("path"))
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            gamma: get(section, "palette", "gamma", defaults.gamma)?,
            brightness: get(section, "palette", "brightness", defaults.brightness)?,
            contrast: get(section, "palette", "contrast", defaults.contrast)?,
        };

        let section = ini.section(Some("lightmap"));
        let defaults = LightmapConfig::default();
        let lightmap = LightmapConfig {
            initial_size: get(section, "lightmap", "initial_size", defaults.initial_size)?,
            max_size: get(section, "lightmap", "max_size", defaults.max_size)?,
        };
        if lightmap.initial_size == 0 {
            return Err(ConfigError::InvalidValue {
                section: "lightmap",
                key: "initial_size",
                value: "0".to_owned(),
            });
        }

        let section = ini.section(Some("view"));
        let mut view = RenderSettings::default();
        view.view_mode = get(section, "view", "mode", view.view_mode)?;
        view.wireframe = get_bool(section, "view", "wireframe", view.wireframe)?;
        view.textured = get_bool(section, "view", "textured", view.textured)?;
        view.set_texture_multiplier(get(
            section,
            "view",
            "texture_multiplier",
            view.texture_multiplier(),
        )?);

        Ok(Self {
            palette,
            lightmap,
            view,
        })
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: Self = fs::read_to_string(path)?.parse()?;
        log::info!("Loaded config {}", path.display());
        Ok(config)
    }
}

impl FromStr for LoaderConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ini(&Ini::load_from_str(s)?)
    }
}
