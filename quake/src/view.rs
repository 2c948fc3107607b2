//! Draw state a renderer session owns and hands to its draw calls.

use std::{fmt, str::FromStr};

use crate::error::UnknownViewMode;

/// Which side of the world's faces is drawn.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// standing inside the level, back faces culled
    #[default]
    Interior,
    /// looking at the level from outside, winding flipped
    Exterior,
    /// no culling
    TwoSided,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Interior => ViewMode::Exterior,
            ViewMode::Exterior => ViewMode::TwoSided,
            ViewMode::TwoSided => ViewMode::Interior,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewMode::Interior => "interior",
            ViewMode::Exterior => "exterior",
            ViewMode::TwoSided => "two-sided",
        }
    }

    /// Quake winds front faces clockwise.
    pub fn front_face_clockwise(self) -> bool {
        self != ViewMode::Exterior
    }

    pub fn culls_back_faces(self) -> bool {
        self != ViewMode::TwoSided
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interior" => Ok(ViewMode::Interior),
            "exterior" => Ok(ViewMode::Exterior),
            "two-sided" | "twosided" | "two_sided" => Ok(ViewMode::TwoSided),
            _ => Err(UnknownViewMode(s.to_owned())),
        }
    }
}

pub const MIN_TEXTURE_MULTIPLIER: f32 = 0.1;
pub const MAX_TEXTURE_MULTIPLIER: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub view_mode: ViewMode,
    pub wireframe: bool,
    /// false draws lightmaps only
    pub textured: bool,
    texture_multiplier: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::default(),
            wireframe: false,
            textured: true,
            texture_multiplier: 1.0,
        }
    }
}

impl RenderSettings {
    pub fn texture_multiplier(&self) -> f32 {
        self.texture_multiplier
    }

    pub fn set_texture_multiplier(&mut self, value: f32) {
        self.texture_multiplier = value.clamp(MIN_TEXTURE_MULTIPLIER, MAX_TEXTURE_MULTIPLIER);
    }

    pub fn cycle_view_mode(&mut self) -> ViewMode {
        self.view_mode = self.view_mode.next();
        log::info!("View mode: {}", self.view_mode);
        self.view_mode
    }
}
