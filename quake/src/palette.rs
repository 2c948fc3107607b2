//! The 256 color RGB table shared by every texture of a map.
//!
//! Free functions work on plain byte slices and quietly do nothing when the
//! slice is not a full palette. [`Palette`] wraps a table that is valid by
//! construction and is what file loading returns.

use std::{fs, path::Path};

use crate::error::PaletteError;

pub const PALETTE_COLORS: usize = 256;
/// Raw `.lmp` palettes are exactly this many bytes.
pub const PALETTE_SIZE: usize = PALETTE_COLORS * 3;

const JASC_MAGIC: &str = "JASC-PAL";
const JASC_VERSION: &str = "0100";

pub fn is_valid(rgb: &[u8]) -> bool {
    rgb.len() == PALETTE_SIZE
}

/// Color at `index`, black if `rgb` is not a full palette.
pub fn color(rgb: &[u8], index: u8) -> [u8; 3] {
    if !is_valid(rgb) {
        return [0; 3];
    }
    let i = index as usize * 3;
    [rgb[i], rgb[i + 1], rgb[i + 2]]
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 255.0) + 0.5) as u8
}

pub fn apply_gamma(rgb: &mut [u8], gamma: f32) {
    if !is_valid(rgb) || (gamma - 1.0).abs() <= 1e-5 {
        return;
    }
    let inv = 1.0 / gamma.max(1e-6);
    for c in rgb.iter_mut() {
        *c = to_byte((*c as f32 / 255.0).powf(inv) * 255.0);
    }
}

/// Both controls are in `[0, 1]` with 0.5 as neutral.
pub fn apply_brightness_contrast(rgb: &mut [u8], brightness: f32, contrast: f32) {
    if !is_valid(rgb) {
        return;
    }
    let b = (brightness - 0.5) * 2.0;
    let c = (contrast - 0.5) * 2.0;
    for v in rgb.iter_mut() {
        let f = (*v as f32 / 255.0 - 0.5) * (1.0 + c) + 0.5 + b * 0.5;
        *v = to_byte(f.clamp(0.0, 1.0) * 255.0);
    }
}

/// Closest palette entry by squared distance. Ties go to the lowest index.
pub fn find_nearest_index(rgb: &[u8], target: [u8; 3]) -> u8 {
    if !is_valid(rgb) {
        return 0;
    }

    let mut best = 0;
    let mut best_dist = i32::MAX;
    for (i, entry) in rgb.chunks_exact(3).enumerate() {
        let dist: i32 = entry
            .iter()
            .zip(target)
            .map(|(&a, b)| (a as i32 - b as i32).pow(2))
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best as u8
}

/// Maps each index of `src` to the nearest color in `dst`. All zero if either is invalid.
pub fn build_remap_table(src: &[u8], dst: &[u8]) -> [u8; PALETTE_COLORS] {
    let mut table = [0; PALETTE_COLORS];
    if !is_valid(src) || !is_valid(dst) {
        return table;
    }
    for (slot, entry) in table.iter_mut().zip(src.chunks_exact(3)) {
        *slot = find_nearest_index(dst, [entry[0], entry[1], entry[2]]);
    }
    table
}

pub fn apply_index_remap(indices: &mut [u8], remap: &[u8]) {
    if remap.len() != PALETTE_COLORS {
        return;
    }
    for i in indices.iter_mut() {
        *i = remap[*i as usize];
    }
}

/// Parses JASC-PAL text. Component values are clamped to `[0, 255]`.
pub fn parse_jasc(text: &str) -> Result<Palette, PaletteError> {
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));

    for (line, expected) in [(1, JASC_MAGIC), (2, JASC_VERSION)] {
        match lines.next() {
            Some(found) if found == expected => {}
            found => {
                return Err(PaletteError::BadHeader {
                    line,
                    found: found.unwrap_or_default().to_owned(),
                })
            }
        }
    }

    let mut tokens = lines.flat_map(str::split_whitespace);

    match tokens.next() {
        Some(count) if count.parse::<i32>() == Ok(PALETTE_COLORS as i32) => {}
        found => {
            return Err(PaletteError::BadHeader {
                line: 3,
                found: found.unwrap_or_default().to_owned(),
            })
        }
    }

    let mut rgb = [0; PALETTE_SIZE];
    for (i, c) in rgb.iter_mut().enumerate() {
        let value = tokens
            .next()
            .and_then(|t| t.parse::<i32>().ok())
            .ok_or(PaletteError::BadEntry { index: i / 3 })?;
        *c = value.clamp(0, 255) as u8;
    }

    Ok(Palette(rgb))
}

pub fn to_jasc(rgb: &[u8]) -> Result<String, PaletteError> {
    Ok(Palette::try_from(rgb)?.to_jasc())
}

/// Loads a raw palette, which must be exactly 768 bytes.
pub fn load_lmp(path: impl AsRef<Path>) -> Result<Palette, PaletteError> {
    Palette::try_from(fs::read(path)?.as_slice())
}

pub fn save_lmp(path: impl AsRef<Path>, rgb: &[u8]) -> Result<(), PaletteError> {
    let palette = Palette::try_from(rgb)?;
    fs::write(path, palette.as_bytes())?;
    Ok(())
}

/// Writes 768 bytes whatever the input length, truncating or padding with black.
pub fn save_lmp_relaxed(path: impl AsRef<Path>, rgb: &[u8]) -> Result<(), PaletteError> {
    fs::write(path, Palette::from_relaxed(rgb).as_bytes())?;
    Ok(())
}

pub fn load_jasc(path: impl AsRef<Path>) -> Result<Palette, PaletteError> {
    parse_jasc(&fs::read_to_string(path)?)
}

pub fn save_jasc(path: impl AsRef<Path>, rgb: &[u8]) -> Result<(), PaletteError> {
    fs::write(path, to_jasc(rgb)?)?;
    Ok(())
}

/// `.pal` in any case.
pub fn is_jasc_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pal"))
}

/// Loads `.pal` files as JASC-PAL text and anything else as a raw palette.
pub fn load(path: impl AsRef<Path>) -> Result<Palette, PaletteError> {
    let path = path.as_ref();
    let palette = if is_jasc_path(path) {
        load_jasc(path)?
    } else {
        load_lmp(path)?
    };
    log::info!("Loaded palette {}", path.display());
    Ok(palette)
}

/// Saves in the form picked by the extension, as [`load`] reads it.
pub fn save(path: impl AsRef<Path>, palette: &Palette) -> Result<(), PaletteError> {
    let path = path.as_ref();
    if is_jasc_path(path) {
        save_jasc(path, palette.as_bytes())
    } else {
        save_lmp(path, palette.as_bytes())
    }
}

/// A complete 256 color palette.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette([u8; PALETTE_SIZE]);

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Palette").field(&self.color(0)).finish()
    }
}

impl TryFrom<&[u8]> for Palette {
    type Error = PaletteError;

    fn try_from(rgb: &[u8]) -> Result<Self, Self::Error> {
        rgb.try_into()
            .map(Self)
            .map_err(|_| PaletteError::BadSize { size: rgb.len() })
    }
}

impl Palette {
    /// Truncates or pads with black to 256 colors.
    pub fn from_relaxed(rgb: &[u8]) -> Self {
        let mut data = [0; PALETTE_SIZE];
        let n = rgb.len().min(PALETTE_SIZE);
        data[..n].copy_from_slice(&rgb[..n]);
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        color(&self.0, index)
    }

    pub fn apply_gamma(&mut self, gamma: f32) {
        apply_gamma(&mut self.0, gamma);
    }

    pub fn apply_brightness_contrast(&mut self, brightness: f32, contrast: f32) {
        apply_brightness_contrast(&mut self.0, brightness, contrast);
    }

    pub fn find_nearest_index(&self, target: [u8; 3]) -> u8 {
        find_nearest_index(&self.0, target)
    }

    /// Table translating indices of this palette into `other`.
    pub fn remap_to(&self, other: &Palette) -> [u8; PALETTE_COLORS] {
        build_remap_table(&self.0, &other.0)
    }

    pub fn to_jasc(&self) -> String {
        let mut text = format!("{JASC_MAGIC}\r\n{JASC_VERSION}\r\n{PALETTE_COLORS}\r\n");
        for c in self.0.chunks_exact(3) {
            text.push_str(&format!("{} {} {}\r\n", c[0], c[1], c[2]));
        }
        text
    }
}

#[cfg(test)]
mod palette_tests {
    use std::path::PathBuf;

    use super::*;

    fn ramp() -> Vec<u8> {
        (0..PALETTE_SIZE).map(|i| (i / 3) as u8).collect()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quake-palette-{}-{name}", std::process::id()))
    }

    #[test]
    fn lookup() {
        let rgb = ramp();
        assert_eq!(color(&rgb, 9), [9, 9, 9]);
        assert_eq!(color(&rgb[..10], 9), [0, 0, 0]);
    }

    #[test]
    fn neutral_adjustments_are_identity() {
        let mut rgb = ramp();
        apply_gamma(&mut rgb, 1.0);
        apply_brightness_contrast(&mut rgb, 0.5, 0.5);
        assert_eq!(rgb, ramp());
    }

    #[test]
    fn gamma_brightens() {
        let mut rgb = ramp();
        apply_gamma(&mut rgb, 2.0);
        assert_eq!(color(&rgb, 0), [0, 0, 0]);
        assert_eq!(color(&rgb, 255), [255, 255, 255]);
        // sqrt(64/255) * 255 = 127.75
        assert_eq!(color(&rgb, 64), [128, 128, 128]);
    }

    #[test]
    fn brightness_saturates() {
        let mut rgb = ramp();
        apply_brightness_contrast(&mut rgb, 1.0, 0.5);
        assert_eq!(color(&rgb, 0), [128, 128, 128]);
        assert_eq!(color(&rgb, 200), [255, 255, 255]);
    }

    #[test]
    fn invalid_palettes_are_left_alone() {
        let mut short = vec![10u8; 30];
        apply_gamma(&mut short, 2.2);
        apply_brightness_contrast(&mut short, 1.0, 1.0);
        assert_eq!(short, vec![10u8; 30]);
    }

    #[test]
    fn nearest_index() {
        let mut rgb = vec![0; PALETTE_SIZE];
        rgb[37 * 3] = 255;
        assert_eq!(find_nearest_index(&rgb, [255, 0, 0]), 37);
        // all other entries tie
        assert_eq!(find_nearest_index(&rgb, [0, 0, 0]), 0);
        assert_eq!(find_nearest_index(&[], [255, 0, 0]), 0);
    }

    #[test]
    fn remap() {
        let src = ramp();
        let mut dst = vec![0; PALETTE_SIZE];
        dst[3..6].copy_from_slice(&[255, 255, 255]);

        let table = build_remap_table(&src, &dst);
        assert_eq!(table[0], 0);
        assert_eq!(table[255], 1);

        let mut indices = vec![0, 200, 255];
        apply_index_remap(&mut indices, &table);
        assert_eq!(indices, vec![0, 1, 1]);

        let mut untouched = vec![3, 4];
        apply_index_remap(&mut untouched, &table[..10]);
        assert_eq!(untouched, vec![3, 4]);
        assert_eq!(build_remap_table(&src, &[]), [0; PALETTE_COLORS]);
    }

    #[test]
    fn palette_remap_to() {
        let src = Palette::try_from(ramp().as_slice()).unwrap();
        let identity: Vec<u8> = (0..=255).collect();
        assert_eq!(src.remap_to(&src).to_vec(), identity);

        let mut dst = Palette::from_relaxed(&[]);
        dst.0[3..6].copy_from_slice(&[255, 255, 255]);
        let table = src.remap_to(&dst);
        assert_eq!(table[0], 0);
        assert_eq!(table[200], 1);
    }

    #[test]
    fn jasc_text_layout() {
        let text = Palette::try_from(ramp().as_slice()).unwrap().to_jasc();
        let lines: Vec<_> = text.split("\r\n").collect();
        assert_eq!(lines[..5], ["JASC-PAL", "0100", "256", "0 0 0", "1 1 1"]);
        assert_eq!(lines[258], "255 255 255");
        assert_eq!(lines[259], "");
        assert_eq!(lines.len(), 260);
    }

    #[test]
    fn jasc_extension_ignores_case() {
        assert!(is_jasc_path(Path::new("gfx/palette.pal")));
        assert!(is_jasc_path(Path::new("GFX/PALETTE.PAL")));
        assert!(!is_jasc_path(Path::new("gfx/palette.lmp")));
        assert!(!is_jasc_path(Path::new("pal")));
    }

    #[test]
    fn jasc_parse_clamps_values() {
        let mut text = String::from("JASC-PAL\r\n0100\r\n256\r\n300 -5 7\r\n");
        for _ in 1..PALETTE_COLORS {
            text.push_str("1 2 3\n");
        }
        let palette = parse_jasc(&text).unwrap();
        assert_eq!(palette.color(0), [255, 0, 7]);
        assert_eq!(palette.color(255), [1, 2, 3]);
        assert_eq!(parse_jasc(&palette.to_jasc()).unwrap(), palette);
    }

    #[test]
    fn jasc_rejects_bad_input() {
        assert!(matches!(
            parse_jasc("RIFF\n0100\n256\n"),
            Err(PaletteError::BadHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse_jasc("JASC-PAL\n0100\n16\n"),
            Err(PaletteError::BadHeader { line: 3, .. })
        ));
        assert!(matches!(
            parse_jasc("JASC-PAL\n0100\n256\n1 2 3\n4 5\n"),
            Err(PaletteError::BadEntry { index: 1 })
        ));
    }

    #[test]
    fn lmp_round_trip() {
        let path = temp_path("round.lmp");
        save_lmp(&path, &ramp()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), ramp());
        assert_eq!(load(&path).unwrap().as_bytes(), ramp().as_slice());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn strict_and_relaxed_sizes() {
        let path = temp_path("sizes.lmp");
        assert!(matches!(
            save_lmp(&path, &[1, 2, 3]),
            Err(PaletteError::BadSize { size: 3 })
        ));

        save_lmp_relaxed(&path, &[1, 2, 3]).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), PALETTE_SIZE);
        assert_eq!(&bytes[..4], &[1, 2, 3, 0]);

        fs::write(&path, vec![0; PALETTE_SIZE + 1]).unwrap();
        assert!(matches!(
            load_lmp(&path),
            Err(PaletteError::BadSize { size: 769 })
        ));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn jasc_file_by_extension() {
        let path = temp_path("ext.pal");
        let palette = Palette::try_from(ramp().as_slice()).unwrap();
        save(&path, &palette).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("JASC-PAL"));
        assert_eq!(load(&path).unwrap(), palette);
        fs::remove_file(&path).unwrap();
    }
}
