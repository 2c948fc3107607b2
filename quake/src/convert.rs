//! Palette-indexed textures to RGBA8.

use crate::{bsp::textures::BSPTexture, palette::PALETTE_SIZE};

/// Index drawn fully transparent on fence-style textures.
pub const TRANSPARENT_INDEX: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbaOptions {
    pub transparent_index: u8,
    /// multiply color by alpha, for filtering cut-out edges
    pub premultiply: bool,
    pub gamma: f32,
}

impl Default for RgbaOptions {
    fn default() -> Self {
        Self {
            transparent_index: TRANSPARENT_INDEX,
            premultiply: false,
            gamma: 1.0,
        }
    }
}

fn lookup(palette: &[u8], index: u8) -> [u8; 3] {
    let base = index as usize * 3;
    match palette.get(base..base + 3) {
        Some(c) if palette.len() >= PALETTE_SIZE => [c[0], c[1], c[2]],
        // no usable palette, keep something visible
        _ => [index; 3],
    }
}

fn gamma_lut(gamma: f32) -> Option<[u8; 256]> {
    if (gamma - 1.0).abs() <= 1e-5 {
        return None;
    }
    let inv = 1.0 / gamma.max(1e-6);
    let mut lut = [0; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = ((v as f32 / 255.0).powf(inv) * 255.0).clamp(0.0, 255.0).round() as u8;
    }
    Some(lut)
}

/// RGBA8 pixels of `texture`, with index 255 transparent.
///
/// A palette shorter than 768 bytes falls back to grayscale. Textures without
/// pixels give an empty buffer.
pub fn to_rgba(texture: &BSPTexture, palette: &[u8]) -> Vec<u8> {
    to_rgba_with(texture, palette, RgbaOptions::default())
}

pub fn to_rgba_with(texture: &BSPTexture, palette: &[u8], options: RgbaOptions) -> Vec<u8> {
    if texture.width == 0 || texture.height == 0 || !texture.has_pixels() {
        return Vec::new();
    }

    let lut = gamma_lut(options.gamma);
    let mut rgba = Vec::with_capacity(texture.indices.len() * 4);

    for &index in &texture.indices {
        let mut rgb = lookup(palette, index);
        if let Some(lut) = &lut {
            rgb = rgb.map(|c| lut[c as usize]);
        }

        let alpha = if index == options.transparent_index {
            0
        } else {
            255
        };
        if options.premultiply && alpha == 0 {
            rgb = [0; 3];
        }

        rgba.extend_from_slice(&rgb);
        rgba.push(alpha);
    }

    rgba
}

/// Opaque gray checkerboard, at least 2x2, for textures stored outside the map.
pub fn checker_rgba(width: u32, height: u32, cell: u32) -> Vec<u8> {
    let width = width.max(2);
    let height = height.max(2);
    let cell = cell.max(1);

    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / cell + y / cell) % 2 == 1 { 200 } else { 60 };
            out.extend_from_slice(&[v, v, v, 255]);
        }
    }
    out
}

/// Gamma corrects the color channels of an RGBA8 buffer in place. Alpha is kept.
pub fn apply_gamma_rgba(rgba: &mut [u8], gamma: f32) {
    let Some(lut) = gamma_lut(gamma) else {
        return;
    };
    for texel in rgba.chunks_exact_mut(4) {
        for c in &mut texel[..3] {
            *c = lut[*c as usize];
        }
    }
}

fn channel_index(c: char) -> Option<usize> {
    match c.to_ascii_uppercase() {
        'R' => Some(0),
        'G' => Some(1),
        'B' => Some(2),
        'A' => Some(3),
        _ => None,
    }
}

/// Reorders the channels of every texel, e.g. `"BGRA"` for backends that want it.
///
/// Each letter of `order` names the source channel of that output channel.
/// Orders that are not four of `RGBA` (either case) leave the buffer untouched.
pub fn swizzle_rgba(rgba: &mut [u8], order: &str) {
    let map: Option<Vec<usize>> = order.chars().map(channel_index).collect();
    let Some(map) = map.filter(|m| m.len() == 4) else {
        log::warn!("Ignoring channel order {order:?}");
        return;
    };

    for texel in rgba.chunks_exact_mut(4) {
        let src = [texel[0], texel[1], texel[2], texel[3]];
        for (out, &from) in texel.iter_mut().zip(&map) {
            *out = src[from];
        }
    }
}

/// Multiplies the color channels by `tint`, clamped at 0. Alpha is kept.
pub fn tint_rgba(rgba: &mut [u8], tint: [f32; 3]) {
    let tint = tint.map(|t| t.max(0.0));
    for texel in rgba.chunks_exact_mut(4) {
        for (c, t) in texel.iter_mut().zip(tint) {
            *c = (*c as f32 * t).clamp(0.0, 255.0).round() as u8;
        }
    }
}

/// Box filtered mip chain. Level 0 is a copy of `rgba`, each next level halves
/// both sides (never below 1) down to 1x1, or until `max_levels` levels exist
/// when it is not 0.
///
/// Empty when the image is empty or `rgba` is shorter than `width * height` texels.
pub fn build_mipmaps_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    max_levels: usize,
) -> Vec<Vec<u8>> {
    let (mut w, mut h) = (width as usize, height as usize);
    if w == 0 || h == 0 || rgba.len() < w * h * 4 {
        return Vec::new();
    }

    let mut levels = vec![rgba[..w * h * 4].to_vec()];
    while (max_levels == 0 || levels.len() < max_levels) && (w > 1 || h > 1) {
        let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
        let prev = &levels[levels.len() - 1];
        let mut next = Vec::with_capacity(nw * nh * 4);

        for y in 0..nh {
            for x in 0..nw {
                let mut sum = [0u32; 4];
                for (px, py) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    // edge texels repeat on odd sides
                    let sx = (x * 2 + px).min(w - 1);
                    let sy = (y * 2 + py).min(h - 1);
                    let i = (sy * w + sx) * 4;
                    for (s, &c) in sum.iter_mut().zip(&prev[i..i + 4]) {
                        *s += c as u32;
                    }
                }
                next.extend(sum.map(|s| (s / 4) as u8));
            }
        }

        levels.push(next);
        (w, h) = (nw, nh);
    }

    levels
}

#[cfg(test)]
mod convert_tests {
    use super::*;

    fn texture(indices: Vec<u8>) -> BSPTexture {
        BSPTexture {
            name: "test".to_owned(),
            width: indices.len() as u32,
            height: 1,
            indices,
        }
    }

    #[test]
    fn palette_lookup_and_transparency() {
        let mut palette = vec![0; PALETTE_SIZE];
        palette[3..6].copy_from_slice(&[10, 20, 30]);
        palette[765..].copy_from_slice(&[1, 2, 3]);

        let rgba = to_rgba(&texture(vec![1, 255]), &palette);
        assert_eq!(rgba, vec![10, 20, 30, 255, 1, 2, 3, 0]);
    }

    #[test]
    fn grayscale_without_palette() {
        assert_eq!(
            to_rgba(&texture(vec![7]), &[1, 2, 3]),
            vec![7, 7, 7, 255]
        );
        assert!(to_rgba(&BSPTexture::default(), &[]).is_empty());
    }

    #[test]
    fn options() {
        let options = RgbaOptions {
            transparent_index: 4,
            premultiply: true,
            gamma: 2.0,
        };
        let rgba = to_rgba_with(&texture(vec![4, 64, 255]), &[], options);
        assert_eq!(&rgba[..4], &[0, 0, 0, 0]);
        assert_eq!(&rgba[4..8], &[128, 128, 128, 255]);
        assert_eq!(&rgba[8..], &[255, 255, 255, 255]);
    }

    #[test]
    fn checkerboard() {
        let rgba = checker_rgba(0, 3, 0);
        assert_eq!(rgba.len(), 2 * 3 * 4);
        assert_eq!(&rgba[..8], &[60, 60, 60, 255, 200, 200, 200, 255]);
        assert_eq!(&rgba[8..12], &[200, 200, 200, 255]);
    }

    #[test]
    fn gamma_on_rgba_keeps_alpha() {
        let mut rgba = vec![64, 0, 255, 64];
        apply_gamma_rgba(&mut rgba, 2.0);
        assert_eq!(rgba, vec![128, 0, 255, 64]);

        let mut unchanged = vec![64, 1, 2, 3];
        apply_gamma_rgba(&mut unchanged, 1.0);
        assert_eq!(unchanged, vec![64, 1, 2, 3]);
    }

    #[test]
    fn swizzle() {
        let mut rgba = vec![1, 2, 3, 4, 5, 6, 7, 8];
        swizzle_rgba(&mut rgba, "bgra");
        assert_eq!(rgba, vec![3, 2, 1, 4, 7, 6, 5, 8]);

        swizzle_rgba(&mut rgba, "AAAA");
        assert_eq!(rgba, vec![4, 4, 4, 4, 8, 8, 8, 8]);

        for bad in ["BGR", "BGRAX", "XGRA"] {
            let mut rgba = vec![1, 2, 3, 4];
            swizzle_rgba(&mut rgba, bad);
            assert_eq!(rgba, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn tint() {
        let mut rgba = vec![100, 100, 100, 100];
        tint_rgba(&mut rgba, [1.0, 0.5, 3.0]);
        assert_eq!(rgba, vec![100, 50, 255, 100]);

        tint_rgba(&mut rgba, [-1.0, 1.0, 1.0]);
        assert_eq!(rgba, vec![0, 50, 255, 100]);
    }

    #[test]
    fn mip_chain() {
        // 3x2: odd width repeats the last column
        let rgba: Vec<u8> = [0, 40, 80, 120, 160, 200]
            .iter()
            .flat_map(|&v| [v, v, v, 255])
            .collect();

        let levels = build_mipmaps_rgba(&rgba, 3, 2, 0);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0], rgba);
        // (0 + 40 + 120 + 160) / 4
        assert_eq!(levels[1], vec![80, 80, 80, 255]);

        let levels = build_mipmaps_rgba(&vec![9; 8 * 8 * 4], 8, 8, 0);
        let sizes: Vec<_> = levels.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![256, 64, 16, 4]);
        assert!(levels[3].iter().all(|&c| c == 9));

        assert_eq!(build_mipmaps_rgba(&vec![0; 8 * 8 * 4], 8, 8, 2).len(), 2);
        assert!(build_mipmaps_rgba(&[0; 4], 2, 2, 0).is_empty());
        assert!(build_mipmaps_rgba(&[], 0, 0, 0).is_empty());
    }
}
