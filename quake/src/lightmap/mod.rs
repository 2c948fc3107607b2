//! Packs every face's lightmap into one RGBA atlas and gives each mesh vertex
//! its coordinate in it.

pub mod packer;

use glam::Vec2;

use crate::{
    bsp::consts::LUXEL_SIZE,
    config::LightmapConfig,
    error::LoadWarning,
    meshes::Mesh,
    prelude::*,
};

pub use packer::{RectPacker, ShelfPacker};

/// Where one face's lightmap lives in the atlas.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LightmapRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// offset of the face's samples in the lighting lump
    pub light_ofs: i32,
    /// texture space (s, t) of the first sample
    pub mins: Vec2,
    pub valid: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LightmapAtlas {
    pub width: u32,
    pub height: u32,
    /// `width * height` RGBA texels, white where no face has samples
    pub rgba: Vec<u8>,
    /// one per face
    pub rects: Vec<LightmapRect>,
}

impl LightmapAtlas {
    pub fn is_empty(&self) -> bool {
        self.rgba.is_empty()
    }

    pub fn rect(&self, face: usize) -> Option<&LightmapRect> {
        self.rects.get(face).filter(|r| r.valid)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.rgba.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// Sample grid of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub mins: Vec2,
    pub w: u32,
    pub h: u32,
}

/// Lightmap footprint of a face whose mesh has been built.
///
/// `None` for unlit faces, faces whose lighting offset lies outside `lighting`,
/// and faces without geometry.
pub fn footprint(
    face: &BSPFace,
    tex_info: &[BSPTexInfo],
    mesh: &Mesh,
    lighting: &[u8],
) -> Option<Footprint> {
    if !face.has_lightmap(lighting) || mesh.vertices.is_empty() {
        return None;
    }
    let tex = tex_info.get(usize::try_from(face.tex_info).ok()?)?;

    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for p in mesh.vertices.positions() {
        let st = tex.project(p);
        min = min.min(st);
        max = max.max(st);
    }

    let mins = (min / LUXEL_SIZE).floor() * LUXEL_SIZE;
    let maxs = (max / LUXEL_SIZE).ceil() * LUXEL_SIZE;
    let extent = (maxs - mins) / LUXEL_SIZE;
    if !extent.is_finite() {
        log::debug!("Face texture extent {extent} is not finite, no lightmap");
        return None;
    }

    // saturates, so extents past u32 fail to pack instead of wrapping
    Some(Footprint {
        mins,
        w: (extent.x as u32).saturating_add(1),
        h: (extent.y as u32).saturating_add(1),
    })
}

fn widen_all(meshes: &mut [Mesh]) {
    for mesh in meshes {
        mesh.vertices.widen(|_| Vec2::ZERO);
    }
}

/// [`build_lightmaps_with`] using the shelf packer.
pub fn build_lightmaps(
    faces: &[BSPFace],
    tex_info: &[BSPTexInfo],
    lighting: &[u8],
    meshes: &mut [Mesh],
    config: &LightmapConfig,
) -> (LightmapAtlas, Vec<LoadWarning>) {
    build_lightmaps_with::<ShelfPacker>(faces, tex_info, lighting, meshes, config)
}

/// Builds the atlas and widens every mesh to carry lightmap coordinates.
///
/// `meshes` must line up with `faces`. When they do not, or when the lightmaps
/// cannot be packed within `config.max_size`, the atlas is left empty and
/// every vertex gets a zero lightmap coordinate.
pub fn build_lightmaps_with<P: RectPacker>(
    faces: &[BSPFace],
    tex_info: &[BSPTexInfo],
    lighting: &[u8],
    meshes: &mut [Mesh],
    config: &LightmapConfig,
) -> (LightmapAtlas, Vec<LoadWarning>) {
    let mut warnings = Vec::new();

    if meshes.len() != faces.len() {
        warnings.push(LoadWarning::FaceMeshMismatch {
            faces: faces.len(),
            meshes: meshes.len(),
        });
        widen_all(meshes);
        return (LightmapAtlas::default(), warnings);
    }

    for (i, mesh) in meshes.iter_mut().enumerate() {
        mesh.face_index = Some(i);
    }

    let footprints: Vec<_> = faces
        .iter()
        .zip(meshes.iter())
        .map(|(face, mesh)| footprint(face, tex_info, mesh, lighting))
        .collect();

    let mut atlas = LightmapAtlas {
        rects: faces
            .iter()
            .map(|face| LightmapRect {
                light_ofs: face.light_ofs,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let sizes: Vec<_> = footprints
        .iter()
        .map(|f| f.map(|f| (f.w, f.h)))
        .collect();
    let area: u64 = sizes.iter().flatten().map(|&(w, h)| w as u64 * h as u64).sum();
    if area == 0 {
        log::info!("No lightmapped faces");
        widen_all(meshes);
        return (atlas, warnings);
    }

    let (width, height, placed) =
        match packer::pack_smallest::<P>(&sizes, config.initial_size, config.max_size) {
            Ok(packed) => packed,
            Err((width, height)) => {
                warnings.push(LoadWarning::AtlasOverflow { width, height });
                widen_all(meshes);
                return (atlas, warnings);
            }
        };

    atlas.width = width;
    atlas.height = height;
    atlas.rgba = vec![255; width as usize * height as usize * 4];

    for ((rect, footprint), pos) in atlas.rects.iter_mut().zip(&footprints).zip(&placed) {
        if let (Some(footprint), Some((x, y))) = (footprint, pos) {
            *rect = LightmapRect {
                x: *x,
                y: *y,
                w: footprint.w,
                h: footprint.h,
                light_ofs: rect.light_ofs,
                mins: footprint.mins,
                valid: true,
            };
        }
    }

    for rect in atlas.rects.iter().filter(|r| r.valid) {
        blit(&mut atlas.rgba, width, rect, lighting);
    }

    let size = Vec2::new(width as f32, height as f32);
    for ((mesh, face), rect) in meshes.iter_mut().zip(faces).zip(&atlas.rects) {
        let tex = usize::try_from(face.tex_info)
            .ok()
            .and_then(|i| tex_info.get(i));

        match tex {
            Some(tex) if rect.valid => {
                let corner = Vec2::new(rect.x as f32, rect.y as f32);
                mesh.vertices.widen(|p| {
                    let luxel = (tex.project(p) - rect.mins) / LUXEL_SIZE;
                    (corner + luxel + 0.5) / size
                });
            }
            _ => mesh.vertices.widen(|_| Vec2::ZERO),
        }
    }

    log::info!(
        "Packed {} lightmaps into a {}x{} atlas",
        atlas.rects.iter().filter(|r| r.valid).count(),
        width,
        height
    );

    (atlas, warnings)
}

/// Copies a face's first light style into its rect as opaque gray.
/// A rect whose samples run past the lighting lump is left white.
fn blit(rgba: &mut [u8], atlas_width: u32, rect: &LightmapRect, lighting: &[u8]) {
    let Ok(start) = usize::try_from(rect.light_ofs) else {
        return;
    };
    let w = rect.w as usize;
    let Some(samples) = start
        .checked_add(w * rect.h as usize)
        .and_then(|end| lighting.get(start..end))
    else {
        log::debug!("Lightmap at {} runs past the lighting lump", rect.light_ofs);
        return;
    };

    for (row, line) in samples.chunks_exact(w).enumerate() {
        let y = rect.y as usize + row;
        for (col, &v) in line.iter().enumerate() {
            let i = (y * atlas_width as usize + rect.x as usize + col) * 4;
            if let Some(texel) = rgba.get_mut(i..i + 4) {
                texel.copy_from_slice(&[v, v, v, 255]);
            }
        }
    }
}

#[cfg(test)]
mod lightmap_tests {
    use glam::{vec3, Vec4};

    use crate::meshes::{MeshBuilder, MeshVertices, TexturedVertex};

    use super::*;

    fn unit_tex_info() -> BSPTexInfo {
        BSPTexInfo {
            tex_s: Vec4::X,
            tex_t: Vec4::Y,
            miptex: 0,
            flags: 0,
        }
    }

    /// Axis aligned quad on z = 0 from `min` to `max`.
    fn quad_mesh(min: Vec2, max: Vec2) -> Mesh {
        let tex = unit_tex_info();
        let ring: Vec<_> = [
            vec3(min.x, min.y, 0.0),
            vec3(max.x, min.y, 0.0),
            vec3(max.x, max.y, 0.0),
            vec3(min.x, max.y, 0.0),
        ]
        .into_iter()
        .map(|p| TexturedVertex::project(p, &tex, Vec2::ONE))
        .collect();
        let mut builder = MeshBuilder::default();
        builder.add_fan(&ring);
        builder.build(Some(0))
    }

    fn lit_face(light_ofs: i32) -> BSPFace {
        BSPFace {
            num_edges: 4,
            light_ofs,
            ..Default::default()
        }
    }

    fn lightmap_uvs(mesh: &Mesh) -> Vec<Vec2> {
        match &mesh.vertices {
            MeshVertices::Lightmapped(v) => v.iter().map(|v| v.lightmap_uv).collect(),
            MeshVertices::Textured(_) => panic!("mesh was not widened"),
        }
    }

    #[test]
    fn footprint_snaps_to_luxels() {
        let mesh = quad_mesh(Vec2::new(-8.0, 0.0), Vec2::new(40.0, 16.0));
        let fp = footprint(&lit_face(0), &[unit_tex_info()], &mesh, &[0; 4]).unwrap();
        assert_eq!(fp.mins, Vec2::new(-16.0, 0.0));
        assert_eq!((fp.w, fp.h), (5, 2));

        assert!(footprint(&lit_face(-1), &[unit_tex_info()], &mesh, &[0; 4]).is_none());
        assert!(footprint(&lit_face(4), &[unit_tex_info()], &mesh, &[0; 4]).is_none());
        assert!(footprint(&lit_face(0), &[unit_tex_info()], &Mesh::default(), &[0; 4]).is_none());
    }

    #[test]
    fn huge_extents_overflow_the_atlas() {
        let stretched = BSPTexInfo {
            tex_s: Vec4::new(1e7, 0.0, 0.0, 0.0),
            ..unit_tex_info()
        };
        let mesh = quad_mesh(Vec2::ZERO, Vec2::new(10000.0, 16.0));
        let fp = footprint(&lit_face(0), &[stretched], &mesh, &[0; 4]).unwrap();
        assert_eq!(fp.w, u32::MAX);

        let mut meshes = [mesh];
        let (atlas, warnings) = build_lightmaps(
            &[lit_face(0)],
            &[stretched],
            &[0; 4],
            &mut meshes,
            &LightmapConfig::default(),
        );
        assert!(atlas.is_empty());
        assert!(matches!(warnings[..], [LoadWarning::AtlasOverflow { .. }]));
        assert_eq!(meshes[0].stride(), 7);
    }

    #[test]
    fn non_finite_extent_has_no_footprint() {
        let mesh = quad_mesh(Vec2::ZERO, Vec2::new(f32::INFINITY, 16.0));
        assert!(footprint(&lit_face(0), &[unit_tex_info()], &mesh, &[0; 4]).is_none());
    }

    #[test]
    fn single_face_atlas() {
        let faces = [lit_face(0)];
        let mut meshes = [quad_mesh(Vec2::ZERO, Vec2::new(16.0, 16.0))];
        let lighting = [10, 20, 30, 40];

        let (atlas, warnings) = build_lightmaps(
            &faces,
            &[unit_tex_info()],
            &lighting,
            &mut meshes,
            &LightmapConfig::default(),
        );
        assert!(warnings.is_empty());
        assert_eq!((atlas.width, atlas.height), (1024, 1024));

        let rect = atlas.rect(0).unwrap();
        assert_eq!((rect.x, rect.y, rect.w, rect.h), (0, 0, 2, 2));
        assert_eq!(atlas.pixel(0, 0), Some([10, 10, 10, 255]));
        assert_eq!(atlas.pixel(1, 1), Some([40, 40, 40, 255]));
        assert_eq!(atlas.pixel(2, 0), Some([255, 255, 255, 255]));

        let mesh = &meshes[0];
        assert_eq!(mesh.face_index, Some(0));
        assert_eq!(mesh.stride(), 7);
        let uvs = lightmap_uvs(mesh);
        assert_eq!(uvs[0], Vec2::splat(0.5 / 1024.0));
        assert_eq!(uvs[2], Vec2::splat(1.5 / 1024.0));
    }

    #[test]
    fn lighting_overrun_stays_white() {
        let faces = [lit_face(2)];
        let mut meshes = [quad_mesh(Vec2::ZERO, Vec2::new(16.0, 16.0))];

        let (atlas, _) = build_lightmaps(
            &faces,
            &[unit_tex_info()],
            &[0; 4],
            &mut meshes,
            &LightmapConfig::default(),
        );
        assert!(atlas.rect(0).is_some());
        assert_eq!(atlas.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(atlas.pixel(1, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn overflow_widens_with_zero() {
        let faces = [lit_face(0), lit_face(0)];
        let mut meshes = [
            quad_mesh(Vec2::ZERO, Vec2::new(16.0 * 20.0, 16.0)),
            quad_mesh(Vec2::ZERO, Vec2::new(16.0, 16.0)),
        ];
        let config = LightmapConfig {
            initial_size: 4,
            max_size: 16,
        };

        let (atlas, warnings) =
            build_lightmaps(&faces, &[unit_tex_info()], &[0; 8], &mut meshes, &config);
        assert!(atlas.is_empty());
        assert!(matches!(warnings[..], [LoadWarning::AtlasOverflow { .. }]));
        for mesh in &meshes {
            assert_eq!(mesh.stride(), 7);
            assert!(lightmap_uvs(mesh).iter().all(|uv| *uv == Vec2::ZERO));
        }
    }

    #[test]
    fn unlit_map_has_no_atlas() {
        let faces = [lit_face(-1)];
        let mut meshes = [quad_mesh(Vec2::ZERO, Vec2::ONE)];
        let (atlas, warnings) = build_lightmaps(
            &faces,
            &[unit_tex_info()],
            &[],
            &mut meshes,
            &LightmapConfig::default(),
        );
        assert!(warnings.is_empty());
        assert!(atlas.is_empty());
        assert_eq!(atlas.rects.len(), 1);
        assert_eq!(meshes[0].floats().len(), 6 * 7);
    }

    #[test]
    fn mismatch_is_reported() {
        let mut meshes = [quad_mesh(Vec2::ZERO, Vec2::ONE)];
        let (atlas, warnings) = build_lightmaps(
            &[],
            &[],
            &[],
            &mut meshes,
            &LightmapConfig::default(),
        );
        assert!(atlas.rects.is_empty());
        assert_eq!(
            warnings,
            vec![LoadWarning::FaceMeshMismatch {
                faces: 0,
                meshes: 1
            }]
        );
        assert_eq!(meshes[0].stride(), 7);
        assert!(lightmap_uvs(&meshes[0]).iter().all(|uv| *uv == Vec2::ZERO));
    }
}
