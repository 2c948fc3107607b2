use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::{error::LoadWarning, prelude::*};

/// Position and diffuse texture coordinate. 5 floats.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: Vec3,
    pub uv: Vec2,
}

/// A [`TexturedVertex`] with its lightmap atlas coordinate. 7 floats.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightmappedVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub lightmap_uv: Vec2,
}

impl TexturedVertex {
    /// Vertex at `position` with texture coordinates normalised by the texture's size.
    pub fn project(position: Vec3, tex_info: &BSPTexInfo, scale: Vec2) -> Self {
        let st = tex_info.project(position);
        Self {
            position,
            uv: Vec2::new(st.x / scale.x, 1.0 - st.y / scale.y),
        }
    }

    pub fn with_lightmap_uv(self, lightmap_uv: Vec2) -> LightmappedVertex {
        LightmappedVertex {
            position: self.position,
            uv: self.uv,
            lightmap_uv,
        }
    }
}

/// Triangle list vertices. Meshes start textured and are widened once lightmaps are packed.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshVertices {
    Textured(Vec<TexturedVertex>),
    Lightmapped(Vec<LightmappedVertex>),
}

impl Default for MeshVertices {
    fn default() -> Self {
        MeshVertices::Textured(Vec::new())
    }
}

impl MeshVertices {
    /// Flat interleaved view, `stride()` floats per vertex.
    pub fn floats(&self) -> &[f32] {
        match self {
            MeshVertices::Textured(v) => bytemuck::cast_slice(v),
            MeshVertices::Lightmapped(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn stride(&self) -> usize {
        match self {
            MeshVertices::Textured(_) => 5,
            MeshVertices::Lightmapped(_) => 7,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MeshVertices::Textured(v) => v.len(),
            MeshVertices::Lightmapped(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, i: usize) -> Option<Vec3> {
        match self {
            MeshVertices::Textured(v) => v.get(i).map(|v| v.position),
            MeshVertices::Lightmapped(v) => v.get(i).map(|v| v.position),
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.len()).filter_map(|i| self.position(i))
    }

    /// Replaces textured vertices by lightmapped ones, with `lightmap_uv` computed per position.
    /// Already widened vertices are rewritten the same way.
    pub fn widen(&mut self, mut lightmap_uv: impl FnMut(Vec3) -> Vec2) {
        let widened = match self {
            MeshVertices::Textured(verts) => verts
                .iter()
                .map(|v| v.with_lightmap_uv(lightmap_uv(v.position)))
                .collect(),
            MeshVertices::Lightmapped(verts) => verts
                .iter()
                .map(|v| LightmappedVertex {
                    lightmap_uv: lightmap_uv(v.position),
                    ..*v
                })
                .collect(),
        };
        *self = MeshVertices::Lightmapped(widened);
    }
}

/// Drawable triangles for one face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// `None` when the face references a texture that does not exist
    pub texture_index: Option<usize>,
    /// set by the lightmap pass
    pub face_index: Option<usize>,
    pub vertices: MeshVertices,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn floats(&self) -> &[f32] {
        self.vertices.floats()
    }

    pub fn stride(&self) -> usize {
        self.vertices.stride()
    }
}

#[derive(Default)]
pub struct MeshBuilder<V: Pod> {
    verts: Vec<V>,
}

impl<V: Pod> MeshBuilder<V> {
    /// Fan triangulates a convex polygon: (0, i, i + 1).
    pub fn add_fan(&mut self, ring: &[V]) {
        let Some((&root, rest)) = ring.split_first() else {
            return;
        };
        for pair in rest.windows(2) {
            self.verts.extend_from_slice(&[root, pair[0], pair[1]]);
        }
    }

    pub fn verts(&self) -> &[V] {
        &self.verts
    }
}

impl MeshBuilder<TexturedVertex> {
    pub fn build(self, texture_index: Option<usize>) -> Mesh {
        Mesh {
            texture_index,
            face_index: None,
            vertices: MeshVertices::Textured(self.verts),
        }
    }
}

/// World positions of a face's polygon, in winding order.
pub fn face_polygon(
    face: &BSPFace,
    verts: &[Vec3],
    edges: &[BSPEdge],
    surf_edges: &[BSPSurfEdge],
) -> Result<Vec<Vec3>, &'static str> {
    let ring = face
        .get_verts(edges, surf_edges)?
        .into_iter()
        .map(|i| verts.get(i).copied().ok_or("vertex index out of bounds"))
        .collect::<Result<Vec<_>, _>>()?;

    if ring.len() < 3 {
        return Err("fewer than 3 vertices");
    }
    Ok(ring)
}

/// Builds one triangle list per face, in face order.
///
/// Faces that cannot be built produce an empty mesh so indices keep lining up,
/// and are reported as [`LoadWarning::DegenerateFace`].
pub fn build_meshes(
    faces: &[BSPFace],
    verts: &[Vec3],
    edges: &[BSPEdge],
    surf_edges: &[BSPSurfEdge],
    tex_info: &[BSPTexInfo],
    textures: &[BSPTexture],
) -> (Vec<Mesh>, Vec<LoadWarning>) {
    let mut warnings = Vec::new();

    let meshes = faces
        .iter()
        .enumerate()
        .map(|(i_face, face)| {
            let built = usize::try_from(face.tex_info)
                .ok()
                .and_then(|i| tex_info.get(i))
                .ok_or("texinfo index out of bounds")
                .and_then(|tex| Ok((tex, face_polygon(face, verts, edges, surf_edges)?)));

            let (tex, ring) = match built {
                Ok(built) => built,
                Err(reason) => {
                    warnings.push(LoadWarning::DegenerateFace {
                        face: i_face,
                        reason,
                    });
                    return Mesh::default();
                }
            };

            let texture_index = tex.texture_index(textures.len());
            let scale = texture_index
                .map(|i| textures[i].uv_scale())
                .unwrap_or(Vec2::ONE);

            let ring: Vec<_> = ring
                .into_iter()
                .map(|p| TexturedVertex::project(p, tex, scale))
                .collect();

            let mut builder = MeshBuilder::default();
            builder.add_fan(&ring);
            builder.build(texture_index)
        })
        .collect();

    (meshes, warnings)
}
