use crate::error::MeshError;
use crate::math::{Float, Vector2, Vector3};

use super::aabb::Aabb;

const DEGENERATE_CROSS_TOLERANCE: Float = 1e-9;
const COPLANAR_DOT_TOLERANCE: Float = 1e-5;

/// Per-corner auxiliary data for one face: indices into the mesh's
/// normal/uv arrays (parallel to the vertex indices) plus the face's
/// material index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceAux {
    pub normal_indices: [u32; 4],
    pub uv_indices: [u32; 4],
    pub material: u32,
}

/// A triangle, `(u, v, w)` indexing into [`Mesh::vertices`].
#[derive(Debug, Clone, Copy)]
pub struct TriangleFace {
    pub indices: [u32; 3],
    pub aux: FaceAux,
}

/// A merged coplanar quad, `(u, v, w, r)`. `aux.normal_indices`/
/// `aux.uv_indices` use all four slots; `indices` does too.
#[derive(Debug, Clone, Copy)]
pub struct QuadFace {
    pub indices: [u32; 4],
    pub aux: FaceAux,
}

/// A reference to one face in the mesh's flat, heterogeneous face list.
/// The accelerator stores these, not raw triangle/quad indices, so a
/// KD-tree leaf can mix both without a discriminated union per face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceRef {
    Triangle(u32),
    Quad(u32),
}

pub struct Mesh {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub uvs: Vec<Vector2>,
    pub triangles: Vec<TriangleFace>,
    pub quads: Vec<QuadFace>,
    face_bounds: Vec<Aabb>,
    faces: Vec<FaceRef>,
}

impl Mesh {
    /// Ingests pre-parsed arrays, the external contract an OBJ loader
    /// (out of scope, §6) is expected to call after parsing.
    pub fn from_arrays(
        vertices: Vec<Vector3>,
        normals: Vec<Vector3>,
        uvs: Vec<Vector2>,
        triangle_indices: Vec<[u32; 3]>,
        triangle_aux: Vec<FaceAux>,
    ) -> Result<Mesh, MeshError> {
        if triangle_indices.len() != triangle_aux.len() {
            return Err(MeshError::MismatchedArrays {
                what: format!(
                    "{} triangle index tuples but {} aux records",
                    triangle_indices.len(),
                    triangle_aux.len()
                ),
            });
        }

        let mut triangles = Vec::with_capacity(triangle_indices.len());
        for (face_i, (indices, aux)) in triangle_indices
            .into_iter()
            .zip(triangle_aux.into_iter())
            .enumerate()
        {
            for &i in &indices {
                if i as usize >= vertices.len() {
                    return Err(MeshError::VertexIndexOutOfRange {
                        index: i,
                        count: vertices.len(),
                    });
                }
            }
            for &i in &aux.normal_indices[..3] {
                if !normals.is_empty() && i as usize >= normals.len() {
                    return Err(MeshError::NormalIndexOutOfRange {
                        face: face_i,
                        index: i,
                        count: normals.len(),
                    });
                }
            }

            let p0 = vertices[indices[0] as usize];
            let p1 = vertices[indices[1] as usize];
            let p2 = vertices[indices[2] as usize];
            let cross_mag = (p1 - p0).cross(p2 - p0).length();
            if cross_mag < DEGENERATE_CROSS_TOLERANCE {
                continue;
            }

            triangles.push(TriangleFace { indices, aux });
        }

        let mut mesh = Mesh {
            vertices,
            normals,
            uvs,
            triangles,
            quads: Vec::new(),
            face_bounds: Vec::new(),
            faces: Vec::new(),
        };
        mesh.merge_coplanar_quads();
        mesh.rebuild_face_list();
        Ok(mesh)
    }

    fn face_normal(&self, indices: &[u32]) -> Vector3 {
        let p0 = self.vertices[indices[0] as usize];
        let p1 = self.vertices[indices[1] as usize];
        let p2 = self.vertices[indices[2] as usize];
        (p1 - p0).cross(p2 - p0).normalized()
    }

    /// Merges adjacent coplanar, consistently-wound triangle pairs into
    /// quads (§3, quad-merge rule). Two triangles merge when they share
    /// an edge, their face normals agree within `1e-5`, and the edge
    /// function reconstructs a consistent winding for the combined quad.
    fn merge_coplanar_quads(&mut self) {
        let mut consumed = vec![false; self.triangles.len()];
        let mut merged_quads = Vec::new();
        let mut survivors = Vec::new();

        for i in 0..self.triangles.len() {
            if consumed[i] {
                continue;
            }
            let mut merged = false;
            for j in (i + 1)..self.triangles.len() {
                if consumed[j] {
                    continue;
                }
                if let Some(quad) = self.try_merge_pair(&self.triangles[i], &self.triangles[j]) {
                    consumed[i] = true;
                    consumed[j] = true;
                    merged_quads.push(quad);
                    merged = true;
                    break;
                }
            }
            if !merged {
                survivors.push(self.triangles[i]);
            }
        }

        self.triangles = survivors;
        self.quads = merged_quads;
    }

    fn try_merge_pair(&self, a: &TriangleFace, b: &TriangleFace) -> Option<QuadFace> {
        let shared: Vec<u32> = a
            .indices
            .iter()
            .copied()
            .filter(|v| b.indices.contains(v))
            .collect();
        if shared.len() != 2 {
            return None;
        }

        let n_a = self.face_normal(&a.indices);
        let n_b = self.face_normal(&b.indices);
        if (1.0 - n_a.dot(n_b)).abs() > COPLANAR_DOT_TOLERANCE {
            return None;
        }

        // u is `a`'s vertex not shared with `b` (its apex); v, w are the
        // shared edge in `a`'s own winding order, starting right after
        // u; r is `b`'s vertex not shared with `a`. Rotating `a`'s
        // indices so the apex lands first is what makes "u,v,w,r" mean
        // "apex, shared edge, apex2" regardless of which two of `a`'s
        // three vertices happen to be the shared ones.
        let apex_pos = a.indices.iter().position(|v| !b.indices.contains(v))?;
        let rotated: Vec<usize> = (0..3).map(|k| (apex_pos + k) % 3).collect();

        let r = *b.indices.iter().find(|v| !a.indices.contains(v))?;
        let r_normal_idx = *b
            .aux
            .normal_indices
            .iter()
            .zip(b.indices.iter())
            .find(|(_, &idx)| idx == r)
            .map(|(n, _)| n)?;
        let r_uv_idx = *b
            .aux
            .uv_indices
            .iter()
            .zip(b.indices.iter())
            .find(|(_, &idx)| idx == r)
            .map(|(n, _)| n)?;

        let indices = [
            a.indices[rotated[0]],
            a.indices[rotated[1]],
            a.indices[rotated[2]],
            r,
        ];
        let aux = FaceAux {
            normal_indices: [
                a.aux.normal_indices[rotated[0]],
                a.aux.normal_indices[rotated[1]],
                a.aux.normal_indices[rotated[2]],
                r_normal_idx,
            ],
            uv_indices: [
                a.aux.uv_indices[rotated[0]],
                a.aux.uv_indices[rotated[1]],
                a.aux.uv_indices[rotated[2]],
                r_uv_idx,
            ],
            material: a.aux.material,
        };

        Some(QuadFace { indices, aux })
    }

    fn rebuild_face_list(&mut self) {
        self.faces.clear();
        self.face_bounds.clear();
        for i in 0..self.triangles.len() {
            self.faces.push(FaceRef::Triangle(i as u32));
            self.face_bounds.push(self.triangle_bounds(i as u32));
        }
        for i in 0..self.quads.len() {
            self.faces.push(FaceRef::Quad(i as u32));
            self.face_bounds.push(self.quad_bounds(i as u32));
        }
    }

    pub fn faces(&self) -> &[FaceRef] {
        &self.faces
    }

    pub fn face_bounds(&self, face: FaceRef) -> Aabb {
        match face {
            FaceRef::Triangle(i) => self.triangle_bounds(i),
            FaceRef::Quad(i) => self.quad_bounds(i),
        }
    }

    pub fn world_bound(&self) -> Aabb {
        self.face_bounds
            .iter()
            .fold(Aabb::EMPTY, |acc, &b| acc.union(b))
    }

    fn triangle_bounds(&self, index: u32) -> Aabb {
        let t = &self.triangles[index as usize];
        Aabb::from_points(&[
            self.vertices[t.indices[0] as usize],
            self.vertices[t.indices[1] as usize],
            self.vertices[t.indices[2] as usize],
        ])
    }

    fn quad_bounds(&self, index: u32) -> Aabb {
        let q = &self.quads[index as usize];
        Aabb::from_points(&[
            self.vertices[q.indices[0] as usize],
            self.vertices[q.indices[1] as usize],
            self.vertices[q.indices[2] as usize],
            self.vertices[q.indices[3] as usize],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aux(material: u32) -> FaceAux {
        FaceAux {
            normal_indices: [0, 0, 0, 0],
            uv_indices: [0, 0, 0, 0],
            material,
        }
    }

    #[test]
    fn merges_coplanar_pair_into_quad() {
        // Unit square in the z=0 plane split along the (0,2) diagonal.
        let vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let triangle_indices = vec![[0, 1, 2], [0, 2, 3]];
        let triangle_aux = vec![aux(0), aux(0)];
        let mesh = Mesh::from_arrays(vertices, vec![], vec![], triangle_indices, triangle_aux).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
        assert_eq!(mesh.quads.len(), 1);
        // apex of `a=[0,1,2]` not shared with `b=[0,2,3]` is vertex 1,
        // at position 1: rotating `a` to start there gives (1,2,0),
        // then `b`'s own apex 3 closes the tuple.
        assert_eq!(mesh.quads[0].indices, [1, 2, 0, 3]);
    }

    #[test]
    fn merge_rotates_the_apex_to_the_front_regardless_of_input_order() {
        // Same square as `merges_coplanar_pair_into_quad`, but `a`'s
        // indices are cyclically rotated so its apex (the vertex not
        // shared with `b`) sits at position 2 instead of 0. A merge
        // that doesn't rotate before storing would scatter "apex,
        // shared edge" across arbitrary tuple slots depending on input
        // order; the resulting quad must be identical either way.
        let vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let triangle_indices = vec![[2, 0, 1], [0, 2, 3]];
        let triangle_aux = vec![aux(0), aux(0)];
        let mesh = Mesh::from_arrays(vertices, vec![], vec![], triangle_indices, triangle_aux).unwrap();
        assert_eq!(mesh.quads.len(), 1);
        assert_eq!(mesh.quads[0].indices, [1, 2, 0, 3]);
    }

    #[test]
    fn degenerate_triangle_is_dropped() {
        let vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ];
        let triangle_indices = vec![[0, 1, 2]];
        let triangle_aux = vec![aux(0)];
        let mesh = Mesh::from_arrays(vertices, vec![], vec![], triangle_indices, triangle_aux).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn out_of_range_index_errors() {
        let vertices = vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)];
        let triangle_indices = vec![[0, 1, 5]];
        let triangle_aux = vec![aux(0)];
        let err = Mesh::from_arrays(vertices, vec![], vec![], triangle_indices, triangle_aux).unwrap_err();
        assert!(matches!(err, MeshError::VertexIndexOutOfRange { index: 5, .. }));
    }
}
