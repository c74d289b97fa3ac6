//! Surface-area-heuristic KD-tree: builder (§4.1) and iterative
//! stack-based traversal (§4.2) over a mesh's flat face list.

mod build;
mod node;

pub use build::{BuildSettings, SahTuning};
pub use node::{KdNode, LeafFaces};

use crate::geometry::{
    intersection::{intersect_quad, intersect_triangle},
    mesh::FaceRef,
    Aabb, CoarseIntersection, LightRay, Mesh,
};
use crate::math::Float;

const MAX_TRAVERSAL_STACK: usize = 64;

pub struct KdTree {
    nodes: Vec<KdNode>,
    face_indices: Vec<u32>,
    faces: Vec<FaceRef>,
    world_bound: Aabb,
}

#[derive(Clone, Copy)]
struct StackFrame {
    node: u32,
    t_min: Float,
    t_max: Float,
}

impl KdTree {
    pub fn build(mesh: &Mesh, settings: BuildSettings) -> KdTree {
        let faces = mesh.faces().to_vec();
        let bounds: Vec<Aabb> = faces.iter().map(|&f| mesh.face_bounds(f)).collect();
        let (nodes, face_indices, world_bound) = build::Builder::build(mesh, &faces, &bounds, settings);
        KdTree {
            nodes,
            face_indices,
            faces,
            world_bound,
        }
    }

    pub fn world_bound(&self) -> Aabb {
        self.world_bound
    }

    fn face_list(&self, faces: &LeafFaces) -> Vec<u32> {
        match *faces {
            LeafFaces::Single(f) => vec![f],
            LeafFaces::Range { offset, count } => {
                self.face_indices[offset as usize..(offset + count) as usize].to_vec()
            }
        }
    }

    fn test_face(&self, mesh: &Mesh, ray: &LightRay, local_index: u32, t_max: Float) -> Option<CoarseIntersection> {
        let face = self.faces[local_index as usize];
        match face {
            FaceRef::Triangle(i) => {
                let t = &mesh.triangles[i as usize];
                let v0 = mesh.vertices[t.indices[0] as usize];
                let v1 = mesh.vertices[t.indices[1] as usize];
                let v2 = mesh.vertices[t.indices[2] as usize];
                intersect_triangle(ray, v0, v1, v2, t_max).map(|(b0, b1, b2, t)| CoarseIntersection {
                    face,
                    subdivision_hint: 0,
                    barycentric: (b0, b1, b2),
                    t,
                })
            }
            FaceRef::Quad(i) => {
                let q = &mesh.quads[i as usize];
                let u = mesh.vertices[q.indices[0] as usize];
                let v = mesh.vertices[q.indices[1] as usize];
                let w = mesh.vertices[q.indices[2] as usize];
                let r = mesh.vertices[q.indices[3] as usize];
                intersect_quad(ray, u, v, w, r, t_max).map(|(hint, b0, b1, b2, t)| CoarseIntersection {
                    face,
                    subdivision_hint: hint,
                    barycentric: (b0, b1, b2),
                    t,
                })
            }
        }
    }

    /// Finds the closest intersection in `(t_min, t_max)`, if any.
    pub fn closest_hit(&self, mesh: &Mesh, ray: &LightRay, t_min: Float, t_max: Float) -> Option<CoarseIntersection> {
        let (entry, exit) = self.world_bound.intersect_p(ray, t_min, t_max)?;
        if self.nodes.is_empty() {
            return None;
        }

        let mut stack: Vec<StackFrame> = Vec::with_capacity(MAX_TRAVERSAL_STACK);
        let mut node_index = 0u32;
        let mut seg_min = entry;
        let mut seg_max = exit.min(t_max);
        let mut closest: Option<CoarseIntersection> = None;
        let mut closest_t = t_max;

        loop {
            if closest_t < seg_min {
                break;
            }
            match &self.nodes[node_index as usize] {
                KdNode::Interior { axis, split, above_child } => {
                    let axis = *axis as usize;
                    let t_plane = if ray.inv_d[axis].is_finite() {
                        (*split - ray.o[axis]) * ray.inv_d[axis]
                    } else if ray.o[axis] == *split {
                        0.0
                    } else {
                        Float::INFINITY
                    };

                    let below_first = (ray.o[axis] < *split)
                        || (ray.o[axis] == *split && ray.d[axis] <= 0.0);
                    let (first_child, second_child) = if below_first {
                        (node_index + 1, *above_child)
                    } else {
                        (*above_child, node_index + 1)
                    };

                    if t_plane > seg_max || t_plane <= 0.0 {
                        node_index = first_child;
                    } else if t_plane < seg_min {
                        node_index = second_child;
                    } else {
                        stack.push(StackFrame { node: second_child, t_min: t_plane, t_max: seg_max });
                        node_index = first_child;
                        seg_max = t_plane;
                    }
                    continue;
                }
                KdNode::Leaf { faces } => {
                    let list = self.face_list(faces);
                    for f in list {
                        if let Some(hit) = self.test_face(mesh, ray, f, closest_t) {
                            if hit.t < closest_t {
                                closest_t = hit.t;
                                closest = Some(hit);
                            }
                        }
                    }
                }
            }

            match stack.pop() {
                Some(frame) => {
                    if closest_t < frame.t_min {
                        break;
                    }
                    node_index = frame.node;
                    seg_min = frame.t_min;
                    seg_max = frame.t_max;
                }
                None => break,
            }
        }

        closest
    }

    /// Returns `true` as soon as any face intersects within
    /// `(t_min, t_max)`; does not resolve barycentrics or normals.
    pub fn occluded(&self, mesh: &Mesh, ray: &LightRay, t_min: Float, t_max: Float) -> bool {
        let Some((entry, exit)) = self.world_bound.intersect_p(ray, t_min, t_max) else {
            return false;
        };
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack: Vec<StackFrame> = Vec::with_capacity(MAX_TRAVERSAL_STACK);
        let mut node_index = 0u32;
        let mut seg_min = entry;
        let mut seg_max = exit.min(t_max);

        loop {
            match &self.nodes[node_index as usize] {
                KdNode::Interior { axis, split, above_child } => {
                    let axis = *axis as usize;
                    let t_plane = if ray.inv_d[axis].is_finite() {
                        (*split - ray.o[axis]) * ray.inv_d[axis]
                    } else if ray.o[axis] == *split {
                        0.0
                    } else {
                        Float::INFINITY
                    };

                    let below_first = (ray.o[axis] < *split)
                        || (ray.o[axis] == *split && ray.d[axis] <= 0.0);
                    let (first_child, second_child) = if below_first {
                        (node_index + 1, *above_child)
                    } else {
                        (*above_child, node_index + 1)
                    };

                    if t_plane > seg_max || t_plane <= 0.0 {
                        node_index = first_child;
                    } else if t_plane < seg_min {
                        node_index = second_child;
                    } else {
                        stack.push(StackFrame { node: second_child, t_min: t_plane, t_max: seg_max });
                        node_index = first_child;
                        seg_max = t_plane;
                    }
                    continue;
                }
                KdNode::Leaf { faces } => {
                    let list = self.face_list(faces);
                    for f in list {
                        if self.test_face(mesh, ray, f, t_max).is_some() {
                            return true;
                        }
                    }
                }
            }

            match stack.pop() {
                Some(frame) => {
                    node_index = frame.node;
                    seg_min = frame.t_min;
                    seg_max = frame.t_max;
                }
                None => return false,
            }
        }
    }
}
