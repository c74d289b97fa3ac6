use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::geometry::mesh::FaceRef;
use crate::geometry::{Aabb, Mesh};
use crate::math::Float;

use super::node::{KdNode, LeafFaces};

const MAX_DEPTH_HARD_CAP: u32 = 64;

/// The two SAH constant sets named in §4.1. `Tuned` is what
/// `original_source/src/kd_tree.cpp` actually runs with and is the
/// default; `Balanced` is the more conventional traversal/intersection
/// split, kept available for experimentation.
#[derive(Debug, Clone, Copy)]
pub enum SahTuning {
    Balanced,
    Tuned,
}

impl SahTuning {
    fn constants(self) -> (Float, Float, Float) {
        match self {
            // (traversal_cost, intersection_cost, empty_bonus)
            SahTuning::Balanced => (50.0, 50.0, 0.0),
            SahTuning::Tuned => (1.0, 80.0, 0.5),
        }
    }
}

impl Default for SahTuning {
    fn default() -> Self {
        SahTuning::Tuned
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildSettings {
    pub max_leaf_size: u32,
    pub tuning: SahTuning,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            max_leaf_size: 1,
            tuning: SahTuning::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeType {
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
struct BoundEdge {
    t: Float,
    face: u32,
    kind: EdgeType,
}

pub struct Builder<'a> {
    mesh: &'a Mesh,
    faces: &'a [FaceRef],
    bounds: &'a [Aabb],
    settings: BuildSettings,
    pub nodes: Vec<KdNode>,
    pub face_indices: Vec<u32>,
    progress: &'a AtomicU32,
}

impl<'a> Builder<'a> {
    pub fn build(
        mesh: &'a Mesh,
        faces: &'a [FaceRef],
        bounds: &'a [Aabb],
        settings: BuildSettings,
    ) -> (Vec<KdNode>, Vec<u32>, Aabb) {
        let world_bound = bounds.iter().fold(Aabb::EMPTY, |acc, &b| acc.union(b));

        // §4.1 progress reporting: a shared atomic holding an f32
        // bit-pattern (stable std has no AtomicF32), polled by a
        // reporter thread at ~50 Hz and joined before this function
        // returns.
        let progress = Arc::new(AtomicU32::new(0.0f32.to_bits()));
        let build_done = Arc::new(AtomicBool::new(false));
        let reporter = {
            let progress = Arc::clone(&progress);
            let build_done = Arc::clone(&build_done);
            std::thread::spawn(move || {
                while !build_done.load(Ordering::Relaxed) {
                    let fraction = f32::from_bits(progress.load(Ordering::Relaxed));
                    log::info!("kd-tree build: {:.1}%", (fraction * 100.0).min(100.0));
                    std::thread::sleep(Duration::from_millis(20));
                }
            })
        };

        let mut builder = Builder {
            mesh,
            faces,
            bounds,
            settings,
            nodes: Vec::new(),
            face_indices: Vec::new(),
            progress: &progress,
        };
        let initial_faces: Vec<u32> = (0..bounds.len() as u32).collect();
        let max_depth = ((8.0 + 1.3 * (bounds.len().max(1) as Float).log2()).round() as u32)
            .min(MAX_DEPTH_HARD_CAP);
        builder.build_node(world_bound, &initial_faces, max_depth, 0, 1.0);

        build_done.store(true, Ordering::Relaxed);
        reporter.join().expect("kd-tree progress reporter thread panicked");
        log::info!("kd-tree build: 100.0%");

        (builder.nodes, builder.face_indices, world_bound)
    }

    /// Returns the index of the node just created. `effort` is this
    /// call's share of the root's total effort (1.0); it is split
    /// between children proportional to their face counts and
    /// accumulated into `self.progress` at every leaf.
    fn build_node(&mut self, bounds: Aabb, faces: &[u32], depth_remaining: u32, bad_refines: u32, effort: Float) -> u32 {
        let node_index = self.nodes.len() as u32;
        // Reserve the slot now so the below-child invariant (below
        // child immediately follows its parent) holds even though the
        // recursive call below will itself push more nodes first.
        self.nodes.push(KdNode::Leaf { faces: LeafFaces::Range { offset: 0, count: 0 } });

        if faces.len() as u32 <= self.settings.max_leaf_size || depth_remaining == 0 {
            self.nodes[node_index as usize] = self.make_leaf(bounds, faces);
            self.add_progress(effort);
            return node_index;
        }

        let (traversal_cost, intersection_cost, empty_bonus) = self.settings.tuning.constants();
        let old_cost = intersection_cost * faces.len() as Float;

        let mut best: Option<(usize, Float, Float, Float)> = None; // (axis, split, cost, _)
        let mut axis = bounds.maximum_extent();

        for _ in 0..3 {
            let mut edges = Vec::with_capacity(faces.len() * 2);
            for &f in faces {
                let b = self.bounds[f as usize];
                edges.push(BoundEdge { t: b.min_point[axis], face: f, kind: EdgeType::Start });
                edges.push(BoundEdge { t: b.max_point[axis], face: f, kind: EdgeType::End });
            }
            edges.sort_by(|a, b| {
                a.t.partial_cmp(&b.t)
                    .unwrap()
                    .then(order_key(a.kind).cmp(&order_key(b.kind)))
            });

            let inv_total_sa = 1.0 / bounds.surface_area().max(1e-12);
            let other_axes: [usize; 2] = match axis {
                0 => [1, 2],
                1 => [0, 2],
                _ => [0, 1],
            };

            let mut n_below = 0u32;
            let mut n_above = faces.len() as u32;
            let mut local_best: Option<(Float, Float)> = None;

            for edge in edges.iter() {
                if edge.kind == EdgeType::End {
                    n_above -= 1;
                }
                let t = edge.t;
                if t > bounds.min_point[axis] && t < bounds.max_point[axis] {
                    let mut below_extent = bounds.diagonal();
                    let mut above_extent = bounds.diagonal();
                    below_extent[axis] = t - bounds.min_point[axis];
                    above_extent[axis] = bounds.max_point[axis] - t;
                    let area = |e: crate::math::Vector3| -> Float {
                        2.0 * (e[other_axes[0]] * e[other_axes[1]]
                            + e[other_axes[0]] * e[axis]
                            + e[other_axes[1]] * e[axis])
                    };
                    let p_below = area(below_extent) * inv_total_sa;
                    let p_above = area(above_extent) * inv_total_sa;
                    let eb = if n_below == 0 || n_above == 0 { empty_bonus } else { 0.0 };
                    let cost = traversal_cost
                        + intersection_cost * (1.0 - eb) * (p_below * n_below as Float + p_above * n_above as Float);
                    if local_best.map_or(true, |(_, c)| cost < c) {
                        local_best = Some((t, cost));
                    }
                }
                if edge.kind == EdgeType::Start {
                    n_below += 1;
                }
            }

            if let Some((t, cost)) = local_best {
                if best.map_or(true, |(_, _, c, _)| cost < c) {
                    best = Some((axis, t, cost, 0.0));
                }
                break;
            }
            axis = (axis + 1) % 3;
        }

        match best {
            Some((axis, split, cost, _)) => {
                let mut bad_refines = bad_refines;
                if cost > old_cost {
                    bad_refines += 1;
                }
                if (cost > 4.0 * old_cost && (faces.len() as u32) < self.settings.max_leaf_size.max(4))
                    || bad_refines == 3
                {
                    self.nodes[node_index as usize] = self.make_leaf(bounds, faces);
                    self.add_progress(effort);
                    return node_index;
                }

                let mut below = Vec::new();
                let mut above = Vec::new();
                for &f in faces {
                    let b = self.bounds[f as usize];
                    if b.min_point[axis] < split {
                        below.push(f);
                    }
                    if b.max_point[axis] > split {
                        above.push(f);
                    }
                }

                let mut below_bounds = bounds;
                below_bounds.max_point[axis] = split;
                let mut above_bounds = bounds;
                above_bounds.min_point[axis] = split;

                let total = (below.len() + above.len()).max(1) as Float;
                let below_effort = effort * (below.len() as Float / total);
                let above_effort = effort - below_effort;

                // Below child occupies the next slot; recursing into it
                // first keeps that invariant true.
                self.build_node(below_bounds, &below, depth_remaining - 1, bad_refines, below_effort);
                let above_child = self.build_node(above_bounds, &above, depth_remaining - 1, bad_refines, above_effort);

                self.nodes[node_index as usize] = KdNode::Interior {
                    axis: axis as u8,
                    split,
                    above_child,
                };
                node_index
            }
            None => {
                self.nodes[node_index as usize] = self.make_leaf(bounds, faces);
                self.add_progress(effort);
                node_index
            }
        }
    }

    fn add_progress(&self, delta: Float) {
        let mut current = self.progress.load(Ordering::Relaxed);
        loop {
            let updated = (f32::from_bits(current) + delta as f32).to_bits();
            match self
                .progress
                .compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Filters `faces` down to those whose actual geometry (not just
    /// its AABB) overlaps `bounds`, via the separating-axis test
    /// (§4.1.a). The above/below partition during the build is
    /// AABB-based and conservative; this tightens the final leaf
    /// contents so a ray doesn't test faces that only the bounding box,
    /// and not the triangle itself, crosses into this leaf's region.
    fn make_leaf(&mut self, bounds: Aabb, faces: &[u32]) -> KdNode {
        let filtered: Vec<u32> = faces
            .iter()
            .copied()
            .filter(|&f| self.face_overlaps(bounds, f))
            .collect();

        if filtered.len() == 1 {
            KdNode::Leaf { faces: LeafFaces::Single(filtered[0]) }
        } else {
            let offset = self.face_indices.len() as u32;
            self.face_indices.extend_from_slice(&filtered);
            KdNode::Leaf {
                faces: LeafFaces::Range { offset, count: filtered.len() as u32 },
            }
        }
    }

    fn face_overlaps(&self, bounds: Aabb, local_index: u32) -> bool {
        match self.faces[local_index as usize] {
            FaceRef::Triangle(i) => {
                let t = &self.mesh.triangles[i as usize];
                let v0 = self.mesh.vertices[t.indices[0] as usize];
                let v1 = self.mesh.vertices[t.indices[1] as usize];
                let v2 = self.mesh.vertices[t.indices[2] as usize];
                bounds.overlaps_triangle(v0, v1, v2)
            }
            FaceRef::Quad(i) => {
                let q = &self.mesh.quads[i as usize];
                let u = self.mesh.vertices[q.indices[0] as usize];
                let v = self.mesh.vertices[q.indices[1] as usize];
                let w = self.mesh.vertices[q.indices[2] as usize];
                let r = self.mesh.vertices[q.indices[3] as usize];
                bounds.overlaps_triangle(u, v, w) || bounds.overlaps_triangle(v, w, r)
            }
        }
    }
}

fn order_key(kind: EdgeType) -> u8 {
    match kind {
        EdgeType::Start => 0,
        EdgeType::End => 1,
    }
}
