use crate::math::{Float, Vector3};

use super::ray::LightRay;

/// Axis-aligned bounding box. `Aabb::EMPTY` is the identity for
/// [`Aabb::union`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_point: Vector3,
    pub max_point: Vector3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min_point: Vector3 {
            x: Float::INFINITY,
            y: Float::INFINITY,
            z: Float::INFINITY,
        },
        max_point: Vector3 {
            x: Float::NEG_INFINITY,
            y: Float::NEG_INFINITY,
            z: Float::NEG_INFINITY,
        },
    };

    pub fn new(min_point: Vector3, max_point: Vector3) -> Self {
        Aabb { min_point, max_point }
    }

    pub fn from_points(points: &[Vector3]) -> Self {
        points.iter().fold(Aabb::EMPTY, |acc, &p| acc.union_point(p))
    }

    pub fn union_point(self, p: Vector3) -> Aabb {
        Aabb::new(self.min_point.min(p), self.max_point.max(p))
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb::new(
            self.min_point.min(other.min_point),
            self.max_point.max(other.max_point),
        )
    }

    pub fn diagonal(self) -> Vector3 {
        self.max_point - self.min_point
    }

    pub fn surface_area(self) -> Float {
        let d = self.diagonal();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            return 0.0;
        }
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    pub fn centroid(self) -> Vector3 {
        (self.min_point + self.max_point) * 0.5
    }

    pub fn maximum_extent(self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Slab test; returns the ray-parameter entry/exit pair clipped to
    /// `[t_min, t_max]`, or `None` on a miss.
    pub fn intersect_p(&self, ray: &LightRay, t_min: Float, t_max: Float) -> Option<(Float, Float)> {
        let mut t0 = t_min;
        let mut t1 = t_max;
        for axis in 0..3 {
            let inv_d = ray.inv_d[axis];
            let mut near = (self.min_point[axis] - ray.o[axis]) * inv_d;
            let mut far = (self.max_point[axis] - ray.o[axis]) * inv_d;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = if near > t0 { near } else { t0 };
            t1 = if far < t1 { far } else { t1 };
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }

    /// Separating-axis test between this box and a triangle (§4.1.a
    /// "leaf construction"): box axes, the face normal, and the nine
    /// edge-cross-box-axis axes (Akenine-Möller's `t_c_intersect_tri`).
    /// A conservative AABB overlap can be true while the triangle
    /// itself never actually crosses the box, so this is a tighter
    /// filter applied only at leaf time, after the AABB-based
    /// above/below partition during the build.
    pub fn overlaps_triangle(&self, v0: Vector3, v1: Vector3, v2: Vector3) -> bool {
        let center = self.centroid();
        let half = self.diagonal() * 0.5;
        let p0 = v0 - center;
        let p1 = v1 - center;
        let p2 = v2 - center;

        // Box face normals: equivalent to an AABB-vs-AABB overlap test
        // on each axis independently.
        for axis in 0..3 {
            let min_p = p0[axis].min(p1[axis]).min(p2[axis]);
            let max_p = p0[axis].max(p1[axis]).max(p2[axis]);
            if min_p > half[axis] || max_p < -half[axis] {
                return false;
            }
        }

        let e0 = p1 - p0;
        let e1 = p2 - p1;
        let e2 = p0 - p2;

        // The triangle's own face plane.
        let normal = e0.cross(e1);
        if !plane_overlaps_box(normal, p0, half) {
            return false;
        }

        // The nine cross products of each triangle edge with each box
        // axis.
        let box_axes = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        for edge in [e0, e1, e2] {
            for box_axis in box_axes {
                let axis = edge.cross(box_axis);
                if axis.length_squared() < 1e-20 {
                    continue;
                }
                if !axis_separates(axis, p0, p1, p2, half) {
                    return false;
                }
            }
        }

        true
    }
}

fn axis_separates(axis: Vector3, p0: Vector3, p1: Vector3, p2: Vector3, half: Vector3) -> bool {
    let s0 = p0.dot(axis);
    let s1 = p1.dot(axis);
    let s2 = p2.dot(axis);
    let min_p = s0.min(s1).min(s2);
    let max_p = s0.max(s1).max(s2);
    let r = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
    !(min_p > r || max_p < -r)
}

fn plane_overlaps_box(normal: Vector3, vert: Vector3, half: Vector3) -> bool {
    let mut vmin = Vector3::ZERO;
    let mut vmax = Vector3::ZERO;
    for axis in 0..3 {
        let v = vert[axis];
        if normal[axis] > 0.0 {
            vmin[axis] = -half[axis] - v;
            vmax[axis] = half[axis] - v;
        } else {
            vmin[axis] = half[axis] - v;
            vmax[axis] = -half[axis] - v;
        }
    }
    if normal.dot(vmin) > 0.0 {
        return false;
    }
    normal.dot(vmax) >= 0.0
}

impl std::ops::Index<usize> for Aabb {
    type Output = Vector3;
    fn index(&self, i: usize) -> &Vector3 {
        match i {
            0 => &self.min_point,
            1 => &self.max_point,
            _ => panic!("Aabb index out of range: {i}"),
        }
    }
}
