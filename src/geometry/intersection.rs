use crate::math::{Float, Vector2, Vector3};

use super::mesh::{FaceRef, Mesh};
use super::ray::LightRay;

const FACE_OFFSET_EPSILON: Float = 1e-4;

/// Which medium the ray was travelling through when it hit the
/// surface, decided by which side of the face the ray approached from
/// (§4.3, fine intersection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// The cheap result of an accelerator query: enough to know *that* and
/// *where* (in barycentric terms) a ray hit, without yet paying for
/// normal/UV interpolation.
#[derive(Debug, Clone, Copy)]
pub struct CoarseIntersection {
    pub face: FaceRef,
    pub subdivision_hint: u8,
    pub barycentric: (Float, Float, Float),
    pub t: Float,
}

/// The fully resolved surface interaction, built from a
/// [`CoarseIntersection`] by [`resolve`].
#[derive(Debug, Clone, Copy)]
pub struct IntersectionPoint {
    pub position: Vector3,
    pub inside: Vector3,
    pub outside: Vector3,
    pub face_normal: Vector3,
    pub shading_normal: Vector3,
    pub uv: Vector2,
    pub material: u32,
    pub direction: Direction,
}

/// Watertight ray-triangle intersection (Woop et al.), §4.3 steps 1-7.
/// `v0, v1, v2` are world-space vertex positions.
pub fn intersect_triangle(ray: &LightRay, v0: Vector3, v1: Vector3, v2: Vector3, t_max: Float) -> Option<(Float, Float, Float, Float)> {
    let p0 = v0 - ray.o;
    let p1 = v1 - ray.o;
    let p2 = v2 - ray.o;

    let p0 = p0.permute(ray.kx, ray.ky, ray.kz);
    let p1 = p1.permute(ray.kx, ray.ky, ray.kz);
    let p2 = p2.permute(ray.kx, ray.ky, ray.kz);

    let p0 = Vector3::new(p0.x + ray.shear.x * p0.z, p0.y + ray.shear.y * p0.z, p0.z);
    let p1 = Vector3::new(p1.x + ray.shear.x * p1.z, p1.y + ray.shear.y * p1.z, p1.z);
    let p2 = Vector3::new(p2.x + ray.shear.x * p2.z, p2.y + ray.shear.y * p2.z, p2.z);

    let e0 = p1.x * p2.y - p1.y * p2.x;
    let e1 = p2.x * p0.y - p2.y * p0.x;
    let e2 = p0.x * p1.y - p0.y * p1.x;

    if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
        return None;
    }
    let det = e0 + e1 + e2;
    if det == 0.0 {
        return None;
    }

    let p0z = p0.z * ray.shear.z;
    let p1z = p1.z * ray.shear.z;
    let p2z = p2.z * ray.shear.z;
    let t_scaled = e0 * p0z + e1 * p1z + e2 * p2z;

    if det < 0.0 && (t_scaled >= 0.0 || t_scaled < t_max * det) {
        return None;
    } else if det > 0.0 && (t_scaled <= 0.0 || t_scaled > t_max * det) {
        return None;
    }

    let inv_det = 1.0 / det;
    let b0 = e0 * inv_det;
    let b1 = e1 * inv_det;
    let b2 = e2 * inv_det;
    let t = t_scaled * inv_det;
    Some((b0, b1, b2, t))
}

/// Watertight quad intersection: splits the quad `(u, v, w, r)` into
/// sub-triangles `{u, v, w}` (hint 0) and `{v, w, r}` (hint 1) and tests
/// the one consistent with the shared-diagonal edge sign (§4.3).
pub fn intersect_quad(
    ray: &LightRay,
    u: Vector3,
    v: Vector3,
    w: Vector3,
    r: Vector3,
    t_max: Float,
) -> Option<(u8, Float, Float, Float, Float)> {
    if let Some((b0, b1, b2, t)) = intersect_triangle(ray, u, v, w, t_max) {
        return Some((0, b0, b1, b2, t));
    }
    if let Some((b0, b1, b2, t)) = intersect_triangle(ray, v, w, r, t_max) {
        return Some((1, b0, b1, b2, t));
    }
    None
}

/// Resolves a coarse hit into normals, UVs, offset points, and the
/// incoming-medium direction tag (§4.3, fine intersection).
pub fn resolve(mesh: &Mesh, hit: &CoarseIntersection) -> IntersectionPoint {
    let (corners, aux) = match hit.face {
        FaceRef::Triangle(i) => {
            let t = &mesh.triangles[i as usize];
            ([t.indices[0], t.indices[1], t.indices[2], t.indices[0]], t.aux)
        }
        FaceRef::Quad(i) => {
            let q = &mesh.quads[i as usize];
            (q.indices, q.aux)
        }
    };

    // Select which three of the (up to four) corners make up the hit
    // sub-triangle.
    let (i0, i1, i2) = match hit.face {
        FaceRef::Triangle(_) => (0usize, 1usize, 2usize),
        FaceRef::Quad(_) => {
            if hit.subdivision_hint == 0 {
                (0, 1, 2)
            } else {
                (1, 2, 3)
            }
        }
    };

    let p0 = mesh.vertices[corners[i0] as usize];
    let p1 = mesh.vertices[corners[i1] as usize];
    let p2 = mesh.vertices[corners[i2] as usize];

    let (b0, b1, b2) = hit.barycentric;

    let mut face_normal = (p1 - p0).cross(p2 - p0).normalized();

    let shading_normal = if mesh.normals.is_empty() {
        face_normal
    } else {
        let n0 = mesh.normals[aux.normal_indices[i0] as usize];
        let n1 = mesh.normals[aux.normal_indices[i1] as usize];
        let n2 = mesh.normals[aux.normal_indices[i2] as usize];
        (n0 * b0 + n1 * b1 + n2 * b2).normalized()
    };

    let uv = if mesh.uvs.is_empty() {
        Vector2::new(0.0, 0.0)
    } else {
        let uv0 = mesh.uvs[aux.uv_indices[i0] as usize];
        let uv1 = mesh.uvs[aux.uv_indices[i1] as usize];
        let uv2 = mesh.uvs[aux.uv_indices[i2] as usize];
        uv0 * b0 + uv1 * b1 + uv2 * b2
    };

    // Project the parametric hit point back onto the face plane to
    // eliminate accumulated walk-off error, then the ray direction
    // decides which side the offset points land on.
    let raw_position = p0 * b0 + p1 * b1 + p2 * b2;
    let d_to_plane = (raw_position - p0).dot(face_normal);
    let position = raw_position - face_normal * d_to_plane;

    let mut shading_normal = shading_normal;
    let direction;
    if face_normal.dot(ray.d) > 0.0 {
        face_normal = -face_normal;
        shading_normal = -shading_normal;
        direction = Direction::Out;
    } else {
        direction = Direction::In;
    }

    let (inside, outside) = if direction == Direction::In {
        (position - face_normal * FACE_OFFSET_EPSILON, position + face_normal * FACE_OFFSET_EPSILON)
    } else {
        (position + face_normal * FACE_OFFSET_EPSILON, position - face_normal * FACE_OFFSET_EPSILON)
    };

    IntersectionPoint {
        position,
        inside,
        outside,
        face_normal,
        shading_normal,
        uv,
        material: aux.material,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e1_hits_unit_triangle() {
        let ray = LightRay::new(Vector3::new(0.5, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = intersect_triangle(
            &ray,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Float::INFINITY,
        );
        let (_, _, _, t) = hit.expect("ray should hit the triangle");
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn e2_misses_far_triangle() {
        let ray = LightRay::new(Vector3::new(5.5, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0));
        let hit = intersect_triangle(
            &ray,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Float::INFINITY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn reciprocal_ray_direction_hits_at_same_t() {
        let v0 = Vector3::new(0.0, 0.0, 0.0);
        let v1 = Vector3::new(1.0, 0.0, 0.0);
        let v2 = Vector3::new(0.0, 1.0, 0.0);
        let p = Vector3::new(0.25, 0.25, 0.0);
        let origin_a = p + Vector3::new(0.0, 0.0, 2.0);
        let origin_b = p - Vector3::new(0.0, 0.0, 2.0);
        let ray_a = LightRay::new(origin_a, Vector3::new(0.0, 0.0, -1.0));
        let ray_b = LightRay::new(origin_b, Vector3::new(0.0, 0.0, 1.0));
        let (_, _, _, t_a) = intersect_triangle(&ray_a, v0, v1, v2, Float::INFINITY).unwrap();
        let (_, _, _, t_b) = intersect_triangle(&ray_b, v0, v1, v2, Float::INFINITY).unwrap();
        assert!((t_a - 2.0).abs() < 1e-4);
        assert!((t_b - 2.0).abs() < 1e-4);
    }

    #[test]
    fn e4_plane_quad_reports_subdivision_per_diagonal_side() {
        // A single quad over the unit square in the xz-plane (§8 E4,
        // testable property 3), split along the diagonal from
        // (1,0,1) to (-1,0,-1): sub-triangle 0 is the half containing
        // (-1,0,1), sub-triangle 1 is the half containing (1,0,-1).
        // u,v,w,r are built the way `Mesh::try_merge_pair` builds a
        // merged quad: v,w are the shared diagonal, u is the first
        // triangle's apex, r is the second triangle's apex.
        let u = Vector3::new(-1.0, 0.0, 1.0);
        let v = Vector3::new(1.0, 0.0, 1.0);
        let w = Vector3::new(-1.0, 0.0, -1.0);
        let r = Vector3::new(1.0, 0.0, -1.0);

        let down = Vector3::new(0.0, -1.0, 0.0);
        let up = Vector3::new(0.0, 1.0, 0.0);

        let ray1 = LightRay::new(Vector3::new(-0.1, 1.0, 0.1), down);
        let ray2 = LightRay::new(Vector3::new(0.1, 1.0, -0.1), down);
        let ray1_up = LightRay::new(Vector3::new(-0.1, -1.0, 0.1), up);
        let ray2_up = LightRay::new(Vector3::new(0.1, -1.0, -0.1), up);
        let ray_out = LightRay::new(Vector3::new(2.0, -1.0, 2.0), up);

        let hit1 = intersect_quad(&ray1, u, v, w, r, Float::INFINITY).expect("ray1 should hit the quad");
        assert_eq!(hit1.0, 0);

        let hit2 = intersect_quad(&ray2, u, v, w, r, Float::INFINITY).expect("ray2 should hit the quad");
        assert_eq!(hit2.0, 1);

        let hit1_up = intersect_quad(&ray1_up, u, v, w, r, Float::INFINITY).expect("ray1_up should hit the quad");
        assert_eq!(hit1_up.0, 0);

        let hit2_up = intersect_quad(&ray2_up, u, v, w, r, Float::INFINITY).expect("ray2_up should hit the quad");
        assert_eq!(hit2_up.0, 1);

        assert!(intersect_quad(&ray_out, u, v, w, r, Float::INFINITY).is_none());
    }

    #[test]
    fn e3_quad_corner_ray_hits() {
        let u = Vector3::new(1.0, 0.0, 1.0);
        let v = Vector3::new(-1.0, 0.0, 1.0);
        let w = Vector3::new(-1.0, 0.0, -1.0);
        let r = Vector3::new(1.0, 0.0, -1.0);
        let ray = LightRay::new(Vector3::new(1.0, 1.0, 1.0), Vector3::new(0.0, -1.0, 0.0));
        let hit = intersect_quad(&ray, u, v, w, r, Float::INFINITY);
        let (_, _, _, _, t) = hit.expect("corner ray should hit the quad");
        assert!((t - 1.0).abs() < 1e-4);
    }
}
