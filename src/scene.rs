//! Scene and light graph (§4, component J): an ordered list of scene
//! objects (each carrying its own acceleration structure) plus an
//! ordered list of lights, queried by the integrator for closest-hit,
//! occlusion, and direct-light sampling.

use crate::accel::kdtree::BuildSettings;
use crate::accel::KdTree;
use crate::geometry::intersection::resolve;
use crate::geometry::{IntersectionPoint, LightRay, Mesh};
use crate::material::{MaterialId, MaterialLibrary};
use crate::math::{uniform_sample_sphere, Float, Vector3};
use crate::spectrum::RgbSpectrum;

/// Geometry plus its acceleration structure (§3 `Scene`: "ordered list
/// of scene objects"). `default_material` is carried for an external
/// loader to fall back on when a face's material index is unresolved;
/// nothing in this crate's intersection path consults it, since every
/// face's `aux.material` is already resolved by the time it reaches a
/// `Mesh`.
pub struct SceneObject {
    pub mesh: Mesh,
    pub kdtree: KdTree,
    pub default_material: MaterialId,
}

impl SceneObject {
    pub fn new(mesh: Mesh, default_material: MaterialId) -> Self {
        let kdtree = KdTree::build(&mesh, BuildSettings::default());
        SceneObject { mesh, kdtree, default_material }
    }
}

/// A spherical emissive light (§4.5, §8 E6/E9-style scenarios):
/// emits `radiance` uniformly from every point on its surface, in
/// every outward direction.
pub struct SphereLight {
    pub center: Vector3,
    pub radius: Float,
    pub radiance: RgbSpectrum,
}

pub enum Light {
    Sphere(SphereLight),
}

/// One direct-lighting sample drawn from a light (§4.5 step 4, "light
/// sample leg").
pub struct LightSample {
    pub wi: Vector3,
    pub li: RgbSpectrum,
    pub pdf: Float,
    pub t_max: Float,
}

impl Light {
    /// Draws `(wi, Li, pdf, tMax)` toward the light as seen from `p`
    /// (§4.5). Returns `None` when the light subtends zero solid
    /// angle from `p` (degenerate: `p` inside the sphere).
    pub fn sample_li(&self, p: Vector3, u: (Float, Float)) -> Option<LightSample> {
        match self {
            Light::Sphere(light) => {
                let to_center = light.center - p;
                let dc2 = to_center.length_squared();
                if dc2 <= light.radius * light.radius {
                    return None;
                }
                let dc = dc2.sqrt();
                let sin_theta_max2 = (light.radius * light.radius / dc2).min(1.0);
                let cos_theta_max = (1.0 - sin_theta_max2).max(0.0).sqrt();
                let cos_theta = 1.0 - u.0 * (1.0 - cos_theta_max);
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                let phi = 2.0 * std::f32::consts::PI * u.1;

                let z = to_center / dc;
                let (x, y) = orthonormal_basis(z);
                let wi = (x * (sin_theta * phi.cos()) + y * (sin_theta * phi.sin()) + z * cos_theta).normalized();

                let pdf = 1.0 / (2.0 * std::f32::consts::PI * (1.0 - cos_theta_max));
                if pdf <= 0.0 || !pdf.is_finite() {
                    return None;
                }

                let t_max = sphere_hit_distance(p, wi, light.center, light.radius)?;
                Some(LightSample { wi, li: light.radiance, pdf, t_max: t_max * 1.0001 })
            }
        }
    }

    /// Density of `sample_li` drawing direction `wi` from `p`, used by
    /// the BSDF sample leg of the MIS estimator (§4.5). Zero if `wi`
    /// does not actually reach the light.
    pub fn pdf_li(&self, p: Vector3, wi: Vector3) -> Float {
        match self {
            Light::Sphere(light) => {
                let to_center = light.center - p;
                let dc2 = to_center.length_squared();
                if dc2 <= light.radius * light.radius {
                    return 0.0;
                }
                if sphere_hit_distance(p, wi, light.center, light.radius).is_none() {
                    return 0.0;
                }
                let sin_theta_max2 = (light.radius * light.radius / dc2).min(1.0);
                let cos_theta_max = (1.0 - sin_theta_max2).max(0.0).sqrt();
                1.0 / (2.0 * std::f32::consts::PI * (1.0 - cos_theta_max).max(1e-7))
            }
        }
    }

    /// Analytic ray intersection against the light's own shape, used
    /// for implicit (primary-ray or specular-bounce) hits (§4.5 step
    /// 2-3).
    pub fn intersect(&self, ray: &LightRay, t_max: Float) -> Option<Float> {
        match self {
            Light::Sphere(light) => sphere_hit_distance(ray.o, ray.d, light.center, light.radius)
                .filter(|&t| t < t_max),
        }
    }

    pub fn emitted_radiance(&self) -> RgbSpectrum {
        match self {
            Light::Sphere(light) => light.radiance,
        }
    }

    /// A uniform point on the light's surface, used by callers that
    /// need a concrete sample point rather than a solid-angle
    /// direction (e.g. bidirectional extensions; unused by the
    /// one-sample MIS estimator itself).
    pub fn sample_point(&self, u: (Float, Float)) -> Vector3 {
        match self {
            Light::Sphere(light) => light.center + uniform_sample_sphere(u) * light.radius,
        }
    }
}

fn orthonormal_basis(z: Vector3) -> (Vector3, Vector3) {
    let sign = if z.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + z.z);
    let b = z.x * z.y * a;
    let x = Vector3::new(1.0 + sign * z.x * z.x * a, sign * b, -sign * z.x);
    let y = Vector3::new(b, sign + z.y * z.y * a, -z.y);
    (x, y)
}

fn sphere_hit_distance(o: Vector3, d: Vector3, center: Vector3, radius: Float) -> Option<Float> {
    let oc = o - center;
    let a = d.length_squared();
    let b = 2.0 * oc.dot(d);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t0 = (-b - sqrt_disc) / (2.0 * a);
    let t1 = (-b + sqrt_disc) / (2.0 * a);
    let eps = 1e-4;
    if t0 > eps {
        Some(t0)
    } else if t1 > eps {
        Some(t1)
    } else {
        None
    }
}

/// The resolved result of [`Scene::intersect`]: a surface interaction
/// plus the material it belongs to.
pub struct SceneHit {
    pub intersection: IntersectionPoint,
    pub material: MaterialId,
}

pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub materials: MaterialLibrary,
    pub background: RgbSpectrum,
}

impl Scene {
    pub fn new(materials: MaterialLibrary, background: RgbSpectrum) -> Self {
        Scene { objects: Vec::new(), lights: Vec::new(), materials, background }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Closest hit across every scene object (§4.5 step 1b).
    pub fn intersect(&self, ray: &LightRay, t_min: Float, t_max: Float) -> Option<SceneHit> {
        let mut closest_t = t_max;
        let mut best: Option<SceneHit> = None;
        for object in &self.objects {
            if let Some(hit) = object.kdtree.closest_hit(&object.mesh, ray, t_min, closest_t) {
                if hit.t < closest_t {
                    closest_t = hit.t;
                    let intersection = resolve(&object.mesh, &hit);
                    let material = MaterialId(intersection.material);
                    best = Some(SceneHit { intersection, material });
                }
            }
        }
        best
    }

    /// Any-hit query across every scene object (§4.5 shadow rays).
    pub fn occluded(&self, ray: &LightRay, t_min: Float, t_max: Float) -> bool {
        self.objects.iter().any(|object| object.kdtree.occluded(&object.mesh, ray, t_min, t_max))
    }

    /// Nearest light the ray hits directly, if any (§4.5 step 1a).
    pub fn intersect_lights(&self, ray: &LightRay, t_max: Float) -> Option<(usize, Float)> {
        let mut best: Option<(usize, Float)> = None;
        let mut closest_t = t_max;
        for (i, light) in self.lights.iter().enumerate() {
            if let Some(t) = light.intersect(ray, closest_t) {
                closest_t = t;
                best = Some((i, t));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_light_sample_points_toward_the_light() {
        let light = Light::Sphere(SphereLight {
            center: Vector3::new(0.0, 5.0, 0.0),
            radius: 1.0,
            radiance: RgbSpectrum::gray(1.0),
        });
        let p = Vector3::ZERO;
        let sample = light.sample_li(p, (0.2, 0.6)).unwrap();
        assert!(sample.wi.y > 0.0);
        assert!(sample.pdf > 0.0);
    }

    #[test]
    fn pdf_li_is_zero_for_direction_missing_the_light() {
        let light = Light::Sphere(SphereLight {
            center: Vector3::new(0.0, 5.0, 0.0),
            radius: 1.0,
            radiance: RgbSpectrum::gray(1.0),
        });
        let p = Vector3::ZERO;
        let away = Vector3::new(0.0, -1.0, 0.0);
        assert_eq!(light.pdf_li(p, away), 0.0);
    }

    #[test]
    fn direct_ray_at_sphere_light_reports_hit() {
        let light = Light::Sphere(SphereLight {
            center: Vector3::new(0.0, 0.0, -5.0),
            radius: 1.0,
            radiance: RgbSpectrum::gray(1.0),
        });
        let ray = LightRay::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let t = light.intersect(&ray, Float::INFINITY).unwrap();
        assert!((t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn empty_scene_has_no_intersection() {
        let scene = Scene::new(MaterialLibrary::new(), RgbSpectrum::ZERO);
        let ray = LightRay::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray, 1e-4, Float::INFINITY).is_none());
        assert!(!scene.occluded(&ray, 1e-4, Float::INFINITY));
    }
}
