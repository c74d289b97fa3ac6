//! Path integrator (§4.5): the per-sample worker loop. Traces one ray
//! path against the scene, accumulating throughput-weighted radiance
//! via BSDF-sampled bounces and one-light multiple-importance-sampled
//! direct illumination.

use crate::bsdf::RAY_FLAG_DELTA;
use crate::geometry::{Direction, LightRay};
use crate::material::TextureTable;
use crate::math::{power_heuristic, Float};
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::spectrum::{CoefficientSpectrum, RgbSpectrum};

const SHADOW_EPSILON: Float = 1e-4;

#[derive(Debug, Clone, Copy)]
pub struct IntegratorSettings {
    pub max_depth: u32,
    pub max_depth_with_transmission: u32,
    pub direct_light_sampling: bool,
    pub background: RgbSpectrum,
}

impl IntegratorSettings {
    pub fn from_config(config: &crate::config::RenderConfig) -> Self {
        IntegratorSettings {
            max_depth: config.max_depth,
            max_depth_with_transmission: config.max_depth_with_transmission,
            direct_light_sampling: config.direct_light_sampling,
            background: RgbSpectrum::new(config.background[0], config.background[1], config.background[2]),
        }
    }
}

pub struct PathIntegrator {
    settings: IntegratorSettings,
}

impl PathIntegrator {
    pub fn new(settings: IntegratorSettings) -> Self {
        PathIntegrator { settings }
    }

    /// Traces one camera ray to completion, returning its estimated
    /// radiance (§4.5).
    pub fn li(&self, mut ray: LightRay, scene: &Scene, textures: &TextureTable, sampler: &mut Sampler) -> RgbSpectrum {
        let mut l = RgbSpectrum::ZERO;
        let mut beta = RgbSpectrum::gray(1.0);
        let mut depth: u32 = 0;
        let mut specular_bounce = true;
        let mut max_depth = self.settings.max_depth;

        loop {
            if depth >= max_depth {
                break;
            }

            let light_hit = scene.intersect_lights(&ray, Float::INFINITY);
            let scene_hit = scene.intersect(&ray, SHADOW_EPSILON, Float::INFINITY);

            let light_t = light_hit.map(|(_, t)| t).unwrap_or(Float::INFINITY);
            let scene_t = scene_hit.as_ref().map(|h| (h.intersection.position - ray.o).length()).unwrap_or(Float::INFINITY);

            if light_t < scene_t {
                // Step 2: hitting a light directly only contributes
                // when unweighted by MIS (primary ray, after a delta
                // bounce, or when direct sampling is disabled).
                let (light_index, _) = light_hit.unwrap();
                if depth == 0 || specular_bounce || !self.settings.direct_light_sampling {
                    l += beta * scene.lights[light_index].emitted_radiance();
                }
                break;
            }

            let Some(hit) = scene_hit else {
                l += beta * self.settings.background;
                break;
            };

            let material = scene.materials.get(hit.material);
            l += beta * material.emission;

            let wi_world = -ray.d;

            if self.settings.direct_light_sampling && !scene.lights.is_empty() {
                l += beta * self.uniform_sample_one_light(scene, textures, &material.bsdf, &hit.intersection, wi_world, sampler);
            }

            let Some(sample) = material.bsdf.sample_f(&hit.intersection, sampler.next_2d(), wi_world, textures) else {
                break;
            };
            if sample.pdf <= 0.0 || sample.f.is_black() || !sample.f.c.iter().all(|c| c.is_finite()) {
                break;
            }

            let cos = sample.wo.dot(hit.intersection.shading_normal).abs();
            beta = beta * sample.f * (cos / sample.pdf);
            specular_bounce = sample.flags & RAY_FLAG_DELTA != 0;

            let origin = if hit.intersection.direction == Direction::In {
                if sample.wo.dot(hit.intersection.face_normal) < 0.0 {
                    hit.intersection.inside
                } else {
                    hit.intersection.outside
                }
            } else if sample.wo.dot(hit.intersection.face_normal) < 0.0 {
                hit.intersection.outside
            } else {
                hit.intersection.inside
            };
            ray = LightRay::new(origin, sample.wo);

            use crate::bsdf::RAY_FLAG_TRANSMISSION;
            if sample.flags & RAY_FLAG_TRANSMISSION != 0 {
                max_depth = max_depth.max(self.settings.max_depth_with_transmission);
            }

            depth += 1;

            // Russian roulette after the third bounce (§4.5 step 6).
            if depth > 3 {
                let q = (1.0 - beta.max_component()).max(0.05);
                if sampler.next_1d() < q {
                    break;
                }
                beta = beta / (1.0 - q);
            }
        }

        l
    }

    fn uniform_sample_one_light(
        &self,
        scene: &Scene,
        textures: &TextureTable,
        bsdf: &crate::bsdf::Bsdf,
        surf: &crate::geometry::IntersectionPoint,
        wi_world: crate::math::Vector3,
        sampler: &mut Sampler,
    ) -> RgbSpectrum {
        let n_lights = scene.lights.len();
        let index = ((sampler.next_1d() * n_lights as Float) as usize).min(n_lights - 1);
        let light = &scene.lights[index];
        let n_lights = n_lights as Float;

        let mut contribution = RgbSpectrum::ZERO;

        // Light sample leg.
        if let Some(light_sample) = light.sample_li(surf.position, sampler.next_2d()) {
            if light_sample.pdf > 0.0 && !light_sample.li.is_black() {
                let f = bsdf.f(surf, wi_world, light_sample.wi, textures);
                if !f.is_black() {
                    let shadow_origin = shadow_ray_origin(surf, light_sample.wi);
                    let shadow_ray = crate::geometry::LightRay::new(shadow_origin, light_sample.wi);
                    if !scene.occluded(&shadow_ray, SHADOW_EPSILON, light_sample.t_max - SHADOW_EPSILON) {
                        let pdf_bsdf = bsdf.pdf(surf, wi_world, light_sample.wi);
                        let weight = power_heuristic(light_sample.pdf, pdf_bsdf);
                        let cos = light_sample.wi.dot(surf.shading_normal).abs();
                        contribution += f * light_sample.li * (weight * cos / light_sample.pdf);
                    }
                }
            }
        }

        // BSDF sample leg.
        if let Some(bsdf_sample) = bsdf.sample_f(surf, sampler.next_2d(), wi_world, textures) {
            if bsdf_sample.flags & RAY_FLAG_DELTA == 0 && bsdf_sample.pdf > 0.0 {
                let shadow_origin = shadow_ray_origin(surf, bsdf_sample.wo);
                let shadow_ray = crate::geometry::LightRay::new(shadow_origin, bsdf_sample.wo);
                if let Some(t_light) = light.intersect(&shadow_ray, Float::INFINITY) {
                    if !scene.occluded(&shadow_ray, SHADOW_EPSILON, t_light - SHADOW_EPSILON) {
                        let pdf_light = light.pdf_li(surf.position, bsdf_sample.wo);
                        if pdf_light > 0.0 {
                            let weight = power_heuristic(bsdf_sample.pdf, pdf_light);
                            let cos = bsdf_sample.wo.dot(surf.shading_normal).abs();
                            contribution += bsdf_sample.f * light.emitted_radiance() * (weight * cos / bsdf_sample.pdf);
                        }
                    }
                }
            }
        }

        contribution * n_lights
    }
}

fn shadow_ray_origin(surf: &crate::geometry::IntersectionPoint, direction: crate::math::Vector3) -> crate::math::Vector3 {
    if direction.dot(surf.face_normal) < 0.0 {
        surf.inside
    } else {
        surf.outside
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Bsdf;
    use crate::material::{Material, MaterialLibrary, ValueNode};
    use crate::math::rng::Rng;
    use crate::math::Vector3;
    use crate::scene::{Light, Scene, SphereLight};

    #[test]
    fn background_is_returned_when_nothing_is_hit() {
        let materials = MaterialLibrary::new();
        let scene = Scene::new(materials, RgbSpectrum::gray(0.2));
        let settings = IntegratorSettings {
            max_depth: 4,
            max_depth_with_transmission: 16,
            direct_light_sampling: true,
            background: RgbSpectrum::gray(0.2),
        };
        let integrator = PathIntegrator::new(settings);
        let textures = TextureTable::new();
        let mut sampler = Sampler::new(Rng::from_worker_index(5));
        let ray = LightRay::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let l = integrator.li(ray, &scene, &textures, &mut sampler);
        assert_eq!(l, RgbSpectrum::gray(0.2));
    }

    #[test]
    fn direct_ray_at_light_returns_its_radiance() {
        let materials = MaterialLibrary::new();
        let mut scene = Scene::new(materials, RgbSpectrum::ZERO);
        scene.add_light(Light::Sphere(SphereLight {
            center: Vector3::new(0.0, 0.0, -5.0),
            radius: 1.0,
            radiance: RgbSpectrum::gray(3.0),
        }));
        let settings = IntegratorSettings {
            max_depth: 4,
            max_depth_with_transmission: 16,
            direct_light_sampling: true,
            background: RgbSpectrum::ZERO,
        };
        let integrator = PathIntegrator::new(settings);
        let textures = TextureTable::new();
        let mut sampler = Sampler::new(Rng::from_worker_index(5));
        let ray = LightRay::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let l = integrator.li(ray, &scene, &textures, &mut sampler);
        assert_eq!(l, RgbSpectrum::gray(3.0));
    }

    #[test]
    fn miss_with_no_lights_or_background_contributes_nothing() {
        let materials = MaterialLibrary::new();
        let scene = Scene::new(materials, RgbSpectrum::ZERO);
        let settings = IntegratorSettings {
            max_depth: 4,
            max_depth_with_transmission: 16,
            direct_light_sampling: true,
            background: RgbSpectrum::ZERO,
        };
        let integrator = PathIntegrator::new(settings);
        let textures = TextureTable::new();
        let mut sampler = Sampler::new(Rng::from_worker_index(9));
        let ray = LightRay::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let l = integrator.li(ray, &scene, &textures, &mut sampler);
        assert_eq!(l, RgbSpectrum::ZERO);
    }

    #[test]
    fn lambertian_plane_lit_by_sphere_light_receives_direct_illumination() {
        use crate::geometry::mesh::FaceAux;
        use crate::geometry::Mesh;
        use crate::scene::SceneObject;

        let mut materials = MaterialLibrary::new();
        let red_id = materials
            .insert(Material {
                name: "red_wall".to_string(),
                emission: RgbSpectrum::ZERO,
                bsdf: Bsdf::lambert(ValueNode::constant(RgbSpectrum::new(0.75, 0.1, 0.1))),
            })
            .unwrap();

        let vertices = vec![
            Vector3::new(-4.0, 0.0, -4.0),
            Vector3::new(4.0, 0.0, -4.0),
            Vector3::new(4.0, 0.0, 4.0),
            Vector3::new(-4.0, 0.0, 4.0),
        ];
        let triangle_indices = vec![[0, 1, 2], [0, 2, 3]];
        let triangle_aux = vec![
            FaceAux { normal_indices: [0; 4], uv_indices: [0; 4], material: red_id.0 },
            FaceAux { normal_indices: [0; 4], uv_indices: [0; 4], material: red_id.0 },
        ];
        let mesh = Mesh::from_arrays(vertices, vec![], vec![], triangle_indices, triangle_aux).unwrap();

        let mut scene = Scene::new(materials, RgbSpectrum::ZERO);
        scene.add_object(SceneObject::new(mesh, red_id));
        scene.add_light(Light::Sphere(SphereLight {
            center: Vector3::new(0.0, 5.0, 0.0),
            radius: 0.5,
            radiance: RgbSpectrum::gray(40.0),
        }));

        let settings = IntegratorSettings {
            max_depth: 4,
            max_depth_with_transmission: 16,
            direct_light_sampling: true,
            background: RgbSpectrum::ZERO,
        };
        let integrator = PathIntegrator::new(settings);
        let textures = TextureTable::new();
        let mut sampler = Sampler::new(Rng::from_worker_index(3));
        let ray = LightRay::new(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        let l = integrator.li(ray, &scene, &textures, &mut sampler);

        assert!(l.c.iter().all(|c| c.is_finite()));
        assert!(l.max_component() > 0.0);
    }
}
