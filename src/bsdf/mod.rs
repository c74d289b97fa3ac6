//! The material/BSDF evaluation graph (§4.4): a tagged variant over
//! Lambertian, microfacet reflection/transmission, and bilayer
//! surfaces, each evaluated in a local shading frame. Redesigned from
//! the teacher's `BXDF`/`BSDF` inheritance hierarchy into one enum with
//! no vtable, per §9's guidance on polymorphism via tagged variants.

mod distribution;
mod frame;
mod media;

pub use distribution::MicrofacetDistribution;
pub use frame::Frame;
pub use media::{DielectricMediaInterface, TransportDirection};

use crate::geometry::IntersectionPoint;
use crate::material::ValueNode;
use crate::math::{cosine_sample_hemisphere, Float, Vector3};
use crate::spectrum::{CoefficientSpectrum, RgbSpectrum};

use frame::{abs_cos_theta, cos_theta, same_hemisphere};

/// Which lobes a sampled direction belongs to (§3 `BSDF graph`, §9
/// `RayFlag`/`BxDFType`). Reused verbatim as the bitset a `sampleF`
/// call returns.
pub type RayFlags = u8;
pub const RAY_FLAG_NONE: RayFlags = 0;
pub const RAY_FLAG_REFLECTION: RayFlags = 1 << 0;
pub const RAY_FLAG_TRANSMISSION: RayFlags = 1 << 1;
pub const RAY_FLAG_DELTA: RayFlags = 1 << 2;
pub const RAY_FLAG_DIFFUSE: RayFlags = 1 << 3;

pub struct BsdfSample {
    pub wo: Vector3,
    pub pdf: Float,
    pub flags: RayFlags,
    pub f: RgbSpectrum,
}

#[derive(Debug, Clone)]
pub enum Bsdf {
    Lambert {
        reflectance: ValueNode,
    },
    MicrofacetReflection {
        distribution: MicrofacetDistribution,
        media: Option<DielectricMediaInterface>,
        reflectance: ValueNode,
    },
    MicrofacetTransmission {
        distribution: MicrofacetDistribution,
        media: DielectricMediaInterface,
        reflectance: ValueNode,
    },
    Bilayer {
        coat_distribution: MicrofacetDistribution,
        coat_media: DielectricMediaInterface,
        diffuse: ValueNode,
    },
    PerfectSpecular {
        reflectance: ValueNode,
    },
}

impl Bsdf {
    pub fn lambert(reflectance: ValueNode) -> Bsdf {
        Bsdf::Lambert { reflectance }
    }

    fn reflectance_at(node: &ValueNode, surf: &IntersectionPoint, textures: &crate::material::TextureTable) -> RgbSpectrum {
        node.evaluate(surf.uv, textures)
    }

    /// Importance-samples an outgoing direction (§4.4).
    pub fn sample_f(
        &self,
        surf: &IntersectionPoint,
        u: (Float, Float),
        wi_world: Vector3,
        textures: &crate::material::TextureTable,
    ) -> Option<BsdfSample> {
        let frame = Frame::from_normal(surf.shading_normal);
        let wi = frame.to_local(wi_world);
        if wi.z == 0.0 {
            return None;
        }

        match self {
            Bsdf::Lambert { reflectance } => {
                let mut wo = cosine_sample_hemisphere(u);
                if wi.z < 0.0 {
                    wo.z = -wo.z;
                }
                let pdf = abs_cos_theta(wo) * std::f32::consts::FRAC_1_PI;
                if pdf <= 0.0 {
                    return None;
                }
                let rho = Self::reflectance_at(reflectance, surf, textures);
                let f = rho * std::f32::consts::FRAC_1_PI;
                Some(BsdfSample {
                    wo: frame.to_world(wo),
                    pdf,
                    flags: RAY_FLAG_REFLECTION | RAY_FLAG_DIFFUSE,
                    f,
                })
            }
            Bsdf::MicrofacetReflection { distribution, media, reflectance } => {
                let mut m = distribution.sample_m(u);
                if wi.z < 0.0 {
                    m = -m;
                }
                let wo = wi.reflect(m);
                if !same_hemisphere(wi, wo) {
                    return None;
                }
                let pdf = distribution.pdf(m) / (4.0 * wi.dot(m).abs());
                if pdf <= 0.0 || !pdf.is_finite() {
                    return None;
                }
                let f = microfacet_reflection_f(distribution, media, reflectance, surf, textures, wi, wo, m);
                Some(BsdfSample { wo: frame.to_world(wo), pdf, flags: RAY_FLAG_REFLECTION, f })
            }
            Bsdf::MicrofacetTransmission { distribution, media, reflectance } => {
                let mut m = distribution.sample_m(u);
                if wi.z < 0.0 {
                    m = -m;
                }
                let direction = if wi.z > 0.0 { TransportDirection::In } else { TransportDirection::Out };
                let wo = media.refract(wi, m, direction)?;
                if same_hemisphere(wi, wo) {
                    return None;
                }
                let (f, pdf) = microfacet_transmission_f_pdf(distribution, media, reflectance, surf, textures, wi, wo, m, direction);
                if pdf <= 0.0 || !pdf.is_finite() {
                    return None;
                }
                Some(BsdfSample { wo: frame.to_world(wo), pdf, flags: RAY_FLAG_TRANSMISSION, f })
            }
            Bsdf::Bilayer { coat_distribution, coat_media, diffuse } => {
                let sample_coat = u.0 < 0.5;
                // Re-scale the first coordinate so each branch still
                // gets a uniform [0,1) input.
                let u_branch = if sample_coat { (u.0 * 2.0, u.1) } else { (u.0 * 2.0 - 1.0, u.1) };

                let wo = if sample_coat {
                    let mut m = coat_distribution.sample_m(u_branch);
                    if wi.z < 0.0 {
                        m = -m;
                    }
                    let wo = wi.reflect(m);
                    if !same_hemisphere(wi, wo) {
                        return None;
                    }
                    wo
                } else {
                    let mut wo = cosine_sample_hemisphere(u_branch);
                    if wi.z < 0.0 {
                        wo.z = -wo.z;
                    }
                    wo
                };

                let pdf = bilayer_pdf(coat_distribution, wi, wo);
                if pdf <= 0.0 {
                    return None;
                }
                let f = bilayer_f(coat_distribution, coat_media, diffuse, surf, textures, wi, wo);
                Some(BsdfSample { wo: frame.to_world(wo), pdf, flags: RAY_FLAG_REFLECTION, f })
            }
            Bsdf::PerfectSpecular { reflectance } => {
                let wo = Vector3::new(-wi.x, -wi.y, wi.z);
                let rho = Self::reflectance_at(reflectance, surf, textures);
                let f = rho / abs_cos_theta(wo).max(1e-6);
                Some(BsdfSample {
                    wo: frame.to_world(wo),
                    pdf: 1.0,
                    flags: RAY_FLAG_REFLECTION | RAY_FLAG_DELTA,
                    f,
                })
            }
        }
    }

    /// Evaluates `f(wi, wo)`; zero for purely delta BSDFs (§4.4).
    pub fn f(&self, surf: &IntersectionPoint, wi_world: Vector3, wo_world: Vector3, textures: &crate::material::TextureTable) -> RgbSpectrum {
        let frame = Frame::from_normal(surf.shading_normal);
        let wi = frame.to_local(wi_world);
        let wo = frame.to_local(wo_world);

        match self {
            Bsdf::Lambert { reflectance } => {
                if !same_hemisphere(wi, wo) {
                    return RgbSpectrum::ZERO;
                }
                Self::reflectance_at(reflectance, surf, textures) * std::f32::consts::FRAC_1_PI
            }
            Bsdf::MicrofacetReflection { distribution, media, reflectance } => {
                if !same_hemisphere(wi, wo) {
                    return RgbSpectrum::ZERO;
                }
                let m = (wi + wo).normalized();
                microfacet_reflection_f(distribution, media, reflectance, surf, textures, wi, wo, m)
            }
            Bsdf::MicrofacetTransmission { distribution, media, reflectance } => {
                if same_hemisphere(wi, wo) {
                    return RgbSpectrum::ZERO;
                }
                let direction = if wi.z > 0.0 { TransportDirection::In } else { TransportDirection::Out };
                let eta = 1.0 / media.ior(direction);
                let mut m = (wi + wo * eta).normalized();
                if m.z < 0.0 {
                    m = -m;
                }
                let (f, _) = microfacet_transmission_f_pdf(distribution, media, reflectance, surf, textures, wi, wo, m, direction);
                f
            }
            Bsdf::Bilayer { coat_distribution, coat_media, diffuse } => {
                if !same_hemisphere(wi, wo) {
                    return RgbSpectrum::ZERO;
                }
                bilayer_f(coat_distribution, coat_media, diffuse, surf, textures, wi, wo)
            }
            Bsdf::PerfectSpecular { .. } => RgbSpectrum::ZERO,
        }
    }

    /// Evaluates `pdf(wi, wo)`; zero for delta BSDFs (§4.4).
    pub fn pdf(&self, surf: &IntersectionPoint, wi_world: Vector3, wo_world: Vector3) -> Float {
        let frame = Frame::from_normal(surf.shading_normal);
        let wi = frame.to_local(wi_world);
        let wo = frame.to_local(wo_world);

        match self {
            Bsdf::Lambert { .. } => {
                if same_hemisphere(wi, wo) {
                    abs_cos_theta(wo) * std::f32::consts::FRAC_1_PI
                } else {
                    0.0
                }
            }
            Bsdf::MicrofacetReflection { distribution, .. } => {
                if !same_hemisphere(wi, wo) {
                    return 0.0;
                }
                let m = (wi + wo).normalized();
                distribution.pdf(m) / (4.0 * wo.dot(m).abs())
            }
            Bsdf::MicrofacetTransmission { distribution, media, .. } => {
                if same_hemisphere(wi, wo) {
                    return 0.0;
                }
                let direction = if wi.z > 0.0 { TransportDirection::In } else { TransportDirection::Out };
                let eta = 1.0 / media.ior(direction);
                let mut m = (wi + wo * eta).normalized();
                if m.z < 0.0 {
                    m = -m;
                }
                transmission_pdf(distribution, wi, wo, m, eta)
            }
            Bsdf::Bilayer { coat_distribution, .. } => bilayer_pdf(coat_distribution, wi, wo),
            Bsdf::PerfectSpecular { .. } => 0.0,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, Bsdf::PerfectSpecular { .. })
    }
}

fn microfacet_reflection_f(
    distribution: &MicrofacetDistribution,
    media: &Option<DielectricMediaInterface>,
    reflectance: &ValueNode,
    surf: &IntersectionPoint,
    textures: &crate::material::TextureTable,
    wi: Vector3,
    wo: Vector3,
    m: Vector3,
) -> RgbSpectrum {
    let cos_theta_i = cos_theta(wi).abs();
    let cos_theta_o = cos_theta(wo).abs();
    if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
        return RgbSpectrum::ZERO;
    }
    let d = distribution.d(m);
    let g = distribution.g(wi, wo, m);
    let fresnel = media
        .map(|m_i| m_i.fresnel_term(wi.dot(m).abs(), TransportDirection::In))
        .unwrap_or(1.0);
    let rho = Bsdf::reflectance_at(reflectance, surf, textures);
    rho * (d * g * fresnel / (4.0 * cos_theta_i * cos_theta_o))
}

fn microfacet_transmission_f_pdf(
    distribution: &MicrofacetDistribution,
    media: &DielectricMediaInterface,
    reflectance: &ValueNode,
    surf: &IntersectionPoint,
    textures: &crate::material::TextureTable,
    wi: Vector3,
    wo: Vector3,
    m: Vector3,
    direction: TransportDirection,
) -> (RgbSpectrum, Float) {
    let eta = 1.0 / media.ior(direction);
    let cos_theta_i = cos_theta(wi);
    let cos_theta_o = cos_theta(wo);
    if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
        return (RgbSpectrum::ZERO, 0.0);
    }

    let d = distribution.d(m);
    let g = distribution.g(wi, wo, m);
    let fresnel = media.fresnel_term(wi.dot(m), direction);
    let denom_w = wi.dot(m) + eta * wo.dot(m);
    if denom_w.abs() < 1e-7 {
        return (RgbSpectrum::ZERO, 0.0);
    }

    let rho = Bsdf::reflectance_at(reflectance, surf, textures);
    let factor = (wi.dot(m).abs() * wo.dot(m).abs()) / (cos_theta_i.abs() * cos_theta_o.abs());
    let f = rho * (d * g * (1.0 - fresnel) * factor / (denom_w * denom_w) * eta * eta).abs();

    let pdf = transmission_pdf(distribution, wi, wo, m, eta);
    (f, pdf)
}

fn transmission_pdf(distribution: &MicrofacetDistribution, wi: Vector3, wo: Vector3, m: Vector3, eta: Float) -> Float {
    let denom_w = wi.dot(m) + eta * wo.dot(m);
    if denom_w.abs() < 1e-7 {
        return 0.0;
    }
    let jacobian = (eta * eta * wo.dot(m)).abs() / (denom_w * denom_w);
    distribution.pdf(m) * jacobian
}

fn schlick_fresnel(r0: Float, cos_theta: Float) -> Float {
    let c = (1.0 - cos_theta.abs()).clamp(0.0, 1.0);
    r0 + (1.0 - r0) * c.powi(5)
}

fn bilayer_f(
    coat_distribution: &MicrofacetDistribution,
    coat_media: &DielectricMediaInterface,
    diffuse: &ValueNode,
    surf: &IntersectionPoint,
    textures: &crate::material::TextureTable,
    wi: Vector3,
    wo: Vector3,
) -> RgbSpectrum {
    let r0 = {
        let eta = coat_media.ior(TransportDirection::In);
        ((eta - 1.0) / (eta + 1.0)).powi(2)
    };
    let fi = schlick_fresnel(r0, cos_theta(wi));
    let fo = schlick_fresnel(r0, cos_theta(wo));

    let rho = Bsdf::reflectance_at(diffuse, surf, textures);
    let diffuse_term = rho * (std::f32::consts::FRAC_1_PI * (1.0 - fi) * (1.0 - fo));

    let m = (wi + wo).normalized();
    let d = coat_distribution.d(m);
    let denom = 4.0 * wo.dot(m).abs() * cos_theta(wi).abs().max(cos_theta(wo).abs());
    let coat_term = if denom > 1e-7 {
        RgbSpectrum::gray(d * schlick_fresnel(r0, wo.dot(m)) / denom)
    } else {
        RgbSpectrum::ZERO
    };

    diffuse_term + coat_term
}

fn bilayer_pdf(coat_distribution: &MicrofacetDistribution, wi: Vector3, wo: Vector3) -> Float {
    if !same_hemisphere(wi, wo) {
        return 0.0;
    }
    let m = (wi + wo).normalized();
    let coat_pdf = coat_distribution.pdf(m) / (4.0 * wo.dot(m).abs()).max(1e-7);
    let diffuse_pdf = abs_cos_theta(wo) * std::f32::consts::FRAC_1_PI;
    0.5 * (coat_pdf + diffuse_pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::math::Vector2;

    fn surf(normal: Vector3) -> IntersectionPoint {
        IntersectionPoint {
            position: Vector3::ZERO,
            inside: Vector3::ZERO,
            outside: Vector3::ZERO,
            face_normal: normal,
            shading_normal: normal,
            uv: Vector2::new(0.0, 0.0),
            material: 0,
            direction: Direction::In,
        }
    }

    #[test]
    fn lambert_energy_conserves_under_monte_carlo() {
        let bsdf = Bsdf::lambert(ValueNode::constant(RgbSpectrum::gray(0.5)));
        let textures = crate::material::TextureTable::new();
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let surf = surf(normal);
        let wi = Vector3::new(0.0, 0.0, 1.0);

        let mut sum = RgbSpectrum::ZERO;
        let n = 20_000;
        let mut rng = crate::math::rng::Rng::from_worker_index(11);
        for _ in 0..n {
            let u = rng.uniform_2d();
            if let Some(sample) = bsdf.sample_f(&surf, u, wi, &textures) {
                let cos = sample.wo.dot(normal).abs();
                sum += sample.f * (cos / sample.pdf);
            }
        }
        let estimate = sum / n as Float;
        assert!(estimate.max_component() <= 1.0 + 1e-2);
    }

    #[test]
    fn perfect_specular_reflects_about_normal() {
        let bsdf = Bsdf::PerfectSpecular { reflectance: ValueNode::constant(RgbSpectrum::gray(1.0)) };
        let textures = crate::material::TextureTable::new();
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let surf = surf(normal);
        let wi = Vector3::new(0.3, 0.0, 0.95).normalized();
        let sample = bsdf.sample_f(&surf, (0.0, 0.0), wi, &textures).unwrap();
        assert!((sample.wo.z - wi.z).abs() < 1e-5);
        assert!((sample.wo.x + wi.x).abs() < 1e-5);
    }

    #[test]
    fn microfacet_reflection_f_is_zero_across_hemispheres() {
        let bsdf = Bsdf::MicrofacetReflection {
            distribution: MicrofacetDistribution::Beckmann { roughness: 0.3 },
            media: None,
            reflectance: ValueNode::constant(RgbSpectrum::gray(0.8)),
        };
        let textures = crate::material::TextureTable::new();
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let surf = surf(normal);
        let wi = Vector3::new(0.0, 0.0, 1.0);
        let wo = Vector3::new(0.0, 0.0, -1.0);
        assert_eq!(bsdf.f(&surf, wi, wo, &textures), RgbSpectrum::ZERO);
    }
}
