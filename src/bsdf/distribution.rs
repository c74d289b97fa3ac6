use crate::math::{Float, Vector3};

use super::frame::abs_cos_theta;

/// A microfacet normal distribution function (§4.4): either the
/// original renderer's Phong-power surface or a Beckmann-roughness
/// surface, chosen per material. Both expose the same
/// sample/evaluate/Smith-shadowing contract so
/// [`super::microfacet::MicrofacetReflection`] and
/// [`super::microfacet::MicrofacetTransmission`] stay distribution-
/// agnostic.
#[derive(Debug, Clone, Copy)]
pub enum MicrofacetDistribution {
    Phong { power: Float },
    Beckmann { roughness: Float },
}

impl MicrofacetDistribution {
    /// Beckmann-equivalent roughness, used by the Smith shadowing term
    /// regardless of which distribution generated `m` (Walter et al.
    /// 2007's `alpha = sqrt(2 / (power + 2))` conversion for Phong).
    fn alpha(&self) -> Float {
        match *self {
            MicrofacetDistribution::Phong { power } => (2.0 / (power + 2.0)).sqrt(),
            MicrofacetDistribution::Beckmann { roughness } => roughness.max(1e-4),
        }
    }

    /// `D(m)`, normal distribution function, zero below the surface.
    pub fn d(&self, m: Vector3) -> Float {
        let cos_theta_m = m.z;
        if cos_theta_m <= 0.0 {
            return 0.0;
        }
        match *self {
            MicrofacetDistribution::Phong { power } => {
                (power + 2.0) / (2.0 * std::f32::consts::PI) * cos_theta_m.powf(power)
            }
            MicrofacetDistribution::Beckmann { roughness } => {
                let alpha = roughness.max(1e-4);
                let cos2 = cos_theta_m * cos_theta_m;
                let tan2 = (1.0 - cos2) / cos2;
                let cos4 = cos2 * cos2;
                (-tan2 / (alpha * alpha)).exp() / (std::f32::consts::PI * alpha * alpha * cos4)
            }
        }
    }

    /// Importance-samples a microsurface normal in the local frame.
    pub fn sample_m(&self, u: (Float, Float)) -> Vector3 {
        let phi = 2.0 * std::f32::consts::PI * u.1;
        let cos_theta_m = match *self {
            MicrofacetDistribution::Phong { power } => u.0.powf(1.0 / (power + 2.0)),
            MicrofacetDistribution::Beckmann { roughness } => {
                let alpha = roughness.max(1e-4);
                let tan2 = -alpha * alpha * (1.0 - u.0).max(1e-7).ln();
                (1.0 / (1.0 + tan2)).sqrt()
            }
        };
        let sin_theta_m = (1.0 - cos_theta_m * cos_theta_m).max(0.0).sqrt();
        Vector3::new(sin_theta_m * phi.cos(), sin_theta_m * phi.sin(), cos_theta_m)
    }

    /// `pdf(m) = D(m) * |cos theta_m|`, the density of `m` itself
    /// (§4.4; the caller still divides by the `4|wo.m|` Jacobian to
    /// get the density of the reflected/transmitted direction).
    pub fn pdf(&self, m: Vector3) -> Float {
        self.d(m) * abs_cos_theta(m)
    }

    fn smith_g1(&self, v: Vector3, m: Vector3) -> Float {
        if v.dot(m) * v.z <= 0.0 {
            return 0.0;
        }
        let cos_theta_v = abs_cos_theta(v);
        if cos_theta_v >= 1.0 - 1e-6 {
            return 1.0;
        }
        let tan_theta_v = (1.0 - cos_theta_v * cos_theta_v).sqrt() / cos_theta_v;
        if tan_theta_v == 0.0 {
            return 1.0;
        }
        let a = 1.0 / (self.alpha() * tan_theta_v);
        if a >= 1.6 {
            1.0
        } else {
            (3.535 * a + 2.181 * a * a) / (1.0 + 2.276 * a + 2.577 * a * a)
        }
    }

    /// Smith bidirectional shadow-masking term `G(i, o, m)`.
    pub fn g(&self, wi: Vector3, wo: Vector3, m: Vector3) -> Float {
        self.smith_g1(wi, m) * self.smith_g1(wo, m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phong_distribution_peaks_at_normal() {
        let d = MicrofacetDistribution::Phong { power: 50.0 };
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let grazing = Vector3::new(0.9, 0.0, 0.436).normalized();
        assert!(d.d(normal) > d.d(grazing));
    }

    #[test]
    fn sampled_normal_is_above_surface() {
        let d = MicrofacetDistribution::Beckmann { roughness: 0.3 };
        for i in 0..16 {
            let u = (i as Float / 16.0, 0.37);
            let m = d.sample_m(u);
            assert!(m.z >= 0.0);
            assert!((m.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn smith_g1_is_one_at_normal_incidence() {
        let d = MicrofacetDistribution::Beckmann { roughness: 0.2 };
        let v = Vector3::new(0.0, 0.0, 1.0);
        let m = Vector3::new(0.0, 0.0, 1.0);
        assert!((d.smith_g1(v, m) - 1.0).abs() < 1e-3);
    }
}
