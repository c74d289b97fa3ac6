use crate::math::{Float, Vector3};

/// Which side of the interface the ray is travelling, matching
/// [`crate::geometry::Direction`] (§4.4, `MediaInterface::DIRECTION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportDirection {
    In,
    Out,
}

/// A dielectric interface's pair of indices of refraction. `OpaqueMediaInterface`
/// from the original renderer is not modelled: per §9 it never actually
/// implemented the `fresnelTerm` contract and has no callers here.
#[derive(Debug, Clone, Copy)]
pub struct DielectricMediaInterface {
    pub ior_incident: Float,
    pub ior_transmitted: Float,
}

impl DielectricMediaInterface {
    pub fn new(ior_incident: Float, ior_transmitted: Float) -> Self {
        DielectricMediaInterface { ior_incident, ior_transmitted }
    }

    pub fn ior(&self, direction: TransportDirection) -> Float {
        match direction {
            TransportDirection::In => self.ior_transmitted / self.ior_incident,
            TransportDirection::Out => self.ior_incident / self.ior_transmitted,
        }
    }

    fn ior_pair(&self, direction: TransportDirection) -> (Float, Float) {
        match direction {
            TransportDirection::In => (self.ior_incident, self.ior_transmitted),
            TransportDirection::Out => (self.ior_transmitted, self.ior_incident),
        }
    }

    /// Full Fresnel reflectance at `cos_theta_i` (unsigned cosine
    /// between the incident direction and the macro-surface normal),
    /// supporting total internal reflection. This is the single
    /// canonical implementation §9 asks for — the vector-valued
    /// overload in the original renderer's dual code path is not
    /// reproduced; callers compute `cos_theta_i` themselves from
    /// whichever vectors they have.
    pub fn fresnel_term(&self, cos_theta_i: Float, direction: TransportDirection) -> Float {
        let (ni, nt) = self.ior_pair(direction);
        let cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
        let (ni, nt, cos_theta_i) = if cos_theta_i < 0.0 {
            (nt, ni, -cos_theta_i)
        } else {
            (ni, nt, cos_theta_i)
        };

        let sin_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0).sqrt();
        let sin_theta_t = ni / nt * sin_theta_i;
        if sin_theta_t >= 1.0 {
            return 1.0;
        }
        let cos_theta_t = (1.0 - sin_theta_t * sin_theta_t).max(0.0).sqrt();

        let r_parallel = (nt * cos_theta_i - ni * cos_theta_t) / (nt * cos_theta_i + ni * cos_theta_t);
        let r_perp = (ni * cos_theta_i - nt * cos_theta_t) / (ni * cos_theta_i + nt * cos_theta_t);
        (r_parallel * r_parallel + r_perp * r_perp) * 0.5
    }

    /// Refracts `wi` (pointing away from the surface, local frame)
    /// through the macrosurface/microsurface normal `n`. Returns
    /// `None` on total internal reflection.
    pub fn refract(&self, wi: Vector3, n: Vector3, direction: TransportDirection) -> Option<Vector3> {
        let eta = 1.0 / self.ior(direction);
        let cos_theta_i = wi.dot(n);
        let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
        let sin2_theta_t = eta * eta * sin2_theta_i;
        if sin2_theta_t >= 1.0 {
            return None;
        }
        let cos_theta_t = (1.0 - sin2_theta_t).max(0.0).sqrt();
        let sign = if cos_theta_i > 0.0 { 1.0 } else { -1.0 };
        Some(n * (eta * cos_theta_i - sign * cos_theta_t) - wi * eta)
    }
}
