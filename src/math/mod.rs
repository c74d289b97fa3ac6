//! Vector math and deterministic RNG shared by every other module.

mod vector2;
mod vector3;
pub mod rng;

pub use vector2::Vector2;
pub use vector3::Vector3;

pub type Float = f32;

/// Clamps `v` into `[lo, hi]`.
pub fn clamp(v: Float, lo: Float, hi: Float) -> Float {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

pub fn lerp(t: Float, a: Float, b: Float) -> Float {
    (1.0 - t) * a + t * b
}

/// Rounds `n` up to the next power of two (returns `n` itself if already
/// a power of two, and 1 for `n == 0`).
pub fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two().max(1)
}

/// Power heuristic (beta=2) for multiple importance sampling (§4.5
/// step 4): weighs a sample drawn with density `nf_pdf` against a
/// competing strategy with density `ng_pdf`.
pub fn power_heuristic(nf_pdf: Float, ng_pdf: Float) -> Float {
    let f2 = nf_pdf * nf_pdf;
    let g2 = ng_pdf * ng_pdf;
    if f2 + g2 == 0.0 {
        0.0
    } else {
        f2 / (f2 + g2)
    }
}

/// Maps a uniform `[0,1)^2` sample to the unit disk via Shirley's
/// concentric mapping, used by both cosine-hemisphere sampling and
/// thin-lens defocus sampling.
pub fn concentric_sample_disk(u: (Float, Float)) -> (Float, Float) {
    let ox = 2.0 * u.0 - 1.0;
    let oy = 2.0 * u.1 - 1.0;
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, std::f32::consts::FRAC_PI_4 * (oy / ox))
    } else {
        (oy, std::f32::consts::FRAC_PI_2 - std::f32::consts::FRAC_PI_4 * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted hemisphere sample around `+z`, used by the
/// Lambertian BSDF (§4.4).
pub fn cosine_sample_hemisphere(u: (Float, Float)) -> Vector3 {
    let (dx, dy) = concentric_sample_disk(u);
    let dz = (1.0 - dx * dx - dy * dy).max(0.0).sqrt();
    Vector3::new(dx, dy, dz)
}

/// Uniform sample over the full sphere, used for spherical light
/// shape sampling.
pub fn uniform_sample_sphere(u: (Float, Float)) -> Vector3 {
    let z = 1.0 - 2.0 * u.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * std::f32::consts::PI * u.1;
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_heuristic_is_symmetric_at_equal_pdfs() {
        assert!((power_heuristic(1.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn power_heuristic_favors_larger_pdf() {
        assert!(power_heuristic(2.0, 1.0) > power_heuristic(1.0, 1.0));
    }

    #[test]
    fn cosine_hemisphere_sample_has_positive_z() {
        let v = cosine_sample_hemisphere((0.3, 0.7));
        assert!(v.z > 0.0);
        assert!((v.length() - 1.0).abs() < 1e-5);
    }
}
