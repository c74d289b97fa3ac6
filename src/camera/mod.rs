//! Camera ray emitters (§4, component H): a pinhole emitter and a
//! thin-lens emitter with circular or polygonal aperture sampling for
//! depth-of-field defocus.

use crate::geometry::LightRay;
use crate::math::{concentric_sample_disk, Float, Vector3};

/// Shape of the thin lens' aperture, sampled uniformly by area.
#[derive(Debug, Clone, Copy)]
pub enum LensAperture {
    Circular,
    Polygonal { sides: u32 },
}

impl LensAperture {
    /// Uniform sample over the unit-radius aperture shape, in lens
    /// coordinates (§4, component H).
    fn sample(&self, u: (Float, Float)) -> (Float, Float) {
        match *self {
            LensAperture::Circular => concentric_sample_disk(u),
            LensAperture::Polygonal { sides } => {
                let sides = sides.max(3);
                let sector = ((u.0 * sides as Float) as u32).min(sides - 1);
                // Re-use the fractional remainder within the chosen
                // sector as a fresh uniform sample so the triangle fan
                // stays unbiased.
                let local_u0 = (u.0 * sides as Float) - sector as Float;
                let theta0 = 2.0 * std::f32::consts::PI * sector as Float / sides as Float;
                let theta1 = 2.0 * std::f32::consts::PI * (sector + 1) as Float / sides as Float;
                let v0 = (theta0.cos(), theta0.sin());
                let v1 = (theta1.cos(), theta1.sin());
                let sqrt_r1 = local_u0.max(0.0).sqrt();
                let b1 = sqrt_r1 * (1.0 - u.1);
                let b2 = sqrt_r1 * u.1;
                (v0.0 * b1 + v1.0 * b2, v0.1 * b1 + v1.1 * b2)
            }
        }
    }
}

/// Thin-lens defocus parameters; a pinhole camera is the degenerate
/// case with `radius == 0.0` and is never sampled.
#[derive(Debug, Clone, Copy)]
pub struct ThinLens {
    pub radius: Float,
    pub focal_distance: Float,
    pub aperture: LensAperture,
}

pub enum CameraKind {
    Pinhole,
    ThinLens(ThinLens),
}

/// A perspective camera over image coordinates `[0, width) x [0,
/// height)`, built from a look-at triple (§4, component H).
pub struct Camera {
    origin: Vector3,
    lower_left: Vector3,
    horizontal: Vector3,
    vertical: Vector3,
    u: Vector3,
    v: Vector3,
    width: Float,
    height: Float,
    kind: CameraKind,
}

impl Camera {
    pub fn look_at(
        eye: Vector3,
        target: Vector3,
        up: Vector3,
        vertical_fov_degrees: Float,
        width: u32,
        height: u32,
        kind: CameraKind,
    ) -> Camera {
        let aspect = width as Float / height as Float;
        let theta = vertical_fov_degrees.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = aspect * half_height;

        let w = (eye - target).normalized();
        let u = up.cross(w).normalized();
        let v = w.cross(u);

        let focal_distance = match kind {
            CameraKind::ThinLens(lens) => lens.focal_distance,
            CameraKind::Pinhole => 1.0,
        };

        let lower_left =
            eye - u * (half_width * focal_distance) - v * (half_height * focal_distance) - w * focal_distance;
        let horizontal = u * (2.0 * half_width * focal_distance);
        let vertical = v * (2.0 * half_height * focal_distance);

        Camera {
            origin: eye,
            lower_left,
            horizontal,
            vertical,
            u,
            v,
            width: width as Float,
            height: height as Float,
            kind,
        }
    }

    /// Emits a ray through continuous pixel coordinates `(pixel_x,
    /// pixel_y)` (origin top-left, `y` growing downward), jittered by
    /// `lens_sample` when the camera carries a thin lens.
    pub fn generate_ray(&self, pixel_x: Float, pixel_y: Float, lens_sample: (Float, Float)) -> LightRay {
        let s = pixel_x / self.width;
        // Flip so increasing pixel_y (downward) matches decreasing
        // image-plane `t` (the `vertical` basis points up).
        let t = 1.0 - pixel_y / self.height;

        let target = self.lower_left + self.horizontal * s + self.vertical * t;

        match self.kind {
            CameraKind::Pinhole => LightRay::new(self.origin, (target - self.origin).normalized()),
            CameraKind::ThinLens(lens) => {
                let (lx, ly) = lens.aperture.sample(lens_sample);
                let offset = self.u * (lx * lens.radius) + self.v * (ly * lens.radius);
                let origin = self.origin + offset;
                LightRay::new(origin, (target - origin).normalized())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinhole_center_ray_points_at_target() {
        let camera = Camera::look_at(
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::ZERO,
            Vector3::new(0.0, 1.0, 0.0),
            40.0,
            200,
            100,
            CameraKind::Pinhole,
        );
        let ray = camera.generate_ray(100.0, 50.0, (0.0, 0.0));
        assert!(ray.d.x.abs() < 1e-4);
        assert!(ray.d.y.abs() < 1e-4);
        assert!(ray.d.z < 0.0);
    }

    #[test]
    fn thin_lens_origin_moves_with_lens_sample() {
        let lens = ThinLens { radius: 0.5, focal_distance: 5.0, aperture: LensAperture::Circular };
        let camera = Camera::look_at(
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::ZERO,
            Vector3::new(0.0, 1.0, 0.0),
            40.0,
            200,
            100,
            CameraKind::ThinLens(lens),
        );
        let center_ray = camera.generate_ray(100.0, 50.0, (0.5, 0.5));
        let edge_ray = camera.generate_ray(100.0, 50.0, (1.0, 0.5));
        assert!((center_ray.o - edge_ray.o).length() > 1e-3);
    }

    #[test]
    fn polygonal_aperture_samples_stay_within_unit_radius() {
        let aperture = LensAperture::Polygonal { sides: 6 };
        for i in 0..20 {
            let u = (i as Float / 20.0, (i * 7 % 20) as Float / 20.0);
            let (x, y) = aperture.sample(u);
            assert!((x * x + y * y).sqrt() <= 1.0 + 1e-4);
        }
    }
}
