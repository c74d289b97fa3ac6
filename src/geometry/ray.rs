use crate::math::{Float, Vector3};

/// A ray carrying the permutation and shear needed by the watertight
/// ray-triangle test (§4.3), precomputed once per ray rather than once
/// per triangle.
#[derive(Debug, Clone, Copy)]
pub struct LightRay {
    pub o: Vector3,
    pub d: Vector3,
    pub inv_d: Vector3,
    pub kx: usize,
    pub ky: usize,
    pub kz: usize,
    pub shear: Vector3,
}

impl LightRay {
    pub fn new(o: Vector3, d: Vector3) -> Self {
        let kz = d.max_abs_axis();
        let mut kx = if kz == 2 { 0 } else { kz + 1 };
        let mut ky = if kx == 2 { 0 } else { kx + 1 };
        // Swap kx/ky if needed so the permuted z direction is never
        // negative, avoiding a winding flip in the edge functions.
        if d[kz] < 0.0 {
            std::mem::swap(&mut kx, &mut ky);
        }
        let dp = d.permute(kx, ky, kz);
        let shear = Vector3::new(-dp.x / dp.z, -dp.y / dp.z, 1.0 / dp.z);
        LightRay {
            o,
            d,
            inv_d: Vector3::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z),
            kx,
            ky,
            kz,
            shear,
        }
    }

    pub fn at(&self, t: Float) -> Vector3 {
        self.o + self.d * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_puts_dominant_axis_last() {
        let r = LightRay::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(r.kz, 2);
    }

    #[test]
    fn at_follows_parametric_line() {
        let r = LightRay::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let p = r.at(2.0);
        assert_eq!(p, Vector3::new(1.0, 2.0, 1.0));
    }
}
