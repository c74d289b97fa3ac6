use crate::math::Float;
use crate::spectrum::RgbSpectrum;

use super::bilinear_weights;

/// A row-major grid of 4-component vectors: `(r, g, b, weight)` in the
/// image plane, or a colour+alpha dirt map feeding the diffraction
/// pipeline.
#[derive(Debug, Clone)]
pub struct VectorMap2D {
    pub width: usize,
    pub height: usize,
    data: Vec<[Float; 4]>,
}

impl VectorMap2D {
    pub fn new(width: usize, height: usize) -> Self {
        VectorMap2D {
            width,
            height,
            data: vec![[0.0; 4]; width * height],
        }
    }

    /// Rebuilds a map from a flat row-major buffer of `(r*w, g*w, b*w,
    /// w)` cells, as read back from a `.fpm` file (§6).
    pub fn from_raw(width: usize, height: usize, data: Vec<[Float; 4]>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        VectorMap2D { width, height, data }
    }

    pub fn raw(&self) -> &[[Float; 4]] {
        &self.data
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> [Float; 4] {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: [Float; 4]) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Adds `weight * color` into the accumulator and `weight` into
    /// the weight channel (§4.6 splatting — commutative, so any order
    /// of splats from any number of workers yields the same total).
    pub fn splat(&mut self, x: usize, y: usize, color: RgbSpectrum, weight: Float) {
        let i = self.index(x, y);
        let cell = &mut self.data[i];
        cell[0] += color.r() * weight;
        cell[1] += color.g() * weight;
        cell[2] += color.b() * weight;
        cell[3] += weight;
    }

    pub fn sample_bilinear(&self, x: Float, y: Float) -> [Float; 4] {
        let mut out = [0.0; 4];
        for &(px, py, w) in bilinear_weights(x, y, self.width, self.height).iter() {
            let cell = self.get(px, py);
            for c in 0..4 {
                out[c] += cell[c] * w;
            }
        }
        out
    }

    /// Divides accumulated colour by accumulated weight; zero-weight
    /// pixels stay black rather than producing NaN (§4.6).
    pub fn finalize(&self) -> RealImageBuffer {
        let mut rgb = vec![0.0; self.width * self.height * 3];
        for (i, cell) in self.data.iter().enumerate() {
            let w = cell[3];
            let (r, g, b) = if w > 0.0 {
                (cell[0] / w, cell[1] / w, cell[2] / w)
            } else {
                (0.0, 0.0, 0.0)
            };
            rgb[i * 3] = r;
            rgb[i * 3 + 1] = g;
            rgb[i * 3 + 2] = b;
        }
        RealImageBuffer {
            width: self.width,
            height: self.height,
            rgb,
        }
    }
}

pub struct RealImageBuffer {
    pub width: usize,
    pub height: usize,
    pub rgb: Vec<Float>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splat_accumulates_weighted_color() {
        let mut m = VectorMap2D::new(2, 2);
        m.splat(0, 0, RgbSpectrum::new(1.0, 0.0, 0.0), 0.5);
        m.splat(0, 0, RgbSpectrum::new(1.0, 0.0, 0.0), 0.5);
        let final_image = m.finalize();
        assert!((final_image.rgb[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_weight_pixel_finalizes_black() {
        let m = VectorMap2D::new(1, 1);
        let final_image = m.finalize();
        assert_eq!(final_image.rgb, vec![0.0, 0.0, 0.0]);
    }
}
