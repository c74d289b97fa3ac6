use crate::math::Float;

use super::bilinear_weights;

/// A row-major grid of scalars.
#[derive(Debug, Clone)]
pub struct RealMap2D {
    pub width: usize,
    pub height: usize,
    data: Vec<Float>,
}

impl RealMap2D {
    pub fn new(width: usize, height: usize) -> Self {
        RealMap2D {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn filled(width: usize, height: usize, value: Float) -> Self {
        RealMap2D {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Float {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: Float) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    pub fn sample_bilinear(&self, x: Float, y: Float) -> Float {
        bilinear_weights(x, y, self.width, self.height)
            .iter()
            .map(|&(px, py, w)| self.get(px, py) * w)
            .sum()
    }

    /// Quarter-swap roll: moves the DC component from (0,0) to the
    /// center, the conventional FFT-shift.
    pub fn rolled(&self) -> RealMap2D {
        let mut out = RealMap2D::new(self.width, self.height);
        let hx = self.width / 2;
        let hy = self.height / 2;
        for y in 0..self.height {
            for x in 0..self.width {
                let nx = (x + hx) % self.width;
                let ny = (y + hy) % self.height;
                out.set(nx, ny, self.get(x, y));
            }
        }
        out
    }

    pub fn multiply_scalar(&mut self, s: Float) {
        for v in self.data.iter_mut() {
            *v *= s;
        }
    }

    pub fn multiply(&mut self, other: &RealMap2D) {
        assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a *= b;
        }
    }

    pub fn data(&self) -> &[Float] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_moves_dc_to_center() {
        let mut m = RealMap2D::new(4, 4);
        m.set(0, 0, 1.0);
        let rolled = m.rolled();
        assert_eq!(rolled.get(2, 2), 1.0);
    }

    #[test]
    fn bilinear_sample_at_grid_point_matches_get() {
        let mut m = RealMap2D::new(4, 4);
        m.set(1, 2, 3.0);
        assert!((m.sample_bilinear(1.0, 2.0) - 3.0).abs() < 1e-6);
    }
}
