use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{FftPlanner, num_complex::Complex as RustComplex};

use crate::math::Float;

use super::bilinear_weights;

/// A row-major grid of complex samples, the working type for the
/// diffraction pipeline's aperture spectrum and for the frequency-
/// domain convolution that blends it back into the rendered image.
#[derive(Debug, Clone)]
pub struct ComplexMap2D {
    pub width: usize,
    pub height: usize,
    data: Vec<Complex64>,
}

impl ComplexMap2D {
    pub fn new(width: usize, height: usize) -> Self {
        ComplexMap2D {
            width,
            height,
            data: vec![Complex64::new(0.0, 0.0); width * height],
        }
    }

    pub fn from_real(real: &super::RealMap2D) -> Self {
        let mut out = ComplexMap2D::new(real.width, real.height);
        for y in 0..real.height {
            for x in 0..real.width {
                out.set(x, y, Complex64::new(real.get(x, y) as f64, 0.0));
            }
        }
        out
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Complex64 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: Complex64) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    pub fn sample_bilinear(&self, x: Float, y: Float) -> Complex64 {
        bilinear_weights(x, y, self.width, self.height)
            .iter()
            .map(|&(px, py, w)| self.get(px, py) * (w as f64))
            .sum()
    }

    /// Pads to the smallest power of two at least `safety_factor`
    /// times the current side length, placing the existing data at the
    /// origin (§4.8 step 1).
    pub fn padded_to_power_of_two(&self, safety_factor: Float) -> ComplexMap2D {
        let side = self.width.max(self.height);
        let target = super::next_pow2_with_margin(side, safety_factor);
        let mut out = ComplexMap2D::new(target, target);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set(x, y, self.get(x, y));
            }
        }
        out
    }

    pub fn rolled(&self) -> ComplexMap2D {
        let mut out = ComplexMap2D::new(self.width, self.height);
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

    pub fn multiply_scalar(&mut self, s: f64) {
        for v in self.data.iter_mut() {
            *v *= s;
        }
    }

    pub fn multiply(&mut self, other: &ComplexMap2D) {
        assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a *= b;
        }
    }

    /// Multi-threaded 2-D FFT: one planner shared across parallel row
    /// transforms, then parallel column transforms (§4.8 step 2).
    pub fn fft(&mut self) {
        self.transform_2d(false);
    }

    pub fn ifft(&mut self) {
        self.transform_2d(true);
        let norm = 1.0 / (self.width * self.height) as f64;
        self.multiply_scalar(norm);
    }

    fn transform_2d(&mut self, inverse: bool) {
        let mut planner = FftPlanner::<f64>::new();
        let row_fft = if inverse {
            planner.plan_fft_inverse(self.width)
        } else {
            planner.plan_fft_forward(self.width)
        };

        let width = self.width;
        self.data
            .par_chunks_mut(width)
            .for_each_with(row_fft.clone(), |fft, row| {
                let mut buf: Vec<RustComplex<f64>> =
                    row.iter().map(|c| RustComplex::new(c.re, c.im)).collect();
                fft.process(&mut buf);
                for (dst, v) in row.iter_mut().zip(buf.into_iter()) {
                    *dst = Complex64::new(v.re, v.im);
                }
            });

        let height = self.height;
        let col_fft = if inverse {
            planner.plan_fft_inverse(height)
        } else {
            planner.plan_fft_forward(height)
        };

        let mut columns: Vec<Vec<Complex64>> = (0..width)
            .map(|x| (0..height).map(|y| self.get(x, y)).collect())
            .collect();
        columns.par_iter_mut().for_each(|col| {
            let mut buf: Vec<RustComplex<f64>> =
                col.iter().map(|c| RustComplex::new(c.re, c.im)).collect();
            col_fft.process(&mut buf);
            for (dst, v) in col.iter_mut().zip(buf.into_iter()) {
                *dst = Complex64::new(v.re, v.im);
            }
        });
        for x in 0..width {
            for y in 0..height {
                self.set(x, y, columns[x][y]);
            }
        }
    }

    pub fn data(&self) -> &[Complex64] {
        &self.data
    }
}
