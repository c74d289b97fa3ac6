use num_complex::Complex64;

use crate::maps::ComplexMap2D;
use crate::math::Float;

/// Converts a discrete 2-D FFT into a continuous-FT estimator over a
/// declared physical aperture size (§4.8 step 3, §3 `ComplexMap2D`).
///
/// The raw FFT output has its DC term at index `(0, 0)` and is indexed
/// by cycle count rather than physical frequency; re-centering it
/// (equivalent to the spec's `(-1)^(kx+ky)` checker phase, applied here
/// as the same quarter-swap [`ComplexMap2D::rolled`] uses elsewhere so
/// the renderer only needs one centering primitive) and scaling by
/// `1/(fsx*fsy)` turns a bin lookup into a bilinear sample at an
/// arbitrary physical frequency.
pub struct CftEstimator2D {
    centered: ComplexMap2D,
    width_phys: Float,
    height_phys: Float,
    scale: f64,
}

impl CftEstimator2D {
    pub fn new(spectrum: &ComplexMap2D, width_phys: Float, height_phys: Float) -> Self {
        let centered = spectrum.rolled();
        let n = spectrum.width as Float;
        let m = spectrum.height as Float;
        let fs_x = n / width_phys;
        let fs_y = m / height_phys;
        let scale = 1.0 / (fs_x as f64 * fs_y as f64);
        CftEstimator2D {
            centered,
            width_phys,
            height_phys,
            scale,
        }
    }

    /// Frequency resolution per output-pixel index at the estimator's
    /// declared physical width: a caller samples at
    /// `fx = pixel_index * horizontal_freq_step() / lambda`.
    pub fn horizontal_freq_step(&self) -> Float {
        1.0 / self.width_phys
    }

    pub fn vertical_freq_step(&self) -> Float {
        1.0 / self.height_phys
    }

    /// Samples the estimator at physical spatial frequency `(fx, fy)`
    /// (cycles per unit length), bilinearly interpolating between the
    /// nearest FFT bins.
    pub fn sample(&self, fx: Float, fy: Float) -> Complex64 {
        let cx = self.centered.width as Float / 2.0;
        let cy = self.centered.height as Float / 2.0;
        let px = cx + fx * self.width_phys;
        let py = cy + fy * self.height_phys;
        self.centered.sample_bilinear(px, py) * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_only_spectrum_is_constant_everywhere() {
        let mut m = ComplexMap2D::new(16, 16);
        m.set(0, 0, Complex64::new(1.0, 0.0));
        // A spectrum that is purely DC at bin 0 represents a constant
        // field once centered; sampling away from the origin should
        // not explode or panic.
        let estimator = CftEstimator2D::new(&m, 4.0, 4.0);
        let center = estimator.sample(0.0, 0.0);
        let off = estimator.sample(0.2, -0.1);
        assert!(center.norm().is_finite());
        assert!(off.norm().is_finite());
    }

    #[test]
    fn real_symmetric_input_has_small_imaginary_part() {
        // A real, symmetric (even) aperture function has a real-valued
        // continuous Fourier transform (§8 property 6).
        let n = 16;
        let mut real = crate::maps::RealMap2D::new(n, n);
        let c = n as Float / 2.0;
        for y in 0..n {
            for x in 0..n {
                let dx = x as Float - c;
                let dy = y as Float - c;
                let v = (-(dx * dx + dy * dy) / 8.0).exp();
                real.set(x, y, v);
            }
        }
        let mut spectrum = ComplexMap2D::from_real(&real);
        spectrum.fft();
        let estimator = CftEstimator2D::new(&spectrum, 4.0, 4.0);
        let s = estimator.sample(0.3, 0.0);
        assert!(s.im.abs() < 1e-1 * s.re.abs().max(1.0));
    }
}
