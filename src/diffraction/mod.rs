//! Fraunhofer-diffraction lens-bloom post-process (§4.8): rasterize an
//! aperture, FFT it, sample its continuous-FT estimator per-wavelength
//! against the CIE observer and a source illuminant, and convolve the
//! resulting pattern with the rendered image.

pub mod aperture;
mod cft;

pub use aperture::Aperture;
pub use cft::CftEstimator2D;

use crate::maps::{ComplexMap2D, VectorMap2D};
use crate::math::Float;
use crate::spectrum::{cmf, CoefficientSpectrum, RgbSpectrum, Xyz};

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub max_samples: usize,
    pub texture_samples: usize,
    pub min_wavelength: Float,
    pub max_wavelength: Float,
    pub wavelength_step: Float,
    pub frequency_multiplier: Float,
    pub safety_factor: Float,
    pub save_aperture_function: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_samples: 512,
            texture_samples: 512,
            min_wavelength: cmf::LAMBDA_START,
            max_wavelength: cmf::LAMBDA_END,
            wavelength_step: 10.0,
            frequency_multiplier: 1.0,
            safety_factor: 2.0,
            save_aperture_function: false,
        }
    }
}

/// A uniform-over-the-visible-band source spectrum, used when the
/// caller does not supply a measured source spectrum.
pub fn flat_source_spectrum(_lambda: Float) -> Float {
    1.0
}

pub struct FraunhoferDiffraction;

impl FraunhoferDiffraction {
    /// Builds the diffraction pattern itself: an RGB map of side
    /// `output_resolution`, normalized to unit energy (§4.8 steps 1-5).
    pub fn generate(
        aperture: &Aperture,
        dirt_map: Option<&VectorMap2D>,
        output_resolution: usize,
        physical_sensor_width: Float,
        source_spectrum: impl Fn(Float) -> Float,
        settings: &Settings,
    ) -> VectorMap2D {
        let raster = aperture.rasterize(settings.texture_samples, dirt_map);
        let padded = raster.padded_to_power_of_two(settings.safety_factor);

        let mut spectrum = padded;
        spectrum.fft();

        let estimator = CftEstimator2D::new(&spectrum, physical_sensor_width, physical_sensor_width);

        let mut out = VectorMap2D::new(output_resolution, output_resolution);
        let half = output_resolution as isize / 2;
        let freq_step = estimator.horizontal_freq_step() * settings.frequency_multiplier;

        let mut lambda = settings.min_wavelength;
        while lambda <= settings.max_wavelength {
            let cie_x = cmf::sample(&cmf::CIE_X, lambda);
            let cie_y = cmf::sample(&cmf::CIE_Y, lambda);
            let cie_z = cmf::sample(&cmf::CIE_Z, lambda);
            let illum = source_spectrum(lambda);
            let weight = settings.wavelength_step / cmf::cie_y_integral();

            for j in 0..output_resolution {
                for i in 0..output_resolution {
                    let fx = (i as isize - half) as Float * freq_step / lambda;
                    let fy = (j as isize - half) as Float * freq_step / lambda;
                    let amplitude = estimator.sample(fx, fy);
                    let intensity = (amplitude.re * amplitude.re + amplitude.im * amplitude.im) as Float;

                    let cell = out.get(i, j);
                    let add = intensity * illum * weight;
                    out.set(
                        i,
                        j,
                        [
                            cell[0] + add * cie_x,
                            cell[1] + add * cie_y,
                            cell[2] + add * cie_z,
                            1.0,
                        ],
                    );
                }
            }
            lambda += settings.wavelength_step;
        }

        normalize_to_unit_energy(out)
    }

    /// Frequency-domain convolution of the rendered image with the
    /// diffraction pattern (§4.8 step 6): pad both to a common safe
    /// size, FFT, multiply, inverse FFT, crop back to the original
    /// resolution.
    pub fn convolve(image: &VectorMap2D, pattern: &VectorMap2D) -> VectorMap2D {
        let side = image.width.max(image.height).max(pattern.width).max(pattern.height);
        let n = crate::math::next_power_of_two(side * 2);

        let mut result = VectorMap2D::new(image.width, image.height);
        for channel in 0..3 {
            let mut img_map = ComplexMap2D::new(n, n);
            for y in 0..image.height {
                for x in 0..image.width {
                    img_map.set(x, y, num_complex::Complex64::new(image.get(x, y)[channel] as f64, 0.0));
                }
            }

            // `pattern`'s energy peak sits at its own center (by
            // construction in `generate()`). Roll it back to the
            // origin before embedding it in the padded canvas, so the
            // convolution kernel's peak lands at index (0,0) of the
            // canvas instead of offset by half the pattern's extent —
            // otherwise the inverse-FFT result comes out shifted by
            // that same offset.
            let mut pat_local = ComplexMap2D::new(pattern.width, pattern.height);
            for y in 0..pattern.height {
                for x in 0..pattern.width {
                    pat_local.set(x, y, num_complex::Complex64::new(pattern.get(x, y)[channel] as f64, 0.0));
                }
            }
            let pat_local = pat_local.rolled();

            let mut pat_map = ComplexMap2D::new(n, n);
            for y in 0..pattern.height {
                for x in 0..pattern.width {
                    pat_map.set(x, y, pat_local.get(x, y));
                }
            }

            img_map.fft();
            pat_map.fft();
            img_map.multiply(&pat_map);
            img_map.ifft();

            for y in 0..image.height {
                for x in 0..image.width {
                    let v = img_map.get(x, y).re as Float;
                    let mut cell = result.get(x, y);
                    cell[channel] = v;
                    cell[3] = 1.0;
                    result.set(x, y, cell);
                }
            }
        }
        result
    }
}

fn normalize_to_unit_energy(mut pattern: VectorMap2D) -> VectorMap2D {
    let mut total = 0.0_f32;
    for y in 0..pattern.height {
        for x in 0..pattern.width {
            let c = pattern.get(x, y);
            total += c[0] + c[1] + c[2];
        }
    }
    if total <= 0.0 {
        return pattern;
    }
    let inv = 1.0 / total;
    for y in 0..pattern.height {
        for x in 0..pattern.width {
            let mut c = pattern.get(x, y);
            c[0] *= inv;
            c[1] *= inv;
            c[2] *= inv;
            pattern.set(x, y, c);
        }
    }
    pattern
}

pub fn xyz_from_accumulator(cell: [Float; 4]) -> Xyz {
    Xyz::new(cell[0], cell[1], cell[2])
}

pub fn to_rgb(xyz: Xyz) -> RgbSpectrum {
    xyz.to_rgb().clamp(0.0, Float::INFINITY)
}
