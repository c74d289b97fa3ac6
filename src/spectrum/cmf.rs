//! CIE 1931 2-degree standard observer, sampled every 10nm from 380nm
//! to 780nm, plus a D65 reference illuminant at the same wavelengths.
//! Used only by [`crate::diffraction`]'s spectral integration (§4.8);
//! the renderer proper never touches this table.

use crate::math::Float;

pub const LAMBDA_START: Float = 380.0;
pub const LAMBDA_END: Float = 780.0;
pub const SAMPLE_STEP: Float = 10.0;
pub const SAMPLE_COUNT: usize = 41;

// CIE 1931 standard observer, 10nm steps, 380-780nm.
#[rustfmt::skip]
pub const CIE_X: [Float; SAMPLE_COUNT] = [
    0.0014, 0.0042, 0.0143, 0.0435, 0.1344, 0.2839, 0.3483, 0.3362, 0.2908, 0.1954,
    0.0956, 0.0320, 0.0049, 0.0093, 0.0633, 0.1655, 0.2904, 0.4334, 0.5945, 0.7621,
    0.9163, 1.0263, 1.0622, 1.0026, 0.8544, 0.6424, 0.4479, 0.2835, 0.1649, 0.0874,
    0.0468, 0.0227, 0.0114, 0.0058, 0.0029, 0.0014, 0.0007, 0.0003, 0.0002, 0.0001,
    0.0000,
];

#[rustfmt::skip]
pub const CIE_Y: [Float; SAMPLE_COUNT] = [
    0.0000, 0.0001, 0.0004, 0.0012, 0.0040, 0.0116, 0.0230, 0.0380, 0.0600, 0.0910,
    0.1390, 0.2080, 0.3230, 0.5030, 0.7100, 0.8620, 0.9540, 0.9950, 0.9950, 0.9520,
    0.8700, 0.7570, 0.6310, 0.5030, 0.3810, 0.2650, 0.1750, 0.1070, 0.0610, 0.0320,
    0.0170, 0.0082, 0.0041, 0.0021, 0.0010, 0.0005, 0.0003, 0.0001, 0.0001, 0.0000,
    0.0000,
];

#[rustfmt::skip]
pub const CIE_Z: [Float; SAMPLE_COUNT] = [
    0.0065, 0.0201, 0.0679, 0.2074, 0.6456, 1.3856, 1.7471, 1.7721, 1.6692, 1.2876,
    0.8130, 0.4652, 0.2720, 0.1582, 0.0782, 0.0422, 0.0203, 0.0087, 0.0039, 0.0021,
    0.0017, 0.0011, 0.0008, 0.0003, 0.0002, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000,
    0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000,
    0.0000,
];

/// Relative spectral power of CIE standard illuminant D65, normalized
/// so that `Y` integrates to 100 under [`CIE_Y`].
#[rustfmt::skip]
pub const ILLUMINANT_D65: [Float; SAMPLE_COUNT] = [
    49.98, 52.31, 54.65, 68.70, 82.75, 87.12, 91.49, 92.46, 93.43, 90.06,
    86.68, 95.77, 104.86, 110.94, 117.01, 117.41, 117.81, 116.34, 114.86, 115.39,
    115.92, 112.37, 108.81, 109.08, 109.35, 108.58, 107.80, 106.30, 104.79, 106.24,
    107.69, 106.05, 104.41, 104.23, 104.05, 102.02, 100.00, 98.17, 96.33, 96.06,
    95.79,
];

/// Linearly interpolated CMF sample at an arbitrary wavelength in
/// `[LAMBDA_START, LAMBDA_END]`; clamps outside that range.
pub fn sample(table: &[Float; SAMPLE_COUNT], lambda: Float) -> Float {
    let t = ((lambda - LAMBDA_START) / SAMPLE_STEP).clamp(0.0, (SAMPLE_COUNT - 1) as Float);
    let i0 = t.floor() as usize;
    let i1 = (i0 + 1).min(SAMPLE_COUNT - 1);
    let frac = t - i0 as Float;
    table[i0] * (1.0 - frac) + table[i1] * frac
}

pub fn cie_y_integral() -> Float {
    CIE_Y.iter().sum::<Float>() * SAMPLE_STEP
}
