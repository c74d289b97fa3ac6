//! 2-D map types shared between the image plane ([`crate::film`]) and
//! the Fraunhofer diffraction pipeline ([`crate::diffraction`]): plain
//! real maps, 4-component vector maps (used for colour + weight
//! accumulation), and complex maps (used for FFT/CFT work).

mod complex;
mod real;
mod vector;

pub use complex::ComplexMap2D;
pub use real::RealMap2D;
pub use vector::{RealImageBuffer, VectorMap2D};

use crate::math::Float;

/// Bilinear sample helper shared by every map type: given continuous
/// coordinates in pixel space, returns the four neighbouring integer
/// coordinates and their interpolation weights.
pub(crate) fn bilinear_weights(x: Float, y: Float, width: usize, height: usize) -> [(usize, usize, Float); 4] {
    let x = x.clamp(0.0, (width - 1) as Float);
    let y = y.clamp(0.0, (height - 1) as Float);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as Float;
    let fy = y - y0 as Float;
    [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ]
}

pub(crate) fn next_pow2_with_margin(n: usize, safety_factor: Float) -> usize {
    crate::math::next_power_of_two(((n as Float) * safety_factor).ceil() as usize)
}
