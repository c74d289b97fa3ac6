use crate::maps::{ComplexMap2D, RealMap2D, VectorMap2D};
use crate::math::Float;

/// The transmittance mask the diffraction pipeline FFTs. Only the two
/// shapes the original renderer's demos actually used are modelled;
/// an arbitrary mask would be supplied as a `dirt_map` instead.
pub enum Aperture {
    Circular { radius: Float },
    Polygonal { sides: usize, radius: Float, rotation: Float },
}

impl Aperture {
    /// Rasterizes the transmittance function into a `resolution` x
    /// `resolution` real map, multiplies in `dirt_map` if supplied
    /// (bilinear-sampled to the raster resolution), then promotes to
    /// a complex map ready for FFT.
    pub fn rasterize(&self, resolution: usize, dirt_map: Option<&VectorMap2D>) -> ComplexMap2D {
        let mut mask = RealMap2D::new(resolution, resolution);
        let center = resolution as Float / 2.0;
        for y in 0..resolution {
            for x in 0..resolution {
                let dx = (x as Float + 0.5 - center) / center;
                let dy = (y as Float + 0.5 - center) / center;
                let inside = self.contains(dx, dy);
                mask.set(x, y, if inside { 1.0 } else { 0.0 });
            }
        }

        if let Some(dirt) = dirt_map {
            for y in 0..resolution {
                for x in 0..resolution {
                    let u = x as Float / resolution as Float * dirt.width as Float;
                    let v = y as Float / resolution as Float * dirt.height as Float;
                    let sample = dirt.sample_bilinear(u, v);
                    let dirt_transmittance = (sample[0] + sample[1] + sample[2]) / 3.0;
                    mask.set(x, y, mask.get(x, y) * dirt_transmittance);
                }
            }
        }

        ComplexMap2D::from_real(&mask)
    }

    fn contains(&self, x: Float, y: Float) -> bool {
        match *self {
            Aperture::Circular { radius } => (x * x + y * y).sqrt() <= radius,
            Aperture::Polygonal { sides, radius, rotation } => {
                let r = (x * x + y * y).sqrt();
                if r > radius {
                    return false;
                }
                let theta = y.atan2(x) - rotation;
                let sector = std::f32::consts::PI * 2.0 / sides as Float;
                let local = theta.rem_euclid(sector) - sector * 0.5;
                let apothem = radius * (std::f32::consts::PI / sides as Float).cos();
                r * local.cos() <= apothem
            }
        }
    }
}
