//! Image plane and reconstruction filter (§4.6): a [`VectorMap2D`]
//! accumulator that every sample splats into under a Gaussian filter
//! footprint, finalized into a plain RGB buffer once rendering
//! completes.

use crate::maps::{RealImageBuffer, VectorMap2D};
use crate::math::Float;
use crate::spectrum::RgbSpectrum;

/// Gaussian reconstruction filter with a square support of `radius`
/// pixels (§4.6): `f(dx, dy) = exp(-alpha*(dx^2+dy^2))`, zeroed at the
/// support edge so distant samples contribute nothing.
#[derive(Debug, Clone, Copy)]
pub struct GaussianFilter {
    pub radius: Float,
    pub alpha: Float,
}

impl GaussianFilter {
    pub fn new(radius: Float, alpha: Float) -> Self {
        GaussianFilter { radius, alpha }
    }

    fn gaussian(&self, d: Float) -> Float {
        (-self.alpha * d * d).exp()
    }

    /// Filter weight at offset `(dx, dy)` from the sample center;
    /// clamped to zero outside the circular extent implied by
    /// `radius` along each axis independently.
    pub fn evaluate(&self, dx: Float, dy: Float) -> Float {
        let edge = self.gaussian(self.radius);
        (self.gaussian(dx) - edge).max(0.0) * (self.gaussian(dy) - edge).max(0.0)
    }
}

pub struct ImagePlane {
    width: usize,
    height: usize,
    origin_x: usize,
    origin_y: usize,
    filter: GaussianFilter,
    accumulator: VectorMap2D,
}

impl ImagePlane {
    pub fn new(width: usize, height: usize, filter: GaussianFilter) -> Self {
        ImagePlane {
            width,
            height,
            origin_x: 0,
            origin_y: 0,
            filter,
            accumulator: VectorMap2D::new(width, height),
        }
    }

    /// A scratch plane covering only the sub-region
    /// `[origin_x, origin_x+width) x [origin_y, origin_y+height)` of
    /// the full image (§4.7, §5): a tile worker allocates and splats
    /// into its own tile+filter-radius region instead of the full
    /// image, so peak scratch memory scales with tile size, not image
    /// size.
    pub fn new_region(origin_x: usize, origin_y: usize, width: usize, height: usize, filter: GaussianFilter) -> Self {
        ImagePlane {
            width,
            height,
            origin_x,
            origin_y,
            filter,
            accumulator: VectorMap2D::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw `(r*w, g*w, b*w, w)` accumulator, exposed so a partial
    /// render can be checkpointed to `.fpm` and re-finalized later
    /// (§6, §7 item 4).
    pub fn accumulator(&self) -> &VectorMap2D {
        &self.accumulator
    }

    /// Splats one sample's radiance onto every integer pixel within
    /// the filter's square support around `(image_x, image_y)`
    /// (§4.6). Not thread-safe on its own; callers confine concurrent
    /// splats to disjoint tile+filter-radius regions.
    pub fn add_sample(&mut self, image_x: Float, image_y: Float, radiance: RgbSpectrum) {
        if radiance.has_nans() {
            return;
        }
        let image_x = image_x - self.origin_x as Float;
        let image_y = image_y - self.origin_y as Float;
        let radius = self.filter.radius;
        let x0 = (image_x - radius).floor().max(0.0) as isize;
        let x1 = (image_x + radius).ceil().min(self.width as Float) as isize;
        let y0 = (image_y - radius).floor().max(0.0) as isize;
        let y1 = (image_y + radius).ceil().min(self.height as Float) as isize;

        for y in y0.max(0)..y1 {
            for x in x0.max(0)..x1 {
                let dx = (x as Float + 0.5) - image_x;
                let dy = (y as Float + 0.5) - image_y;
                let w = self.filter.evaluate(dx, dy);
                if w > 0.0 {
                    self.accumulator.splat(x as usize, y as usize, radiance, w);
                }
            }
        }
    }

    /// Merges another plane's accumulator into this one, cell by cell,
    /// translating `other`'s region origin back into this plane's
    /// coordinates (used to fold a per-tile scratch plane back into
    /// the shared image once a tile's border region is locked).
    pub fn merge(&mut self, other: &ImagePlane) {
        for y in 0..other.height {
            for x in 0..other.width {
                let cell = other.accumulator.get(x, y);
                if cell[3] > 0.0 {
                    let gx = other.origin_x + x;
                    let gy = other.origin_y + y;
                    if gx < self.width && gy < self.height {
                        self.accumulator.splat(
                            gx,
                            gy,
                            RgbSpectrum::new(cell[0] / cell[3], cell[1] / cell[3], cell[2] / cell[3]),
                            cell[3],
                        );
                    }
                }
            }
        }
    }

    pub fn finalize(&self) -> RealImageBuffer {
        self.accumulator.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_at_pixel_center_matches_its_own_radiance() {
        let mut plane = ImagePlane::new(4, 4, GaussianFilter::new(2.0, 2.0));
        plane.add_sample(1.5, 1.5, RgbSpectrum::new(1.0, 0.5, 0.25));
        let img = plane.finalize();
        let i = (1 * 4 + 1) * 3;
        assert!((img.rgb[i] - 1.0).abs() < 1e-2);
        assert!((img.rgb[i + 1] - 0.5).abs() < 1e-2);
    }

    #[test]
    fn filter_normalization_is_weighted_mean() {
        let mut plane = ImagePlane::new(1, 1, GaussianFilter::new(2.0, 2.0));
        plane.add_sample(0.5, 0.5, RgbSpectrum::gray(1.0));
        plane.add_sample(0.5, 0.5, RgbSpectrum::gray(0.0));
        let img = plane.finalize();
        assert!((img.rgb[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gaussian_filter_is_zero_outside_radius() {
        let filter = GaussianFilter::new(1.0, 2.0);
        assert_eq!(filter.evaluate(5.0, 0.0), 0.0);
    }

    #[test]
    fn region_plane_merges_into_full_plane_at_the_right_offset() {
        let filter = GaussianFilter::new(1.0, 2.0);
        let mut full = ImagePlane::new(8, 8, filter);
        // Tile scratch plane covering only columns/rows [4, 8), as a
        // `render_tile` worker would allocate for its own tile region.
        let mut region = ImagePlane::new_region(4, 4, 4, 4, filter);
        region.add_sample(5.5, 5.5, RgbSpectrum::gray(1.0));
        full.merge(&region);

        let img = full.finalize();
        let i = (5 * 8 + 5) * 3;
        assert!((img.rgb[i] - 1.0).abs() < 1e-2);
        // Nothing should have landed outside the region's footprint.
        assert_eq!(img.rgb[0], 0.0);
    }
}
