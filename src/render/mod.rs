//! Tile scheduler and worker pool (§4.7): partitions the image into a
//! queue of tiles, traces every sample of every tile's pixels through
//! the [`PathIntegrator`], and merges each tile's splats into the
//! shared [`ImagePlane`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::camera::Camera;
use crate::config::{RenderConfig, RenderPattern};
use crate::film::{GaussianFilter, ImagePlane};
use crate::integrator::{IntegratorSettings, PathIntegrator};
use crate::maps::RealImageBuffer;
use crate::material::TextureTable;
use crate::math::Float;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::spectrum::{CoefficientSpectrum, RgbSpectrum};

/// A contiguous pixel rectangle processed by one worker (§4.7, §GLOSSARY
/// "Tile").
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Tile {
    fn pixel_count(&self) -> u64 {
        (self.x1 - self.x0) as u64 * (self.y1 - self.y0) as u64
    }
}

/// Builds the tile queue in the configured traversal order: spiral
/// outward from the image center by default, row-major as the fallback
/// (§4.7).
pub fn tile_queue(width: u32, height: u32, tile_size: u32, pattern: RenderPattern) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let cols = (width + tile_size - 1) / tile_size;
    let rows = (height + tile_size - 1) / tile_size;
    let mut coords: Vec<(u32, u32)> = (0..rows).flat_map(|r| (0..cols).map(move |c| (c, r))).collect();

    if pattern == RenderPattern::Spiral {
        let cx = (cols as f64 - 1.0) / 2.0;
        let cy = (rows as f64 - 1.0) / 2.0;
        coords.sort_by(|a, b| {
            let da = (a.0 as f64 - cx).powi(2) + (a.1 as f64 - cy).powi(2);
            let db = (b.0 as f64 - cx).powi(2) + (b.1 as f64 - cy).powi(2);
            da.partial_cmp(&db).unwrap()
        });
    }

    coords
        .into_iter()
        .map(|(c, r)| {
            let x0 = c * tile_size;
            let y0 = r * tile_size;
            Tile { x0, y0, x1: (x0 + tile_size).min(width), y1: (y0 + tile_size).min(height) }
        })
        .collect()
}

/// Drives a full render of `scene` as seen by `camera`, under `config`
/// (§4.7). Owns nothing beyond its borrowed inputs; the returned buffer
/// is the only thing that outlives the call.
pub struct RenderDriver<'a> {
    config: RenderConfig,
    scene: &'a Scene,
    camera: &'a Camera,
    textures: &'a TextureTable,
    integrator: PathIntegrator,
}

impl<'a> RenderDriver<'a> {
    pub fn new(config: RenderConfig, scene: &'a Scene, camera: &'a Camera, textures: &'a TextureTable) -> Self {
        let integrator = PathIntegrator::new(IntegratorSettings::from_config(&config));
        RenderDriver { config, scene, camera, textures, integrator }
    }

    pub fn render(&self) -> RealImageBuffer {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(if self.config.multithreaded { self.config.threads } else { 1 })
            .stack_size(self.config.worker_stack_bytes)
            .build()
            .expect("failed to build the worker thread pool");

        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let filter = GaussianFilter::new(self.config.filter_radius, self.config.filter_alpha);
        let image = Mutex::new(ImagePlane::new(width, height, filter));
        let tiles = tile_queue(self.config.width, self.config.height, self.config.tile_size, self.config.render_pattern);

        let total_pixels: u64 = tiles.iter().map(Tile::pixel_count).sum();
        let done = AtomicU64::new(0);

        log::info!("rendering {} tiles ({} x {}, {} spp)", tiles.len(), self.config.width, self.config.height, self.config.samples_per_pixel);

        // Any panic inside a worker propagates out of `pool.install`,
        // aborting the render with no retry (§4.7, §7 item 4).
        pool.install(|| {
            if self.config.multithreaded {
                tiles.par_iter().enumerate().for_each(|(index, tile)| {
                    let tile_plane = self.render_tile(index as u64, tile, filter, width, height, &done, total_pixels);
                    image.lock().unwrap().merge(&tile_plane);
                });
            } else {
                for (index, tile) in tiles.iter().enumerate() {
                    let tile_plane = self.render_tile(index as u64, tile, filter, width, height, &done, total_pixels);
                    image.lock().unwrap().merge(&tile_plane);
                }
            }
        });

        log::info!("render finished: {} / {} pixels", done.load(Ordering::Relaxed), total_pixels);
        image.into_inner().unwrap().finalize()
    }

    /// Traces every sample in one tile into a scratch [`ImagePlane`]
    /// sized to the tile expanded by the filter radius — not the full
    /// image — so the caller can fold it into the shared plane with a
    /// single `merge` call (§4.6, §4.7, §5: scratch memory scales with
    /// tile size, not image size).
    fn render_tile(
        &self,
        worker_index: u64,
        tile: &Tile,
        filter: GaussianFilter,
        width: usize,
        height: usize,
        done: &AtomicU64,
        total_pixels: u64,
    ) -> ImagePlane {
        let radius = filter.radius.ceil() as isize;
        let rx0 = (tile.x0 as isize - radius).max(0) as usize;
        let ry0 = (tile.y0 as isize - radius).max(0) as usize;
        let rx1 = ((tile.x1 as isize + radius).max(0) as usize).min(width);
        let ry1 = ((tile.y1 as isize + radius).max(0) as usize).min(height);
        let mut plane = ImagePlane::new_region(rx0, ry0, rx1 - rx0, ry1 - ry0, filter);
        // Per-worker scratch allocator (§4.7), reset after every pixel so
        // no transient allocation outlives the samples it served.
        let mut scratch = bumpalo::Bump::with_capacity(4096);

        for py in tile.y0..tile.y1 {
            for px in tile.x0..tile.x1 {
                let pixel_index = py as u64 * self.config.width as u64 + px as u64;
                let worker_seed = if self.config.deterministic_seed { worker_index } else { rand::random() };

                for s in 0..self.config.samples_per_pixel {
                    let mut sampler = Sampler::for_pixel_sample(worker_seed, pixel_index, s as u64);
                    let (jx, jy) = sampler.next_2d();
                    let image_x = px as Float + jx;
                    let image_y = py as Float + jy;
                    let lens_sample = sampler.next_2d();
                    let ray = self.camera.generate_ray(image_x, image_y, lens_sample);

                    let mut l = self.integrator.li(ray, self.scene, self.textures, &mut sampler);
                    if l.has_nans() {
                        log::warn!("NaN radiance at pixel ({}, {}) sample {}, clamped to black", px, py, s);
                        l = RgbSpectrum::ZERO;
                    }
                    plane.add_sample(image_x, image_y, l);
                }

                scratch.reset();
                let count = done.fetch_add(1, Ordering::Relaxed) + 1;
                if count % 1000 == 0 || count == total_pixels {
                    log::info!("progress: {} / {} pixels", count, total_pixels);
                }
            }
        }

        plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialLibrary;
    use crate::math::Vector3;

    #[test]
    fn spiral_queue_starts_near_center() {
        let tiles = tile_queue(128, 128, 32, RenderPattern::Spiral);
        let first = tiles[0];
        assert!(first.x0 == 32 || first.x0 == 64);
        assert!(first.y0 == 32 || first.y0 == 64);
    }

    #[test]
    fn row_major_queue_starts_top_left() {
        let tiles = tile_queue(128, 128, 32, RenderPattern::RowMajor);
        assert_eq!((tiles[0].x0, tiles[0].y0), (0, 0));
    }

    #[test]
    fn tile_queue_covers_every_pixel_exactly_once() {
        let tiles = tile_queue(100, 60, 32, RenderPattern::RowMajor);
        let total: u64 = tiles.iter().map(Tile::pixel_count).sum();
        assert_eq!(total, 100 * 60);
    }

    #[test]
    fn single_threaded_render_produces_a_full_image() {
        let materials = MaterialLibrary::new();
        let scene = Scene::new(materials, RgbSpectrum::gray(0.1));
        let camera = Camera::look_at(
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::ZERO,
            Vector3::new(0.0, 1.0, 0.0),
            40.0,
            8,
            8,
            crate::camera::CameraKind::Pinhole,
        );
        let textures = TextureTable::new();
        let mut config = RenderConfig::default();
        config.width = 8;
        config.height = 8;
        config.samples_per_pixel = 2;
        config.multithreaded = false;
        config.threads = 1;
        config.tile_size = 4;

        let driver = RenderDriver::new(config, &scene, &camera, &textures);
        let image = driver.render();
        assert_eq!(image.width, 8);
        assert_eq!(image.height, 8);
        for c in &image.rgb {
            assert!((c - 0.1).abs() < 1e-3);
        }
    }
}
