//! Render driver configuration, deserializable from TOML or JSON by an
//! embedder so that this crate never needs to know about a scene
//! description language.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tile traversal order handed to the scheduler in [`crate::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderPattern {
    /// Spiral outward from the image center (default).
    Spiral,
    /// Row-major left-to-right, top-to-bottom.
    RowMajor,
}

impl Default for RenderPattern {
    fn default() -> Self {
        RenderPattern::Spiral
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub threads: usize,
    pub multithreaded: bool,
    pub deterministic_seed: bool,
    pub background: [f32; 3],
    pub direct_light_sampling: bool,
    pub render_pattern: RenderPattern,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub max_depth_with_transmission: u32,
    pub filter_radius: f32,
    pub filter_alpha: f32,
    pub tile_size: u32,
    pub worker_stack_bytes: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1280,
            height: 720,
            threads: num_cpus::get(),
            multithreaded: true,
            deterministic_seed: true,
            background: [0.0, 0.0, 0.0],
            direct_light_sampling: true,
            render_pattern: RenderPattern::Spiral,
            samples_per_pixel: 64,
            max_depth: 4,
            max_depth_with_transmission: 16,
            filter_radius: 2.0,
            filter_alpha: 2.0,
            tile_size: 32,
            worker_stack_bytes: 50 * 1024 * 1024,
        }
    }
}

impl RenderConfig {
    /// Checks the option table in isolation; does not touch the
    /// filesystem or scene.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads(self.threads));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::NonPositiveResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamplesPerPixel(self.samples_per_pixel));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth(self.max_depth));
        }
        if self.filter_radius <= 0.0 {
            return Err(ConfigError::NonPositiveFilterRadius(self.filter_radius));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::NonPositiveTileSize(self.tile_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        RenderConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_threads_rejected() {
        let mut cfg = RenderConfig::default();
        cfg.threads = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroThreads(0))));
    }

    #[test]
    fn zero_resolution_rejected() {
        let mut cfg = RenderConfig::default();
        cfg.width = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositiveResolution { .. })
        ));
    }
}
