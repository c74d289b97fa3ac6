use crate::math::{Float, Vector2};
use crate::maps::VectorMap2D;
use crate::spectrum::RgbSpectrum;

/// A sampleable image, referenced by index from a [`ValueNode::Texture`](super::ValueNode::Texture).
/// Backed by the same [`VectorMap2D`] the image plane and diffraction
/// pipeline use, so a loaded texture and a rendered image share one
/// sampling primitive.
pub struct Texture {
    map: VectorMap2D,
}

impl Texture {
    pub fn new(map: VectorMap2D) -> Self {
        Texture { map }
    }

    pub fn sample(&self, uv: Vector2) -> RgbSpectrum {
        let u = uv.x.rem_euclid(1.0) * (self.map.width.max(1) - 1).max(1) as Float;
        let v = uv.y.rem_euclid(1.0) * (self.map.height.max(1) - 1).max(1) as Float;
        let c = self.map.sample_bilinear(u, v);
        RgbSpectrum::new(c[0], c[1], c[2])
    }
}

/// Append-only table of loaded textures, indexed the same way
/// [`crate::material::MaterialLibrary`] indexes materials.
#[derive(Default)]
pub struct TextureTable {
    textures: Vec<Texture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureTable {
    pub fn new() -> Self {
        TextureTable::default()
    }

    pub fn insert(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }

    pub fn get(&self, id: TextureId) -> &Texture {
        &self.textures[id.0 as usize]
    }
}
