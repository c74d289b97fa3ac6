//! Materials and the BSDF graph's value inputs: an append-only,
//! name-indexed [`MaterialLibrary`] (§3) plus the small expression
//! graph ([`ValueNode`]) and texture table that feed a BSDF's
//! diffuse/specular reflectance parameters.

mod texture;
mod value_node;

pub use texture::{Texture, TextureId, TextureTable};
pub use value_node::{BinaryOp, Channel, UnaryOp, ValueNode};

use std::collections::HashMap;

use crate::bsdf::Bsdf;
use crate::error::MaterialError;
use crate::spectrum::{CoefficientSpectrum, RgbSpectrum};

/// Index into a [`MaterialLibrary`], stored in each face's auxiliary
/// data (§3 `Mesh`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

pub struct Material {
    pub name: String,
    pub emission: RgbSpectrum,
    pub bsdf: Bsdf,
}

/// Append-only, name-indexed table of materials (§3). Populated during
/// scene load and immutable during render — nothing in the render loop
/// takes `&mut MaterialLibrary`.
#[derive(Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    by_name: HashMap<String, MaterialId>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        MaterialLibrary::default()
    }

    pub fn insert(&mut self, material: Material) -> Result<MaterialId, MaterialError> {
        if self.by_name.contains_key(&material.name) {
            return Err(MaterialError::DuplicateMaterial(material.name.clone()));
        }
        let id = MaterialId(self.materials.len() as u32);
        self.by_name.insert(material.name.clone(), id);
        self.materials.push(material);
        Ok(id)
    }

    /// Looks up a material by name, resolving to `default` when absent
    /// (§6: "unknown materials resolve to a caller-supplied default
    /// index") rather than erroring.
    pub fn resolve(&self, name: &str, default: MaterialId) -> MaterialId {
        self.by_name.get(name).copied().unwrap_or(default)
    }

    pub fn get_index(&self, name: &str) -> Result<MaterialId, MaterialError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| MaterialError::UnknownMaterial(name.to_string()))
    }

    pub fn get(&self, id: MaterialId) -> &Material {
        &self.materials[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Bsdf;

    fn material(name: &str) -> Material {
        Material {
            name: name.to_string(),
            emission: RgbSpectrum::ZERO,
            bsdf: Bsdf::lambert(ValueNode::constant(RgbSpectrum::gray(0.5))),
        }
    }

    #[test]
    fn insert_then_lookup_by_name() {
        let mut lib = MaterialLibrary::new();
        let id = lib.insert(material("red")).unwrap();
        assert_eq!(lib.get_index("red").unwrap(), id);
    }

    #[test]
    fn duplicate_name_errors() {
        let mut lib = MaterialLibrary::new();
        lib.insert(material("red")).unwrap();
        assert!(matches!(
            lib.insert(material("red")),
            Err(MaterialError::DuplicateMaterial(_))
        ));
    }

    #[test]
    fn unknown_name_resolves_to_default() {
        let mut lib = MaterialLibrary::new();
        let default = lib.insert(material("default")).unwrap();
        assert_eq!(lib.resolve("missing", default), default);
    }
}
