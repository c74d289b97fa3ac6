//! Error taxonomy for the renderer: input errors, configuration errors,
//! and the top-level error a caller matches on. Numerical degeneracies
//! and light-transport edge cases are handled in-line where they occur
//! and never reach these types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("vertex index {index} out of range (mesh has {count} vertices)")]
    VertexIndexOutOfRange { index: u32, count: usize },

    #[error("face {face} references normal index {index} out of range ({count} normals)")]
    NormalIndexOutOfRange {
        face: usize,
        index: u32,
        count: usize,
    },

    #[error("degenerate face {face}: cross product magnitude {magnitude} below tolerance")]
    DegenerateFace { face: usize, magnitude: f32 },

    #[error("mesh arrays have mismatched lengths: {what}")]
    MismatchedArrays { what: String },
}

#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("unknown material name: {0}")]
    UnknownMaterial(String),

    #[error("material library already contains a material named {0}")]
    DuplicateMaterial(String),

    #[error("material {material} references an undefined texture {texture}")]
    UndefinedTexture { material: String, texture: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("thread count must be at least 1, got {0}")]
    ZeroThreads(usize),

    #[error("image resolution must be positive, got {width}x{height}")]
    NonPositiveResolution { width: u32, height: u32 },

    #[error("samples per pixel must be at least 1, got {0}")]
    ZeroSamplesPerPixel(u32),

    #[error("max_depth must be at least 1, got {0}")]
    ZeroMaxDepth(u32),

    #[error("filter radius must be positive, got {0}")]
    NonPositiveFilterRadius(f32),

    #[error("tile size must be positive, got {0}")]
    NonPositiveTileSize(u32),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("material error: {0}")]
    Material(#[from] MaterialError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encode error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
