//! Scene geometry: axis-aligned bounding boxes, rays, meshes, and the
//! coarse/fine intersection records the accelerator and BSDF layer pass
//! between each other.

pub mod aabb;
pub mod intersection;
pub mod mesh;
pub mod ray;

pub use aabb::Aabb;
pub use intersection::{CoarseIntersection, Direction, IntersectionPoint};
pub use mesh::Mesh;
pub use ray::LightRay;
