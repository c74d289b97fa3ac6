//! Spatial acceleration: the SAH KD-tree over mesh faces.

pub mod kdtree;

pub use kdtree::KdTree;
