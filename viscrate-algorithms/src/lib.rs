//! # viscrate algorithms
//!
//! Point cloud processing used while loading geometry: k-nearest-neighbour
//! search and normal estimation.

pub mod nearest_neighbor;
pub mod normals;

// Re-export commonly used items
pub use nearest_neighbor::*;
pub use normals::*;
