//! Core data structures and traits for viscrate
//!
//! This crate provides the geometry model shared by the loader, the IO
//! registry and the renderer: point clouds, triangle meshes with authored
//! materials, images, bounding boxes and the error type.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod material;
pub mod image;
pub mod bounds;
pub mod geometry;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use material::*;
pub use image::*;
pub use bounds::*;
pub use geometry::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Matrix4};
