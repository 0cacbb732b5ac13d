//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// 8-bit RGB color
pub type Color3 = [u8; 3];

/// Normal used wherever a direction cannot be derived
pub const DEFAULT_NORMAL: Vector3f = Vector3f::new(0.0, 0.0, 1.0);

/// Convert a float color in [0, 1] to 8-bit RGB, clamping out-of-range channels
pub fn color_from_f32(color: [f32; 3]) -> Color3 {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Convert an 8-bit RGB color to floats in [0, 1]
pub fn color_to_f32(color: Color3) -> [f32; 3] {
    color.map(|c| c as f32 / 255.0)
}
