//! Axis-aligned bounding boxes

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// An axis-aligned box; the empty box has `min > max` and unions as identity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAlignedBoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl Default for AxisAlignedBoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl AxisAlignedBoundingBox {
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3f::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3f::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut bbox = Self::empty();
        for p in points {
            bbox.min = bbox.min.inf(p);
            bbox.max = bbox.max.sup(p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Box center; the origin for an empty box
    pub fn center(&self) -> Point3f {
        if self.is_empty() {
            return Point3f::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths; zero for an empty box
    pub fn extent(&self) -> Vector3f {
        if self.is_empty() {
            return Vector3f::zeros();
        }
        self.max - self.min
    }

    /// Longest edge length
    pub fn max_extent(&self) -> f32 {
        self.extent().max()
    }
}

impl AddAssign for AxisAlignedBoundingBox {
    fn add_assign(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }
}
