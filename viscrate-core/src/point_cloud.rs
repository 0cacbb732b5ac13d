//! Point cloud data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A point cloud with optional per-point normals and colors
///
/// When present, `normals` and `colors` hold exactly one entry per point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point3f>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<Color3>>,
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<Point3f>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: Point3f) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3f> {
        self.points.iter()
    }

    /// Whether every point carries a normal
    pub fn has_normals(&self) -> bool {
        !self.points.is_empty()
            && self.normals.as_ref().is_some_and(|n| n.len() == self.points.len())
    }

    /// Whether every point carries a color
    pub fn has_colors(&self) -> bool {
        !self.points.is_empty()
            && self.colors.as_ref().is_some_and(|c| c.len() == self.points.len())
    }

    /// Set per-point normals; ignored if the count does not match
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.points.len() {
            self.normals = Some(normals);
        }
    }

    /// Set per-point colors; ignored if the count does not match
    pub fn set_colors(&mut self, colors: Vec<Color3>) {
        if colors.len() == self.points.len() {
            self.colors = Some(colors);
        }
    }

    /// Rescale every normal to unit length
    ///
    /// Zero-length normals have no direction to keep and become `DEFAULT_NORMAL`.
    pub fn normalize_normals(&mut self) {
        if let Some(normals) = &mut self.normals {
            for normal in normals.iter_mut() {
                *normal = normal.try_normalize(f32::EPSILON).unwrap_or(DEFAULT_NORMAL);
            }
        }
    }

    /// Assign the same color to every point
    pub fn paint_uniform_color(&mut self, color: [f32; 3]) {
        self.colors = Some(vec![color_from_f32(color); self.points.len()]);
    }

    /// Clear all points and attributes
    pub fn clear(&mut self) {
        self.points.clear();
        self.normals = None;
        self.colors = None;
    }
}

impl Index<usize> for PointCloud {
    type Output = Point3f;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for PointCloud {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3f;
    type IntoIter = std::slice::Iter<'a, Point3f>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<Point3f> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3f>>(iter: I) -> Self {
        Self::from_points(Vec::from_iter(iter))
    }
}
