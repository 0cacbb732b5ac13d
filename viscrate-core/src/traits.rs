//! Core traits for viscrate

use crate::{bounds::AxisAlignedBoundingBox, geometry::Geometry, mesh::TriangleMesh, point::*, point_cloud::PointCloud};

/// Trait for nearest neighbor search functionality
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point, as `(index, distance)` pairs sorted by distance
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;

    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)>;
}

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> AxisAlignedBoundingBox;

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        self.bounding_box().center()
    }
}

impl Drawable for PointCloud {
    fn bounding_box(&self) -> AxisAlignedBoundingBox {
        AxisAlignedBoundingBox::from_points(&self.points)
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> AxisAlignedBoundingBox {
        AxisAlignedBoundingBox::from_points(&self.vertices)
    }
}

impl Drawable for Geometry {
    fn bounding_box(&self) -> AxisAlignedBoundingBox {
        match self {
            Geometry::TriangleMesh(mesh) => mesh.bounding_box(),
            Geometry::PointCloud(cloud) => cloud.bounding_box(),
        }
    }
}
