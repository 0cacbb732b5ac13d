//! Geometry variants handled by the loader and renderer

use crate::mesh::TriangleMesh;
use crate::point_cloud::PointCloud;

/// Kind of geometry, for logging and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    TriangleMesh,
    PointCloud,
}

/// Loaded geometry: either a triangle mesh or a point cloud
#[derive(Debug, Clone)]
pub enum Geometry {
    TriangleMesh(TriangleMesh),
    PointCloud(PointCloud),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::TriangleMesh(_) => GeometryType::TriangleMesh,
            Geometry::PointCloud(_) => GeometryType::PointCloud,
        }
    }

    pub fn as_mesh(&self) -> Option<&TriangleMesh> {
        match self {
            Geometry::TriangleMesh(mesh) => Some(mesh),
            Geometry::PointCloud(_) => None,
        }
    }

    pub fn as_point_cloud(&self) -> Option<&PointCloud> {
        match self {
            Geometry::PointCloud(cloud) => Some(cloud),
            Geometry::TriangleMesh(_) => None,
        }
    }
}

impl From<TriangleMesh> for Geometry {
    fn from(mesh: TriangleMesh) -> Self {
        Geometry::TriangleMesh(mesh)
    }
}

impl From<PointCloud> for Geometry {
    fn from(cloud: PointCloud) -> Self {
        Geometry::PointCloud(cloud)
    }
}

/// What a file contains, as determined without a full parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileGeometry {
    pub contains_points: bool,
    pub contains_lines: bool,
    pub contains_triangles: bool,
}
