//! I/O operations for point clouds, meshes and images
//!
//! Reading and writing dispatch on the lowercase file extension through
//! the process-wide [`registry::default_registry`]. PLY, OBJ (with MTL
//! materials) and XYZ are registered out of the box.

pub mod image_io;
pub mod mtl;
pub mod obj;
pub mod ply;
pub mod registry;
pub mod xyz;

pub use image_io::{read_image, write_image};
pub use registry::{
    default_registry, file_extension, GeometryProbe, IoRegistry, MeshReader, MeshWriter, PointCloudReader,
    PointCloudWriter, WriteOptions,
};

use std::path::Path;
use viscrate_core::{FileGeometry, PointCloud, Result, TriangleMesh};

/// Read a triangle mesh, choosing the reader by file extension
pub fn read_triangle_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    default_registry().read_mesh(path.as_ref())
}

/// Write a triangle mesh, choosing the writer by file extension
pub fn write_triangle_mesh<P: AsRef<Path>>(path: P, mesh: &TriangleMesh, options: &WriteOptions) -> Result<()> {
    default_registry().write_mesh(mesh, path.as_ref(), options)
}

/// Read a point cloud, choosing the reader by file extension
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud> {
    default_registry().read_point_cloud(path.as_ref())
}

/// Write a point cloud, choosing the writer by file extension
pub fn write_point_cloud<P: AsRef<Path>>(path: P, cloud: &PointCloud, options: &WriteOptions) -> Result<()> {
    default_registry().write_point_cloud(cloud, path.as_ref(), options)
}

/// Classify what a file contains without reading all of it
pub fn read_file_geometry_type<P: AsRef<Path>>(path: P) -> Result<FileGeometry> {
    default_registry().probe(path.as_ref())
}
