//! Geometry loading with mesh-to-point-cloud fallback
//!
//! A file is read as a triangle mesh when it contains triangles and the mesh
//! reader produces at least one; otherwise it is read as a point cloud.
//! Reader errors and panics never leave this module: they only decide which
//! path is taken.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use viscrate_algorithms::{estimate_normals, DEFAULT_NORMAL_NEIGHBORS};
use viscrate_core::{Geometry, PointCloud, Result, TriangleMesh, DEFAULT_NORMAL};
use viscrate_io::{read_file_geometry_type, read_point_cloud, read_triangle_mesh};

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Run a reader, turning both errors and panics into `None`
fn guarded<T>(what: &str, path: &Path, read: impl FnOnce() -> Result<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(read)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            log::warn!("failed to read {} from {}: {}", what, path.display(), e);
            None
        }
        Err(_) => {
            log::warn!("{} reader panicked on {}", what, path.display());
            None
        }
    }
}

/// Fill in the attributes the renderer expects on every mesh
pub fn complete_mesh(mesh: &mut TriangleMesh) {
    if !mesh.has_vertex_normals() {
        log::info!("mesh has no normals, computing vertex normals");
        mesh.compute_vertex_normals();
    }
    if !mesh.has_vertex_colors() {
        mesh.paint_uniform_color(WHITE);
    }
    if !mesh.has_triangle_uvs() {
        mesh.set_triangle_uvs(vec![[0.0, 0.0]; 3 * mesh.face_count()]);
    }
}

/// Give every point a unit-length normal
pub fn complete_point_cloud(cloud: &mut PointCloud) {
    if !cloud.has_normals() {
        log::info!("point cloud has no normals, estimating with k = {}", DEFAULT_NORMAL_NEIGHBORS);
        if let Err(e) = estimate_normals(cloud, DEFAULT_NORMAL_NEIGHBORS) {
            log::warn!("normal estimation failed ({}), using {:?}", e, DEFAULT_NORMAL);
            cloud.normals = Some(vec![DEFAULT_NORMAL; cloud.len()]);
        }
    }
    cloud.normalize_normals();
}

fn load_mesh(path: &Path) -> Option<TriangleMesh> {
    let mut mesh = guarded("triangle mesh", path, || read_triangle_mesh(path))?;
    if mesh.faces.is_empty() {
        log::info!("{} contains no triangles, trying it as a point cloud", path.display());
        return None;
    }
    complete_mesh(&mut mesh);
    Some(mesh)
}

fn load_point_cloud(path: &Path) -> Option<PointCloud> {
    let mut cloud = guarded("point cloud", path, || read_point_cloud(path))?;
    if cloud.is_empty() {
        log::warn!("{} contains no points", path.display());
        return None;
    }
    complete_point_cloud(&mut cloud);
    Some(cloud)
}

/// Load a mesh or point cloud from `path`
///
/// Returns `None` when neither reader succeeds; the caller decides how to
/// abort.
pub fn load_geometry(path: &Path) -> Option<Geometry> {
    let contains_triangles = match read_file_geometry_type(path) {
        Ok(probe) => probe.contains_triangles,
        Err(e) => {
            log::warn!("could not classify {}: {}", path.display(), e);
            false
        }
    };

    if contains_triangles {
        if let Some(mesh) = load_mesh(path) {
            log::info!(
                "loaded mesh {}: {} vertices, {} triangles",
                path.display(),
                mesh.vertex_count(),
                mesh.face_count()
            );
            return Some(Geometry::TriangleMesh(mesh));
        }
        log::info!("{} did not load as a mesh, trying it as a point cloud", path.display());
    }

    match load_point_cloud(path) {
        Some(cloud) => {
            log::info!("loaded point cloud {}: {} points", path.display(), cloud.len());
            Some(Geometry::PointCloud(cloud))
        }
        None => {
            log::error!("failed to load {} as a mesh or a point cloud", path.display());
            None
        }
    }
}
