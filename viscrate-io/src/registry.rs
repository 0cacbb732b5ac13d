//! Extension-keyed IO registry
//!
//! Handlers are registered per lowercase file extension. Dispatch never
//! panics: an empty or unknown extension is logged and reported as
//! `Error::UnsupportedFormat`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use viscrate_core::{Error, FileGeometry, PointCloud, Result, TriangleMesh};

/// Options shared by the writers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Prefer a text encoding where the format offers one
    pub write_ascii: bool,
}

/// Trait for reading point clouds from files
pub trait PointCloudReader: Send + Sync {
    /// Read a point cloud from the given path
    fn read_point_cloud(&self, path: &Path) -> Result<PointCloud>;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

/// Trait for writing point clouds to files
pub trait PointCloudWriter: Send + Sync {
    /// Write a point cloud to the given path
    fn write_point_cloud(&self, cloud: &PointCloud, path: &Path, options: &WriteOptions) -> Result<()>;

    /// Get the format name this writer handles
    fn format_name(&self) -> &'static str;
}

/// Trait for reading meshes from files
pub trait MeshReader: Send + Sync {
    /// Read a mesh from the given path
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh>;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

/// Trait for writing meshes to files
pub trait MeshWriter: Send + Sync {
    /// Write a mesh to the given path
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path, options: &WriteOptions) -> Result<()>;

    /// Get the format name this writer handles
    fn format_name(&self) -> &'static str;
}

/// Classifies file content without a full parse
pub trait GeometryProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<FileGeometry>;
}

/// IO registry that manages format handlers and provides unified access
#[derive(Default)]
pub struct IoRegistry {
    point_cloud_readers: HashMap<String, Box<dyn PointCloudReader>>,
    point_cloud_writers: HashMap<String, Box<dyn PointCloudWriter>>,
    mesh_readers: HashMap<String, Box<dyn MeshReader>>,
    mesh_writers: HashMap<String, Box<dyn MeshWriter>>,
    probes: HashMap<String, Box<dyn GeometryProbe>>,
}

/// Lowercase extension of `path`, if it has a non-empty one
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn lookup<'a, T: ?Sized>(
    table: &'a HashMap<String, Box<T>>,
    path: &Path,
    action: &str,
) -> Result<&'a T> {
    let handler = file_extension(path).and_then(|ext| table.get(&ext));
    match handler {
        Some(handler) => Ok(handler.as_ref()),
        None => {
            log::warn!("{} failed: unknown file extension for {}", action, path.display());
            Err(Error::UnsupportedFormat(format!(
                "{}: no handler for extension {:?}",
                action,
                path.extension().unwrap_or_default()
            )))
        }
    }
}

impl IoRegistry {
    /// Create a new empty IO registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the PLY, OBJ and XYZ handlers
    pub fn with_default_formats() -> Self {
        let mut registry = Self::new();

        registry.register_point_cloud_reader("ply", Box::new(crate::ply::PlyFormat));
        registry.register_point_cloud_writer("ply", Box::new(crate::ply::PlyFormat));
        registry.register_mesh_reader("ply", Box::new(crate::ply::PlyFormat));
        registry.register_mesh_writer("ply", Box::new(crate::ply::PlyFormat));
        registry.register_probe("ply", Box::new(crate::ply::PlyFormat));

        registry.register_point_cloud_reader("obj", Box::new(crate::obj::ObjFormat));
        registry.register_mesh_reader("obj", Box::new(crate::obj::ObjFormat));
        registry.register_mesh_writer("obj", Box::new(crate::obj::ObjFormat));
        registry.register_probe("obj", Box::new(crate::obj::ObjFormat));

        registry.register_point_cloud_reader("xyz", Box::new(crate::xyz::XyzFormat));
        registry.register_point_cloud_writer("xyz", Box::new(crate::xyz::XyzFormat));
        registry.register_probe("xyz", Box::new(crate::xyz::XyzFormat));

        registry
    }

    /// Register a point cloud reader for a specific format
    pub fn register_point_cloud_reader(&mut self, format: &str, handler: Box<dyn PointCloudReader>) {
        self.point_cloud_readers.insert(format.to_lowercase(), handler);
    }

    /// Register a point cloud writer for a specific format
    pub fn register_point_cloud_writer(&mut self, format: &str, handler: Box<dyn PointCloudWriter>) {
        self.point_cloud_writers.insert(format.to_lowercase(), handler);
    }

    /// Register a mesh reader for a specific format
    pub fn register_mesh_reader(&mut self, format: &str, handler: Box<dyn MeshReader>) {
        self.mesh_readers.insert(format.to_lowercase(), handler);
    }

    /// Register a mesh writer for a specific format
    pub fn register_mesh_writer(&mut self, format: &str, handler: Box<dyn MeshWriter>) {
        self.mesh_writers.insert(format.to_lowercase(), handler);
    }

    /// Register a content probe for a specific format
    pub fn register_probe(&mut self, format: &str, handler: Box<dyn GeometryProbe>) {
        self.probes.insert(format.to_lowercase(), handler);
    }

    pub fn read_point_cloud(&self, path: &Path) -> Result<PointCloud> {
        lookup(&self.point_cloud_readers, path, "Read PointCloud")?.read_point_cloud(path)
    }

    pub fn write_point_cloud(&self, cloud: &PointCloud, path: &Path, options: &WriteOptions) -> Result<()> {
        lookup(&self.point_cloud_writers, path, "Write PointCloud")?.write_point_cloud(cloud, path, options)
    }

    pub fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        lookup(&self.mesh_readers, path, "Read TriangleMesh")?.read_mesh(path)
    }

    pub fn write_mesh(&self, mesh: &TriangleMesh, path: &Path, options: &WriteOptions) -> Result<()> {
        lookup(&self.mesh_writers, path, "Write TriangleMesh")?.write_mesh(mesh, path, options)
    }

    pub fn probe(&self, path: &Path) -> Result<FileGeometry> {
        lookup(&self.probes, path, "Read geometry type")?.probe(path)
    }

    /// Get a list of supported formats for point clouds
    pub fn supported_point_cloud_formats(&self) -> Vec<String> {
        self.point_cloud_readers.keys().cloned().collect()
    }

    /// Get a list of supported formats for meshes
    pub fn supported_mesh_formats(&self) -> Vec<String> {
        self.mesh_readers.keys().cloned().collect()
    }

    /// Check if a format is supported for reading point clouds
    pub fn supports_point_cloud_reading(&self, format: &str) -> bool {
        self.point_cloud_readers.contains_key(&format.to_lowercase())
    }

    /// Check if a format is supported for writing point clouds
    pub fn supports_point_cloud_writing(&self, format: &str) -> bool {
        self.point_cloud_writers.contains_key(&format.to_lowercase())
    }

    /// Check if a format is supported for reading meshes
    pub fn supports_mesh_reading(&self, format: &str) -> bool {
        self.mesh_readers.contains_key(&format.to_lowercase())
    }

    /// Check if a format is supported for writing meshes
    pub fn supports_mesh_writing(&self, format: &str) -> bool {
        self.mesh_writers.contains_key(&format.to_lowercase())
    }
}

/// Process-wide registry with the built-in formats
pub fn default_registry() -> &'static IoRegistry {
    static REGISTRY: OnceLock<IoRegistry> = OnceLock::new();
    REGISTRY.get_or_init(IoRegistry::with_default_formats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use viscrate_core::Point3f;

    struct MockPlyHandler;

    impl PointCloudReader for MockPlyHandler {
        fn read_point_cloud(&self, _path: &Path) -> Result<PointCloud> {
            let mut cloud = PointCloud::new();
            cloud.push(Point3f::new(0.0, 0.0, 0.0));
            Ok(cloud)
        }

        fn format_name(&self) -> &'static str {
            "ply"
        }
    }

    impl MeshReader for MockPlyHandler {
        fn read_mesh(&self, _path: &Path) -> Result<TriangleMesh> {
            let vertices = vec![Point3f::new(0.0, 0.0, 0.0)];
            Ok(TriangleMesh::from_vertices_and_faces(vertices, vec![]))
        }

        fn format_name(&self) -> &'static str {
            "ply"
        }
    }

    #[test]
    fn test_registry_registration() {
        let mut registry = IoRegistry::new();

        registry.register_point_cloud_reader("PLY", Box::new(MockPlyHandler));
        registry.register_mesh_reader("ply", Box::new(MockPlyHandler));

        assert!(registry.supports_point_cloud_reading("ply"));
        assert!(registry.supports_mesh_reading("Ply"));
        assert!(!registry.supports_point_cloud_writing("ply"));
        assert!(!registry.supports_mesh_reading("xyz"));
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let mut registry = IoRegistry::new();
        registry.register_point_cloud_reader("ply", Box::new(MockPlyHandler));

        let cloud = registry.read_point_cloud(Path::new("scan.PLY")).unwrap();
        assert_eq!(cloud.len(), 1);
    }

    #[test]
    fn test_unknown_extension() {
        let registry = IoRegistry::new();

        for path in ["model.xyz", "model", "model."] {
            let result = registry.read_point_cloud(Path::new(path));
            assert!(matches!(result, Err(Error::UnsupportedFormat(_))), "{}", path);

            let result = registry.read_mesh(Path::new(path));
            assert!(matches!(result, Err(Error::UnsupportedFormat(_))), "{}", path);
        }

        let result = registry.write_mesh(&TriangleMesh::new(), Path::new("out.stl"), &WriteOptions::default());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_default_registry_formats() {
        let registry = default_registry();

        let mut formats = registry.supported_point_cloud_formats();
        formats.sort();
        assert_eq!(formats, vec!["obj", "ply", "xyz"]);

        assert!(registry.supports_mesh_writing("ply"));
        assert!(registry.supports_mesh_writing("obj"));
        assert!(!registry.supports_mesh_reading("xyz"));
    }
}
