//! Mesh data structures and functionality

use crate::material::MeshMaterial;
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and optional surface attributes
///
/// `triangle_uvs` holds three texture coordinates per face, in face order.
/// `materials` keeps named materials in the order they were declared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<Color3>>,
    pub triangle_uvs: Option<Vec<[f32; 2]>>,
    #[serde(skip)]
    pub materials: Vec<(String, MeshMaterial)>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            ..Default::default()
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    pub fn has_vertex_normals(&self) -> bool {
        !self.vertices.is_empty()
            && self.normals.as_ref().is_some_and(|n| n.len() == self.vertices.len())
    }

    pub fn has_vertex_colors(&self) -> bool {
        !self.vertices.is_empty()
            && self.colors.as_ref().is_some_and(|c| c.len() == self.vertices.len())
    }

    /// Whether every face corner has a texture coordinate
    pub fn has_triangle_uvs(&self) -> bool {
        !self.faces.is_empty()
            && self.triangle_uvs.as_ref().is_some_and(|uv| uv.len() == 3 * self.faces.len())
    }

    pub fn has_materials(&self) -> bool {
        !self.materials.is_empty()
    }

    /// Calculate unit face normals
    ///
    /// Degenerate faces yield `DEFAULT_NORMAL`.
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                self.face_area_normal(face)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or(DEFAULT_NORMAL)
            })
            .collect()
    }

    /// Cross product of the face edges; its length is twice the face area
    fn face_area_normal(&self, face: &[usize; 3]) -> Vector3f {
        let v0 = self.vertices[face[0]];
        let v1 = self.vertices[face[1]];
        let v2 = self.vertices[face[2]];

        (v1 - v0).cross(&(v2 - v0))
    }

    /// Compute area-weighted vertex normals, replacing any existing ones
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];

        for face in &self.faces {
            let weighted = self.face_area_normal(face);
            for &index in face {
                normals[index] += weighted;
            }
        }

        for normal in &mut normals {
            *normal = normal.try_normalize(f32::EPSILON).unwrap_or(DEFAULT_NORMAL);
        }

        self.normals = Some(normals);
    }

    /// Assign the same color to every vertex
    pub fn paint_uniform_color(&mut self, color: [f32; 3]) {
        self.colors = Some(vec![color_from_f32(color); self.vertices.len()]);
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Set vertex colors
    pub fn set_colors(&mut self, colors: Vec<Color3>) {
        if colors.len() == self.vertices.len() {
            self.colors = Some(colors);
        }
    }

    /// Set per-corner texture coordinates
    pub fn set_triangle_uvs(&mut self, uvs: Vec<[f32; 2]>) {
        if uvs.len() == 3 * self.faces.len() {
            self.triangle_uvs = Some(uvs);
        }
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(5.0, 5.0, 5.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_compute_vertex_normals() {
        let mut mesh = quad();
        mesh.compute_vertex_normals();

        assert!(mesh.has_vertex_normals());
        let normals = mesh.normals.as_ref().unwrap();
        for normal in &normals[..4] {
            assert_relative_eq!(*normal, Vector3f::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        }
        // isolated vertex
        assert_eq!(normals[4], DEFAULT_NORMAL);
    }

    #[test]
    fn test_area_weighting() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(10.0, 0.0, 0.0),
                Point3f::new(0.0, 10.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 3, 1]],
        );
        mesh.compute_vertex_normals();

        let n0 = mesh.normals.as_ref().unwrap()[0];
        assert_relative_eq!(n0.norm(), 1.0, epsilon = 1e-6);
        // the large face in the XY plane dominates
        assert!(n0.z > n0.y.abs());
    }

    #[test]
    fn test_triangle_uv_count() {
        let mut mesh = quad();
        assert!(!mesh.has_triangle_uvs());

        mesh.set_triangle_uvs(vec![[0.0, 0.0]; 5]);
        assert!(!mesh.has_triangle_uvs());

        mesh.set_triangle_uvs(vec![[0.0, 0.0]; 6]);
        assert!(mesh.has_triangle_uvs());
    }

    #[test]
    fn test_paint_uniform_color() {
        let mut mesh = quad();
        mesh.paint_uniform_color([1.0, 1.0, 1.0]);
        assert!(mesh.has_vertex_colors());
        assert!(mesh.colors.unwrap().iter().all(|c| *c == [255, 255, 255]));
    }
}
