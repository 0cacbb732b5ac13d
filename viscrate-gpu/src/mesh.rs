//! Vertex layout and geometry conversion for rendering

use bytemuck::{Pod, Zeroable};
use viscrate_core::{color_to_f32, Geometry, PointCloud, TriangleMesh, Vector3f, DEFAULT_NORMAL};

/// Vertex data for geometry rendering
///
/// `corner` is zero for triangle vertices. Points are drawn as screen-aligned
/// quads whose six vertices share a position and carry their quad corner in
/// [-0.5, 0.5]; the vertex shader scales it by the material point size.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
    pub corner: [f32; 2],
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];

impl MeshVertex {
    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x3,
            4 => Float32x2,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

fn to_array(v: &Vector3f) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Expand a mesh to three vertices per triangle so per-corner UVs survive
pub fn mesh_vertices(mesh: &TriangleMesh) -> Vec<MeshVertex> {
    let normals = mesh.normals.as_ref().filter(|_| mesh.has_vertex_normals());
    let colors = mesh.colors.as_ref().filter(|_| mesh.has_vertex_colors());
    let uvs = mesh.triangle_uvs.as_ref().filter(|_| mesh.has_triangle_uvs());
    let face_normals = if normals.is_none() {
        mesh.calculate_face_normals()
    } else {
        Vec::new()
    };

    let mut vertices = Vec::with_capacity(mesh.faces.len() * 3);
    for (f, face) in mesh.faces.iter().enumerate() {
        for (k, &i) in face.iter().enumerate() {
            let p = mesh.vertices[i];
            let normal = match normals {
                Some(n) => to_array(&n[i]),
                None => to_array(&face_normals[f]),
            };
            vertices.push(MeshVertex {
                position: [p.x, p.y, p.z],
                normal,
                uv: uvs.map_or([0.0, 0.0], |uv| uv[3 * f + k]),
                color: colors.map_or(WHITE, |c| color_to_f32(c[i])),
                corner: [0.0, 0.0],
            });
        }
    }
    vertices
}

/// Expand every point to a six-vertex quad
pub fn point_cloud_vertices(cloud: &PointCloud) -> Vec<MeshVertex> {
    let normals = cloud.normals.as_ref().filter(|_| cloud.has_normals());
    let colors = cloud.colors.as_ref().filter(|_| cloud.has_colors());

    let mut vertices = Vec::with_capacity(cloud.len() * QUAD_CORNERS.len());
    for (i, p) in cloud.points.iter().enumerate() {
        let normal = normals.map_or(DEFAULT_NORMAL, |n| n[i]);
        let color = colors.map_or(WHITE, |c| color_to_f32(c[i]));
        for corner in QUAD_CORNERS {
            vertices.push(MeshVertex {
                position: [p.x, p.y, p.z],
                normal: to_array(&normal),
                uv: [corner[0] + 0.5, 0.5 - corner[1]],
                color,
                corner,
            });
        }
    }
    vertices
}

pub fn geometry_vertices(geometry: &Geometry) -> Vec<MeshVertex> {
    match geometry {
        Geometry::TriangleMesh(mesh) => mesh_vertices(mesh),
        Geometry::PointCloud(cloud) => point_cloud_vertices(cloud),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viscrate_core::Point3f;

    #[test]
    fn test_vertex_layout_matches_struct() {
        let desc = MeshVertex::desc();
        assert_eq!(desc.array_stride, 13 * 4);
        assert_eq!(desc.attributes.last().unwrap().offset, 11 * 4);
    }

    #[test]
    fn test_mesh_is_deindexed_with_uvs() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        mesh.set_triangle_uvs(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.5, 0.5], [1.0, 1.0], [0.0, 1.0]]);

        let vertices = mesh_vertices(&mesh);
        assert_eq!(vertices.len(), 6);
        // vertex 0 is shared but keeps its per-corner UV
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
        assert_eq!(vertices[3].uv, [0.5, 0.5]);
        assert_eq!(vertices[3].position, vertices[0].position);
        // face normal fallback
        assert_eq!(vertices[4].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[5].color, WHITE);
    }

    #[test]
    fn test_points_become_quads() {
        let mut cloud = PointCloud::from_points(vec![Point3f::new(1.0, 2.0, 3.0)]);
        cloud.set_colors(vec![[255, 0, 0]]);

        let vertices = point_cloud_vertices(&cloud);
        assert_eq!(vertices.len(), 6);
        assert!(vertices.iter().all(|v| v.position == [1.0, 2.0, 3.0]));
        assert!(vertices.iter().all(|v| v.color == [1.0, 0.0, 0.0]));
        assert_eq!(vertices[2].corner, [0.5, 0.5]);
    }
}
